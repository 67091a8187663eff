//! Keybinding registry: maps actions to key events with config overrides.
//!
//! In the terminal host a "click" is focus + activate; the registry also
//! carries direct shortcuts for the page's main controls.
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::HashMap;

// ============================================================================
// Action Enum
// ============================================================================

/// All user-facing actions that can be triggered by keybindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    FocusNext,
    FocusPrev,
    Activate,
    Back,
    ToggleSidebar,
    ToggleProfile,
    WizardNext,
    WizardPrev,
    Reload,
    CycleTheme,
    ShowHelp,
}

impl Action {
    /// Human-readable description for the help screen.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Quit => "Quit",
            Self::FocusNext => "Focus next control",
            Self::FocusPrev => "Focus previous control",
            Self::Activate => "Activate focused control / confirm",
            Self::Back => "Dismiss / cancel",
            Self::ToggleSidebar => "Toggle sidebar",
            Self::ToggleProfile => "Toggle profile menu",
            Self::WizardNext => "Form: next step",
            Self::WizardPrev => "Form: previous step",
            Self::Reload => "Reload page",
            Self::CycleTheme => "Cycle theme",
            Self::ShowHelp => "Show help",
        }
    }
}

// ============================================================================
// Context Enum
// ============================================================================

/// Dispatch context. Determines which bindings are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    Global,
    /// Typing a file path for a file input.
    Picker,
}

// ============================================================================
// Key Specification
// ============================================================================

/// A key event: code + modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySpec {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeySpec {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }
}

/// Parse a key string from config into a KeySpec.
///
/// Supported formats:
/// - Single char: "q", "s", "/"
/// - Named keys: "Enter", "Esc", "Tab", "BackTab", "Up", "Down", "Left", "Right", "Space"
/// - Modifier combos: "Ctrl+b"
/// - Function keys: "F1" through "F12"
fn parse_key_string(s: &str) -> Option<KeySpec> {
    let s = s.trim();

    if let Some(rest) = s.strip_prefix("Ctrl+") {
        let rest = rest.trim();
        let mut chars = rest.chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) => Some(KeySpec::ctrl(c)),
            _ => None,
        };
    }

    match s.to_lowercase().as_str() {
        "enter" | "return" => return Some(KeySpec::plain(KeyCode::Enter)),
        "esc" | "escape" => return Some(KeySpec::plain(KeyCode::Esc)),
        "tab" => return Some(KeySpec::plain(KeyCode::Tab)),
        "backtab" => return Some(KeySpec::new(KeyCode::BackTab, KeyModifiers::SHIFT)),
        "up" => return Some(KeySpec::plain(KeyCode::Up)),
        "down" => return Some(KeySpec::plain(KeyCode::Down)),
        "left" => return Some(KeySpec::plain(KeyCode::Left)),
        "right" => return Some(KeySpec::plain(KeyCode::Right)),
        "space" => return Some(KeySpec::plain(KeyCode::Char(' '))),
        _ => {}
    }

    if let Some(n) = s
        .strip_prefix(['F', 'f'])
        .and_then(|rest| rest.parse::<u8>().ok())
    {
        if (1..=12).contains(&n) {
            return Some(KeySpec::plain(KeyCode::F(n)));
        }
    }

    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(KeySpec::plain(KeyCode::Char(c))),
        _ => None,
    }
}

/// Format a KeySpec as a human-readable string for the help screen.
fn format_key(key: &KeySpec) -> String {
    let modifier = if key.modifiers.contains(KeyModifiers::CONTROL) {
        "Ctrl+"
    } else {
        ""
    };

    let key_name = match key.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::BackTab => "Shift+Tab".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::Left => "Left".to_string(),
        KeyCode::Right => "Right".to_string(),
        KeyCode::F(n) => format!("F{}", n),
        _ => "?".to_string(),
    };

    format!("{}{}", modifier, key_name)
}

// ============================================================================
// Keybinding Registry
// ============================================================================

/// Registry of keybindings, supporting default bindings and config overrides.
pub struct KeybindingRegistry {
    /// Primary lookup: (Context, KeySpec) -> Action
    lookup: HashMap<(Context, KeySpec), Action>,
    /// All bindings for help screen enumeration
    bindings: Vec<(Context, KeySpec, Action)>,
}

impl KeybindingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            lookup: HashMap::new(),
            bindings: Vec::new(),
        };
        registry.register_defaults();
        registry
    }

    fn bind(&mut self, context: Context, key: KeySpec, action: Action) {
        self.lookup.insert((context, key), action);
        self.bindings.push((context, key, action));
    }

    fn register_defaults(&mut self) {
        use KeyCode::*;

        // === Global ===
        self.bind(Context::Global, KeySpec::plain(Char('q')), Action::Quit);
        self.bind(Context::Global, KeySpec::plain(Tab), Action::FocusNext);
        self.bind(Context::Global, KeySpec::plain(Char('j')), Action::FocusNext);
        self.bind(Context::Global, KeySpec::plain(Down), Action::FocusNext);
        self.bind(
            Context::Global,
            KeySpec::new(BackTab, KeyModifiers::SHIFT),
            Action::FocusPrev,
        );
        self.bind(Context::Global, KeySpec::plain(Char('k')), Action::FocusPrev);
        self.bind(Context::Global, KeySpec::plain(Up), Action::FocusPrev);
        self.bind(Context::Global, KeySpec::plain(Enter), Action::Activate);
        self.bind(Context::Global, KeySpec::plain(Char(' ')), Action::Activate);
        self.bind(Context::Global, KeySpec::plain(Esc), Action::Back);
        self.bind(Context::Global, KeySpec::plain(Char('s')), Action::ToggleSidebar);
        self.bind(Context::Global, KeySpec::plain(Char('p')), Action::ToggleProfile);
        self.bind(Context::Global, KeySpec::plain(Char('n')), Action::WizardNext);
        self.bind(Context::Global, KeySpec::plain(Char('b')), Action::WizardPrev);
        self.bind(Context::Global, KeySpec::plain(Char('r')), Action::Reload);
        self.bind(Context::Global, KeySpec::plain(Char('T')), Action::CycleTheme);
        self.bind(Context::Global, KeySpec::plain(Char('?')), Action::ShowHelp);

        // === File path prompt ===
        self.bind(Context::Picker, KeySpec::plain(Enter), Action::Activate);
        self.bind(Context::Picker, KeySpec::plain(Esc), Action::Back);
    }

    /// Apply user overrides from config keybindings map.
    ///
    /// Keys in the map are action names (e.g., "quit", "toggle_sidebar").
    /// Values are key strings (e.g., "q", "Ctrl+b", "F5").
    ///
    /// Returns a list of warnings for unrecognized action names or unparseable keys.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) -> Vec<String> {
        let mut warnings = Vec::new();

        for (action_name, key_str) in overrides {
            let Some(action) = parse_action_name(action_name) else {
                warnings.push(format!("Unknown action '{}', ignoring", action_name));
                continue;
            };

            let Some(key) = parse_key_string(key_str) else {
                warnings.push(format!(
                    "Cannot parse key '{}' for action '{}', ignoring",
                    key_str, action_name
                ));
                continue;
            };

            let contexts_for_action: Vec<Context> = self
                .bindings
                .iter()
                .filter(|(_, _, a)| *a == action)
                .map(|(c, _, _)| *c)
                .collect();

            self.lookup.retain(|_, a| *a != action);
            self.bindings.retain(|(_, _, a)| *a != action);

            for ctx in contexts_for_action {
                self.bind(ctx, key, action);
            }

            tracing::info!(
                action = %action_name,
                key = %key_str,
                "Applied keybinding override"
            );
        }

        warnings
    }

    /// Look up the action for a given key in a given context.
    ///
    /// The picker context does not fall back to Global: typed characters
    /// there are path text, not shortcuts.
    pub fn action_for_key(
        &self,
        code: KeyCode,
        modifiers: KeyModifiers,
        context: Context,
    ) -> Option<Action> {
        let key = KeySpec::new(code, modifiers);
        if let Some(&action) = self.lookup.get(&(context, key)) {
            return Some(action);
        }
        if context == Context::Global {
            return None;
        }
        match key.code {
            KeyCode::Char(_) if !key.modifiers.contains(KeyModifiers::CONTROL) => None,
            _ => self.lookup.get(&(Context::Global, key)).copied(),
        }
    }

    /// Get all bindings for the help screen: (key display string, description).
    pub fn all_bindings(&self) -> Vec<(String, &'static str)> {
        self.bindings
            .iter()
            .filter(|(ctx, _, _)| *ctx == Context::Global)
            .map(|(_, key, action)| (format_key(key), action.describe()))
            .collect()
    }
}

impl Default for KeybindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an action name string (from config) into an Action enum.
fn parse_action_name(name: &str) -> Option<Action> {
    match name.to_lowercase().as_str() {
        "quit" => Some(Action::Quit),
        "focus_next" | "next" => Some(Action::FocusNext),
        "focus_prev" | "prev" => Some(Action::FocusPrev),
        "activate" | "select" | "enter" => Some(Action::Activate),
        "back" => Some(Action::Back),
        "toggle_sidebar" | "sidebar" => Some(Action::ToggleSidebar),
        "toggle_profile" | "profile" => Some(Action::ToggleProfile),
        "wizard_next" => Some(Action::WizardNext),
        "wizard_prev" => Some(Action::WizardPrev),
        "reload" => Some(Action::Reload),
        "cycle_theme" | "theme" => Some(Action::CycleTheme),
        "show_help" | "help" => Some(Action::ShowHelp),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
