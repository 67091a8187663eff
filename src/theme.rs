//! Theme system for the TUI.
//!
//! Provides semantic color roles that map to ratatui `Style` values.
//! The `ThemeVariant` enum selects between Dark and Light palettes.

use ratatui::style::{Color, Modifier, Style};

// ============================================================================
// Theme Variant
// ============================================================================

/// Available theme variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeVariant {
    Dark,
    Light,
}

impl ThemeVariant {
    /// Parse a variant name from a string (case-insensitive).
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    /// Build the `ColorPalette` for this variant.
    pub fn palette(self) -> ColorPalette {
        match self {
            Self::Dark => ColorPalette::dark(),
            Self::Light => ColorPalette::light(),
        }
    }

    /// Cycle to the next variant: Dark → Light → Dark.
    pub fn next(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    /// Human-readable name for status display.
    pub fn name(self) -> &'static str {
        match self {
            Self::Dark => "Dark",
            Self::Light => "Light",
        }
    }
}

// ============================================================================
// Color Palette: semantic roles to Style
// ============================================================================

/// A complete color palette mapping every semantic UI role to a `Style`.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    // -- Navbar --
    pub navbar: Style,
    pub navbar_menu: Style,

    // -- Sidebar --
    pub sidebar_item: Style,
    pub sidebar_header_open: Style,
    pub submenu_item: Style,

    // -- Main content --
    pub heading: Style,
    pub body: Style,
    pub countdown: Style,
    pub timestamp: Style,
    pub control: Style,
    pub control_checked: Style,
    pub control_disabled: Style,

    // -- Focus --
    pub focused: Style,

    // -- Chrome --
    pub status_bar: Style,
    pub status_notice: Style,
    pub panel_border: Style,
    pub panel_border_active: Style,
    pub prompt: Style,
}

impl ColorPalette {
    fn dark() -> Self {
        Self {
            navbar: Style::default().bg(Color::DarkGray).fg(Color::White),
            navbar_menu: Style::default().fg(Color::Cyan),

            sidebar_item: Style::default(),
            sidebar_header_open: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            submenu_item: Style::default().fg(Color::Gray),

            heading: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            body: Style::default(),
            countdown: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            timestamp: Style::default().fg(Color::Gray),
            control: Style::default().fg(Color::Blue),
            control_checked: Style::default().fg(Color::Green),
            control_disabled: Style::default().fg(Color::DarkGray),

            focused: Style::default().bg(Color::DarkGray).fg(Color::White),

            status_bar: Style::default().bg(Color::DarkGray).fg(Color::White),
            status_notice: Style::default().bg(Color::DarkGray).fg(Color::Yellow),
            panel_border: Style::default(),
            panel_border_active: Style::default().fg(Color::Cyan),
            prompt: Style::default().fg(Color::Yellow),
        }
    }

    /// Light palette, adapted for light terminal backgrounds.
    fn light() -> Self {
        Self {
            navbar: Style::default().bg(Color::White).fg(Color::Black),
            navbar_menu: Style::default().fg(Color::Blue),

            sidebar_item: Style::default().fg(Color::Black),
            sidebar_header_open: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            submenu_item: Style::default().fg(Color::DarkGray),

            heading: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            body: Style::default().fg(Color::Black),
            countdown: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            timestamp: Style::default().fg(Color::DarkGray),
            control: Style::default().fg(Color::Blue),
            control_checked: Style::default().fg(Color::Green),
            control_disabled: Style::default().fg(Color::Gray),

            focused: Style::default().bg(Color::Blue).fg(Color::White),

            status_bar: Style::default().bg(Color::White).fg(Color::Black),
            status_notice: Style::default().bg(Color::White).fg(Color::Red),
            panel_border: Style::default().fg(Color::DarkGray),
            panel_border_active: Style::default().fg(Color::Blue),
            prompt: Style::default().fg(Color::Magenta),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dark_palette_focus_is_highlighted() {
        let palette = ThemeVariant::Dark.palette();
        assert_eq!(
            palette.focused,
            Style::default().bg(Color::DarkGray).fg(Color::White)
        );
    }

    #[test]
    fn light_palette_differs_from_dark() {
        let dark = ThemeVariant::Dark.palette();
        let light = ThemeVariant::Light.palette();
        assert_ne!(dark.focused, light.focused);
        assert_ne!(dark.status_bar, light.status_bar);
    }

    #[test]
    fn variant_from_str_name() {
        assert_eq!(ThemeVariant::from_str_name("dark"), Some(ThemeVariant::Dark));
        assert_eq!(ThemeVariant::from_str_name("Light"), Some(ThemeVariant::Light));
        assert_eq!(ThemeVariant::from_str_name("neon"), None);
    }

    #[test]
    fn variant_cycles() {
        assert_eq!(ThemeVariant::Dark.next(), ThemeVariant::Light);
        assert_eq!(ThemeVariant::Light.next().next(), ThemeVariant::Light);
    }
}
