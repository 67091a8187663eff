use crate::keybindings::KeybindingRegistry;
use crate::theme::{ColorPalette, ThemeVariant};
use chrono::Local;
use navtick::clock::SystemClock;
use navtick::countdown::{spawn_countdown, CountdownHandle, CountdownKind, DisplaySink, Reloader};
use navtick::dom::{Document, NodeId, PageLoadError, DEFAULT_PAGE};
use navtick::error::ComponentError;
use navtick::glue::Trigger;
use navtick::page::{Activation, Page, PageOptions};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Capacity of the app event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Slots countdown text never fills, so a reload request always fits.
/// Each countdown sends at most one reload per page generation; the margin
/// covers sinks racing past the capacity check on other worker threads.
const RELOAD_HEADROOM: usize = 2 * CountdownKind::ALL.len();

// ============================================================================
// Events
// ============================================================================

/// Events delivered to the UI loop from countdown tasks.
///
/// Every event carries the page generation it was produced for. Events from
/// a page that has since been reloaded are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Countdown {
        generation: u64,
        kind: CountdownKind,
        text: String,
    },
    ReloadRequested {
        generation: u64,
        kind: CountdownKind,
    },
}

/// Publishes countdown text into the app event channel.
struct ChannelSink {
    generation: u64,
    kind: CountdownKind,
    tx: mpsc::Sender<AppEvent>,
}

impl DisplaySink for ChannelSink {
    fn publish(&mut self, text: String) {
        let event = AppEvent::Countdown {
            generation: self.generation,
            kind: self.kind,
            text,
        };
        // The last slots are kept for reload requests. A dropped text is
        // replaced by the next tick.
        if self.tx.capacity() <= RELOAD_HEADROOM {
            tracing::debug!(kind = self.kind.name(), "Event channel busy, countdown text dropped");
            return;
        }
        if let Err(e) = self.tx.try_send(event) {
            tracing::debug!(kind = self.kind.name(), error = %e, "Countdown text dropped");
        }
    }
}

/// Asks the UI loop to reload the page.
struct ChannelReloader {
    generation: u64,
    kind: CountdownKind,
    tx: mpsc::Sender<AppEvent>,
}

impl Reloader for ChannelReloader {
    fn reload(&mut self) -> Result<(), ComponentError> {
        self.tx
            .try_send(AppEvent::ReloadRequested {
                generation: self.generation,
                kind: self.kind,
            })
            .map_err(|e| ComponentError::ReloadUnavailable(e.to_string()))
    }
}

// ============================================================================
// Page Source
// ============================================================================

/// Where the page markup comes from. Reloading re-reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    Bundled,
    File(PathBuf),
}

impl PageSource {
    pub fn load(&self) -> Result<Document, PageLoadError> {
        match self {
            Self::Bundled => Document::from_toml(DEFAULT_PAGE),
            Self::File(path) => Document::load(path),
        }
    }

    pub fn describe(&self) -> Cow<'_, str> {
        match self {
            Self::Bundled => Cow::Borrowed("bundled dashboard"),
            Self::File(path) => path.to_string_lossy(),
        }
    }
}

// ============================================================================
// File Path Prompt
// ============================================================================

/// State of the file path prompt opened by activating a file input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerState {
    pub input: NodeId,
    pub buffer: String,
}

/// Maximum length of a typed file path.
pub const MAX_PATH_INPUT: usize = 4096;

// ============================================================================
// App
// ============================================================================

pub struct App {
    pub page: Page,
    pub source: PageSource,
    pub options: PageOptions,

    /// Bumped on every reload; stale countdown events are ignored.
    pub generation: u64,
    countdowns: Vec<CountdownHandle>,
    event_tx: mpsc::Sender<AppEvent>,

    pub focused: Option<NodeId>,
    pub picker: Option<PickerState>,
    pub show_help: bool,

    pub theme: ThemeVariant,
    pub palette: ColorPalette,
    pub keybindings: KeybindingRegistry,

    pub status_message: Option<(Cow<'static, str>, Instant)>,
    pub needs_redraw: bool,
}

impl App {
    /// Load and mount the page. Countdowns start with [`App::start_countdowns`].
    pub fn new(
        source: PageSource,
        options: PageOptions,
        theme: ThemeVariant,
        keybindings: KeybindingRegistry,
        event_tx: mpsc::Sender<AppEvent>,
    ) -> Result<Self, PageLoadError> {
        let page = Page::mount(source.load()?, &options, &Local);
        let mut app = Self {
            page,
            source,
            options,
            generation: 0,
            countdowns: Vec::new(),
            event_tx,
            focused: None,
            picker: None,
            show_help: false,
            theme,
            palette: theme.palette(),
            keybindings,
            status_message: None,
            needs_redraw: true,
        };
        app.refocus();
        Ok(app)
    }

    /// Spawn one countdown task per display element on the page.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_countdowns(&mut self) {
        for &(kind, _) in self.page.countdowns() {
            let sink = ChannelSink {
                generation: self.generation,
                kind,
                tx: self.event_tx.clone(),
            };
            let reloader = ChannelReloader {
                generation: self.generation,
                kind,
                tx: self.event_tx.clone(),
            };
            self.countdowns
                .push(spawn_countdown(kind, SystemClock, sink, reloader));
        }
        tracing::debug!(
            generation = self.generation,
            running = self.running_countdowns(),
            "Countdowns started"
        );
    }

    pub fn running_countdowns(&self) -> usize {
        self.countdowns.iter().filter(|h| !h.is_finished()).count()
    }

    /// Stop every running countdown and wait for its task to end.
    pub async fn stop_countdowns(&mut self) {
        for handle in self.countdowns.drain(..) {
            let kind = handle.kind();
            let phase = handle.stop().await;
            tracing::debug!(kind = kind.name(), ?phase, "Countdown stopped");
        }
    }

    /// Re-read the page source and mount it afresh.
    ///
    /// Countdowns are swapped only once the new page has loaded. On a load
    /// failure the current page and its countdowns keep running, as if the
    /// reload never happened.
    pub async fn reload(&mut self) {
        match self.source.load() {
            Ok(doc) => {
                self.stop_countdowns().await;
                self.generation = self.generation.wrapping_add(1);
                self.page = Page::mount(doc, &self.options, &Local);
                self.picker = None;
                self.focused = None;
                self.refocus();
                self.start_countdowns();
                tracing::info!(source = %self.source.describe(), generation = self.generation, "Page reloaded");
                self.set_status("Page reloaded");
            }
            Err(e) => {
                tracing::warn!(source = %self.source.describe(), error = %e, "Page reload failed");
                self.set_status(format!("Reload failed: {}", e));
            }
        }
    }

    // ------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------

    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear status message if expired (older than 3 seconds)
    /// Returns true if a message was actually cleared
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= 3 {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    // ------------------------------------------------------------------
    // Theme
    // ------------------------------------------------------------------

    pub fn cycle_theme(&mut self) {
        self.theme = self.theme.next();
        self.palette = self.theme.palette();
        self.set_status(format!("Theme: {}", self.theme.name()));
    }

    // ------------------------------------------------------------------
    // Focus
    // ------------------------------------------------------------------

    /// Keep focus on a displayed control, falling back to the first one.
    pub fn refocus(&mut self) {
        let targets = self.page.focus_targets();
        if self.focused.is_some_and(|f| targets.contains(&f)) {
            return;
        }
        self.focused = targets.first().copied();
    }

    pub fn focus_next(&mut self) {
        self.move_focus(1);
    }

    pub fn focus_prev(&mut self) {
        self.move_focus(-1);
    }

    fn move_focus(&mut self, step: isize) {
        let targets = self.page.focus_targets();
        if targets.is_empty() {
            self.focused = None;
            return;
        }
        let len = targets.len() as isize;
        let next = match self.focused.and_then(|f| targets.iter().position(|&t| t == f)) {
            Some(pos) => (pos as isize + step).rem_euclid(len),
            None => 0,
        };
        self.focused = Some(targets[next as usize]);
    }

    // ------------------------------------------------------------------
    // Activation
    // ------------------------------------------------------------------

    pub fn activate_focused(&mut self) {
        if let Some(node) = self.focused {
            let outcome = self.page.activate(node);
            self.handle_activation(outcome);
        }
    }

    pub fn dispatch(&mut self, trigger: Trigger) {
        let outcome = self.page.dispatch(trigger);
        if outcome == Activation::Ignored {
            tracing::debug!(?trigger, "Trigger has no mounted component");
        }
        self.handle_activation(outcome);
    }

    fn handle_activation(&mut self, outcome: Activation) {
        match outcome {
            Activation::Ignored | Activation::Updated => {}
            Activation::PickFile(input) => {
                self.picker = Some(PickerState {
                    input,
                    buffer: String::new(),
                });
            }
            Activation::Notice(msg) => self.set_status(msg),
        }
        self.refocus();
    }

    /// Apply the path typed in the prompt. An empty path clears the selection.
    pub fn confirm_picker(&mut self) {
        let Some(picker) = self.picker.take() else {
            return;
        };
        let path = picker.buffer.trim();
        let file = (!path.is_empty()).then(|| Path::new(path));
        self.choose_file(picker.input, file);
    }

    pub fn choose_file(&mut self, input: NodeId, file: Option<&Path>) {
        match self.page.choose_file(input, file) {
            Ok(()) => match file {
                Some(path) => self.set_status(format!("Attached {}", path.display())),
                None => self.set_status("Selection cleared"),
            },
            Err(e) => {
                tracing::warn!(error = %e, "File selection failed");
                self.set_status(format!("Preview failed: {}", e));
            }
        }
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Apply a countdown event. Returns `true` if the page should reload.
    pub fn apply_event(&mut self, event: AppEvent) -> bool {
        match event {
            AppEvent::Countdown {
                generation,
                kind,
                text,
            } => {
                if generation == self.generation {
                    self.page.set_countdown_text(kind, text);
                }
                false
            }
            AppEvent::ReloadRequested { generation, kind } => {
                let current = generation == self.generation;
                if current {
                    tracing::info!(kind = kind.name(), "Countdown expired, reloading page");
                }
                current
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tokio::time;

    fn test_app() -> (App, mpsc::Receiver<AppEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let app = App::new(
            PageSource::Bundled,
            PageOptions::default(),
            ThemeVariant::Dark,
            KeybindingRegistry::new(),
            tx,
        )
        .unwrap();
        (app, rx)
    }

    fn by_id(app: &App, id: &str) -> NodeId {
        app.page.document().get_element_by_id(id).unwrap()
    }

    #[test]
    fn test_initial_focus_is_first_control() {
        let (app, _rx) = test_app();
        assert_eq!(app.focused, Some(by_id(&app, "menu-icon")));
    }

    #[test]
    fn test_focus_wraps_around() {
        let (mut app, _rx) = test_app();
        let first = app.focused;
        app.focus_prev();
        assert_ne!(app.focused, first);
        app.focus_next();
        assert_eq!(app.focused, first);
    }

    #[test]
    fn test_activate_file_input_opens_picker() {
        let (mut app, _rx) = test_app();
        let image = by_id(&app, "pfpImage");
        app.focused = Some(image);
        app.activate_focused();
        assert_eq!(
            app.picker,
            Some(PickerState {
                input: by_id(&app, "pfpInput"),
                buffer: String::new(),
            })
        );
    }

    #[test]
    fn test_missing_file_sets_status_and_keeps_preview() {
        let (mut app, _rx) = test_app();
        let image = by_id(&app, "pfpImage");
        let before = app.page.document().attr(image, "src").map(str::to_string);
        app.picker = Some(PickerState {
            input: by_id(&app, "pfpInput"),
            buffer: "/nonexistent/navtick/avatar.png".into(),
        });
        app.confirm_picker();

        assert!(app.picker.is_none());
        let (msg, _) = app.status_message.clone().unwrap();
        assert!(msg.starts_with("Preview failed"));
        assert_eq!(
            app.page.document().attr(image, "src").map(str::to_string),
            before
        );
    }

    #[test]
    fn test_wizard_notice_goes_to_status() {
        let (mut app, _rx) = test_app();
        app.dispatch(Trigger::WizardNext);
        let (msg, _) = app.status_message.clone().unwrap();
        assert_eq!(msg, "Please choose if you are a Student or a CIO.");
    }

    #[test]
    fn test_focus_moves_off_hidden_control() {
        let (mut app, _rx) = test_app();
        app.dispatch(Trigger::ToggleProfile);
        let settings_menu = app
            .page
            .document()
            .query_selector(".profile-menu")
            .unwrap()
            .unwrap();
        assert!(app.page.is_displayed(settings_menu));
        // Focus stays valid across toggles.
        app.dispatch(Trigger::ToggleProfile);
        assert!(app
            .page
            .focus_targets()
            .contains(&app.focused.unwrap()));
    }

    #[test]
    fn test_stale_events_ignored() {
        let (mut app, _rx) = test_app();
        app.generation = 3;
        let reload = app.apply_event(AppEvent::ReloadRequested {
            generation: 2,
            kind: CountdownKind::Daily,
        });
        assert!(!reload);

        app.apply_event(AppEvent::Countdown {
            generation: 2,
            kind: CountdownKind::Daily,
            text: "00:00:09".into(),
        });
        let display = by_id(&app, "daily-countdown");
        assert_eq!(app.page.document().text(display), "");
    }

    #[test]
    fn test_current_events_applied() {
        let (mut app, _rx) = test_app();
        app.apply_event(AppEvent::Countdown {
            generation: 0,
            kind: CountdownKind::Weekly,
            text: "02:03:04:05".into(),
        });
        let display = by_id(&app, "weekly-countdown");
        assert_eq!(app.page.document().text(display), "02:03:04:05");
        assert!(app.apply_event(AppEvent::ReloadRequested {
            generation: 0,
            kind: CountdownKind::Weekly,
        }));
    }

    #[tokio::test]
    async fn test_first_tick_published_on_start() {
        let (mut app, mut rx) = test_app();
        app.start_countdowns();
        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let AppEvent::Countdown { kind, text, .. } = event {
                assert!(!text.is_empty());
                kinds.push(kind);
            }
        }
        kinds.sort_by_key(|k| k.name());
        assert_eq!(kinds, vec![CountdownKind::Daily, CountdownKind::Weekly]);
    }

    #[tokio::test]
    async fn test_reload_remounts_and_bumps_generation() {
        let (mut app, _rx) = test_app();
        app.start_countdowns();
        app.dispatch(Trigger::ToggleSidebar);
        assert!(app.page.sidebar().unwrap().state().expanded);

        app.reload().await;

        assert_eq!(app.generation, 1);
        assert!(!app.page.sidebar().unwrap().state().expanded);
        assert_eq!(app.running_countdowns(), 2);
    }

    #[tokio::test]
    async fn test_reload_failure_keeps_page() {
        let (mut app, _rx) = test_app();
        app.source = PageSource::File(PathBuf::from("/nonexistent/navtick/page.toml"));
        app.start_countdowns();
        app.dispatch(Trigger::ToggleSidebar);

        app.reload().await;

        assert!(app.page.sidebar().unwrap().state().expanded);
        assert_eq!(app.generation, 0);
        assert_eq!(app.running_countdowns(), 2);
        let (msg, _) = app.status_message.clone().unwrap();
        assert!(msg.starts_with("Reload failed"));
    }

    #[tokio::test]
    async fn test_reload_request_fits_when_text_backs_up() {
        let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let mut sink = ChannelSink {
            generation: 0,
            kind: CountdownKind::Daily,
            tx: tx.clone(),
        };
        let mut reloader = ChannelReloader {
            generation: 0,
            kind: CountdownKind::Daily,
            tx,
        };

        // The UI loop is stalled: nobody drains the channel.
        for _ in 0..EVENT_CHANNEL_CAPACITY * 2 {
            sink.publish("00:00:01".to_string());
        }
        assert!(reloader.reload().is_ok());

        let mut reloads = 0;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, AppEvent::ReloadRequested { .. }) {
                reloads += 1;
            }
        }
        assert_eq!(reloads, 1);
    }

    #[tokio::test]
    async fn test_status_expires_after_3_seconds() {
        let (mut app, _rx) = test_app();
        time::pause();
        app.set_status("Test message");

        time::advance(Duration::from_secs(2)).await;
        app.clear_expired_status();
        assert!(app.status_message.is_some());

        time::advance(Duration::from_secs(2)).await;
        assert!(app.clear_expired_status());
        assert!(app.status_message.is_none());
    }
}
