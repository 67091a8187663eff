//! Main event loop for the TUI.
//!
//! Multiplexes terminal input, countdown events from the page's running
//! countdowns, shutdown signals and a status-expiry tick.

use crate::app::{App, AppEvent};
use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc;

#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};

use super::input::handle_input;
use super::render::render;

/// Status expiry is checked at this cadence; countdowns tick on their own.
const STATUS_TICK: Duration = Duration::from_millis(250);

/// Result of handling a key press event.
pub enum Action {
    /// Continue the event loop and process more events.
    Continue,
    /// Exit the application and restore the terminal.
    Quit,
}

/// Raw mode plus alternate screen for as long as this value lives.
///
/// Dropping it restores the terminal, so an error returned from anywhere in
/// the loop still leaves the shell usable.
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    fn enter() -> Result<Self> {
        // The hook goes in before raw mode so a panic during setup is covered too.
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            original_hook(panic_info);
        }));

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        tracing::debug!("Terminal session started");
        Ok(Self { terminal })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
        tracing::debug!("Terminal restored");
    }
}

/// SIGTERM and SIGINT, or nothing on platforms without them.
struct ShutdownSignals {
    #[cfg(unix)]
    term: Signal,
    #[cfg(unix)]
    int: Signal,
}

impl ShutdownSignals {
    fn install() -> Result<Self> {
        Ok(Self {
            #[cfg(unix)]
            term: signal(SignalKind::terminate())?,
            #[cfg(unix)]
            int: signal(SignalKind::interrupt())?,
        })
    }

    /// Resolves with the signal's name.
    #[cfg(unix)]
    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.term.recv() => "SIGTERM",
            _ = self.int.recv() => "SIGINT",
        }
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) -> &'static str {
        std::future::pending().await
    }
}

/// Runs the TUI until the user quits, a signal arrives, or the terminal
/// input stream ends.
///
/// Countdowns are started here, after the terminal is ready, so their first
/// tick lands in the first frame.
pub async fn run(app: &mut App, mut event_rx: mpsc::Receiver<AppEvent>) -> Result<()> {
    let mut session = TerminalSession::enter()?;
    let mut signals = ShutdownSignals::install()?;
    let mut input = EventStream::new();
    let mut status_tick = tokio::time::interval(STATUS_TICK);

    app.start_countdowns();

    loop {
        if app.clear_expired_status() {
            app.needs_redraw = true;
        }

        // Countdown events that queued up while we were handling input.
        while let Ok(event) = event_rx.try_recv() {
            handle_app_event(app, event).await;
        }

        if app.needs_redraw {
            session.terminal.draw(|f| render(f, app))?;
            app.needs_redraw = false;
        }

        tokio::select! {
            biased;

            name = signals.recv() => {
                tracing::info!(signal = name, "Shutting down");
                break;
            }

            maybe_event = input.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    app.needs_redraw = true;
                    if let Action::Quit = handle_input(app, key.code, key.modifiers).await {
                        break;
                    }
                }
                Some(Ok(Event::Resize(_, _))) => app.needs_redraw = true,
                Some(Ok(_)) => {}
                Some(Err(e)) => tracing::warn!(error = %e, "Terminal event stream error"),
                None => {
                    tracing::info!("Terminal event stream closed");
                    break;
                }
            },

            Some(event) = event_rx.recv() => handle_app_event(app, event).await,

            _ = status_tick.tick() => {}
        }
    }

    app.stop_countdowns().await;
    drop(session);
    Ok(())
}

async fn handle_app_event(app: &mut App, event: AppEvent) {
    app.needs_redraw = true;
    if app.apply_event(event) {
        app.reload().await;
    }
}
