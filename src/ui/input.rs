//! Input handling for the TUI.
//!
//! Keys map to actions through the keybinding registry. The help overlay
//! and the file path prompt capture input while they are open.

use crate::app::{App, MAX_PATH_INPUT};
use crate::keybindings::{Action as KbAction, Context as KbContext};
use crossterm::event::{KeyCode, KeyModifiers};
use navtick::glue::Trigger;
use navtick::sidebar::SubmenuId;

use super::Action;

/// Main input dispatch function.
pub(super) async fn handle_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Action {
    if app.show_help {
        return handle_help_input(app, code);
    }

    if app.picker.is_some() {
        handle_picker_input(app, code, modifiers);
        return Action::Continue;
    }

    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Action::Quit;
    }

    // Digits address submenus by position.
    if let KeyCode::Char(c @ '1'..='9') = code {
        if modifiers.is_empty() || modifiers == KeyModifiers::SHIFT {
            let index = c as usize - '1' as usize;
            app.dispatch(Trigger::ToggleSubmenu(SubmenuId(index)));
            return Action::Continue;
        }
    }

    let Some(action) = app.keybindings.action_for_key(code, modifiers, KbContext::Global) else {
        return Action::Continue;
    };

    match action {
        KbAction::Quit => return Action::Quit,
        KbAction::FocusNext => app.focus_next(),
        KbAction::FocusPrev => app.focus_prev(),
        KbAction::Activate => app.activate_focused(),
        KbAction::Back => app.status_message = None,
        KbAction::ToggleSidebar => app.dispatch(Trigger::ToggleSidebar),
        KbAction::ToggleProfile => app.dispatch(Trigger::ToggleProfile),
        KbAction::WizardNext => app.dispatch(Trigger::WizardNext),
        KbAction::WizardPrev => app.dispatch(Trigger::WizardPrev),
        KbAction::Reload => app.reload().await,
        KbAction::CycleTheme => app.cycle_theme(),
        KbAction::ShowHelp => app.show_help = true,
    }
    Action::Continue
}

fn handle_help_input(app: &mut App, code: KeyCode) -> Action {
    match code {
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => app.show_help = false,
        _ => {}
    }
    Action::Continue
}

fn handle_picker_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match app.keybindings.action_for_key(code, modifiers, KbContext::Picker) {
        Some(KbAction::Activate) => {
            app.confirm_picker();
            return;
        }
        Some(KbAction::Back) => {
            app.picker = None;
            return;
        }
        _ => {}
    }

    let Some(picker) = app.picker.as_mut() else {
        return;
    };
    match code {
        KeyCode::Backspace => {
            picker.buffer.pop();
        }
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
            if picker.buffer.len() + c.len_utf8() <= MAX_PATH_INPUT {
                picker.buffer.push(c);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{AppEvent, PageSource, PickerState, EVENT_CHANNEL_CAPACITY};
    use crate::keybindings::KeybindingRegistry;
    use crate::theme::ThemeVariant;
    use navtick::page::PageOptions;
    use tokio::sync::mpsc;

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

    #[tokio::test]
    async fn test_quit_key() {
        let (mut app, _rx) = test_app();
        let action = handle_input(&mut app, KeyCode::Char('q'), KeyModifiers::NONE).await;
        assert!(matches!(action, Action::Quit));
    }

    #[tokio::test]
    async fn test_digit_opens_submenu() {
        let (mut app, _rx) = test_app();
        handle_input(&mut app, KeyCode::Char('2'), KeyModifiers::NONE).await;
        let state = app.page.sidebar().unwrap().state();
        assert_eq!(state.active_submenu, Some(SubmenuId(1)));
        assert!(state.expanded);
    }

    #[tokio::test]
    async fn test_sidebar_key_toggles() {
        let (mut app, _rx) = test_app();
        handle_input(&mut app, KeyCode::Char('s'), KeyModifiers::NONE).await;
        assert!(app.page.sidebar().unwrap().state().expanded);
    }

    #[tokio::test]
    async fn test_picker_captures_typed_keys() {
        let (mut app, _rx) = test_app();
        let input = app.page.document().get_element_by_id("pfpInput").unwrap();
        app.picker = Some(PickerState {
            input,
            buffer: String::new(),
        });

        for c in "/tmp/q".chars() {
            handle_input(&mut app, KeyCode::Char(c), KeyModifiers::NONE).await;
        }
        handle_input(&mut app, KeyCode::Backspace, KeyModifiers::NONE).await;
        assert_eq!(app.picker.as_ref().unwrap().buffer, "/tmp/");

        handle_input(&mut app, KeyCode::Esc, KeyModifiers::NONE).await;
        assert!(app.picker.is_none());
    }

    #[tokio::test]
    async fn test_help_captures_input() {
        let (mut app, _rx) = test_app();
        handle_input(&mut app, KeyCode::Char('?'), KeyModifiers::NONE).await;
        assert!(app.show_help);
        let action = handle_input(&mut app, KeyCode::Char('q'), KeyModifiers::NONE).await;
        assert!(matches!(action, Action::Continue));
        assert!(!app.show_help);
    }
}
