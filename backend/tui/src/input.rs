//! Keyboard Input Handler
//!
//! Maps crossterm key events onto `AppState`. Anything that needs IO comes
//! back as a [`Command`] for the runner to execute.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tagscan_core::WorkflowState;

use crate::app::{AppState, Field};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Persist the credential field; sent on every edit.
    SaveCredential(String),
    /// Open (or reopen) the camera for the scanning screen.
    StartCamera,
    Capture,
    Export,
    /// Leave Results; the runner rereads the stored credential.
    ScanAnother,
}

/// Handles a single keyboard event.
pub fn handle_key_event(key: KeyEvent, state: &mut AppState) -> Option<Command> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        state.should_quit = true;
        return None;
    }

    match state.workflow.state() {
        WorkflowState::Input => handle_input_key(key, state),
        WorkflowState::Scanning { .. } => handle_scanning_key(key, state),
        WorkflowState::Results => handle_results_key(key, state),
    }
}

fn handle_input_key(key: KeyEvent, state: &mut AppState) -> Option<Command> {
    let form = &mut state.form;
    match key.code {
        KeyCode::Esc => {
            state.should_quit = true;
            None
        }
        KeyCode::Tab | KeyCode::Down => {
            form.focus = form.focus.next();
            None
        }
        KeyCode::BackTab | KeyCode::Up => {
            form.focus = form.focus.prev();
            None
        }
        KeyCode::Enter => state.submit().then_some(Command::StartCamera),
        KeyCode::Backspace => {
            form.focused_mut().pop();
            credential_edit(state)
        }
        KeyCode::Char(c) => {
            form.focused_mut().push(c);
            credential_edit(state)
        }
        _ => None,
    }
}

fn credential_edit(state: &AppState) -> Option<Command> {
    (state.form.focus == Field::Credential)
        .then(|| Command::SaveCredential(state.form.credential.clone()))
}

fn handle_scanning_key(key: KeyEvent, state: &mut AppState) -> Option<Command> {
    match key.code {
        KeyCode::Char(' ') | KeyCode::Enter => Some(Command::Capture),
        KeyCode::Char('f') | KeyCode::Char('F') | KeyCode::Esc => {
            state.finish();
            None
        }
        KeyCode::Char('r') | KeyCode::Char('R') if state.capture.needs_camera() => {
            Some(Command::StartCamera)
        }
        _ => None,
    }
}

fn handle_results_key(key: KeyEvent, state: &mut AppState) -> Option<Command> {
    match key.code {
        KeyCode::Char('e') | KeyCode::Char('E') => {
            (!state.workflow.records().is_empty()).then_some(Command::Export)
        }
        KeyCode::Char('n') | KeyCode::Char('N') => Some(Command::ScanAnother),
        KeyCode::Char('q') | KeyCode::Esc => {
            state.should_quit = true;
            None
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(state: &mut AppState, text: &str) -> Vec<Command> {
        text.chars()
            .filter_map(|c| handle_key_event(press(KeyCode::Char(c)), state))
            .collect()
    }

    #[test]
    fn every_credential_keystroke_is_saved() {
        let mut state = AppState::new(None, "i");
        let commands = type_text(&mut state, "ab");
        assert_eq!(
            commands,
            vec![
                Command::SaveCredential("a".into()),
                Command::SaveCredential("ab".into())
            ]
        );
        assert_eq!(
            handle_key_event(press(KeyCode::Backspace), &mut state),
            Some(Command::SaveCredential("a".into()))
        );
    }

    #[test]
    fn other_fields_do_not_save_credential() {
        let mut state = AppState::new(Some("k".into()), "i");
        handle_key_event(press(KeyCode::Tab), &mut state);
        handle_key_event(press(KeyCode::Tab), &mut state);
        assert_eq!(state.form.focus, Field::TruckNumber);
        assert!(type_text(&mut state, "T-9").is_empty());
        assert_eq!(state.form.truck_number, "T-9");
    }

    #[test]
    fn enter_submits_and_asks_for_camera() {
        let mut state = AppState::new(Some("k".into()), "i");
        state.form.truck_number = "T-9".into();
        assert_eq!(
            handle_key_event(press(KeyCode::Enter), &mut state),
            Some(Command::StartCamera)
        );
        assert!(state.workflow.session_id().is_some());
    }

    #[test]
    fn enter_with_missing_field_does_nothing() {
        let mut state = AppState::new(None, "i");
        state.form.truck_number = "T-9".into();
        assert_eq!(handle_key_event(press(KeyCode::Enter), &mut state), None);
        assert_eq!(state.workflow.state(), &WorkflowState::Input);
    }

    #[test]
    fn scanning_keys() {
        let mut state = AppState::new(Some("k".into()), "i");
        state.form.truck_number = "T-9".into();
        state.submit();

        assert_eq!(
            handle_key_event(press(KeyCode::Char(' ')), &mut state),
            Some(Command::Capture)
        );
        // No camera is open, so retry is offered.
        assert_eq!(
            handle_key_event(press(KeyCode::Char('r')), &mut state),
            Some(Command::StartCamera)
        );
        assert_eq!(handle_key_event(press(KeyCode::Char('f')), &mut state), None);
        assert_eq!(state.workflow.state(), &WorkflowState::Results);
    }

    #[test]
    fn export_is_disabled_without_records() {
        let mut state = AppState::new(Some("k".into()), "i");
        state.form.truck_number = "T-9".into();
        state.submit();
        state.finish();
        assert_eq!(handle_key_event(press(KeyCode::Char('e')), &mut state), None);
        assert_eq!(
            handle_key_event(press(KeyCode::Char('n')), &mut state),
            Some(Command::ScanAnother)
        );
    }

    #[test]
    fn ctrl_c_quits_anywhere() {
        let mut state = AppState::new(None, "i");
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key_event(key, &mut state), None);
        assert!(state.should_quit);
        assert!(state.form.credential.is_empty());
    }
}
