use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::ui::traits::Action;

/// Keys that work regardless of the focused view.
pub struct InputHandler;

impl InputHandler {
    pub fn handle_key(key: KeyEvent) -> Option<Action> {
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Action::Quit),
            (KeyCode::Esc, _) => Some(Action::Quit),
            (KeyCode::Char(' '), _) => Some(Action::TogglePlay),
            (KeyCode::Char('n'), _) => Some(Action::NextTrack),
            (KeyCode::Char('p'), _) => Some(Action::PreviousTrack),
            _ => None,
        }
    }
}
