use ratatui::crossterm::event::KeyEvent;
use ratatui::{Frame, layout::Rect};

use crate::{audio::SessionState, model::Track};

/// What a key press asks the session to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,
    Play(Track),
    Pause,
    Enqueue(Track),
    TogglePlay,
    NextTrack,
    PreviousTrack,
}

pub trait View: Send {
    fn render(&mut self, f: &mut Frame, area: Rect, session: &SessionState);
    fn handle_input(&mut self, key: KeyEvent, session: &SessionState) -> Option<Action>;
}
