//! Keyboard input: one discrete action per physical keypress.

use crate::game::Action;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Map a key event to a game action. Keys outside the fixed set are
/// ignored. Ctrl-C quits from any state.
pub fn map_key(key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }
    match key.code {
        KeyCode::Left => Some(Action::MoveLeft),
        KeyCode::Right => Some(Action::MoveRight),
        KeyCode::Down => Some(Action::SoftDrop),
        KeyCode::Up => Some(Action::Rotate),
        KeyCode::Char(' ') => Some(Action::HardDrop),
        KeyCode::Enter => Some(Action::Confirm),
        KeyCode::Esc | KeyCode::Char('p') | KeyCode::Char('P') => Some(Action::Pause),
        _ => None,
    }
}
