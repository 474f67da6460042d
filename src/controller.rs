use std::time::Duration;
use tracing::trace;

use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};

use crate::config::DashboardConfig;
use crate::domain::{DashError, Message};
use crate::model::Model;

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &DashboardConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, DashError> {
        if !event::poll(Duration::from_millis(self.event_poll_time))? {
            return Ok(None);
        }
        let message = match event::read()? {
            // crossterm also emits release and repeat events on Windows
            Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                if model.raw_keyevents() {
                    Some(Message::RawKey(key))
                } else {
                    Self::handle_key(key)
                }
            }
            Event::Resize(width, height) => Some(Message::Resize(width as usize, height as usize)),
            _ => None,
        };
        Ok(message)
    }

    pub(crate) fn handle_key(key: KeyEvent) -> Option<Message> {
        let message = match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Message::Quit),
            (KeyCode::Char('q'), _) => Some(Message::Quit),
            (KeyCode::Up, _) | (KeyCode::Char('k'), _) => Some(Message::MoveUp),
            (KeyCode::Down, _) | (KeyCode::Char('j'), _) => Some(Message::MoveDown),
            (KeyCode::PageUp, _) => Some(Message::MovePageUp),
            (KeyCode::PageDown, _) => Some(Message::MovePageDown),
            (KeyCode::Home, _) | (KeyCode::Char('g'), _) => Some(Message::MoveBeginning),
            (KeyCode::End, _) | (KeyCode::Char('G'), _) => Some(Message::MoveEnd),
            (KeyCode::Tab, _) | (KeyCode::Right, _) | (KeyCode::Char('l'), _) => {
                Some(Message::NextDataset)
            }
            (KeyCode::BackTab, _) | (KeyCode::Left, _) | (KeyCode::Char('h'), _) => {
                Some(Message::PreviousDataset)
            }
            (KeyCode::Char('c'), _) => Some(Message::NextCategory),
            (KeyCode::Char('C'), _) => Some(Message::PreviousCategory),
            (KeyCode::Char('/'), _) => Some(Message::Search),
            (KeyCode::Char(':'), _) => Some(Message::EnterCommand),
            (KeyCode::Enter, _) => Some(Message::Enter),
            (KeyCode::Esc, _) => Some(Message::Exit),
            (KeyCode::Char('y'), _) => Some(Message::CopyRow),
            (KeyCode::Char('r'), _) => Some(Message::Reload),
            (KeyCode::Char('?'), _) => Some(Message::Help),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Option<Message> {
        Controller::handle_key(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn maps_navigation_keys() {
        assert_eq!(press(KeyCode::Char('j'), KeyModifiers::NONE), Some(Message::MoveDown));
        assert_eq!(press(KeyCode::Up, KeyModifiers::NONE), Some(Message::MoveUp));
        assert_eq!(press(KeyCode::Tab, KeyModifiers::NONE), Some(Message::NextDataset));
        assert_eq!(press(KeyCode::Char('G'), KeyModifiers::SHIFT), Some(Message::MoveEnd));
    }

    #[test]
    fn category_keys_and_ctrl_c() {
        assert_eq!(press(KeyCode::Char('c'), KeyModifiers::NONE), Some(Message::NextCategory));
        assert_eq!(
            press(KeyCode::Char('C'), KeyModifiers::SHIFT),
            Some(Message::PreviousCategory)
        );
        assert_eq!(press(KeyCode::Char('c'), KeyModifiers::CONTROL), Some(Message::Quit));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        assert_eq!(press(KeyCode::Char('z'), KeyModifiers::NONE), None);
        assert_eq!(press(KeyCode::F(5), KeyModifiers::NONE), None);
    }
}
