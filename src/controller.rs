use std::time::Duration;

use ratatui::crossterm::event::{
    self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};
use tracing::trace;

use crate::domain::{ColumnKey, LrvConfig, LrvError, Message};
use crate::model::Model;

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &LrvConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, LrvError> {
        if !event::poll(Duration::from_millis(self.event_poll_time))? {
            return Ok(None);
        }
        let message = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(model, key),
            Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                Some(Message::Click(mouse.column, mouse.row))
            }
            Event::Resize(width, height) => Some(Message::Resize(width, height)),
            _ => None,
        };
        Ok(message)
    }

    fn handle_key(&self, model: &Model, key: event::KeyEvent) -> Option<Message> {
        // While a filter box has focus, almost every key is text input.
        let message = if model.filter_active() {
            match key.code {
                KeyCode::Esc | KeyCode::Enter => Some(Message::UnfocusFilter),
                KeyCode::Tab => Some(Message::FocusNextFilter),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    Some(Message::Quit)
                }
                _ => Some(Message::RawKey(key)),
            }
        } else {
            match key.code {
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    Some(Message::Quit)
                }
                KeyCode::Char('q') | KeyCode::Esc => Some(Message::Quit),
                KeyCode::Tab => Some(Message::FocusNextFilter),
                // Keyboard path to the click-to-sort headers.
                KeyCode::Char('1') => Some(Message::SortByColumn(ColumnKey::LoadDate)),
                KeyCode::Char('2') => Some(Message::SortByColumn(ColumnKey::Source)),
                KeyCode::Char('3') => Some(Message::SortByColumn(ColumnKey::RecordCount)),
                KeyCode::Char('4') => Some(Message::SortByColumn(ColumnKey::LoadStatus)),
                KeyCode::Up => Some(Message::MoveUp),
                KeyCode::Down => Some(Message::MoveDown),
                KeyCode::PageUp => Some(Message::MovePageUp),
                KeyCode::PageDown => Some(Message::MovePageDown),
                KeyCode::Home => Some(Message::MoveBeginning),
                KeyCode::End => Some(Message::MoveEnd),
                _ => None,
            }
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyEvent;

    fn controller() -> Controller {
        Controller::new(&LrvConfig {
            event_poll_time: 100,
        })
    }

    fn empty_model() -> Model {
        Model::new(Vec::new(), "p.d.t".to_string(), 80, 24)
    }

    #[test]
    fn q_quits_when_no_filter_has_focus() {
        let message = controller().handle_key(&empty_model(), KeyEvent::from(KeyCode::Char('q')));
        assert!(matches!(message, Some(Message::Quit)));
    }

    #[test]
    fn characters_go_to_the_focused_filter() {
        let mut model = empty_model();
        model.update(Message::FocusNextFilter).unwrap();
        let message = controller().handle_key(&model, KeyEvent::from(KeyCode::Char('q')));
        assert!(matches!(message, Some(Message::RawKey(_))));
    }

    #[test]
    fn escape_leaves_a_focused_filter_instead_of_quitting() {
        let mut model = empty_model();
        model.update(Message::FocusNextFilter).unwrap();
        let message = controller().handle_key(&model, KeyEvent::from(KeyCode::Esc));
        assert!(matches!(message, Some(Message::UnfocusFilter)));
    }
}
