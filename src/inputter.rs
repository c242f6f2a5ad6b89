use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

/// Line editor behind the per-column filter boxes. Focus changes and the
/// apply-on-every-keystroke behavior live in the model; this only maintains
/// the text and the cursor.
#[derive(Default)]
pub struct Inputter {
    current_input: String,
    curser_pos: usize,
}

#[derive(Default, Clone, Debug, PartialEq)]
pub struct InputResult {
    pub input: String,
    pub curser_pos: usize,
}

impl Inputter {
    pub fn read(&mut self, key: event::KeyEvent) -> InputResult {
        match (key.code, key.modifiers) {
            (KeyCode::Backspace, KeyModifiers::NONE) => self.backspace(),
            (KeyCode::Left, KeyModifiers::NONE) => self.left(),
            (KeyCode::Right, KeyModifiers::NONE) => self.right(),
            (kc, km) => self.key(kc, km),
        }
    }

    pub fn set(&mut self, s: &str) {
        self.current_input = s.to_string();
        self.curser_pos = s.chars().count();
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            input: self.current_input.clone(),
            curser_pos: self.curser_pos,
        }
    }

    pub fn clear(&mut self) {
        self.current_input.clear();
        self.curser_pos = 0;
    }

    fn backspace(&mut self) -> InputResult {
        if self.curser_pos > 0 {
            self.curser_pos -= 1;
            let byte_idx = self.getbytepos();
            self.current_input.remove(byte_idx);
        }
        self.get()
    }

    fn left(&mut self) -> InputResult {
        self.curser_pos = self.curser_pos.saturating_sub(1);
        self.get()
    }

    fn right(&mut self) -> InputResult {
        if self.curser_pos < self.current_input.chars().count() {
            self.curser_pos += 1;
        }
        self.get()
    }

    fn key(&mut self, code: KeyCode, _modifier: KeyModifiers) -> InputResult {
        if let Some(chr) = code.as_char() {
            self.current_input.insert(self.getbytepos(), chr);
            self.curser_pos += 1;
        }
        self.get()
    }

    fn getbytepos(&self) -> usize {
        self.current_input
            .char_indices()
            .nth(self.curser_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.current_input.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyEvent;

    fn press(inputter: &mut Inputter, code: KeyCode) -> InputResult {
        inputter.read(KeyEvent::from(code))
    }

    #[test]
    fn typing_appends_at_the_cursor() {
        let mut inputter = Inputter::default();
        press(&mut inputter, KeyCode::Char('a'));
        press(&mut inputter, KeyCode::Char('b'));
        press(&mut inputter, KeyCode::Left);
        let result = press(&mut inputter, KeyCode::Char('x'));
        assert_eq!(result.input, "axb");
        assert_eq!(result.curser_pos, 2);
    }

    #[test]
    fn backspace_removes_before_the_cursor() {
        let mut inputter = Inputter::default();
        inputter.set("abc");
        press(&mut inputter, KeyCode::Left);
        let result = press(&mut inputter, KeyCode::Backspace);
        assert_eq!(result.input, "ac");
        assert_eq!(result.curser_pos, 1);
    }

    #[test]
    fn set_positions_the_cursor_at_the_end() {
        let mut inputter = Inputter::default();
        inputter.set("load");
        assert_eq!(inputter.get().curser_pos, 4);
    }
}
