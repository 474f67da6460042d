use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::trace;

/// Single line editor used by the search bar and the command line.
#[derive(Default)]
pub struct Inputter {
    text: Vec<char>,
    cursor: usize,
    finished: bool,
    canceled: bool,
}

#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct InputResult {
    pub input: String,
    pub cursor: usize,
    pub finished: bool,
    pub canceled: bool,
    /// The text differs from before the key was read.
    pub changed: bool,
}

impl Inputter {
    pub fn read(&mut self, key: KeyEvent) -> InputResult {
        let before = self.text.clone();
        match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => self.finished = true,
            (KeyCode::Esc, _) => {
                self.clear();
                self.canceled = true;
                self.finished = true;
            }
            (KeyCode::Backspace, _) => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.text.remove(self.cursor);
                }
            }
            (KeyCode::Delete, _) => {
                if self.cursor < self.text.len() {
                    self.text.remove(self.cursor);
                }
            }
            (KeyCode::Left, _) => self.cursor = self.cursor.saturating_sub(1),
            (KeyCode::Right, _) => self.cursor = std::cmp::min(self.cursor + 1, self.text.len()),
            (KeyCode::Home, _) => self.cursor = 0,
            (KeyCode::End, _) => self.cursor = self.text.len(),
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => {
                self.text.drain(..self.cursor);
                self.cursor = 0;
            }
            (KeyCode::Char(chr), m) if !m.contains(KeyModifiers::CONTROL) => {
                self.text.insert(self.cursor, chr);
                self.cursor += 1;
            }
            (code, _) => trace!("Ignoring input key {code:?}"),
        }
        let mut result = self.get();
        result.changed = before != self.text;
        result
    }

    /// Replaces the text and puts the cursor at its end.
    pub fn set(&mut self, s: &str) {
        self.text = s.chars().collect();
        self.cursor = self.text.len();
        self.finished = false;
        self.canceled = false;
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            input: self.text.iter().collect(),
            cursor: self.cursor,
            finished: self.finished,
            canceled: self.canceled,
            changed: false,
        }
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
        self.finished = false;
        self.canceled = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(input: &mut Inputter, s: &str) -> InputResult {
        let mut last = InputResult::default();
        for c in s.chars() {
            last = input.read(key(KeyCode::Char(c)));
        }
        last
    }

    #[test]
    fn typing_appends_and_reports_change() {
        let mut input = Inputter::default();
        let result = type_str(&mut input, "876");
        assert_eq!(result.input, "876");
        assert_eq!(result.cursor, 3);
        assert!(result.changed);
        assert!(!result.finished);
    }

    #[test]
    fn backspace_removes_before_cursor() {
        let mut input = Inputter::default();
        type_str(&mut input, "abc");
        input.read(key(KeyCode::Left));
        let result = input.read(key(KeyCode::Backspace));
        assert_eq!(result.input, "ac");
        assert_eq!(result.cursor, 1);
    }

    #[test]
    fn insert_in_the_middle_with_multibyte_chars() {
        let mut input = Inputter::default();
        type_str(&mut input, "çé");
        input.read(key(KeyCode::Left));
        let result = input.read(key(KeyCode::Char('x')));
        assert_eq!(result.input, "çxé");
    }

    #[test]
    fn moving_does_not_count_as_change() {
        let mut input = Inputter::default();
        type_str(&mut input, "ab");
        assert!(!input.read(key(KeyCode::Home)).changed);
        assert!(!input.read(key(KeyCode::Backspace)).changed);
        assert!(input.read(key(KeyCode::Delete)).changed);
        assert_eq!(input.get().input, "b");
    }

    #[test]
    fn enter_finishes_and_escape_cancels() {
        let mut input = Inputter::default();
        type_str(&mut input, "hose");
        let done = input.read(key(KeyCode::Enter));
        assert!(done.finished && !done.canceled);
        assert_eq!(done.input, "hose");

        input.set("hose");
        let canceled = input.read(key(KeyCode::Esc));
        assert!(canceled.finished && canceled.canceled);
        assert_eq!(canceled.input, "");
        assert!(canceled.changed);
    }

    #[test]
    fn ctrl_u_clears_to_start() {
        let mut input = Inputter::default();
        input.set("open stock");
        let result = input.read(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert_eq!(result.input, "");
    }
}
