//! Terminal-agnostic keyboard input.

/// Keyboard input abstraction.
///
/// Decouples application logic from terminal libraries (crossterm, termion,
/// etc.) enabling deterministic simulation testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Printable character.
    Char(char),
    /// Enter/Return key.
    Enter,
    /// Backspace key (delete character before cursor).
    Backspace,
    /// Delete key (delete character at cursor).
    Delete,
    /// Tab key (next contact).
    Tab,
    /// Escape key (quit).
    Esc,
    /// Left arrow key.
    Left,
    /// Right arrow key.
    Right,
    /// Up arrow key (previous contact).
    Up,
    /// Down arrow key (next contact).
    Down,
    /// Home key (cursor to start).
    Home,
    /// End key (cursor to end).
    End,
}

/// Single-line compose buffer with a character cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeBuffer {
    text: String,
    /// Cursor position in characters.
    cursor: usize,
}

impl ComposeBuffer {
    /// Current text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Clear text and cursor.
    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// Replace the text, cursor at the end.
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.chars().count();
    }

    /// Apply an editing key. Returns false if the key does not edit.
    pub fn edit(&mut self, key: KeyInput) -> bool {
        let len = self.text.chars().count();
        match key {
            KeyInput::Char(c) => {
                let at = self.byte_offset(self.cursor);
                self.text.insert(at, c);
                self.cursor += 1;
            },
            KeyInput::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_offset(self.cursor);
                    self.text.remove(at);
                }
            },
            KeyInput::Delete => {
                if self.cursor < len {
                    let at = self.byte_offset(self.cursor);
                    self.text.remove(at);
                }
            },
            KeyInput::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyInput::Right => self.cursor = (self.cursor + 1).min(len),
            KeyInput::Home => self.cursor = 0,
            KeyInput::End => self.cursor = len,
            KeyInput::Enter | KeyInput::Tab | KeyInput::Esc | KeyInput::Up | KeyInput::Down => {
                return false;
            },
        }
        true
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.text.char_indices().nth(chars).map_or(self.text.len(), |(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> ComposeBuffer {
        let mut buffer = ComposeBuffer::default();
        for c in text.chars() {
            buffer.edit(KeyInput::Char(c));
        }
        buffer
    }

    #[test]
    fn char_input_adds_to_buffer() {
        let buffer = typed("hi");
        assert_eq!(buffer.text(), "hi");
        assert_eq!(buffer.cursor(), 2);
    }

    #[test]
    fn backspace_removes_char() {
        let mut buffer = typed("ab");
        buffer.edit(KeyInput::Backspace);
        assert_eq!(buffer.text(), "a");
        assert_eq!(buffer.cursor(), 1);
    }

    #[test]
    fn cursor_movement() {
        let mut buffer = typed("abc");

        buffer.edit(KeyInput::Home);
        assert_eq!(buffer.cursor(), 0);
        buffer.edit(KeyInput::End);
        assert_eq!(buffer.cursor(), 3);
        buffer.edit(KeyInput::Left);
        assert_eq!(buffer.cursor(), 2);
        buffer.edit(KeyInput::Right);
        buffer.edit(KeyInput::Right);
        assert_eq!(buffer.cursor(), 3);
    }

    #[test]
    fn editing_is_char_based_for_multibyte_text() {
        let mut buffer = typed("héllo");
        buffer.edit(KeyInput::Home);
        buffer.edit(KeyInput::Right);
        buffer.edit(KeyInput::Delete);
        assert_eq!(buffer.text(), "hllo");

        buffer.edit(KeyInput::Char('ö'));
        assert_eq!(buffer.text(), "höllo");
        assert_eq!(buffer.cursor(), 2);
    }

    #[test]
    fn navigation_keys_do_not_edit() {
        let mut buffer = typed("x");
        assert!(!buffer.edit(KeyInput::Enter));
        assert!(!buffer.edit(KeyInput::Tab));
        assert_eq!(buffer.text(), "x");
    }
}
