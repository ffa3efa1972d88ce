use std::path::PathBuf;

use crate::fs::entry::DirectoryEntry;

/// The entry a pending operation applies to, captured by identity when the mode is entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub path: PathBuf,
}

impl Target {
    pub fn of(entry: &DirectoryEntry) -> Self {
        Self {
            name: entry
                .path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| entry.name.clone()),
            path: entry.path.clone(),
        }
    }
}

/// Which input is currently armed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Idle,
    Renaming {
        target: Target,
    },
    /// Navigation stays live so the user can walk to the destination.
    Moving {
        target: Target,
        origin: PathBuf,
    },
    DeleteConfirm {
        target: Target,
    },
    CreatingFile,
    CreatingDirectory,
    Finding,
    CommandBar,
}

impl Mode {
    /// Modes that route typed characters into the pending text.
    pub fn captures_text(&self) -> bool {
        !matches!(self, Mode::Idle | Mode::Moving { .. })
    }

    /// Navigation keys are honored only when no text is being typed.
    pub fn allows_navigation(&self) -> bool {
        !self.captures_text()
    }

    pub fn target(&self) -> Option<&Target> {
        match self {
            Mode::Renaming { target }
            | Mode::Moving { target, .. }
            | Mode::DeleteConfirm { target } => Some(target),
            _ => None,
        }
    }
}

/// Text being typed for the active mode, with a byte-offset insertion cursor.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PendingText {
    pub text: String,
    pub cursor_position: usize,
}

impl PendingText {
    /// Prefilled buffer with the cursor at the end.
    pub fn with_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            cursor_position: text.len(),
        }
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor_position = 0;
    }

    /// Insert a character at the cursor.
    pub fn insert(&mut self, c: char) {
        self.text.insert(self.cursor_position, c);
        self.cursor_position += c.len_utf8();
    }

    /// Delete the character before the cursor.
    pub fn backspace(&mut self) {
        if let Some(prev) = self.text[..self.cursor_position].chars().next_back() {
            self.cursor_position -= prev.len_utf8();
            self.text.remove(self.cursor_position);
        }
    }

    pub fn move_left(&mut self) {
        if let Some(prev) = self.text[..self.cursor_position].chars().next_back() {
            self.cursor_position -= prev.len_utf8();
        }
    }

    pub fn move_right(&mut self) {
        if let Some(next) = self.text[self.cursor_position..].chars().next() {
            self.cursor_position += next.len_utf8();
        }
    }

    pub fn home(&mut self) {
        self.cursor_position = 0;
    }

    pub fn end(&mut self) {
        self.cursor_position = self.text.len();
    }
}

/// Affirmative answer to a delete confirmation.
pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}
