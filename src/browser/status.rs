use crate::browser::mode::{Mode, PendingText};
use crate::fs::entry::DirectoryEntry;

/// Severity of a transient status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Error,
}

/// A one-line message reported back to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: MessageKind,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: single_line(text.into()),
            kind: MessageKind::Info,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: single_line(text.into()),
            kind: MessageKind::Error,
        }
    }
}

fn single_line(text: String) -> String {
    match text.lines().next() {
        Some(first) if first.len() != text.len() => first.to_string(),
        _ => text,
    }
}

/// How the status line should be styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    /// Details of the selected entry.
    Normal,
    /// A text prompt is active.
    Prompt,
    Info,
    Error,
}

/// Derived status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub left: String,
    pub right: String,
    pub kind: StatusKind,
    /// Column (in chars) of the text cursor within `left`, when a prompt is active.
    pub caret: Option<usize>,
}

/// Everything the status line depends on.
pub struct StatusInput<'a> {
    pub mode: &'a Mode,
    pub pending: &'a PendingText,
    pub selected: Option<&'a DirectoryEntry>,
    pub cursor: usize,
    pub len: usize,
    pub message: Option<&'a StatusMessage>,
}

fn prompt_prefix(mode: &Mode) -> Option<String> {
    match mode {
        Mode::Renaming { target } => Some(format!("Rename {} to: ", target.name)),
        Mode::DeleteConfirm { target } => Some(format!("Delete {}? [y/N]: ", target.name)),
        Mode::CreatingFile => Some("New file: ".to_string()),
        Mode::CreatingDirectory => Some("New directory: ".to_string()),
        Mode::Finding => Some("Find: ".to_string()),
        Mode::CommandBar => Some(":".to_string()),
        Mode::Idle | Mode::Moving { .. } => None,
    }
}

/// Compute the status line from the current state.
pub fn derive(input: &StatusInput<'_>) -> StatusLine {
    let position = if input.len == 0 {
        "0/0".to_string()
    } else {
        format!("{}/{}", input.cursor + 1, input.len)
    };

    if let Some(prefix) = prompt_prefix(input.mode) {
        let pending = input.pending;
        let caret = prefix.chars().count() + pending.text[..pending.cursor_position].chars().count();
        return StatusLine {
            left: format!("{}{}", prefix, pending.text),
            right: String::new(),
            kind: StatusKind::Prompt,
            caret: Some(caret),
        };
    }

    if let Mode::Moving { target, .. } = input.mode {
        return StatusLine {
            left: format!(
                "Moving {}: go to the destination, Enter to drop here, Esc to cancel",
                target.name
            ),
            right: position,
            kind: StatusKind::Prompt,
            caret: None,
        };
    }

    if let Some(message) = input.message {
        return StatusLine {
            left: message.text.clone(),
            right: position,
            kind: match message.kind {
                MessageKind::Info => StatusKind::Info,
                MessageKind::Error => StatusKind::Error,
            },
            caret: None,
        };
    }

    let left = match input.selected {
        Some(entry) => format!(
            "{}  {}  {}  {}",
            entry.name,
            entry.size_label(),
            entry.mode_label(),
            entry.modified_label()
        ),
        None => "(empty)".to_string(),
    };
    StatusLine {
        left,
        right: position,
        kind: StatusKind::Normal,
        caret: None,
    }
}
