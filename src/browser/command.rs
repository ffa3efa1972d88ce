//! Command-bar mini-language: `verb [argument]`.
//!
//! Only the first two whitespace-separated tokens matter. There is no quoting
//! or escaping, so names containing spaces can't be expressed here.

/// A tokenized command-bar line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandLine<'a> {
    pub verb: &'a str,
    pub arg: &'a str,
}

/// Split a line into a verb and at most one argument.
pub fn tokenize(line: &str) -> CommandLine<'_> {
    let mut tokens = line.split_whitespace();
    CommandLine {
        verb: tokens.next().unwrap_or(""),
        arg: tokens.next().unwrap_or(""),
    }
}

/// A recognized command-bar command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `mkdir <name>`
    MakeDir(String),
    /// `touch <name>`
    Touch(String),
    /// `mv <new name>` renames the selected entry.
    Rename(String),
    /// `rm` deletes the selected entry.
    Remove,
    /// `cp [dest]` copies the selected entry into `dest` (or the current directory).
    Copy(Option<String>),
    Zip,
    Unzip,
    /// `cd <path>`
    ChangeDir(String),
    /// `find <query>`
    Find(String),
    /// `hidden`
    ToggleHidden,
}

impl Command {
    /// Whether the command acts on the selected entry.
    pub fn needs_selection(&self) -> bool {
        matches!(
            self,
            Command::Rename(_) | Command::Remove | Command::Copy(_) | Command::Zip | Command::Unzip
        )
    }
}

/// Parse a command-bar line. Unknown verbs and missing required arguments yield `None`.
pub fn parse(line: &str) -> Option<Command> {
    let CommandLine { verb, arg } = tokenize(line);
    let required = |build: fn(String) -> Command| {
        if arg.is_empty() {
            None
        } else {
            Some(build(arg.to_string()))
        }
    };

    match verb {
        "mkdir" => required(Command::MakeDir),
        "touch" => required(Command::Touch),
        "mv" => required(Command::Rename),
        "rm" => Some(Command::Remove),
        "cp" => Some(Command::Copy((!arg.is_empty()).then(|| arg.to_string()))),
        "zip" => Some(Command::Zip),
        "unzip" => Some(Command::Unzip),
        "cd" => required(Command::ChangeDir),
        "find" => required(Command::Find),
        "hidden" => Some(Command::ToggleHidden),
        _ => None,
    }
}
