//! # Logical Keys
//!
//! A `KeyEvent` is what every input path produces: the chatpad listener,
//! and the TUI's own keyboard layer. The shell write path consumes them
//! uniformly, so neither side needs to know where a key came from.
//!
//! Logical names follow the usual terminal-toolkit spelling: `"enter"`,
//! `"tab"`, `"backspace"`, `"escape"`, `"space"`, `"up"`, and chords such as
//! `"ctrl+c"`. Printable keys are their own single-character name.

use std::fmt;

/// The interrupt chord. Encoded as ETX when written to a shell.
pub const INTERRUPT: &str = "ctrl+c";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// Logical key identifier (e.g. `"enter"`, `"a"`, `"ctrl+c"`).
    pub key: String,
    /// Literal character, if the key produces one.
    pub character: Option<char>,
}

impl KeyEvent {
    /// Builds a key event, deriving the literal from the name.
    ///
    /// A one-character name is its own literal; anything longer carries none.
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        let character = single_char(&key);
        Self { key, character }
    }

    /// Builds a named key that still carries a literal (e.g. `"space"` / `' '`).
    pub fn with_character(key: impl Into<String>, character: char) -> Self {
        Self {
            key: key.into(),
            character: Some(character),
        }
    }

    pub fn is_interrupt(&self) -> bool {
        self.key == INTERRUPT
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.character {
            Some(c) if self.key.chars().count() != 1 => write!(f, "{} ({:?})", self.key, c),
            _ => write!(f, "{}", self.key),
        }
    }
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
