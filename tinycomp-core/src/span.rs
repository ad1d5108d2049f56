//! Source positions attached to tokens, AST nodes and diagnostics.

use std::fmt;

/// A 1-based (line, column) position in the source text.
///
/// `Position::default()` is `(0, 0)` and marks "no position".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Position {
    pub line: u32,
    pub col: u32,
}

impl Position {
    pub const START: Position = Position { line: 1, col: 1 };

    pub fn new(line: u32, col: u32) -> Self {
        Position { line, col }
    }

    /// Advance past `ch`. A newline moves to the next line and resets the
    /// column to 0 before the regular per-character increment.
    pub fn advance(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.col = 0;
        }
        self.col += 1;
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}
