//! Source positions.
//!
//! Qux diagnostics are anchored by line and column rather than by byte
//! offset: the renderer needs the line to print the source snippet and the
//! column to place the caret run, and neither needs the full text to be
//! available when the position is recorded.

use std::fmt;

/// A token-sized region of one source line.
///
/// - `line`: 1-based line number
/// - `col`: 0-based column, counted in characters
/// - `len`: length of the region in characters
///
/// Positions are produced by the lexer and copied onto every IR node. They
/// are not validated here; `qux_diagnostic::Location` checks the arithmetic
/// when a position is turned into a diagnostic.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Position {
    pub line: u32,
    pub col: u32,
    pub len: u32,
}

impl Position {
    /// Create a new position.
    #[inline]
    pub const fn new(line: u32, col: u32, len: u32) -> Self {
        Position { line, col, len }
    }

    /// Column one past the end of the region.
    #[inline]
    pub const fn end_col(&self) -> u32 {
        self.col + self.len
    }

    /// Extend this position to cover `other` when both sit on the same line.
    ///
    /// Positions on different lines are left unchanged: a located error
    /// only ever points into a single line.
    #[inline]
    #[must_use]
    pub fn to(self, other: Position) -> Position {
        if self.line != other.line || other.end_col() < self.col {
            return self;
        }
        Position {
            line: self.line,
            col: self.col,
            len: other.end_col().max(self.end_col()) - self.col,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.line, self.col, self.end_col())
    }
}
