//! Source locations attached to errors.

use std::fmt;

use qux_ir::Position;

/// Error returned when a location's position arithmetic is invalid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    /// Lines are 1-based.
    #[error("line must be at least 1, got {0}")]
    LineZero(u32),
    /// A location always covers at least one character.
    #[error("length must be at least 1, got {0}")]
    EmptyLength(u32),
    /// `col + len` does not fit in a column number.
    #[error("column {col} with length {len} overflows")]
    Overflow { col: u32, len: u32 },
}

/// Where a located error points: unit id, 1-based line, 0-based column and
/// token length.
///
/// Only the arithmetic is checked on construction. Whether the line exists
/// in the source is checked when rendering, because the source text may not
/// be at hand when the error is created.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    unit: String,
    line: u32,
    col: u32,
    len: u32,
}

impl Location {
    /// Create a location, validating `line >= 1` and `len >= 1`.
    pub fn new(unit: impl Into<String>, line: u32, col: u32, len: u32) -> Result<Self, PositionError> {
        if line == 0 {
            return Err(PositionError::LineZero(line));
        }
        if len == 0 {
            return Err(PositionError::EmptyLength(len));
        }
        if col.checked_add(len).is_none() {
            return Err(PositionError::Overflow { col, len });
        }
        Ok(Location {
            unit: unit.into(),
            line,
            col,
            len,
        })
    }

    /// Create a location from an IR position.
    pub fn at(unit: impl Into<String>, pos: Position) -> Result<Self, PositionError> {
        Location::new(unit, pos.line, pos.col, pos.len)
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn col(&self) -> u32 {
        self.col
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    /// Column one past the end of the located token.
    pub fn end_col(&self) -> u32 {
        self.col + self.len
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}-{}", self.unit, self.line, self.col, self.end_col())
    }
}
