//! Plain-text diagnostic rendering.
//!
//! A located error with its source available renders as three lines:
//!
//! ```text
//! a.b.Main@3:10-13: undeclared variable `foo`
//!     print foo
//!           ^^^
//! ```
//!
//! Without source text, or when the location does not fit the source, only
//! the header line is produced. Rendering never fails: bad data shortens the
//! output instead.

use std::fmt::Write;

use crate::{ErrorFamily, ErrorShape, Location};

/// The lines of one source file, as the renderer needs them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceLines {
    /// Unit the lines belong to; `None` matches any unit.
    unit: Option<String>,
    lines: Vec<String>,
}

impl SourceLines {
    /// Split `text` into lines, usable for errors in any unit.
    pub fn new(text: &str) -> Self {
        SourceLines {
            unit: None,
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    /// Split `text` into lines belonging to `unit`.
    ///
    /// Located errors in other units render without a snippet.
    pub fn for_unit(unit: impl Into<String>, text: &str) -> Self {
        SourceLines {
            unit: Some(unit.into()),
            ..SourceLines::new(text)
        }
    }

    /// Get a 1-based line.
    pub fn line(&self, line: u32) -> Option<&str> {
        let idx = usize::try_from(line).ok()?.checked_sub(1)?;
        self.lines.get(idx).map(String::as_str)
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn covers(&self, unit: &str) -> bool {
        self.unit.as_deref().map_or(true, |own| own == unit)
    }
}

/// Render any error of either family to diagnostic text.
///
/// List members are rendered in order, separated by newlines.
pub fn render<E: ErrorFamily>(error: &E, source: Option<&SourceLines>) -> String {
    let mut out = String::new();
    render_into(error, source, &mut out);
    out
}

fn render_into<E: ErrorFamily>(error: &E, source: Option<&SourceLines>, out: &mut String) {
    match error.shape() {
        ErrorShape::Message(message) => out.push_str(message),
        ErrorShape::Located { message, location } => {
            let _ = write!(out, "{location}: {message}");
            if let Some(line) = source.and_then(|source| snippet(source, location)) {
                let caret_count = location.len().max(1) as usize;
                let _ = write!(
                    out,
                    "\n{line}\n{}{}",
                    caret_indent(line, location.col() as usize),
                    "^".repeat(caret_count)
                );
            }
        }
        ErrorShape::List(errors) => {
            for (i, error) in errors.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                render_into(error, source, out);
            }
        }
    }
}

/// Whitespace reaching column `col` of `line`. Tabs stay tabs so the carets
/// line up however the terminal expands them.
fn caret_indent(line: &str, col: usize) -> String {
    line.chars()
        .take(col)
        .map(|c| if c == '\t' { '\t' } else { ' ' })
        .collect()
}

/// The source line a location points into, if the location fits it.
fn snippet<'a>(source: &'a SourceLines, location: &Location) -> Option<&'a str> {
    if !source.covers(location.unit()) {
        tracing::debug!(
            unit = location.unit(),
            "source lines belong to another unit, rendering without snippet"
        );
        return None;
    }
    let Some(line) = source.line(location.line()) else {
        tracing::warn!(
            %location,
            line_count = source.len(),
            "error line is outside the source, rendering without snippet"
        );
        return None;
    };
    let line_len = line.chars().count();
    let end = location.end_col() as usize;
    if location.col() as usize >= line_len || end > line_len {
        tracing::warn!(
            %location,
            line_len,
            "error columns are outside the source line, rendering without snippet"
        );
        return None;
    }
    Some(line)
}

#[cfg(test)]
mod tests;
