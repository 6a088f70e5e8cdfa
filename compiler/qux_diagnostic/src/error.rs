//! The two error families.
//!
//! `CompilerError` and `BuildError` have identical shapes, generated by
//! `error_family!`. They stay distinct types so a job's result always says
//! which side of the user/environment boundary a failure came from.

use std::fmt;
use std::time::Duration;

use qux_ir::Position;

use crate::Location;

/// Borrowed view of one error, used by the renderer.
#[derive(Debug)]
pub enum ErrorShape<'a, E> {
    Message(&'a str),
    Located {
        message: &'a str,
        location: &'a Location,
    },
    List(&'a [E]),
}

/// Implemented by both error families so [`crate::render`] can walk either.
pub trait ErrorFamily: Sized {
    fn shape(&self) -> ErrorShape<'_, Self>;
}

/// Join list members with newlines for `Display`.
fn display_list<E: fmt::Display>(errors: &[E]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Generate an error family: the enum, its constructors and accessors.
macro_rules! error_family {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            /// A message with no location.
            #[error("{0}")]
            Message(String),
            /// A message anchored in a source unit.
            #[error("{location}: {message}")]
            Located { message: String, location: Location },
            /// Independent sibling errors, in the order they were found.
            #[error("{}", display_list(.0))]
            List(Vec<$name>),
        }

        impl $name {
            /// Create a plain error.
            pub fn new(message: impl Into<String>) -> Self {
                $name::Message(message.into())
            }

            /// Create a located error.
            pub fn located(message: impl Into<String>, location: Location) -> Self {
                $name::Located {
                    message: message.into(),
                    location,
                }
            }

            /// Create a located error from an IR position.
            ///
            /// IR positions come from the lexer and are valid by
            /// construction. If one is not, the error degrades to a plain
            /// message carrying the raw position rather than failing.
            pub fn at(message: impl Into<String>, unit: &str, pos: Position) -> Self {
                let message = message.into();
                match Location::at(unit, pos) {
                    Ok(location) => $name::Located { message, location },
                    Err(e) => {
                        tracing::warn!(unit, %pos, "invalid position on error: {e}");
                        $name::Message(format!("{unit}@{pos}: {message}"))
                    }
                }
            }

            /// Combine errors into one.
            ///
            /// A single error is returned as-is rather than wrapped in a
            /// one-element list.
            pub fn list(mut errors: Vec<$name>) -> Self {
                if errors.len() == 1 {
                    if let Some(only) = errors.pop() {
                        return only;
                    }
                }
                $name::List(errors)
            }

            /// The message, for plain and located errors.
            pub fn message(&self) -> Option<&str> {
                match self {
                    $name::Message(message) | $name::Located { message, .. } => Some(message),
                    $name::List(_) => None,
                }
            }

            /// The location, for located errors.
            pub fn location(&self) -> Option<&Location> {
                match self {
                    $name::Located { location, .. } => Some(location),
                    _ => None,
                }
            }

            pub fn is_list(&self) -> bool {
                matches!(self, $name::List(_))
            }

            /// Number of leaf (non-list) errors.
            pub fn len(&self) -> usize {
                match self {
                    $name::List(errors) => errors.iter().map($name::len).sum(),
                    _ => 1,
                }
            }

            /// Whether this is a list with no leaf errors.
            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            /// Leaf errors in order, with nested lists expanded.
            pub fn flatten(&self) -> Vec<&$name> {
                fn collect<'a>(error: &'a $name, out: &mut Vec<&'a $name>) {
                    match error {
                        $name::List(errors) => {
                            for error in errors {
                                collect(error, out);
                            }
                        }
                        leaf => out.push(leaf),
                    }
                }
                let mut out = Vec::new();
                collect(self, &mut out);
                out
            }
        }

        impl From<Vec<$name>> for $name {
            fn from(errors: Vec<$name>) -> Self {
                $name::list(errors)
            }
        }

        impl ErrorFamily for $name {
            fn shape(&self) -> ErrorShape<'_, Self> {
                match self {
                    $name::Message(message) => ErrorShape::Message(message),
                    $name::Located { message, location } => ErrorShape::Located { message, location },
                    $name::List(errors) => ErrorShape::List(errors),
                }
            }
        }
    };
}

error_family! {
    /// An error attributable to the user's source.
    CompilerError
}

error_family! {
    /// An environment or process-level error: I/O, timeouts, configuration.
    BuildError
}

/// Prefix of the message carried by a timed-out build.
const TIMED_OUT: &str = "build timed out";

impl BuildError {
    /// The failure recorded for a job that exceeded its timeout.
    pub fn timed_out(after: Duration) -> Self {
        BuildError::Message(format!("{TIMED_OUT} after {}ms", after.as_millis()))
    }

    /// Whether this is the timeout failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, BuildError::Message(message) if message.starts_with(TIMED_OUT))
    }

    /// Wrap an I/O failure with what was being done.
    pub fn io(action: &str, path: &std::path::Path, error: &std::io::Error) -> Self {
        BuildError::Message(format!("failed to {action} '{}': {error}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn located(message: &str, line: u32) -> CompilerError {
        CompilerError::located(message, Location::new("a.Main", line, 0, 1).unwrap())
    }

    #[test]
    fn test_list_of_one_collapses() {
        let err = CompilerError::list(vec![CompilerError::new("only")]);
        assert_eq!(err, CompilerError::new("only"));
    }

    #[test]
    fn test_list_preserves_order() {
        let err = CompilerError::list(vec![located("first", 2), located("second", 1)]);
        let messages: Vec<_> = err.flatten().iter().filter_map(|e| e.message()).collect();
        assert_eq!(messages, vec!["first", "second"]);
    }

    #[test]
    fn test_len_counts_leaves() {
        let nested = CompilerError::List(vec![
            located("a", 1),
            CompilerError::List(vec![located("b", 2), located("c", 3)]),
        ]);
        assert_eq!(nested.len(), 3);
        assert!(CompilerError::List(Vec::new()).is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(located("bad", 2).to_string(), "a.Main@2:0-1: bad");
        let list = CompilerError::List(vec![located("x", 1), CompilerError::new("y")]);
        assert_eq!(list.to_string(), "a.Main@1:0-1: x\ny");
    }

    #[test]
    fn test_at_with_valid_position() {
        let err = CompilerError::at("oops", "a.Main", Position::new(4, 2, 3));
        assert_eq!(err.location().map(Location::line), Some(4));
    }

    #[test]
    fn test_at_with_invalid_position_degrades() {
        let err = BuildError::at("oops", "a.Main", Position::new(0, 2, 3));
        assert!(err.location().is_none());
        assert_eq!(err.message(), Some("a.Main@0:2-5: oops"));
    }

    #[test]
    fn test_timeout() {
        let err = BuildError::timed_out(Duration::from_millis(250));
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "build timed out after 250ms");
        assert!(!BuildError::new("disk full").is_timeout());
    }
}
