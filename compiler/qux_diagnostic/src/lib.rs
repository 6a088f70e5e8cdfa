//! Error model and diagnostic rendering.
//!
//! Two error families share one shape:
//! - [`CompilerError`]: problems attributable to the user's source (syntax
//!   errors, type errors, undeclared names)
//! - [`BuildError`]: process-level problems (I/O, timeouts, configuration)
//!
//! Each is either a plain message, a message anchored at a [`Location`], or
//! an ordered list of sibling errors of the same family. The closed shape is
//! what lets [`render`] handle every error with one exhaustive match.
//!
//! ```text
//! a.b.Main@3:8-9: undeclared variable `y`
//!     print y
//!           ^
//! ```

mod error;
mod location;
mod render;

pub use error::{BuildError, CompilerError, ErrorFamily, ErrorShape};
pub use location::{Location, PositionError};
pub use render::{render, SourceLines};
