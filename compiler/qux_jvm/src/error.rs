//! Translator errors.
//!
//! Every variant means an earlier stage let something through that it
//! should have rejected or rewritten. The build job reports these as
//! internal errors, never as problems in user source.

use qux_ir::{Position, Type};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TranslateError {
    #[error("expression at {0} has no type")]
    Untyped(Position),
    #[error("name `{name}` at {pos} was never resolved")]
    Unresolved { name: String, pos: Position },
    #[error("call at {0} has no signature")]
    MissingSignature(Position),
    #[error("constant `{0}` is not a single literal")]
    NonLiteralConstant(String),
    #[error("type `{0}` reached the translator without being lowered")]
    UnloweredType(Type),
    #[error("operator `{op}` has no translation for {ty}")]
    Operator { op: &'static str, ty: Type },
    #[error("local `{0}` has no slot")]
    UnknownLocal(String),
    #[error("constant pool overflow")]
    PoolOverflow,
    #[error("method `{0}` is too large")]
    CodeTooLarge(String),
    #[error("branch offset out of range in method `{0}`")]
    BranchOverflow(String),
    #[error("method `{0}` can run off the end of its code")]
    FallsOffEnd(String),
}
