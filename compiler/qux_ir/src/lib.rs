//! Qux IR - Intermediate Representation Types
//!
//! This crate contains the core data structures for the Qux compiler:
//! - Positions (line/column/length) for source locations
//! - Dotted unit identifiers and their output paths
//! - The IR node for one compilation unit (`Unit`) and its declarations,
//!   statements and expressions
//! - Semantic types and the descriptors exposed to other units
//!
//! # Mutation Model
//!
//! A `Unit` is owned by exactly one build job. Pipeline stages take it by
//! value and hand back a (possibly rewritten) unit. The unit identifier and
//! the exported declaration set ([`Unit::exports`]) are fixed once parsing
//! completes; stages may rewrite anything else.

pub mod ast;
mod position;
pub mod stack;
mod types;
mod unit_id;

pub use ast::{
    BinaryOp, Block, Callee, ConstDecl, Decl, DeclKind, Export, Expr, ExprKind, FnDecl, Global,
    Import, Literal, Param, Stmt, StmtKind, TypeAnn, TypeDecl, UnaryOp, Unit,
};
pub use position::Position;
pub use types::{Descriptor, Signature, Type, TypeName};
pub use unit_id::UnitId;
