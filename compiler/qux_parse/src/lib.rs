//! Qux front end: lexer and recursive-descent parser.
//!
//! [`parse`] turns the text of one source file into an unresolved
//! [`qux_ir::Unit`]. Names are left as parsed (`Ident`, `Path`,
//! `Callee::Unresolved`); the resolver stage rewrites them later.
//!
//! Lexing and parsing stop at the first problem: a syntax error is reported
//! as a single located [`qux_diagnostic::CompilerError`].

mod lexer;
mod parser;

pub use lexer::{lex, LexError, Lexeme, Token};
pub use parser::parse;

/// File extension of Qux sources.
pub const SOURCE_EXTENSION: &str = "qux";
