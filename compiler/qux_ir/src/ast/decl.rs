//! Top-level declarations.

use std::fmt;

use super::{Block, Expr};
use crate::{Position, Type};

/// Declaration-kind tag.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DeclKind {
    Const,
    Function,
    Type,
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclKind::Const => f.write_str("constant"),
            DeclKind::Function => f.write_str("function"),
            DeclKind::Type => f.write_str("type"),
        }
    }
}

/// A type as written in source, with where it was written.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct TypeAnn {
    pub ty: Type,
    pub pos: Position,
}

impl TypeAnn {
    pub fn new(ty: Type, pos: Position) -> Self {
        TypeAnn { ty, pos }
    }
}

/// `const NAME: Type = value`
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ConstDecl {
    pub name: String,
    pub pos: Position,
    pub ty: TypeAnn,
    pub value: Expr,
}

/// `type NAME = Type`
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct TypeDecl {
    pub name: String,
    pub pos: Position,
    pub target: TypeAnn,
}

/// A function parameter.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Param {
    pub name: String,
    pub pos: Position,
    pub ty: TypeAnn,
}

/// `fn name(params) -> ret { body }`
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct FnDecl {
    pub name: String,
    pub pos: Position,
    pub params: Vec<Param>,
    pub ret: TypeAnn,
    pub body: Block,
}

/// A top-level declaration.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Decl {
    Const(ConstDecl),
    Function(FnDecl),
    Type(TypeDecl),
}

impl Decl {
    pub fn kind(&self) -> DeclKind {
        match self {
            Decl::Const(_) => DeclKind::Const,
            Decl::Function(_) => DeclKind::Function,
            Decl::Type(_) => DeclKind::Type,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Decl::Const(c) => &c.name,
            Decl::Function(f) => &f.name,
            Decl::Type(t) => &t.name,
        }
    }

    /// Position of the declared name.
    pub fn pos(&self) -> Position {
        match self {
            Decl::Const(c) => c.pos,
            Decl::Function(f) => f.pos,
            Decl::Type(t) => t.pos,
        }
    }
}
