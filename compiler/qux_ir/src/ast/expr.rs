//! Expressions.

use std::fmt;

use crate::{Position, Signature, Type, UnitId};

/// A literal value.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Literal {
    Int(i64),
    Bool(bool),
    Str(String),
}

impl Literal {
    /// The type of this literal.
    pub fn ty(&self) -> Type {
        match self {
            Literal::Int(_) => Type::Int,
            Literal::Bool(_) => Type::Bool,
            Literal::Str(_) => Type::Str,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{v}"),
            Literal::Bool(v) => write!(f, "{v}"),
            Literal::Str(v) => write!(f, "{v:?}"),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

impl BinaryOp {
    /// Source spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq
        )
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::NotEq)
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

/// A resolved reference to a constant or function of some unit.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Global {
    pub owner: UnitId,
    pub name: String,
}

impl Global {
    pub fn new(owner: UnitId, name: impl Into<String>) -> Self {
        Global {
            owner,
            name: name.into(),
        }
    }
}

impl fmt::Display for Global {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.name)
    }
}

/// The function a call invokes.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Callee {
    /// `name(..)` or `Import.name(..)` as parsed.
    Unresolved {
        qualifier: Option<String>,
        name: String,
    },
    /// Rewritten by the resolver.
    Resolved(Global),
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ExprKind {
    Literal(Literal),
    /// A bare identifier as parsed.
    Ident(String),
    /// `Import.name` as parsed.
    Path { qualifier: String, name: String },
    /// A parameter or `var`, after resolution.
    Local(String),
    /// A constant, after resolution.
    Global(Global),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// A static call. `signature` is filled in by the type checker.
    Call {
        callee: Callee,
        args: Vec<Expr>,
        signature: Option<Signature>,
    },
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub pos: Position,
    /// Filled in by the type checker.
    pub ty: Option<Type>,
}

impl Expr {
    pub fn new(kind: ExprKind, pos: Position) -> Self {
        Expr { kind, pos, ty: None }
    }

    pub fn literal(literal: Literal, pos: Position) -> Self {
        Expr::new(ExprKind::Literal(literal), pos)
    }

    /// The literal value, if this expression is one.
    pub fn as_literal(&self) -> Option<&Literal> {
        match &self.kind {
            ExprKind::Literal(literal) => Some(literal),
            _ => None,
        }
    }
}
