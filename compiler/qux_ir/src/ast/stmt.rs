//! Statements and blocks.

use super::{Expr, TypeAnn};
use crate::Position;

/// A brace-delimited statement list. Every block opens a new scope.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Block { stmts }
    }

    /// Whether every path through this block ends in a `return`.
    ///
    /// Conservative: loops never count, since their condition is not
    /// evaluated here.
    pub fn always_returns(&self) -> bool {
        self.stmts.iter().any(Stmt::always_returns)
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub pos: Position,
}

impl Stmt {
    pub fn new(kind: StmtKind, pos: Position) -> Self {
        Stmt { kind, pos }
    }

    /// Whether executing this statement always ends in a `return`.
    pub fn always_returns(&self) -> bool {
        match &self.kind {
            StmtKind::Return(_) => true,
            StmtKind::If {
                then,
                otherwise: Some(otherwise),
                ..
            } => then.always_returns() && otherwise.always_returns(),
            _ => false,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum StmtKind {
    /// `var name (: Type)? = value`
    Var {
        name: String,
        ty: Option<TypeAnn>,
        value: Expr,
    },
    /// `name = value`; the statement position is the target's position.
    Assign { target: String, value: Expr },
    /// `if cond { .. } else { .. }`; `else if` nests an `If` in `otherwise`.
    If {
        cond: Expr,
        then: Block,
        otherwise: Option<Block>,
    },
    /// `while cond { .. }`
    While { cond: Expr, body: Block },
    /// `return value?`
    Return(Option<Expr>),
    /// `print value`
    Print(Expr),
    /// A call evaluated for its effect.
    Expr(Expr),
}
