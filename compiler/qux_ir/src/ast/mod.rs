//! The IR node for one compilation unit.
//!
//! The parser produces a `Unit` with unresolved names (`Ident`, `Path`,
//! `Callee::Unresolved`). The resolver stage rewrites them into `Local` and
//! `Global` references; the type checker fills in expression types and call
//! signatures. The translator expects the fully rewritten form.

mod decl;
mod expr;
mod stmt;

pub use decl::{ConstDecl, Decl, DeclKind, FnDecl, Param, TypeAnn, TypeDecl};
pub use expr::{BinaryOp, Callee, Expr, ExprKind, Global, Literal, UnaryOp};
pub use stmt::{Block, Stmt, StmtKind};

use rustc_hash::FxHashSet;

use crate::{Position, UnitId};

/// An `import a.b.C` line. Binds the simple name `C` within the unit.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Import {
    pub id: UnitId,
    pub pos: Position,
}

impl Import {
    /// The name the import binds.
    pub fn alias(&self) -> &str {
        self.id.simple_name()
    }
}

/// One exported declaration: its kind and name.
///
/// The set of exports is what other units can see through the resource
/// registry, so it must not change after the unit is registered.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Export {
    pub kind: DeclKind,
    pub name: String,
}

/// One parsed source file.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Unit {
    pub id: UnitId,
    pub imports: Vec<Import>,
    pub decls: Vec<Decl>,
}

impl Unit {
    /// Create an empty unit.
    pub fn new(id: UnitId) -> Self {
        Unit {
            id,
            imports: Vec::new(),
            decls: Vec::new(),
        }
    }

    /// The exported declaration set.
    pub fn exports(&self) -> FxHashSet<Export> {
        self.decls
            .iter()
            .map(|decl| Export {
                kind: decl.kind(),
                name: decl.name().to_string(),
            })
            .collect()
    }

    /// Find the import bound to `alias`.
    pub fn import(&self, alias: &str) -> Option<&Import> {
        self.imports.iter().find(|import| import.alias() == alias)
    }

    /// Iterate over constant declarations.
    pub fn consts(&self) -> impl Iterator<Item = &ConstDecl> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Const(c) => Some(c),
            _ => None,
        })
    }

    /// Iterate over function declarations.
    pub fn functions(&self) -> impl Iterator<Item = &FnDecl> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Function(f) => Some(f),
            _ => None,
        })
    }

    /// Iterate over type alias declarations.
    pub fn types(&self) -> impl Iterator<Item = &TypeDecl> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Type(t) => Some(t),
            _ => None,
        })
    }

    /// Find a declaration by kind and name.
    pub fn find(&self, kind: DeclKind, name: &str) -> Option<&Decl> {
        self.decls
            .iter()
            .find(|decl| decl.kind() == kind && decl.name() == name)
    }
}

#[cfg(test)]
mod tests;
