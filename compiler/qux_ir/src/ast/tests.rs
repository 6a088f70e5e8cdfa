use super::*;
use crate::{Position, Type};
use pretty_assertions::assert_eq;

fn pos() -> Position {
    Position::new(1, 0, 1)
}

fn sample_unit() -> Unit {
    let mut unit = Unit::new(UnitId::new("a.Main"));
    unit.imports.push(Import {
        id: UnitId::new("a.util.Math"),
        pos: pos(),
    });
    unit.decls.push(Decl::Const(ConstDecl {
        name: "MAX".into(),
        pos: pos(),
        ty: TypeAnn::new(Type::Int, pos()),
        value: Expr::literal(Literal::Int(10), pos()),
    }));
    unit.decls.push(Decl::Function(FnDecl {
        name: "main".into(),
        pos: pos(),
        params: Vec::new(),
        ret: TypeAnn::new(Type::Void, pos()),
        body: Block::default(),
    }));
    unit
}

#[test]
fn test_exports() {
    let exports = sample_unit().exports();
    assert_eq!(exports.len(), 2);
    assert!(exports.contains(&Export {
        kind: DeclKind::Const,
        name: "MAX".into()
    }));
    assert!(exports.contains(&Export {
        kind: DeclKind::Function,
        name: "main".into()
    }));
}

#[test]
fn test_import_alias() {
    let unit = sample_unit();
    assert_eq!(unit.import("Math").map(|i| i.id.as_str()), Some("a.util.Math"));
    assert!(unit.import("Other").is_none());
}

#[test]
fn test_find_by_kind() {
    let unit = sample_unit();
    assert!(unit.find(DeclKind::Const, "MAX").is_some());
    assert!(unit.find(DeclKind::Function, "MAX").is_none());
    assert_eq!(unit.functions().count(), 1);
    assert_eq!(unit.consts().count(), 1);
    assert_eq!(unit.types().count(), 0);
}

#[test]
fn test_always_returns() {
    let ret = Stmt::new(StmtKind::Return(None), pos());
    let print = Stmt::new(
        StmtKind::Print(Expr::literal(Literal::Int(1), pos())),
        pos(),
    );
    let cond = Expr::literal(Literal::Bool(true), pos());

    let if_both = Stmt::new(
        StmtKind::If {
            cond: cond.clone(),
            then: Block::new(vec![ret.clone()]),
            otherwise: Some(Block::new(vec![ret.clone()])),
        },
        pos(),
    );
    let if_one = Stmt::new(
        StmtKind::If {
            cond: cond.clone(),
            then: Block::new(vec![ret.clone()]),
            otherwise: None,
        },
        pos(),
    );
    let loop_ = Stmt::new(
        StmtKind::While {
            cond,
            body: Block::new(vec![ret]),
        },
        pos(),
    );

    assert!(if_both.always_returns());
    assert!(!if_one.always_returns());
    assert!(!loop_.always_returns());
    assert!(!Block::new(vec![print.clone()]).always_returns());
    assert!(Block::new(vec![print, if_both]).always_returns());
}
