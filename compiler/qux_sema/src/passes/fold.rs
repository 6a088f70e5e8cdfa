//! Constant folding.
//!
//! Integer arithmetic wraps, matching the target's 64-bit semantics.
//! Division by zero is never folded, so the failure stays where the
//! program would hit it at run time.

use qux_diagnostic::CompilerError;
use qux_ir::stack::with_stack;
use qux_ir::{BinaryOp, Block, Decl, Expr, ExprKind, Literal, StmtKind, UnaryOp, Unit};

use crate::stage::Stage;

/// Replaces operations on literals with their result.
#[derive(Debug, Default)]
pub struct Folder;

impl Stage for Folder {
    fn name(&self) -> &'static str {
        "fold"
    }

    fn apply(&mut self, mut unit: Unit) -> Result<Unit, CompilerError> {
        let mut folded = 0usize;
        for decl in &mut unit.decls {
            match decl {
                Decl::Const(c) => fold_expr(&mut c.value, &mut folded),
                Decl::Function(f) => fold_block(&mut f.body, &mut folded),
                Decl::Type(_) => {}
            }
        }
        tracing::debug!(folded, "folded constant expressions");
        Ok(unit)
    }
}

/// Value of an expression built only from literals and operators.
///
/// `None` if the expression names anything, calls anything, divides by
/// zero or mixes operand types.
pub fn evaluate(expr: &Expr) -> Option<Literal> {
    with_stack(|| match &expr.kind {
        ExprKind::Literal(literal) => Some(literal.clone()),
        ExprKind::Unary { op, operand } => unary(*op, &evaluate(operand)?),
        ExprKind::Binary { op, lhs, rhs } => binary(*op, &evaluate(lhs)?, &evaluate(rhs)?),
        _ => None,
    })
}

fn unary(op: UnaryOp, operand: &Literal) -> Option<Literal> {
    match (op, operand) {
        (UnaryOp::Neg, Literal::Int(v)) => Some(Literal::Int(v.wrapping_neg())),
        (UnaryOp::Not, Literal::Bool(v)) => Some(Literal::Bool(!v)),
        _ => None,
    }
}

fn binary(op: BinaryOp, lhs: &Literal, rhs: &Literal) -> Option<Literal> {
    use Literal::{Bool, Int, Str};

    let value = match (op, lhs, rhs) {
        (BinaryOp::Add, Int(a), Int(b)) => Int(a.wrapping_add(*b)),
        (BinaryOp::Sub, Int(a), Int(b)) => Int(a.wrapping_sub(*b)),
        (BinaryOp::Mul, Int(a), Int(b)) => Int(a.wrapping_mul(*b)),
        (BinaryOp::Div, Int(_), Int(0)) => return None,
        (BinaryOp::Div, Int(a), Int(b)) => Int(a.wrapping_div(*b)),
        (BinaryOp::Add, Str(a), Str(b)) => Str(format!("{a}{b}")),
        (BinaryOp::Lt, Int(a), Int(b)) => Bool(a < b),
        (BinaryOp::LtEq, Int(a), Int(b)) => Bool(a <= b),
        (BinaryOp::Gt, Int(a), Int(b)) => Bool(a > b),
        (BinaryOp::GtEq, Int(a), Int(b)) => Bool(a >= b),
        (BinaryOp::And, Bool(a), Bool(b)) => Bool(*a && *b),
        (BinaryOp::Or, Bool(a), Bool(b)) => Bool(*a || *b),
        (BinaryOp::Eq, a, b) if a.ty() == b.ty() => Bool(a == b),
        (BinaryOp::NotEq, a, b) if a.ty() == b.ty() => Bool(a != b),
        _ => return None,
    };
    Some(value)
}

fn fold_block(block: &mut Block, folded: &mut usize) {
    for stmt in &mut block.stmts {
        with_stack(|| match &mut stmt.kind {
            StmtKind::Var { value, .. }
            | StmtKind::Assign { value, .. }
            | StmtKind::Print(value)
            | StmtKind::Expr(value)
            | StmtKind::Return(Some(value)) => fold_expr(value, folded),
            StmtKind::Return(None) => {}
            StmtKind::If {
                cond,
                then,
                otherwise,
            } => {
                fold_expr(cond, folded);
                fold_block(then, folded);
                if let Some(otherwise) = otherwise {
                    fold_block(otherwise, folded);
                }
            }
            StmtKind::While { cond, body } => {
                fold_expr(cond, folded);
                fold_block(body, folded);
            }
        });
    }
}

/// Fold bottom-up so every operand is folded before its operator.
fn fold_expr(expr: &mut Expr, folded: &mut usize) {
    with_stack(|| {
        match &mut expr.kind {
            ExprKind::Unary { operand, .. } => fold_expr(operand, folded),
            ExprKind::Binary { lhs, rhs, .. } => {
                fold_expr(lhs, folded);
                fold_expr(rhs, folded);
            }
            ExprKind::Call { args, .. } => {
                for arg in args {
                    fold_expr(arg, folded);
                }
                return;
            }
            _ => return,
        }
        if let Some(literal) = evaluate(expr) {
            expr.ty = Some(literal.ty());
            expr.kind = ExprKind::Literal(literal);
            *folded += 1;
        }
    });
}
