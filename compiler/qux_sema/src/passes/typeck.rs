//! Type checking.
//!
//! Annotates every expression with its type and every call with the
//! callee's signature, and lowers alias types in declarations to the
//! primitive types they name. Problems are collected and reported together;
//! an expression whose type could not be determined is skipped by its
//! parent rather than reported again.

use rustc_hash::FxHashMap;

use qux_diagnostic::CompilerError;
use qux_ir::stack::with_stack;
use qux_ir::{
    BinaryOp, Block, Callee, ConstDecl, Decl, Descriptor, Expr, ExprKind, FnDecl, Global, Position,
    Signature, Stmt, StmtKind, Type, TypeAnn, TypeName, UnaryOp, Unit, UnitId,
};

use super::fold;
use crate::context::BuildContext;
use crate::environment::Environment;
use crate::resource::Resource;
use crate::stage::Stage;

type Locals = Environment<String, Type>;

/// Checks and annotates types.
#[derive(Debug)]
pub struct TypeChecker {
    context: BuildContext,
}

impl TypeChecker {
    pub fn new(context: &BuildContext) -> Self {
        TypeChecker {
            context: context.clone(),
        }
    }
}

impl Stage for TypeChecker {
    fn name(&self) -> &'static str {
        "typeck"
    }

    fn apply(&mut self, mut unit: Unit) -> Result<Unit, CompilerError> {
        let mut checker = Checker::new(&self.context, &unit);
        for decl in &mut unit.decls {
            match decl {
                Decl::Const(c) => checker.constant(c),
                Decl::Function(f) => checker.function(f),
                Decl::Type(t) => {
                    if t.target.ty.is_primitive() {
                        continue;
                    }
                    checker.error(
                        format!(
                            "type alias `{}` must name a primitive type, found `{}`",
                            t.name, t.target.ty
                        ),
                        t.target.pos,
                    );
                }
            }
        }
        if checker.errors.is_empty() {
            Ok(unit)
        } else {
            Err(CompilerError::list(checker.errors))
        }
    }
}

/// Why a type could not be lowered to a primitive.
enum LowerError {
    Unknown,
    NotPrimitive(Type),
}

struct Checker<'c> {
    context: &'c BuildContext,
    unit: UnitId,
    /// This unit's own facade, with qualified type names.
    own: Resource,
    /// Import alias to imported unit.
    imports: FxHashMap<String, UnitId>,
    /// Lowered types of this unit's constants.
    constants: FxHashMap<String, Type>,
    /// Lowered signatures of this unit's functions.
    signatures: FxHashMap<String, Signature>,
    /// Return type of the function being checked; `None` if it is unknown.
    ret: Option<Type>,
    errors: Vec<CompilerError>,
}

impl<'c> Checker<'c> {
    fn new(context: &'c BuildContext, unit: &Unit) -> Self {
        let mut checker = Checker {
            context,
            unit: unit.id.clone(),
            own: Resource::from_unit(unit),
            imports: unit
                .imports
                .iter()
                .map(|i| (i.alias().to_string(), i.id.clone()))
                .collect(),
            constants: FxHashMap::default(),
            signatures: FxHashMap::default(),
            ret: None,
            errors: Vec::new(),
        };
        for c in unit.consts() {
            if let Ok(ty) = checker.lower(&c.ty) {
                checker.constants.insert(c.name.clone(), ty);
            }
        }
        for f in unit.functions() {
            let params: Result<Vec<Type>, LowerError> =
                f.params.iter().map(|p| checker.lower(&p.ty)).collect();
            if let (Ok(params), Ok(ret)) = (params, checker.lower(&f.ret)) {
                checker
                    .signatures
                    .insert(f.name.clone(), Signature { params, ret });
            }
        }
        checker
    }

    fn error(&mut self, message: String, pos: Position) {
        self.errors
            .push(CompilerError::at(message, self.unit.as_str(), pos));
    }

    /// Lower an annotation written in this unit.
    fn lower(&self, ann: &TypeAnn) -> Result<Type, LowerError> {
        let Type::Named(TypeName { qualifier, name }) = &ann.ty else {
            return Ok(ann.ty.clone());
        };
        let owner = match qualifier {
            None => self.unit.clone(),
            Some(alias) => self.imports.get(alias).cloned().ok_or(LowerError::Unknown)?,
        };
        let qualified = TypeName::new(Some(owner.to_string()), name.clone());
        self.lower_qualified(&Type::Named(qualified))
    }

    /// Lower an annotation, reporting failure at the annotation.
    fn lower_reported(&mut self, ann: &TypeAnn) -> Option<Type> {
        match self.lower(ann) {
            Ok(ty) => Some(ty),
            Err(LowerError::Unknown) => {
                self.error(format!("unknown type `{}`", ann.ty), ann.pos);
                None
            }
            Err(LowerError::NotPrimitive(target)) => {
                self.error(
                    format!(
                        "type alias `{}` must name a primitive type, found `{target}`",
                        ann.ty
                    ),
                    ann.pos,
                );
                None
            }
        }
    }

    /// Lower a type whose qualifier, if any, is a full unit id.
    fn lower_qualified(&self, ty: &Type) -> Result<Type, LowerError> {
        let Type::Named(TypeName {
            qualifier: Some(owner),
            name,
        }) = ty
        else {
            return if ty.is_primitive() {
                Ok(ty.clone())
            } else {
                Err(LowerError::Unknown)
            };
        };
        let owner = UnitId::new(owner.as_str());
        let resource = if owner == self.unit {
            Some(&self.own)
        } else {
            self.context.resource(&owner)
        };
        let target = resource
            .and_then(|r| r.lookup_type_type(name))
            .and_then(Descriptor::as_value)
            .ok_or(LowerError::Unknown)?;
        if target.is_primitive() {
            Ok(target.clone())
        } else {
            Err(LowerError::NotPrimitive(target.clone()))
        }
    }

    fn constant(&mut self, c: &mut ConstDecl) {
        let declared = self.lower_reported(&c.ty);
        if let Some(ty) = &declared {
            c.ty.ty = ty.clone();
            if *ty == Type::Void {
                self.error(format!("constant `{}` cannot have type Void", c.name), c.ty.pos);
            }
        }
        if !is_literal_expr(&c.value) {
            self.error(
                format!(
                    "initializer of constant `{}` must be a literal expression",
                    c.name
                ),
                c.value.pos,
            );
            return;
        }
        let found = self.value(&Locals::new(), &mut c.value);
        if let (Some(declared), Some(found)) = (&declared, &found) {
            self.mismatch(declared, found, c.value.pos);
        }
        if found.is_some() && fold::evaluate(&c.value).is_none() {
            self.error(
                format!("initializer of constant `{}` divides by zero", c.name),
                c.value.pos,
            );
        }
    }

    fn function(&mut self, f: &mut FnDecl) {
        let mut locals = Locals::new();
        for param in &mut f.params {
            let Some(ty) = self.lower_reported(&param.ty) else {
                continue;
            };
            if ty == Type::Void {
                self.error(
                    format!("parameter `{}` cannot have type Void", param.name),
                    param.ty.pos,
                );
            }
            param.ty.ty = ty.clone();
            locals.put(param.name.clone(), ty);
        }
        self.ret = self.lower_reported(&f.ret);
        if let Some(ret) = &self.ret {
            f.ret.ty = ret.clone();
        }
        self.block(&mut locals, &mut f.body);
        let needs_return = self.ret.as_ref().is_some_and(|ret| *ret != Type::Void);
        if needs_return && !f.body.always_returns() {
            self.error(format!("missing return in function `{}`", f.name), f.pos);
        }
        self.ret = None;
    }

    fn mismatch(&mut self, expected: &Type, found: &Type, pos: Position) {
        if expected != found {
            self.error(
                format!("mismatched types: expected {expected}, found {found}"),
                pos,
            );
        }
    }

    fn condition(&mut self, locals: &Locals, cond: &mut Expr) {
        if let Some(ty) = self.value(locals, cond) {
            if ty != Type::Bool {
                self.error(format!("condition must be Bool, found {ty}"), cond.pos);
            }
        }
    }

    fn block(&mut self, locals: &mut Locals, block: &mut Block) {
        locals.scoped(|locals| {
            for stmt in &mut block.stmts {
                with_stack(|| self.stmt(locals, stmt));
            }
        });
    }

    fn stmt(&mut self, locals: &mut Locals, stmt: &mut Stmt) {
        let pos = stmt.pos;
        match &mut stmt.kind {
            StmtKind::Var { name, ty, value } => {
                let found = self.value(locals, value);
                let declared = match ty {
                    Some(ann) => {
                        let lowered = self.lower_reported(ann);
                        if let Some(lowered) = &lowered {
                            ann.ty = lowered.clone();
                        }
                        lowered
                    }
                    None => None,
                };
                if let (Some(declared), Some(found)) = (&declared, &found) {
                    self.mismatch(declared, found, value.pos);
                }
                if let Some(ty) = declared.or(found) {
                    locals.put(name.clone(), ty);
                }
            }
            StmtKind::Assign { target, value } => {
                let found = self.value(locals, value);
                if let (Some(expected), Some(found)) = (locals.get(target.as_str()).cloned(), found) {
                    self.mismatch(&expected, &found, value.pos);
                }
            }
            StmtKind::If {
                cond,
                then,
                otherwise,
            } => {
                self.condition(locals, cond);
                self.block(locals, then);
                if let Some(otherwise) = otherwise {
                    self.block(locals, otherwise);
                }
            }
            StmtKind::While { cond, body } => {
                self.condition(locals, cond);
                self.block(locals, body);
            }
            StmtKind::Return(value) => self.return_stmt(locals, value.as_mut(), pos),
            StmtKind::Print(value) => {
                self.value(locals, value);
            }
            StmtKind::Expr(value) => {
                self.expr(locals, value);
            }
        }
    }

    fn return_stmt(&mut self, locals: &Locals, value: Option<&mut Expr>, pos: Position) {
        let expected = self.ret.clone();
        match (expected, value) {
            (Some(Type::Void), Some(value)) => {
                self.expr(locals, value);
                self.error(
                    "cannot return a value from a function returning Void".to_string(),
                    value.pos,
                );
            }
            (Some(expected), Some(value)) => {
                if let Some(found) = self.value(locals, value) {
                    self.mismatch(&expected, &found, value.pos);
                }
            }
            (None, Some(value)) => {
                self.expr(locals, value);
            }
            (Some(Type::Void) | None, None) => {}
            (Some(expected), None) => {
                self.error(format!("missing return value of type {expected}"), pos);
            }
        }
    }

    /// Type of an expression used as a value: `Void` is rejected.
    fn value(&mut self, locals: &Locals, expr: &mut Expr) -> Option<Type> {
        let ty = self.expr(locals, expr)?;
        if ty == Type::Void {
            self.error(
                "call to a function returning Void used as a value".to_string(),
                expr.pos,
            );
            return None;
        }
        Some(ty)
    }

    fn expr(&mut self, locals: &Locals, expr: &mut Expr) -> Option<Type> {
        let ty = with_stack(|| self.expr_inner(locals, expr));
        expr.ty.clone_from(&ty);
        ty
    }

    fn expr_inner(&mut self, locals: &Locals, expr: &mut Expr) -> Option<Type> {
        let pos = expr.pos;
        match &mut expr.kind {
            ExprKind::Literal(literal) => Some(literal.ty()),
            ExprKind::Local(name) => locals.get(name.as_str()).cloned(),
            ExprKind::Global(global) => self.constant_type(global, pos),
            ExprKind::Ident(name) | ExprKind::Path { name, .. } => {
                self.error(format!("unresolved name `{name}`"), pos);
                None
            }
            ExprKind::Unary { op, operand } => {
                let operand = self.value(locals, operand)?;
                match (*op, &operand) {
                    (UnaryOp::Neg, Type::Int) => Some(Type::Int),
                    (UnaryOp::Not, Type::Bool) => Some(Type::Bool),
                    (op, _) => {
                        let symbol = if op == UnaryOp::Neg { "-" } else { "not" };
                        self.error(
                            format!("operator `{symbol}` cannot be applied to {operand}"),
                            pos,
                        );
                        None
                    }
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.value(locals, lhs);
                let rhs = self.value(locals, rhs);
                self.binary(*op, &lhs?, &rhs?, pos)
            }
            ExprKind::Call {
                callee,
                args,
                signature,
            } => {
                let found: Vec<Option<Type>> =
                    args.iter_mut().map(|arg| self.value(locals, arg)).collect();
                let Callee::Resolved(global) = callee else {
                    self.error("unresolved function call".to_string(), pos);
                    return None;
                };
                let resolved = self.signature(global, pos)?;
                let name = self.describe(global);
                if resolved.params.len() == args.len() {
                    for (i, (param, (arg, found))) in resolved
                        .params
                        .iter()
                        .zip(args.iter().zip(found))
                        .enumerate()
                    {
                        match found {
                            Some(found) if found != *param => self.error(
                                format!(
                                    "argument {} of `{name}`: expected {param}, found {found}",
                                    i + 1
                                ),
                                arg.pos,
                            ),
                            _ => {}
                        }
                    }
                } else {
                    self.error(
                        format!(
                            "function `{name}` expects {} argument(s), found {}",
                            resolved.params.len(),
                            args.len()
                        ),
                        pos,
                    );
                }
                let ret = resolved.ret.clone();
                *signature = Some(resolved);
                Some(ret)
            }
        }
    }

    fn binary(&mut self, op: BinaryOp, lhs: &Type, rhs: &Type, pos: Position) -> Option<Type> {
        let ty = match (op, lhs, rhs) {
            (BinaryOp::Add, Type::Str, Type::Str) => Type::Str,
            (BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div, Type::Int, Type::Int) => {
                Type::Int
            }
            (op, Type::Int, Type::Int) if op.is_comparison() => Type::Bool,
            (op, lhs, rhs) if op.is_equality() && lhs == rhs => Type::Bool,
            (op, Type::Bool, Type::Bool) if op.is_logical() => Type::Bool,
            _ => {
                self.error(
                    format!(
                        "operator `{}` cannot be applied to {lhs} and {rhs}",
                        op.as_str()
                    ),
                    pos,
                );
                return None;
            }
        };
        Some(ty)
    }

    /// How a callee is named in messages: bare when local.
    fn describe(&self, global: &Global) -> String {
        if global.owner == self.unit {
            global.name.clone()
        } else {
            global.to_string()
        }
    }

    fn constant_type(&mut self, global: &Global, pos: Position) -> Option<Type> {
        if global.owner == self.unit {
            return self.constants.get(&global.name).cloned();
        }
        let ty = self
            .context
            .resource(&global.owner)
            .and_then(|r| r.lookup_constant_type(&global.name))
            .and_then(Descriptor::as_value)
            .cloned();
        let Some(ty) = ty else {
            self.error(format!("unknown constant `{global}`"), pos);
            return None;
        };
        match self.lower_qualified(&ty) {
            Ok(ty) => Some(ty),
            Err(_) => {
                self.error(
                    format!("constant `{global}` has a type that cannot be resolved: {ty}"),
                    pos,
                );
                None
            }
        }
    }

    fn signature(&mut self, global: &Global, pos: Position) -> Option<Signature> {
        if global.owner == self.unit {
            return self.signatures.get(&global.name).cloned();
        }
        let signature = self
            .context
            .resource(&global.owner)
            .and_then(|r| r.lookup_function_type(&global.name))
            .and_then(Descriptor::as_function)
            .cloned();
        let Some(signature) = signature else {
            self.error(format!("unknown function `{global}`"), pos);
            return None;
        };
        let params: Result<Vec<Type>, LowerError> = signature
            .params
            .iter()
            .map(|p| self.lower_qualified(p))
            .collect();
        match (params, self.lower_qualified(&signature.ret)) {
            (Ok(params), Ok(ret)) => Some(Signature { params, ret }),
            _ => {
                self.error(
                    format!("function `{global}` has a signature that cannot be resolved: {signature}"),
                    pos,
                );
                None
            }
        }
    }
}

/// Whether `expr` is built only from literals and operators.
fn is_literal_expr(expr: &Expr) -> bool {
    with_stack(|| match &expr.kind {
        ExprKind::Literal(_) => true,
        ExprKind::Unary { operand, .. } => is_literal_expr(operand),
        ExprKind::Binary { lhs, rhs, .. } => is_literal_expr(lhs) && is_literal_expr(rhs),
        _ => false,
    })
}
