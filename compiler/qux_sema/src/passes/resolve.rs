//! Name resolution.
//!
//! Rewrites every name use into a `Local` (parameter or `var`) or a
//! `Global` (constant or function of this or an imported unit). Locals are
//! tracked in an [`Environment`] so a `var` is only visible after its
//! declaration and only inside its block.

use rustc_hash::{FxHashMap, FxHashSet};

use qux_diagnostic::CompilerError;
use qux_ir::stack::with_stack;
use qux_ir::{Block, Callee, Decl, Expr, ExprKind, Global, Position, Stmt, StmtKind, Unit, UnitId};

use crate::context::BuildContext;
use crate::environment::Environment;
use crate::stage::Stage;

type Locals = Environment<String, ()>;

/// Resolves names against the unit, its imports and the registry.
#[derive(Debug)]
pub struct Resolver {
    context: BuildContext,
}

impl Resolver {
    pub fn new(context: &BuildContext) -> Self {
        Resolver {
            context: context.clone(),
        }
    }
}

impl Stage for Resolver {
    fn name(&self) -> &'static str {
        "resolve"
    }

    fn apply(&mut self, mut unit: Unit) -> Result<Unit, CompilerError> {
        let mut names = Names::new(&self.context, &unit);
        for decl in &mut unit.decls {
            match decl {
                Decl::Const(c) => names.expr(&Locals::new(), &mut c.value),
                Decl::Function(f) => {
                    let mut locals = Locals::new();
                    for param in &f.params {
                        locals.put(param.name.clone(), ());
                    }
                    names.block(&mut locals, &mut f.body);
                }
                Decl::Type(_) => {}
            }
        }
        if names.errors.is_empty() {
            Ok(unit)
        } else {
            Err(CompilerError::list(names.errors))
        }
    }
}

/// What a unit can refer to, and the problems found so far.
struct Names<'c> {
    context: &'c BuildContext,
    unit: UnitId,
    constants: FxHashSet<String>,
    functions: FxHashSet<String>,
    /// Import alias to imported unit, `None` when that unit is unknown.
    imports: FxHashMap<String, Option<UnitId>>,
    errors: Vec<CompilerError>,
}

impl<'c> Names<'c> {
    fn new(context: &'c BuildContext, unit: &Unit) -> Self {
        let mut names = Names {
            context,
            unit: unit.id.clone(),
            constants: unit.consts().map(|c| c.name.clone()).collect(),
            functions: unit.functions().map(|f| f.name.clone()).collect(),
            imports: FxHashMap::default(),
            errors: Vec::new(),
        };
        for import in &unit.imports {
            let known = context.resource(&import.id).is_some();
            if !known {
                names.error(format!("cannot find unit `{}`", import.id), import.pos);
            }
            names
                .imports
                .insert(import.alias().to_string(), known.then(|| import.id.clone()));
        }
        names
    }

    fn error(&mut self, message: String, pos: Position) {
        self.errors
            .push(CompilerError::at(message, self.unit.as_str(), pos));
    }

    /// The registered unit behind `alias`, reporting an unknown alias.
    ///
    /// `None` without a new error when the alias names a missing unit,
    /// which was already reported at the import.
    fn imported(&mut self, alias: &str, pos: Position) -> Option<UnitId> {
        match self.imports.get(alias) {
            Some(id) => id.clone(),
            None => {
                self.error(format!("unknown import `{alias}`"), pos);
                None
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
            StmtKind::Var { name, value, .. } => {
                self.expr(locals, value);
                locals.put(name.clone(), ());
            }
            StmtKind::Assign { target, value } => {
                self.expr(locals, value);
                if !locals.contains(target.as_str()) {
                    let message = if self.constants.contains(target.as_str()) {
                        format!("cannot assign to constant `{target}`")
                    } else {
                        format!("undeclared variable `{target}`")
                    };
                    self.error(message, pos);
                }
            }
            StmtKind::If {
                cond,
                then,
                otherwise,
            } => {
                self.expr(locals, cond);
                self.block(locals, then);
                if let Some(otherwise) = otherwise {
                    self.block(locals, otherwise);
                }
            }
            StmtKind::While { cond, body } => {
                self.expr(locals, cond);
                self.block(locals, body);
            }
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    self.expr(locals, value);
                }
            }
            StmtKind::Print(value) | StmtKind::Expr(value) => self.expr(locals, value),
        }
    }

    fn expr(&mut self, locals: &Locals, expr: &mut Expr) {
        with_stack(|| self.expr_inner(locals, expr));
    }

    fn expr_inner(&mut self, locals: &Locals, expr: &mut Expr) {
        let pos = expr.pos;
        let rewritten = match &mut expr.kind {
            ExprKind::Ident(name) => self.ident(locals, name, pos),
            ExprKind::Path { qualifier, name } => self.path(qualifier, name, pos),
            ExprKind::Unary { operand, .. } => {
                self.expr(locals, operand);
                None
            }
            ExprKind::Binary { lhs, rhs, .. } => {
                self.expr(locals, lhs);
                self.expr(locals, rhs);
                None
            }
            ExprKind::Call { callee, args, .. } => {
                for arg in args.iter_mut() {
                    self.expr(locals, arg);
                }
                if let Some(resolved) = self.callee(callee, pos) {
                    *callee = Callee::Resolved(resolved);
                }
                None
            }
            ExprKind::Literal(_) | ExprKind::Local(_) | ExprKind::Global(_) => None,
        };
        if let Some(kind) = rewritten {
            expr.kind = kind;
        }
    }

    fn ident(&mut self, locals: &Locals, name: &str, pos: Position) -> Option<ExprKind> {
        if locals.contains(name) {
            return Some(ExprKind::Local(name.to_string()));
        }
        if self.constants.contains(name) {
            return Some(ExprKind::Global(Global::new(self.unit.clone(), name)));
        }
        let message = if self.functions.contains(name) {
            format!("function `{name}` used as a value; call it with `{name}(..)`")
        } else {
            format!("undeclared variable `{name}`")
        };
        self.error(message, pos);
        None
    }

    fn path(&mut self, qualifier: &str, name: &str, pos: Position) -> Option<ExprKind> {
        let owner = self.imported(qualifier, pos)?;
        let found = self
            .context
            .resource(&owner)
            .is_some_and(|r| r.lookup_constant_type(name).is_some());
        if found {
            Some(ExprKind::Global(Global::new(owner, name)))
        } else {
            self.error(format!("unit `{owner}` has no constant `{name}`"), pos);
            None
        }
    }

    fn callee(&mut self, callee: &Callee, pos: Position) -> Option<Global> {
        let Callee::Unresolved { qualifier, name } = callee else {
            return None;
        };
        let Some(qualifier) = qualifier else {
            if self.functions.contains(name) {
                return Some(Global::new(self.unit.clone(), name.as_str()));
            }
            self.error(format!("unknown function `{name}`"), pos);
            return None;
        };
        let owner = self.imported(qualifier, pos)?;
        let found = self
            .context
            .resource(&owner)
            .is_some_and(|r| r.lookup_function_type(name).is_some());
        if found {
            Some(Global::new(owner, name.as_str()))
        } else {
            self.error(format!("unit `{owner}` has no function `{name}`"), pos);
            None
        }
    }
}
