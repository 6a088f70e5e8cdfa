//! Method bodies.
//!
//! Every `Int` is a JVM `long` (two local slots, two stack words), `Bool`
//! is an `int` 0/1 and `Str` is a `java/lang/String` reference. Locals get
//! a fresh slot per declaration and keep it for the rest of the method.

mod code;

use qux_ir::stack::with_stack;
use qux_ir::{
    BinaryOp, Block, Callee, Expr, ExprKind, FnDecl, Literal, Signature, Stmt, StmtKind, Type,
    UnaryOp,
};
use qux_sema::Environment;

use crate::class::{ClassFile, MethodBody};
use crate::TranslateError;
use code::{op, Code};

const STRING: &str = "java/lang/String";
const PRINT_STREAM: &str = "java/io/PrintStream";

/// Field descriptor of a lowered type.
pub fn descriptor(ty: &Type) -> Result<&'static str, TranslateError> {
    match ty {
        Type::Int => Ok("J"),
        Type::Bool => Ok("Z"),
        Type::Str => Ok("Ljava/lang/String;"),
        Type::Void => Ok("V"),
        Type::Named(_) => Err(TranslateError::UnloweredType(ty.clone())),
    }
}

/// Method descriptor, e.g. `(JZ)Ljava/lang/String;`.
pub fn method_descriptor(signature: &Signature) -> Result<String, TranslateError> {
    let mut out = String::from("(");
    for param in &signature.params {
        out.push_str(descriptor(param)?);
    }
    out.push(')');
    out.push_str(descriptor(&signature.ret)?);
    Ok(out)
}

/// Stack words (and local slots) a value of `ty` takes.
fn words(ty: &Type) -> i32 {
    match ty {
        Type::Int => 2,
        Type::Void => 0,
        _ => 1,
    }
}

/// Signature of a declared function.
pub fn signature_of(function: &FnDecl) -> Signature {
    Signature {
        params: function.params.iter().map(|p| p.ty.ty.clone()).collect(),
        ret: function.ret.ty.clone(),
    }
}

#[derive(Clone, Debug)]
struct Slot {
    index: u16,
    ty: Type,
}

type Locals = Environment<String, Slot>;

/// Emit the body of `function`.
pub fn method(class: &mut ClassFile, function: &FnDecl) -> Result<MethodBody, TranslateError> {
    let mut gen = MethodGen {
        class,
        code: Code::new(function.name.as_str()),
        name: function.name.clone(),
        next_slot: 0,
    };
    let mut locals = Locals::new();
    for param in &function.params {
        let slot = gen.allocate(&param.ty.ty)?;
        locals.put(param.name.clone(), slot);
    }
    gen.block(&mut locals, &function.body)?;
    if !function.body.always_returns() {
        if function.ret.ty != Type::Void {
            return Err(TranslateError::FallsOffEnd(function.name.clone()));
        }
        gen.code.op(op::RETURN, 0);
    }
    let max_locals = gen.next_slot;
    let (max_stack, code) = gen.code.finish()?;
    Ok(MethodBody {
        max_stack,
        max_locals,
        code,
    })
}

/// `public static void main(String[])` calling the no-argument `main`.
pub fn main_bridge(class: &mut ClassFile, owner: &str) -> Result<MethodBody, TranslateError> {
    let target = class.pool().method(owner, "main", "()V")?;
    let mut code = Code::new("main");
    code.op_u16(op::INVOKESTATIC, target, 0);
    code.op(op::RETURN, 0);
    let (max_stack, code) = code.finish()?;
    Ok(MethodBody {
        max_stack,
        max_locals: 1,
        code,
    })
}

struct MethodGen<'a> {
    class: &'a mut ClassFile,
    code: Code,
    name: String,
    next_slot: u16,
}

impl MethodGen<'_> {
    fn allocate(&mut self, ty: &Type) -> Result<Slot, TranslateError> {
        descriptor(ty)?;
        let index = self.next_slot;
        let size = match ty {
            Type::Int => 2,
            _ => 1,
        };
        self.next_slot = index
            .checked_add(size)
            .ok_or_else(|| TranslateError::CodeTooLarge(self.name.clone()))?;
        Ok(Slot {
            index,
            ty: ty.clone(),
        })
    }

    fn load(&mut self, slot: &Slot) {
        let opcode = match slot.ty {
            Type::Int => op::LLOAD,
            Type::Bool => op::ILOAD,
            _ => op::ALOAD,
        };
        self.code.local(opcode, slot.index, words(&slot.ty));
    }

    fn store(&mut self, slot: &Slot) {
        let opcode = match slot.ty {
            Type::Int => op::LSTORE,
            Type::Bool => op::ISTORE,
            _ => op::ASTORE,
        };
        self.code.local(opcode, slot.index, -words(&slot.ty));
    }

    fn block(&mut self, locals: &mut Locals, block: &Block) -> Result<(), TranslateError> {
        locals.scoped(|locals| {
            for stmt in &block.stmts {
                with_stack(|| self.stmt(locals, stmt))?;
                // Anything after an unconditional return is dead.
                if stmt.always_returns() {
                    break;
                }
            }
            Ok(())
        })
    }

    fn stmt(&mut self, locals: &mut Locals, stmt: &Stmt) -> Result<(), TranslateError> {
        match &stmt.kind {
            StmtKind::Var { name, value, .. } => {
                self.expr(locals, value)?;
                let ty = value.ty.clone().ok_or(TranslateError::Untyped(value.pos))?;
                let slot = self.allocate(&ty)?;
                self.store(&slot);
                locals.put(name.clone(), slot);
            }
            StmtKind::Assign { target, value } => {
                self.expr(locals, value)?;
                let slot = locals
                    .get(target.as_str())
                    .cloned()
                    .ok_or_else(|| TranslateError::UnknownLocal(target.clone()))?;
                self.store(&slot);
            }
            StmtKind::If {
                cond,
                then,
                otherwise,
            } => {
                let other = self.code.label();
                self.expr(locals, cond)?;
                self.code.branch(op::IFEQ, other, -1);
                self.block(locals, then)?;
                match otherwise {
                    Some(otherwise) => {
                        let end = self.code.label();
                        if !then.always_returns() {
                            self.code.branch(op::GOTO, end, 0);
                        }
                        self.code.bind(other);
                        self.block(locals, otherwise)?;
                        self.code.bind(end);
                    }
                    None => self.code.bind(other),
                }
            }
            StmtKind::While { cond, body } => {
                let top = self.code.label();
                let end = self.code.label();
                self.code.bind(top);
                self.expr(locals, cond)?;
                self.code.branch(op::IFEQ, end, -1);
                self.block(locals, body)?;
                self.code.branch(op::GOTO, top, 0);
                self.code.bind(end);
            }
            StmtKind::Return(None) => self.code.op(op::RETURN, 0),
            StmtKind::Return(Some(value)) => {
                self.expr(locals, value)?;
                let ty = typed(value)?;
                let opcode = match ty {
                    Type::Int => op::LRETURN,
                    Type::Bool => op::IRETURN,
                    _ => op::ARETURN,
                };
                self.code.op(opcode, -words(ty));
            }
            StmtKind::Print(value) => {
                let out = self
                    .class
                    .pool()
                    .field("java/lang/System", "out", "Ljava/io/PrintStream;")?;
                self.code.op_u16(op::GETSTATIC, out, 1);
                self.expr(locals, value)?;
                let ty = typed(value)?;
                let println = format!("({})V", descriptor(ty)?);
                let index = self.class.pool().method(PRINT_STREAM, "println", &println)?;
                self.code
                    .op_u16(op::INVOKEVIRTUAL, index, -(1 + words(ty)));
            }
            StmtKind::Expr(value) => {
                self.expr(locals, value)?;
                match words(typed(value)?) {
                    2 => self.code.op(op::POP2, -2),
                    1 => self.code.op(op::POP, -1),
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn expr(&mut self, locals: &Locals, expr: &Expr) -> Result<(), TranslateError> {
        with_stack(|| self.expr_inner(locals, expr))
    }

    fn expr_inner(&mut self, locals: &Locals, expr: &Expr) -> Result<(), TranslateError> {
        let ty = typed(expr)?;
        match &expr.kind {
            ExprKind::Literal(literal) => self.literal(literal)?,
            ExprKind::Local(name) => {
                let slot = locals
                    .get(name.as_str())
                    .cloned()
                    .ok_or_else(|| TranslateError::UnknownLocal(name.clone()))?;
                self.load(&slot);
            }
            ExprKind::Global(global) => {
                let index = self.class.pool().field(
                    &global.owner.internal_name(),
                    &global.name,
                    descriptor(ty)?,
                )?;
                self.code.op_u16(op::GETSTATIC, index, words(ty));
            }
            ExprKind::Ident(name) | ExprKind::Path { name, .. } => {
                return Err(TranslateError::Unresolved {
                    name: name.clone(),
                    pos: expr.pos,
                });
            }
            ExprKind::Unary { op: unary, operand } => {
                self.expr(locals, operand)?;
                match unary {
                    UnaryOp::Neg => self.code.op(op::LNEG, 0),
                    UnaryOp::Not => {
                        self.code.op(op::ICONST_1, 1);
                        self.code.op(op::IXOR, -1);
                    }
                }
            }
            ExprKind::Binary { op: binary, lhs, rhs } => self.binary(locals, *binary, lhs, rhs)?,
            ExprKind::Call {
                callee,
                args,
                signature,
            } => {
                let global = match callee {
                    Callee::Resolved(global) => global,
                    Callee::Unresolved { name, .. } => {
                        return Err(TranslateError::Unresolved {
                            name: name.clone(),
                            pos: expr.pos,
                        });
                    }
                };
                let signature = signature
                    .as_ref()
                    .ok_or(TranslateError::MissingSignature(expr.pos))?;
                for arg in args {
                    self.expr(locals, arg)?;
                }
                let index = self.class.pool().method(
                    &global.owner.internal_name(),
                    &global.name,
                    &method_descriptor(signature)?,
                )?;
                let popped: i32 = signature.params.iter().map(words).sum();
                self.code
                    .op_u16(op::INVOKESTATIC, index, words(&signature.ret) - popped);
            }
        }
        Ok(())
    }

    fn literal(&mut self, literal: &Literal) -> Result<(), TranslateError> {
        match literal {
            Literal::Int(0) => self.code.op(op::LCONST_0, 2),
            Literal::Int(1) => self.code.op(op::LCONST_1, 2),
            Literal::Int(value) => {
                let index = self.class.pool().long(*value)?;
                self.code.op_u16(op::LDC2_W, index, 2);
            }
            Literal::Bool(value) => {
                let opcode = if *value { op::ICONST_1 } else { op::ICONST_0 };
                self.code.op(opcode, 1);
            }
            Literal::Str(value) => {
                let index = self.class.pool().string(value)?;
                self.code.ldc(index);
            }
        }
        Ok(())
    }

    fn binary(
        &mut self,
        locals: &Locals,
        binary: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
    ) -> Result<(), TranslateError> {
        if binary.is_logical() {
            return self.short_circuit(locals, binary, lhs, rhs);
        }
        self.expr(locals, lhs)?;
        self.expr(locals, rhs)?;
        let operands = typed(lhs)?;
        match (binary, operands) {
            (BinaryOp::Add, Type::Str) => {
                let concat = self.class.pool().method(
                    STRING,
                    "concat",
                    "(Ljava/lang/String;)Ljava/lang/String;",
                )?;
                self.code.op_u16(op::INVOKEVIRTUAL, concat, -1);
            }
            (BinaryOp::Add, Type::Int) => self.code.op(op::LADD, -2),
            (BinaryOp::Sub, Type::Int) => self.code.op(op::LSUB, -2),
            (BinaryOp::Mul, Type::Int) => self.code.op(op::LMUL, -2),
            (BinaryOp::Div, Type::Int) => self.code.op(op::LDIV, -2),
            (_, Type::Int) if binary.is_comparison() || binary.is_equality() => {
                self.code.op(op::LCMP, -3);
                let opcode = match binary {
                    BinaryOp::Lt => op::IFLT,
                    BinaryOp::LtEq => op::IFLE,
                    BinaryOp::Gt => op::IFGT,
                    BinaryOp::GtEq => op::IFGE,
                    BinaryOp::Eq => op::IFEQ,
                    _ => op::IFNE,
                };
                self.push_condition(opcode, -1);
            }
            (BinaryOp::Eq, Type::Bool) => self.push_condition(op::IF_ICMPEQ, -2),
            (BinaryOp::NotEq, Type::Bool) => self.push_condition(op::IF_ICMPNE, -2),
            (BinaryOp::Eq | BinaryOp::NotEq, Type::Str) => {
                let equals =
                    self.class
                        .pool()
                        .method(STRING, "equals", "(Ljava/lang/Object;)Z")?;
                self.code.op_u16(op::INVOKEVIRTUAL, equals, -1);
                if binary == BinaryOp::NotEq {
                    self.code.op(op::ICONST_1, 1);
                    self.code.op(op::IXOR, -1);
                }
            }
            (binary, ty) => {
                return Err(TranslateError::Operator {
                    op: binary.as_str(),
                    ty: ty.clone(),
                })
            }
        }
        Ok(())
    }

    /// Push 1 if the branch `opcode` is taken, else 0.
    fn push_condition(&mut self, opcode: u8, delta: i32) {
        let taken = self.code.label();
        let end = self.code.label();
        self.code.branch(opcode, taken, delta);
        self.code.op(op::ICONST_0, 1);
        self.code.branch(op::GOTO, end, 0);
        self.code.bind(taken);
        self.code.op(op::ICONST_1, 1);
        self.code.bind(end);
    }

    /// `and` skips `rhs` when `lhs` is false, `or` when it is true.
    fn short_circuit(
        &mut self,
        locals: &Locals,
        binary: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
    ) -> Result<(), TranslateError> {
        let (skip_if, skipped_value) = if binary == BinaryOp::And {
            (op::IFEQ, op::ICONST_0)
        } else {
            (op::IFNE, op::ICONST_1)
        };
        let skip = self.code.label();
        let end = self.code.label();
        self.expr(locals, lhs)?;
        self.code.branch(skip_if, skip, -1);
        self.expr(locals, rhs)?;
        self.code.branch(op::GOTO, end, 0);
        self.code.bind(skip);
        self.code.op(skipped_value, 1);
        self.code.bind(end);
        Ok(())
    }
}

fn typed(expr: &Expr) -> Result<&Type, TranslateError> {
    expr.ty.as_ref().ok_or(TranslateError::Untyped(expr.pos))
}
