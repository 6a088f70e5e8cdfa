use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use qux_diagnostic::CompilerError;
use qux_ir::{Callee, Decl, ExprKind, Global, Literal, StmtKind, Type, Unit, UnitId};

use super::default_pipeline;
use crate::stage::{factory, Pipeline, PipelineError, Stage};
use crate::{BuildContext, CompileOptions, Resource, ResourceRegistry};

/// Parse `sources` as (stem, text), register them all and return the
/// context with the units in input order.
fn setup(sources: &[(&str, &str)]) -> (BuildContext, Vec<Unit>) {
    let units: Vec<Unit> = sources
        .iter()
        .map(|(stem, text)| qux_parse::parse(stem, text).unwrap())
        .collect();
    let mut registry = ResourceRegistry::new();
    registry.add_resources("qux", units.iter().map(Resource::from_unit));
    let context = BuildContext::new(Arc::new(registry), CompileOptions::default());
    (context, units)
}

/// Run the default pipeline over the first of `sources`.
fn compile(sources: &[(&str, &str)]) -> Result<Unit, PipelineError> {
    let (context, mut units) = setup(sources);
    default_pipeline().run(&context, units.remove(0))
}

fn compile_ok(sources: &[(&str, &str)]) -> Unit {
    match compile(sources) {
        Ok(unit) => unit,
        Err(e) => panic!("unexpected failure:\n{e}"),
    }
}

fn compile_err(sources: &[(&str, &str)]) -> CompilerError {
    match compile(sources) {
        Ok(unit) => panic!("expected a compiler error, got {unit:?}"),
        Err(PipelineError::Compiler(e)) => e,
        Err(e) => panic!("expected a compiler error, got {e}"),
    }
}

fn messages(error: &CompilerError) -> Vec<&str> {
    error.flatten().into_iter().filter_map(|e| e.message()).collect()
}

const MATH: (&str, &str) = (
    "Math",
    "package q\n\
     type Meters = Int\n\
     const LIMIT: Int = 10\n\
     fn twice(x: Int) -> Int { return x * 2 }\n\
     fn grow(m: Meters) -> Meters { return m + 1 }",
);

#[test]
fn test_two_undeclared_variables_aggregate() {
    let err = compile_err(&[(
        "Main",
        "package a\nfn main() {\n    print foo\n    print bar + 1\n}",
    )]);
    assert!(err.is_list());
    assert_eq!(err.len(), 2);
    let leaves = err.flatten();
    assert!(leaves.iter().all(|e| e.location().is_some()));
    assert_eq!(
        leaves[0].to_string(),
        "a.Main@3:10-13: undeclared variable `foo`"
    );
    assert_eq!(
        leaves[1].to_string(),
        "a.Main@4:10-13: undeclared variable `bar`"
    );
}

#[test]
fn test_duplicates_per_namespace() {
    let err = compile_err(&[(
        "Main",
        "const A: Int = 1\nconst A: Int = 2\nfn A() {}\nfn f(x: Int, x: Int) {}",
    )]);
    assert_eq!(
        messages(&err),
        vec![
            "duplicate constant `A`",
            "duplicate parameter `x` in function `f`"
        ]
    );
}

#[test]
fn test_duplicate_import() {
    let err = compile_err(&[
        ("Main", "import q.Math\nimport r.Math\n"),
        MATH,
    ]);
    assert_eq!(messages(&err), vec!["duplicate import `Math`"]);
    assert_eq!(err.location().unwrap().line(), 2);
}

#[test]
fn test_resolves_across_units() {
    let unit = compile_ok(&[
        (
            "Main",
            "import q.Math\nfn main() {\n    var n = Math.twice(Math.LIMIT)\n    helper(n)\n}\nfn helper(n: Int) {}",
        ),
        MATH,
    ]);
    let Decl::Function(main) = &unit.decls[0] else {
        panic!("expected a function");
    };
    let StmtKind::Var { value, .. } = &main.body.stmts[0].kind else {
        panic!("expected a var");
    };
    let ExprKind::Call { callee, args, signature } = &value.kind else {
        panic!("expected a call");
    };
    assert_eq!(
        callee,
        &Callee::Resolved(Global::new(UnitId::new("q.Math"), "twice"))
    );
    assert_eq!(
        args[0].kind,
        ExprKind::Global(Global::new(UnitId::new("q.Math"), "LIMIT"))
    );
    assert_eq!(signature.as_ref().map(ToString::to_string).as_deref(), Some("(Int) -> Int"));
    assert_eq!(value.ty, Some(Type::Int));
    let StmtKind::Expr(call) = &main.body.stmts[1].kind else {
        panic!("expected a call statement");
    };
    let ExprKind::Call { callee, args, .. } = &call.kind else {
        panic!("expected a call");
    };
    assert_eq!(callee, &Callee::Resolved(Global::new(UnitId::new("Main"), "helper")));
    assert_eq!(args[0].kind, ExprKind::Local("n".into()));
}

#[test]
fn test_missing_unit_reported_once() {
    let err = compile_err(&[(
        "Main",
        "import q.Missing\nfn main() {\n    Missing.run()\n    print Missing.X\n}",
    )]);
    assert_eq!(messages(&err), vec!["cannot find unit `q.Missing`"]);
}

#[test]
fn test_unknown_members_and_imports() {
    let err = compile_err(&[
        (
            "Main",
            "import q.Math\nfn main() {\n    Math.thrice(1)\n    print Math.NOPE\n    Other.go()\n    nothing()\n}",
        ),
        MATH,
    ]);
    assert_eq!(
        messages(&err),
        vec![
            "unit `q.Math` has no function `thrice`",
            "unit `q.Math` has no constant `NOPE`",
            "unknown import `Other`",
            "unknown function `nothing`",
        ]
    );
}

#[test]
fn test_var_scope_ends_with_block() {
    let err = compile_err(&[(
        "Main",
        "fn f() {\n    if true {\n        var x = 1\n    }\n    print x\n}",
    )]);
    assert_eq!(messages(&err), vec!["undeclared variable `x`"]);
}

#[test]
fn test_var_visible_only_after_declaration() {
    let err = compile_err(&[("Main", "fn f() {\n    print y\n    var y = 1\n    y = 2\n}")]);
    assert_eq!(messages(&err), vec!["undeclared variable `y`"]);
}

#[test]
fn test_assign_to_constant() {
    let err = compile_err(&[("Main", "const A: Int = 1\nfn f() {\n    A = 2\n}")]);
    assert_eq!(messages(&err), vec!["cannot assign to constant `A`"]);
}

#[test]
fn test_type_errors_aggregate() {
    let err = compile_err(&[(
        "Main",
        "fn f() {\n    var s: Str = 1\n    if 1 { }\n    print 1 + \"a\"\n}",
    )]);
    assert_eq!(
        messages(&err),
        vec![
            "mismatched types: expected Str, found Int",
            "condition must be Bool, found Int",
            "operator `+` cannot be applied to Int and Str",
        ]
    );
}

#[test]
fn test_missing_return() {
    let err = compile_err(&[(
        "Main",
        "fn f(x: Int) -> Int {\n    if x > 0 {\n        return 1\n    }\n}",
    )]);
    assert_eq!(messages(&err), vec!["missing return in function `f`"]);

    compile_ok(&[(
        "Main",
        "fn f(x: Int) -> Int {\n    if x > 0 {\n        return 1\n    } else {\n        return 2\n    }\n}",
    )]);
}

#[test]
fn test_return_checks() {
    let err = compile_err(&[(
        "Main",
        "fn f() {\n    return 1\n}\nfn g() -> Str {\n    return\n}\nfn h() -> Str {\n    return 3\n}",
    )]);
    assert_eq!(
        messages(&err),
        vec![
            "cannot return a value from a function returning Void",
            "missing return value of type Str",
            "mismatched types: expected Str, found Int",
        ]
    );
}

#[test]
fn test_constant_initializers() {
    let err = compile_err(&[(
        "Main",
        "const A: Int = 1\nconst B: Int = A + 1\nconst C: Int = 1 / 0\nconst D: Bool = 1",
    )]);
    assert_eq!(
        messages(&err),
        vec![
            "initializer of constant `B` must be a literal expression",
            "initializer of constant `C` divides by zero",
            "mismatched types: expected Bool, found Int",
        ]
    );
}

#[test]
fn test_aliases_lowered_to_primitives() {
    let unit = compile_ok(&[
        (
            "Main",
            "import q.Math\n\
             type Count = Int\n\
             const START: Count = 3\n\
             fn f(m: Math.Meters, c: Count) -> Count {\n    return Math.grow(m) + c\n}",
        ),
        MATH,
    ]);
    let Decl::Const(start) = &unit.decls[1] else {
        panic!("expected a constant");
    };
    assert_eq!(start.ty.ty, Type::Int);
    let Decl::Function(f) = &unit.decls[2] else {
        panic!("expected a function");
    };
    let params: Vec<&Type> = f.params.iter().map(|p| &p.ty.ty).collect();
    assert_eq!(params, vec![&Type::Int, &Type::Int]);
    assert_eq!(f.ret.ty, Type::Int);
}

#[test]
fn test_unknown_type() {
    let err = compile_err(&[("Main", "fn f(x: Nope) {}\nconst A: Math.T = 1")]);
    assert_eq!(
        messages(&err),
        vec!["unknown type `Nope`", "unknown type `Math.T`"]
    );
}

#[test]
fn test_void_used_as_value() {
    let err = compile_err(&[("Main", "fn g() {}\nfn f() {\n    print g()\n    g()\n}")]);
    assert_eq!(
        messages(&err),
        vec!["call to a function returning Void used as a value"]
    );
}

#[test]
fn test_call_arity_and_arguments() {
    let err = compile_err(&[
        (
            "Main",
            "import q.Math\nfn f() {\n    print Math.twice(1, 2)\n    print Math.twice(\"x\")\n}",
        ),
        MATH,
    ]);
    assert_eq!(
        messages(&err),
        vec![
            "function `q.Math.twice` expects 1 argument(s), found 2",
            "argument 1 of `q.Math.twice`: expected Int, found Str",
        ]
    );
}

#[test]
fn test_folding() {
    let unit = compile_ok(&[(
        "Main",
        "const X: Int = 2 * 3 + 1\nconst S: Str = \"a\" + \"b\"\nconst B: Bool = not (1 < 2)\nfn f() {\n    print 1 / 0\n}",
    )]);
    let values: Vec<Option<&Literal>> = unit
        .consts()
        .map(|c| c.value.as_literal())
        .collect();
    assert_eq!(
        values,
        vec![
            Some(&Literal::Int(7)),
            Some(&Literal::Str("ab".into())),
            Some(&Literal::Bool(false))
        ]
    );
    let Decl::Function(f) = &unit.decls[3] else {
        panic!("expected a function");
    };
    let StmtKind::Print(value) = &f.body.stmts[0].kind else {
        panic!("expected a print");
    };
    assert!(matches!(value.kind, ExprKind::Binary { .. }));
    assert_eq!(value.ty, Some(Type::Int));
}

#[test]
fn test_folding_wraps() {
    let unit = compile_ok(&[("Main", "const X: Int = 9223372036854775807 + 1")]);
    let x = unit.consts().next().unwrap();
    assert_eq!(x.value.as_literal(), Some(&Literal::Int(i64::MIN)));
}

struct Rename;

impl Stage for Rename {
    fn name(&self) -> &'static str {
        "rename"
    }

    fn apply(&mut self, mut unit: Unit) -> Result<Unit, CompilerError> {
        if let Some(Decl::Function(f)) = unit.decls.first_mut() {
            f.name = format!("{}_renamed", f.name);
        }
        Ok(unit)
    }
}

#[test]
fn test_stage_may_not_rename_exports() {
    let (context, mut units) = setup(&[("Main", "fn main() {}")]);
    let pipeline = Pipeline::new().with(factory(|_| Rename));
    let err = pipeline.run(&context, units.remove(0)).unwrap_err();
    let PipelineError::Renamed { stage, unit, .. } = &err else {
        panic!("expected a rename error, got {err}");
    };
    assert_eq!(*stage, "rename");
    assert_eq!(unit.as_str(), "Main");
    assert_eq!(
        err.to_string(),
        "stage `rename` changed the registered shape of `Main`: exports differ in function `main_renamed`, function `main`"
    );
}

struct Record {
    label: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl Stage for Record {
    fn name(&self) -> &'static str {
        self.label
    }

    fn apply(&mut self, unit: Unit) -> Result<Unit, CompilerError> {
        self.log.lock().unwrap().push(self.label);
        if self.label == "fail" {
            return Err(CompilerError::new("stop"));
        }
        Ok(unit)
    }
}

#[test]
fn test_pipeline_runs_in_order_and_stops_at_first_failure() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut pipeline = Pipeline::new();
    for label in ["first", "second", "fail", "never"] {
        let log = Arc::clone(&log);
        pipeline.push(factory(move |_| Record {
            label,
            log: Arc::clone(&log),
        }));
    }
    let (context, mut units) = setup(&[("Main", "")]);
    let err = pipeline.run(&context, units.remove(0)).unwrap_err();
    assert_eq!(err.to_string(), "stop");
    assert_eq!(*log.lock().unwrap(), vec!["first", "second", "fail"]);
}
