//! End-to-end builds through the orchestrator.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use qux_diagnostic::CompilerError;
use qux_ir::Unit;
use qux_sema::{default_pipeline, factory, Stage};
use quxc::{BuildReport, Config, Failure, Orchestrator, Toolchain};

/// A source tree in a temporary directory.
struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    fn new() -> Self {
        Project {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn file(&self, relative: &str, text: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, text).unwrap();
        path
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    fn config(&self) -> Config {
        Config {
            outdir: self.path("out"),
            ..Config::default()
        }
    }

    fn build(&self, sources: &[PathBuf]) -> BuildReport {
        Orchestrator::new(self.config()).build(sources).unwrap()
    }
}

fn compiler_error<'a>(report: &'a BuildReport, path: &Path) -> &'a CompilerError {
    match report.get(path).and_then(|r| r.failure()) {
        Some(Failure::Compiler(e)) => e,
        other => panic!("expected a compiler error for {}, got {other:?}", path.display()),
    }
}

const GOOD: &str = "package b\nfn main() {\n    print 1 + 2\n}\n";

#[test]
fn syntax_error_and_valid_unit() {
    let project = Project::new();
    let bad = project.file("src/Bad.qux", "package a\nfn main() {\n    print (1\n}\n");
    let good = project.file("src/Good.qux", GOOD);

    let report = project.build(&[bad.clone(), good.clone()]);
    assert_eq!(report.len(), 2);

    let error = compiler_error(&report, &bad);
    assert_eq!(error.location().map(|l| (l.unit(), l.line())), Some(("a.Bad", 4)));

    let artifact = project.path("out/b/Good.class");
    assert_eq!(report.get(&good).unwrap().artifact(), Some(artifact.as_path()));
    assert_eq!(&fs::read(&artifact).unwrap()[..4], &[0xCA, 0xFE, 0xBA, 0xBE]);
    assert_eq!(report.exit_code(), 1);
}

#[test]
fn parse_failures_do_not_reach_the_pool() {
    let project = Project::new();
    let mut sources = Vec::new();
    for i in 0..6 {
        let text = if i % 3 == 0 {
            format!("fn broken{i}( {{\n")
        } else {
            format!("package p\nconst N{i}: Int = {i}\n")
        };
        sources.push(project.file(&format!("src/U{i}.qux"), &text));
    }

    let report = project.build(&sources);
    assert_eq!(report.len(), 6);
    assert_eq!(report.succeeded(), 4);
    assert_eq!(report.failed(), 2);
    let order: Vec<&Path> = report.iter().map(|(path, _)| path).collect();
    let expected: Vec<&Path> = sources.iter().map(PathBuf::as_path).collect();
    assert_eq!(order, expected);
    for i in [0, 3] {
        compiler_error(&report, &sources[i]);
    }
    assert!(project.path("out/p/U1.class").is_file());
}

#[test]
fn two_undeclared_variables() {
    let project = Project::new();
    let main = project.file(
        "Main.qux",
        "package a\nfn main() {\n    print foo\n    print bar + 1\n}\n",
    );
    let report = project.build(&[main.clone()]);
    let error = compiler_error(&report, &main);
    assert!(error.is_list());
    let leaves: Vec<String> = error.flatten().iter().map(ToString::to_string).collect();
    assert_eq!(
        leaves,
        vec![
            "a.Main@3:10-13: undeclared variable `foo`",
            "a.Main@4:10-13: undeclared variable `bar`",
        ]
    );
}

#[test]
fn forward_references_across_units() {
    let project = Project::new();
    let main = project.file(
        "src/a/Main.qux",
        "package a\nimport q.Math\nfn main() {\n    print Math.twice(Math.LIMIT)\n}\n",
    );
    let math = project.file(
        "src/q/Math.qux",
        "package q\nconst LIMIT: Int = 21\nfn twice(x: Int) -> Int { return x * 2 }\n",
    );
    let report = project.build(&[main, math]);
    assert_eq!(report.exit_code(), 0, "{report:?}");
    assert!(project.path("out/a/Main.class").is_file());
    assert!(project.path("out/q/Math.class").is_file());
}

#[test]
fn cross_unit_type_errors_are_reported() {
    let project = Project::new();
    let main = project.file(
        "Main.qux",
        "package a\nimport q.Math\nfn main() {\n    print Math.twice(true)\n}\n",
    );
    let math = project.file("Math.qux", "package q\nfn twice(x: Int) -> Int { return x * 2 }\n");
    let report = project.build(&[main.clone(), math.clone()]);
    let error = compiler_error(&report, &main);
    assert_eq!(
        error.message(),
        Some("argument 1 of `q.Math.twice`: expected Int, found Bool")
    );
    assert!(report.get(&math).unwrap().is_success());
}

#[test]
fn classpath_units_are_registered_not_built() {
    let project = Project::new();
    project.file(
        "lib/q/Math.qux",
        "package q\nfn twice(x: Int) -> Int { return x * 2 }\n",
    );
    let main = project.file(
        "src/Main.qux",
        "package a\nimport q.Math\nfn main() {\n    print Math.twice(4)\n}\n",
    );
    let config = Config {
        classpath: vec![project.path("lib")],
        ..project.config()
    };
    let report = Orchestrator::new(config).build(&[main.clone()]).unwrap();
    assert_eq!(report.len(), 1);
    assert!(report.get(&main).unwrap().is_success(), "{report:?}");
    assert!(!project.path("out/q/Math.class").exists());

    // Without the classpath the import is unresolved.
    let report = project.build(&[main.clone()]);
    assert_eq!(
        compiler_error(&report, &main).message(),
        Some("cannot find unit `q.Math`")
    );
}

#[test]
fn missing_input_is_a_build_failure() {
    let project = Project::new();
    let missing = project.path("Nope.qux");
    let good = project.file("Good.qux", GOOD);
    let report = project.build(&[missing.clone(), good.clone()]);
    assert!(matches!(
        report.get(&missing).unwrap().failure(),
        Some(Failure::Build(_))
    ));
    assert!(report.get(&good).unwrap().is_success());
}

#[test]
fn repeated_unit_id_is_built_once() {
    let project = Project::new();
    let first = project.file("x/Main.qux", "fn main() {\n    print 1\n}\n");
    let second = project.file("y/Main.qux", "fn main() {\n    print 2\n}\n");
    let report = project.build(&[first.clone(), second.clone()]);

    assert_eq!(report.len(), 2);
    let artifact = project.path("out/Main.class");
    assert_eq!(report.get(&first).unwrap().artifact(), Some(artifact.as_path()));
    match report.get(&second).unwrap().failure() {
        Some(Failure::Build(e)) => assert_eq!(
            e.message(),
            Some(format!("unit `Main` is also defined in '{}'", first.display()).as_str())
        ),
        other => panic!("expected a build error, got {other:?}"),
    }
    assert_eq!(report.exit_code(), 1);
}

/// Sleeps when applied to the unit called `Slow`.
struct Sleepy;

impl Stage for Sleepy {
    fn name(&self) -> &'static str {
        "sleepy"
    }

    fn apply(&mut self, unit: Unit) -> Result<Unit, CompilerError> {
        if unit.id.simple_name() == "Slow" {
            std::thread::sleep(Duration::from_secs(3));
        }
        Ok(unit)
    }
}

#[test]
fn slow_unit_times_out_alone() {
    let project = Project::new();
    let slow = project.file("Slow.qux", "fn main() {}\n");
    let fast = project.file("Fast.qux", "fn main() {}\n");
    let config = Config {
        timeout: Some(Duration::from_millis(300)),
        jobs_multiplier: 2,
        ..project.config()
    };
    let toolchain = Toolchain::new(project.path("out"))
        .with_pipeline(default_pipeline().with(factory(|_| Sleepy)));

    let started = Instant::now();
    let report = Orchestrator::new(config)
        .with_toolchain(toolchain)
        .build(&[slow.clone(), fast.clone()])
        .unwrap();
    assert!(started.elapsed() < Duration::from_secs(3));

    match report.get(&slow).unwrap().failure() {
        Some(Failure::Build(e)) => assert!(e.is_timeout(), "{e}"),
        other => panic!("expected a timeout, got {other:?}"),
    }
    assert!(report.get(&fast).unwrap().is_success());
    assert_eq!(report.exit_code(), 1);
}

#[test]
fn properties_file_feeds_the_build() {
    let project = Project::new();
    let props = project.file(
        "quxc.toml",
        &format!(
            "outdir = {:?}\ncharset = \"iso-8859-1\"\n",
            project.path("classes").display().to_string()
        ),
    );
    let config = Config::layered([quxc::Properties::load(&props).unwrap()]).unwrap();
    let main = project.path("Main.qux");
    fs::write(&main, b"fn main() {\n    print \"caf\xE9\"\n}\n").unwrap();
    let report = Orchestrator::new(config).build(&[main.clone()]).unwrap();
    assert!(report.get(&main).unwrap().is_success(), "{report:?}");
    assert!(project.path("classes/Main.class").is_file());
}
