use std::fs;

use pretty_assertions::assert_eq;

use super::*;

fn registry_with(sources: &[(&str, &str)]) -> ResourceRegistry {
    let mut registry = ResourceRegistry::new();
    registry.register("qux", source_reader(Charset::Utf8));
    registry.add_resources(
        "qux",
        sources
            .iter()
            .map(|(stem, text)| Resource::from_unit(&qux_parse::parse(stem, text).unwrap())),
    );
    registry
}

fn ids(registry: &ResourceRegistry) -> Vec<&str> {
    registry.ids("qux").into_iter().map(UnitId::as_str).collect()
}

#[test]
fn test_classpath_is_followed_transitively() {
    let lib = tempfile::tempdir().unwrap();
    fs::create_dir_all(lib.path().join("q")).unwrap();
    fs::create_dir_all(lib.path().join("r")).unwrap();
    fs::write(
        lib.path().join("q/Math.qux"),
        "package q\nimport r.Units\nfn twice(x: Int) -> Int { return x * 2 }\n",
    )
    .unwrap();
    fs::write(lib.path().join("r/Units.qux"), "package r\ntype Meters = Int\n").unwrap();

    let mut registry = registry_with(&[("Main", "package a\nimport q.Math\n")]);
    resolve_classpath(&mut registry, "qux", &[lib.path().to_path_buf()]);
    assert_eq!(ids(&registry), vec!["a.Main", "q.Math", "r.Units"]);
    let math = registry.lookup("qux", &UnitId::new("q.Math")).unwrap();
    assert!(math.lookup_function_type("twice").is_some());
}

#[test]
fn test_later_classpath_entries_are_searched() {
    let empty = tempfile::tempdir().unwrap();
    let lib = tempfile::tempdir().unwrap();
    fs::create_dir_all(lib.path().join("q")).unwrap();
    fs::write(lib.path().join("q/Math.qux"), "package q\nconst PI: Int = 3\n").unwrap();

    let mut registry = registry_with(&[("Main", "package a\nimport q.Math\n")]);
    resolve_classpath(
        &mut registry,
        "qux",
        &[empty.path().to_path_buf(), lib.path().to_path_buf()],
    );
    assert_eq!(ids(&registry), vec!["a.Main", "q.Math"]);
}

#[test]
fn test_units_being_built_win_over_classpath() {
    let lib = tempfile::tempdir().unwrap();
    fs::create_dir_all(lib.path().join("q")).unwrap();
    fs::write(lib.path().join("q/Math.qux"), "package q\nconst OLD: Int = 1\n").unwrap();

    let mut registry = registry_with(&[
        ("Main", "package a\nimport q.Math\n"),
        ("Math", "package q\nconst NEW: Int = 2\n"),
    ]);
    resolve_classpath(&mut registry, "qux", &[lib.path().to_path_buf()]);
    let math = registry.lookup("qux", &UnitId::new("q.Math")).unwrap();
    assert!(math.lookup_constant_type("NEW").is_some());
    assert!(math.lookup_constant_type("OLD").is_none());
}

#[test]
fn test_classpath_unit_with_another_id_is_skipped() {
    let lib = tempfile::tempdir().unwrap();
    fs::create_dir_all(lib.path().join("q")).unwrap();
    fs::write(lib.path().join("q/Math.qux"), "package z\nconst OLD: Int = 1\n").unwrap();

    let mut registry = registry_with(&[
        ("Main", "package a\nimport q.Math\n"),
        ("Math", "package z\nconst NEW: Int = 2\n"),
    ]);
    resolve_classpath(&mut registry, "qux", &[lib.path().to_path_buf()]);
    assert_eq!(ids(&registry), vec!["a.Main", "z.Math"]);
    let math = registry.lookup("qux", &UnitId::new("z.Math")).unwrap();
    assert!(math.lookup_constant_type("NEW").is_some());
    assert!(math.lookup_constant_type("OLD").is_none());
}

#[test]
fn test_missing_and_broken_imports_are_left_alone() {
    let lib = tempfile::tempdir().unwrap();
    fs::create_dir_all(lib.path().join("q")).unwrap();
    fs::write(lib.path().join("q/Broken.qux"), "package q\nfn (\n").unwrap();

    let mut registry = registry_with(&[(
        "Main",
        "package a\nimport q.Broken\nimport z.Nowhere\n",
    )]);
    resolve_classpath(&mut registry, "qux", &[lib.path().to_path_buf()]);
    assert_eq!(ids(&registry), vec!["a.Main"]);
}
