use std::path::{Path, PathBuf};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use qux_ir::{Descriptor, Signature, Type, TypeName, UnitId};

use super::{ReadError, Resource, ResourceRegistry};

fn unit(stem: &str, text: &str) -> qux_ir::Unit {
    qux_parse::parse(stem, text).unwrap()
}

#[test]
fn test_from_unit_qualifies_type_names() {
    let unit = unit(
        "Geo",
        "package a\n\
         import q.Units\n\
         type Meters = Int\n\
         const ORIGIN: Meters = 0\n\
         fn scale(by: Units.Factor, m: Meters) -> Bool { return true }",
    );
    let resource = Resource::from_unit(&unit);
    assert_eq!(resource.id().as_str(), "a.Geo");
    assert_eq!(resource.imports(), &[UnitId::new("q.Units")]);
    assert_eq!(
        resource.lookup_type_type("Meters"),
        Some(&Descriptor::Value(Type::Int))
    );
    assert_eq!(
        resource.lookup_constant_type("ORIGIN"),
        Some(&Descriptor::Value(Type::Named(TypeName::new(
            Some("a.Geo".into()),
            "Meters"
        ))))
    );
    assert_eq!(
        resource
            .lookup_function_type("scale")
            .map(ToString::to_string),
        Some("(q.Units.Factor, a.Geo.Meters) -> Bool".to_string())
    );
    assert_eq!(resource.lookup_function_type("ORIGIN"), None);
}

#[test]
fn test_last_write_wins() {
    let id = UnitId::new("a.Util");
    let mut registry = ResourceRegistry::new();
    registry.add_resources(
        "qux",
        [Resource::new(id.clone()).with_constant("X", Type::Int)],
    );
    registry.add_resources(
        "qux",
        [Resource::new(id.clone()).with_constant("X", Type::Str)],
    );
    let found = registry.lookup("qux", &id).unwrap();
    assert_eq!(
        found.lookup_constant_type("X"),
        Some(&Descriptor::Value(Type::Str))
    );
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_lookup_is_per_kind() {
    let id = UnitId::new("a.Util");
    let mut registry = ResourceRegistry::new();
    registry.add_resources("qux", [Resource::new(id.clone())]);
    assert!(registry.contains("qux", &id));
    assert!(!registry.contains("class", &id));
    assert_eq!(registry.ids("qux"), vec![&id]);
    assert!(registry.ids("class").is_empty());
}

#[test]
fn test_read_through_registered_reader() {
    let mut registry = ResourceRegistry::new();
    registry.register(
        "qux",
        Arc::new(|path: &Path| {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
            let resource = Resource::new(UnitId::new(stem)).with_function(
                "f",
                Signature {
                    params: vec![],
                    ret: Type::Void,
                },
            );
            Ok::<_, ReadError>(resource)
        }),
    );
    assert!(registry.has_reader("qux"));
    let resource = registry.read("qux", &PathBuf::from("lib/Util.qux")).unwrap();
    assert_eq!(resource.id().as_str(), "Util");
    assert!(registry.is_empty());
}

#[test]
fn test_read_without_reader() {
    let registry = ResourceRegistry::new();
    let err = registry.read("qux", Path::new("Util.qux")).unwrap_err();
    assert!(matches!(err, ReadError::Build(_)));
    assert_eq!(
        err.to_string(),
        "no reader registered for `.qux` files (reading Util.qux)"
    );
}
