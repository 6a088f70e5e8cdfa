//! Dotted compilation-unit identifiers.

use std::fmt;
use std::path::PathBuf;

/// Identifier of one compilation unit, e.g. `a.b.Main`.
///
/// The last segment is the unit's simple name (the source file stem); the
/// preceding segments are its package. The identifier determines both the
/// JVM internal name (`a/b/Main`) and the artifact path (`a/b/Main.class`).
#[derive(Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct UnitId(String);

impl UnitId {
    /// Create an identifier from a dotted path.
    pub fn new(dotted: impl Into<String>) -> Self {
        UnitId(dotted.into())
    }

    /// Create an identifier from an optional package and a simple name.
    pub fn from_parts(package: Option<&str>, name: &str) -> Self {
        match package {
            Some(package) if !package.is_empty() => UnitId(format!("{package}.{name}")),
            _ => UnitId(name.to_string()),
        }
    }

    /// The dotted form.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Segments of the dotted path.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// The last segment.
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// Everything before the last segment, if anything.
    pub fn package(&self) -> Option<&str> {
        self.0.rsplit_once('.').map(|(package, _)| package)
    }

    /// JVM internal name: dots replaced with slashes.
    pub fn internal_name(&self) -> String {
        self.0.replace('.', "/")
    }

    /// Relative artifact path: `a.b.C` with extension `class` is `a/b/C.class`.
    pub fn output_path(&self, extension: &str) -> PathBuf {
        let mut path: PathBuf = self.segments().collect();
        path.set_extension(extension);
        path
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitId {
    fn from(value: &str) -> Self {
        UnitId::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_output_path() {
        let id = UnitId::new("a.b.C");
        assert_eq!(id.output_path("class"), PathBuf::from("a").join("b").join("C.class"));
    }

    #[test]
    fn test_output_path_no_package() {
        let id = UnitId::new("Main");
        assert_eq!(id.output_path("class"), PathBuf::from("Main.class"));
    }

    #[test]
    fn test_parts() {
        let id = UnitId::from_parts(Some("qux.util"), "Math");
        assert_eq!(id.as_str(), "qux.util.Math");
        assert_eq!(id.simple_name(), "Math");
        assert_eq!(id.package(), Some("qux.util"));
        assert_eq!(id.internal_name(), "qux/util/Math");
    }

    #[test]
    fn test_parts_without_package() {
        let id = UnitId::from_parts(None, "Main");
        assert_eq!(id.package(), None);
        assert_eq!(id.simple_name(), "Main");
    }
}
