//! Semantic types and declaration descriptors.

use std::fmt;

/// A Qux type.
///
/// `Named` is a reference to a type alias declared with `type`. Aliases only
/// ever name a primitive type, so resolving a `Named` type takes a single
/// registry lookup. After type checking, declarations carry primitive types
/// only.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Type {
    Int,
    Bool,
    Str,
    Void,
    Named(TypeName),
}

impl Type {
    /// Check whether this is one of the built-in types.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Type::Named(_))
    }

    /// Check whether a value of this type can be stored or passed.
    pub fn is_value(&self) -> bool {
        !matches!(self, Type::Void)
    }

    /// Parse a built-in type keyword.
    pub fn primitive(name: &str) -> Option<Type> {
        match name {
            "Int" => Some(Type::Int),
            "Bool" => Some(Type::Bool),
            "Str" => Some(Type::Str),
            "Void" => Some(Type::Void),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => f.write_str("Int"),
            Type::Bool => f.write_str("Bool"),
            Type::Str => f.write_str("Str"),
            Type::Void => f.write_str("Void"),
            Type::Named(name) => write!(f, "{name}"),
        }
    }
}

/// Name of a type alias, optionally qualified.
///
/// In source the qualifier is an import's simple name (`Units.Meters`). In a
/// registered resource the qualifier is always the owning unit's full dotted
/// identifier, so the name stays meaningful outside the declaring unit.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct TypeName {
    pub qualifier: Option<String>,
    pub name: String,
}

impl TypeName {
    pub fn new(qualifier: Option<String>, name: impl Into<String>) -> Self {
        TypeName {
            qualifier,
            name: name.into(),
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{qualifier}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Parameter and result types of a function.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Signature {
    pub params: Vec<Type>,
    pub ret: Type,
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, ") -> {}", self.ret)
    }
}

/// Structural type signature of an exported declaration.
///
/// Constants and type aliases describe a single value type; functions
/// describe their full signature.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Descriptor {
    Value(Type),
    Function(Signature),
}

impl Descriptor {
    /// The value type, if this describes a constant or alias.
    pub fn as_value(&self) -> Option<&Type> {
        match self {
            Descriptor::Value(ty) => Some(ty),
            Descriptor::Function(_) => None,
        }
    }

    /// The signature, if this describes a function.
    pub fn as_function(&self) -> Option<&Signature> {
        match self {
            Descriptor::Function(signature) => Some(signature),
            Descriptor::Value(_) => None,
        }
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::Value(ty) => write!(f, "{ty}"),
            Descriptor::Function(signature) => write!(f, "{signature}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_display() {
        let sig = Signature {
            params: vec![Type::Int, Type::Named(TypeName::new(Some("a.Units".into()), "Meters"))],
            ret: Type::Bool,
        };
        assert_eq!(sig.to_string(), "(Int, a.Units.Meters) -> Bool");
        assert_eq!(Descriptor::Function(sig).to_string(), "(Int, a.Units.Meters) -> Bool");
    }

    #[test]
    fn test_primitive_keywords() {
        assert_eq!(Type::primitive("Int"), Some(Type::Int));
        assert_eq!(Type::primitive("Void"), Some(Type::Void));
        assert_eq!(Type::primitive("Meters"), None);
    }

    #[test]
    fn test_descriptor_accessors() {
        let value = Descriptor::Value(Type::Str);
        assert_eq!(value.as_value(), Some(&Type::Str));
        assert!(value.as_function().is_none());
    }
}
