//! Resource facades and the registry that holds them.
//!
//! A [`Resource`] is the read-only summary of one unit's exported
//! declarations: for every constant, function and type alias, its
//! [`Descriptor`]. Stages use it to check references into other units
//! without ever seeing those units' IR.

mod registry;

pub use registry::{ReadError, ResourceReader, ResourceRegistry};

use rustc_hash::FxHashMap;

use qux_ir::{Decl, Descriptor, Signature, Type, TypeName, Unit, UnitId};

/// Read-only view of one unit's exported declarations.
///
/// Type names inside descriptors are fully qualified: a local alias is
/// qualified with the declaring unit's id and an import qualifier is
/// replaced with the imported unit's id. An import qualifier that names no
/// import is kept as written; the resolver reports it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resource {
    id: UnitId,
    imports: Vec<UnitId>,
    constants: FxHashMap<String, Descriptor>,
    functions: FxHashMap<String, Descriptor>,
    types: FxHashMap<String, Descriptor>,
}

impl Resource {
    /// An empty facade for `id`.
    pub fn new(id: UnitId) -> Self {
        Resource {
            id,
            imports: Vec::new(),
            constants: FxHashMap::default(),
            functions: FxHashMap::default(),
            types: FxHashMap::default(),
        }
    }

    /// Summarize a freshly parsed unit.
    pub fn from_unit(unit: &Unit) -> Self {
        let mut resource = Resource::new(unit.id.clone());
        resource.imports = unit.imports.iter().map(|i| i.id.clone()).collect();
        let qualify = |ty: &Type| qualify(ty, unit);
        for decl in &unit.decls {
            match decl {
                Decl::Const(c) => {
                    resource
                        .constants
                        .insert(c.name.clone(), Descriptor::Value(qualify(&c.ty.ty)));
                }
                Decl::Function(f) => {
                    let signature = Signature {
                        params: f.params.iter().map(|p| qualify(&p.ty.ty)).collect(),
                        ret: qualify(&f.ret.ty),
                    };
                    resource
                        .functions
                        .insert(f.name.clone(), Descriptor::Function(signature));
                }
                Decl::Type(t) => {
                    resource
                        .types
                        .insert(t.name.clone(), Descriptor::Value(qualify(&t.target.ty)));
                }
            }
        }
        resource
    }

    pub fn id(&self) -> &UnitId {
        &self.id
    }

    /// Units this one imports, in source order.
    pub fn imports(&self) -> &[UnitId] {
        &self.imports
    }

    /// Type of the constant `name`.
    pub fn lookup_constant_type(&self, name: &str) -> Option<&Descriptor> {
        self.constants.get(name)
    }

    /// Signature of the function `name`.
    pub fn lookup_function_type(&self, name: &str) -> Option<&Descriptor> {
        self.functions.get(name)
    }

    /// Target of the type alias `name`.
    pub fn lookup_type_type(&self, name: &str) -> Option<&Descriptor> {
        self.types.get(name)
    }

    /// Add or replace a constant.
    #[must_use]
    pub fn with_constant(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.constants.insert(name.into(), Descriptor::Value(ty));
        self
    }

    /// Add or replace a function.
    #[must_use]
    pub fn with_function(mut self, name: impl Into<String>, signature: Signature) -> Self {
        self.functions
            .insert(name.into(), Descriptor::Function(signature));
        self
    }

    /// Add or replace a type alias.
    #[must_use]
    pub fn with_type(mut self, name: impl Into<String>, target: Type) -> Self {
        self.types.insert(name.into(), Descriptor::Value(target));
        self
    }
}

/// Rewrite a type written in `unit` so its qualifier is a full unit id.
pub fn qualify(ty: &Type, unit: &Unit) -> Type {
    match ty {
        Type::Named(TypeName {
            qualifier: None,
            name,
        }) => Type::Named(TypeName::new(Some(unit.id.to_string()), name.clone())),
        Type::Named(TypeName {
            qualifier: Some(alias),
            name,
        }) => match unit.import(alias) {
            Some(import) => Type::Named(TypeName::new(Some(import.id.to_string()), name.clone())),
            None => ty.clone(),
        },
        primitive => primitive.clone(),
    }
}

#[cfg(test)]
mod tests;
