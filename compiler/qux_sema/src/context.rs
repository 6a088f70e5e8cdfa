//! Shared, read-only state handed to every stage.

use std::sync::Arc;

use qux_ir::UnitId;

use crate::resource::{Resource, ResourceRegistry};

/// Options that affect how stages interpret a unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileOptions {
    /// Registry kind under which source units (and their imports) are
    /// registered.
    pub kind: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            kind: "qux".to_string(),
        }
    }
}

/// Everything a stage may consult besides the unit it transforms.
///
/// Cloning is cheap: the registry and options are shared. There is no way
/// to mutate either through a context.
#[derive(Clone, Debug)]
pub struct BuildContext {
    registry: Arc<ResourceRegistry>,
    options: Arc<CompileOptions>,
}

impl BuildContext {
    pub fn new(registry: Arc<ResourceRegistry>, options: CompileOptions) -> Self {
        BuildContext {
            registry,
            options: Arc::new(options),
        }
    }

    /// A context over an empty registry.
    pub fn empty() -> Self {
        Self::new(Arc::new(ResourceRegistry::new()), CompileOptions::default())
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// The registered resource of a source unit.
    pub fn resource(&self, id: &UnitId) -> Option<&Resource> {
        self.registry
            .lookup(&self.options.kind, id)
            .map(|resource| &**resource)
    }

    /// Ids of every registered source unit, sorted.
    pub fn registered_units(&self) -> Vec<&UnitId> {
        self.registry.ids(&self.options.kind)
    }
}
