//! The table of registered resources.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use qux_diagnostic::{BuildError, CompilerError};
use qux_ir::UnitId;

use super::Resource;

/// Why a reader could not produce a resource.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ReadError {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Compiler(#[from] CompilerError),
}

/// Turns a file of one kind into a resource.
pub type ResourceReader = Arc<dyn Fn(&Path) -> Result<Resource, ReadError> + Send + Sync>;

/// Resources of every registered unit, keyed by kind and unit id.
///
/// The registry is filled through `&mut` during the sequential front end
/// and then shared read-only (behind an `Arc`) with every build job.
/// Adding a resource for an id that is already present replaces it.
#[derive(Default)]
pub struct ResourceRegistry {
    readers: FxHashMap<String, ResourceReader>,
    resources: FxHashMap<String, FxHashMap<UnitId, Arc<Resource>>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the reader for files of `kind` (a file extension).
    pub fn register(&mut self, kind: impl Into<String>, reader: ResourceReader) {
        let kind = kind.into();
        tracing::trace!(%kind, "registered resource reader");
        self.readers.insert(kind, reader);
    }

    /// Whether a reader is installed for `kind`.
    pub fn has_reader(&self, kind: &str) -> bool {
        self.readers.contains_key(kind)
    }

    /// Read the file at `path` with the reader for `kind`.
    ///
    /// The resource is returned, not added.
    pub fn read(&self, kind: &str, path: &Path) -> Result<Resource, ReadError> {
        let reader = self.readers.get(kind).ok_or_else(|| {
            BuildError::new(format!(
                "no reader registered for `.{kind}` files (reading {})",
                path.display()
            ))
        })?;
        reader(path)
    }

    /// Add resources of `kind`, replacing any with the same id.
    pub fn add_resources(&mut self, kind: &str, resources: impl IntoIterator<Item = Resource>) {
        let table = self.resources.entry(kind.to_string()).or_default();
        for resource in resources {
            let id = resource.id().clone();
            if table.insert(id.clone(), Arc::new(resource)).is_some() {
                tracing::debug!(%kind, unit = %id, "replaced registered resource");
            } else {
                tracing::trace!(%kind, unit = %id, "registered resource");
            }
        }
    }

    /// The resource registered for `id`.
    pub fn lookup(&self, kind: &str, id: &UnitId) -> Option<&Arc<Resource>> {
        self.resources.get(kind)?.get(id)
    }

    /// Whether `id` is registered under `kind`.
    pub fn contains(&self, kind: &str, id: &UnitId) -> bool {
        self.lookup(kind, id).is_some()
    }

    /// Ids registered under `kind`, sorted.
    pub fn ids(&self, kind: &str) -> Vec<&UnitId> {
        let mut ids: Vec<&UnitId> = self
            .resources
            .get(kind)
            .map(|table| table.keys().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// Total number of registered resources across kinds.
    pub fn len(&self) -> usize {
        self.resources.values().map(FxHashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&String> = self.readers.keys().collect();
        kinds.sort();
        f.debug_struct("ResourceRegistry")
            .field("readers", &kinds)
            .field("resources", &self.len())
            .finish()
    }
}
