//! The standard stages, in pipeline order.

mod duplicates;
pub mod fold;
mod resolve;
mod typeck;

pub use duplicates::Duplicates;
pub use fold::Folder;
pub use resolve::Resolver;
pub use typeck::TypeChecker;

use crate::stage::{factory, Pipeline};

/// duplicates, resolve, typeck, fold.
pub fn default_pipeline() -> Pipeline {
    Pipeline::new()
        .with(factory(|_| Duplicates))
        .with(factory(Resolver::new))
        .with(factory(TypeChecker::new))
        .with(factory(|_| Folder))
}

#[cfg(test)]
mod tests;
