//! Qux semantic analysis.
//!
//! - [`Environment`]: the scope chain every pass uses for locals
//! - [`ResourceRegistry`] and [`Resource`]: what each unit exports, keyed
//!   by unit id, for cross-unit checks
//! - [`BuildContext`]: the read-only state shared by all stages of a build
//! - [`Stage`] and [`Pipeline`]: composable passes over a [`qux_ir::Unit`]
//! - [`passes`]: the standard stages and [`default_pipeline`]

mod context;
mod environment;
pub mod passes;
pub mod resource;
mod stage;

pub use context::{BuildContext, CompileOptions};
pub use environment::{Environment, EnvironmentError};
pub use passes::default_pipeline;
pub use resource::{ReadError, Resource, ResourceReader, ResourceRegistry};
pub use stage::{factory, Pipeline, PipelineError, Stage, StageFactory};
