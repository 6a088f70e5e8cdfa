//! Pipeline stages and their composition.
//!
//! A [`Pipeline`] is an ordered list of stage factories. For each job it
//! builds every stage from the job's [`BuildContext`] and threads the unit
//! through them in order, stopping at the first error.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashSet;

use qux_diagnostic::CompilerError;
use qux_ir::{Export, Unit, UnitId};

use crate::context::BuildContext;

/// One semantic or lowering pass over a unit.
///
/// A stage may rewrite anything inside the unit except its id and its
/// exported declaration set, which other units already depend on. A stage
/// that finds several independent problems reports them all as one list
/// error.
pub trait Stage {
    /// Short name used in logs and internal errors.
    fn name(&self) -> &'static str;

    fn apply(&mut self, unit: Unit) -> Result<Unit, CompilerError>;
}

/// Builds a fresh stage for one job.
pub type StageFactory = Arc<dyn Fn(&BuildContext) -> Box<dyn Stage> + Send + Sync>;

/// Wrap a constructor as a [`StageFactory`].
pub fn factory<S, F>(make: F) -> StageFactory
where
    S: Stage + 'static,
    F: Fn(&BuildContext) -> S + Send + Sync + 'static,
{
    Arc::new(move |context: &BuildContext| Box::new(make(context)) as Box<dyn Stage>)
}

/// Why a pipeline stopped.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A stage rejected the unit.
    #[error(transparent)]
    Compiler(#[from] CompilerError),
    /// A stage changed what the unit exposes to other units.
    #[error("stage `{stage}` changed the registered shape of `{unit}`: {detail}")]
    Renamed {
        stage: &'static str,
        unit: UnitId,
        detail: String,
    },
}

/// Ordered stage factories.
#[derive(Clone, Default)]
pub struct Pipeline {
    factories: Vec<StageFactory>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage.
    #[must_use]
    pub fn with(mut self, factory: StageFactory) -> Self {
        self.factories.push(factory);
        self
    }

    pub fn push(&mut self, factory: StageFactory) {
        self.factories.push(factory);
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Build every stage from `context` and apply them in order.
    pub fn run(&self, context: &BuildContext, mut unit: Unit) -> Result<Unit, PipelineError> {
        let id = unit.id.clone();
        let exports = unit.exports();
        for make in &self.factories {
            let mut stage = make(context);
            let name = stage.name();
            let span = tracing::debug_span!("stage", name);
            let _guard = span.enter();
            unit = stage.apply(unit)?;
            check_shape(name, &id, &exports, &unit)?;
            tracing::trace!("stage finished");
        }
        Ok(unit)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.factories.len())
            .finish()
    }
}

/// Fail if `stage` changed the unit's id or export set.
fn check_shape(
    stage: &'static str,
    id: &UnitId,
    exports: &FxHashSet<Export>,
    unit: &Unit,
) -> Result<(), PipelineError> {
    if unit.id != *id {
        return Err(PipelineError::Renamed {
            stage,
            unit: id.clone(),
            detail: format!("id became `{}`", unit.id),
        });
    }
    let after = unit.exports();
    if after != *exports {
        let mut changed: Vec<String> = exports
            .symmetric_difference(&after)
            .map(|e| format!("{} `{}`", e.kind, e.name))
            .collect();
        changed.sort();
        return Err(PipelineError::Renamed {
            stage,
            unit: id.clone(),
            detail: format!("exports differ in {}", changed.join(", ")),
        });
    }
    Ok(())
}
