//! Building a set of units.
//!
//! # Phases
//!
//! 1. **Front end** (this thread): read and parse every input, register
//!    each parsed unit, then pull in imported units from the classpath.
//!    Parse failures and repeated unit ids are final results and never
//!    reach the pool.
//! 2. **Jobs** (worker pool): one [`BuildJob`] per parsed unit, all sharing
//!    the now read-only registry.
//! 3. **Collection** (this thread): drain one result per job from the
//!    results channel, timing out individual jobs that run too long.
//!
//! The returned [`BuildReport`] has exactly one result per input.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crossbeam::channel::{self, Receiver, RecvTimeoutError};
use rustc_hash::{FxHashMap, FxHashSet};

use qux_diagnostic::BuildError;
use qux_ir::{Unit, UnitId};
use qux_parse::SOURCE_EXTENSION;
use qux_sema::{BuildContext, CompileOptions, ReadError, Resource, ResourceReader, ResourceRegistry};

use crate::config::{Charset, Config};
use crate::job::{parse_file, BuildJob, JobInput, Toolchain};
use crate::result::{BuildReport, BuildResult, InternalError};
use crate::sources::{read_source, stem};

/// Stack for pool workers. Stages also grow the stack on demand.
const WORKER_STACK: usize = 16 * 1024 * 1024;

/// The worker pool could not be created.
#[derive(Debug, thiserror::Error)]
#[error("failed to start the worker pool: {0}")]
pub struct PoolError(#[from] rayon::ThreadPoolBuildError);

/// Messages from workers to the collecting thread.
enum Event {
    Started { index: usize, at: Instant },
    Finished { index: usize, result: BuildResult },
}

/// Reader for `.qux` files on the classpath.
pub fn source_reader(charset: Charset) -> ResourceReader {
    Arc::new(move |path: &Path| {
        let text = read_source(path, charset)?;
        let unit = qux_parse::parse(&stem(path), &text)?;
        Ok::<_, ReadError>(Resource::from_unit(&unit))
    })
}

/// Runs builds with one configuration and toolchain.
#[derive(Debug)]
pub struct Orchestrator {
    config: Config,
    toolchain: Toolchain,
}

impl Orchestrator {
    /// The default toolchain writing to `config.outdir`.
    pub fn new(config: Config) -> Self {
        let toolchain = Toolchain::new(config.outdir.clone()).with_charset(config.charset);
        Orchestrator { config, toolchain }
    }

    /// Replace the toolchain; its charset is kept in line with the config.
    #[must_use]
    pub fn with_toolchain(mut self, toolchain: Toolchain) -> Self {
        self.toolchain = toolchain.with_charset(self.config.charset);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build every file in `sources`.
    ///
    /// Only a failure to start the worker pool aborts the build; every
    /// other problem is recorded against the unit it belongs to.
    pub fn build(&self, sources: &[PathBuf]) -> Result<BuildReport, PoolError> {
        let span = tracing::info_span!("build", units = sources.len());
        let _guard = span.enter();

        let mut results: Vec<Option<BuildResult>> = Vec::with_capacity(sources.len());
        results.resize_with(sources.len(), || None);

        let (context, parsed) = self.front_end(sources, &mut results);
        if !parsed.is_empty() {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.worker_count())
                .stack_size(WORKER_STACK)
                .thread_name(|i| format!("quxc-worker-{i}"))
                .build()?;
            let receiver = self.submit(&pool, &context, parsed);
            self.collect(&receiver, &mut results);
        }

        let mut report = BuildReport::new();
        for (path, result) in sources.iter().zip(results) {
            let result = result
                .unwrap_or_else(|| BuildResult::Internal(InternalError::new("no result was recorded")));
            report.push(path.clone(), result);
        }
        tracing::info!(
            built = report.succeeded(),
            failed = report.failed(),
            "build finished"
        );
        Ok(report)
    }

    /// Parse and register every input, then resolve the classpath.
    fn front_end(
        &self,
        sources: &[PathBuf],
        results: &mut [Option<BuildResult>],
    ) -> (BuildContext, Vec<(usize, Unit)>) {
        let span = tracing::debug_span!("front_end");
        let _guard = span.enter();
        let kind = CompileOptions::default().kind;

        let mut parsed = Vec::new();
        let mut seen: FxHashMap<UnitId, usize> = FxHashMap::default();
        for (index, path) in sources.iter().enumerate() {
            match parse_file(path, self.config.charset) {
                Ok(unit) => {
                    if let Some(&first) = seen.get(&unit.id) {
                        tracing::debug!(path = %path.display(), unit = %unit.id, "duplicate unit");
                        let error = BuildError::new(format!(
                            "unit `{}` is also defined in '{}'",
                            unit.id,
                            sources[first].display()
                        ));
                        results[index] = Some(error.into());
                        continue;
                    }
                    tracing::debug!(path = %path.display(), unit = %unit.id, "parsed");
                    seen.insert(unit.id.clone(), index);
                    parsed.push((index, unit));
                }
                Err(result) => {
                    tracing::debug!(path = %path.display(), "front end failed");
                    results[index] = Some(result);
                }
            }
        }

        let mut registry = ResourceRegistry::new();
        registry.register(kind.clone(), source_reader(self.config.charset));
        registry.add_resources(&kind, parsed.iter().map(|(_, unit)| Resource::from_unit(unit)));
        resolve_classpath(&mut registry, &kind, &self.config.classpath);

        let context = BuildContext::new(Arc::new(registry), CompileOptions { kind });
        (context, parsed)
    }

    /// Spawn one job per parsed unit.
    fn submit(
        &self,
        pool: &rayon::ThreadPool,
        context: &BuildContext,
        parsed: Vec<(usize, Unit)>,
    ) -> Receiver<Event> {
        let (sender, receiver) = channel::unbounded();
        for (index, unit) in parsed {
            let job = BuildJob::new(JobInput::Parsed(unit), context.clone(), self.toolchain.clone());
            let sender = sender.clone();
            pool.spawn(move || {
                // The collector may have stopped listening; nothing to do then.
                let _ = sender.send(Event::Started {
                    index,
                    at: Instant::now(),
                });
                let result = catch_unwind(AssertUnwindSafe(|| job.run())).unwrap_or_else(|_| {
                    tracing::error!(index, "build job panicked");
                    BuildResult::Internal(InternalError::new("build job panicked"))
                });
                let _ = sender.send(Event::Finished { index, result });
            });
        }
        receiver
    }

    /// Wait until every outstanding slot in `results` is filled.
    fn collect(&self, receiver: &Receiver<Event>, results: &mut [Option<BuildResult>]) {
        let mut outstanding = results.iter().filter(|r| r.is_none()).count();
        let mut running: FxHashMap<usize, Instant> = FxHashMap::default();

        while outstanding > 0 {
            let deadline = self
                .config
                .timeout
                .and_then(|limit| running.values().min().map(|start| *start + limit));
            let event = match deadline {
                Some(deadline) => receiver.recv_deadline(deadline),
                None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            match event {
                Ok(Event::Started { index, at }) => {
                    running.insert(index, at);
                }
                Ok(Event::Finished { index, result }) => {
                    running.remove(&index);
                    if results[index].is_some() {
                        tracing::debug!(index, "discarding result of a timed-out job");
                        continue;
                    }
                    results[index] = Some(result);
                    outstanding -= 1;
                }
                Err(RecvTimeoutError::Timeout) => {
                    let Some(limit) = self.config.timeout else {
                        continue;
                    };
                    let now = Instant::now();
                    let expired: Vec<usize> = running
                        .iter()
                        .filter(|(_, start)| now.duration_since(**start) >= limit)
                        .map(|(index, _)| *index)
                        .collect();
                    for index in expired {
                        running.remove(&index);
                        tracing::warn!(index, ?limit, "build timed out");
                        results[index] = Some(BuildError::timed_out(limit).into());
                        outstanding -= 1;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::error!(outstanding, "workers stopped before reporting");
                    for slot in results.iter_mut().filter(|r| r.is_none()) {
                        *slot = Some(BuildResult::Internal(InternalError::new(
                            "build job ended without a result",
                        )));
                    }
                    break;
                }
            }
        }
    }
}

/// Register classpath units that the registered units import, transitively.
///
/// An import found nowhere is left for the resolver to report. A classpath
/// file that cannot be read or parsed, or that declares a unit other than
/// the one its path names, is skipped with a warning. Registered units are
/// never replaced.
pub fn resolve_classpath(registry: &mut ResourceRegistry, kind: &str, classpath: &[PathBuf]) {
    if classpath.is_empty() {
        return;
    }
    let mut pending: Vec<UnitId> = registry
        .ids(kind)
        .into_iter()
        .filter_map(|id| registry.lookup(kind, id))
        .flat_map(|resource| resource.imports().to_vec())
        .collect();
    let mut tried: FxHashSet<UnitId> = FxHashSet::default();

    while let Some(id) = pending.pop() {
        if registry.contains(kind, &id) || !tried.insert(id.clone()) {
            continue;
        }
        let relative = id.output_path(SOURCE_EXTENSION);
        let Some(path) = classpath
            .iter()
            .map(|dir| dir.join(&relative))
            .find(|path| path.is_file())
        else {
            tracing::debug!(unit = %id, "not on the classpath");
            continue;
        };
        match registry.read(kind, &path) {
            Ok(resource) if *resource.id() != id => {
                tracing::warn!(
                    path = %path.display(),
                    expected = %id,
                    found = %resource.id(),
                    "skipping classpath unit declaring another id"
                );
            }
            Ok(resource) => {
                tracing::debug!(unit = %resource.id(), path = %path.display(), "classpath unit");
                pending.extend(resource.imports().iter().cloned());
                registry.add_resources(kind, [resource]);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping classpath unit");
            }
        }
    }
}

/// Shorthand for a build with the default toolchain.
pub fn build(config: Config, sources: &[PathBuf]) -> Result<BuildReport, PoolError> {
    Orchestrator::new(config).build(sources)
}

#[cfg(test)]
mod tests;
