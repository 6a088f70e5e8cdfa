//! Compiling one unit end to end.
//!
//! ```text
//! input ──► parse? ──► stage 0 ─► ... ─► stage n ──► translate ──► write
//! ```
//!
//! The first failure ends the job. Parse and stage errors are the user's;
//! translation and write problems are internal, since a unit that passed
//! every stage should always translate.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use qux_ir::Unit;
use qux_jvm::{ClassTranslator, Translator};
use qux_sema::{default_pipeline, BuildContext, Pipeline, PipelineError};

use crate::config::Charset;
use crate::result::{BuildResult, InternalError};
use crate::sources::{read_source, stem};

/// What a job starts from.
#[derive(Debug)]
pub enum JobInput {
    /// A source file, read and parsed by the job.
    Path(PathBuf),
    /// A unit the orchestrator already parsed and registered.
    Parsed(Unit),
}

/// The parts of a build shared by every job: stages, back end and output
/// settings.
#[derive(Clone)]
pub struct Toolchain {
    pub pipeline: Pipeline,
    pub translator: Arc<dyn Translator>,
    pub outdir: PathBuf,
    pub charset: Charset,
}

impl Toolchain {
    /// The standard stages and the class-file back end.
    pub fn new(outdir: impl Into<PathBuf>) -> Self {
        Toolchain {
            pipeline: default_pipeline(),
            translator: Arc::new(ClassTranslator),
            outdir: outdir.into(),
            charset: Charset::Utf8,
        }
    }

    #[must_use]
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    #[must_use]
    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    #[must_use]
    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    /// Where the artifact for `unit` goes.
    pub fn artifact_path(&self, unit: &Unit) -> PathBuf {
        self.outdir
            .join(unit.id.output_path(self.translator.extension()))
    }
}

impl std::fmt::Debug for Toolchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolchain")
            .field("stages", &self.pipeline.len())
            .field("extension", &self.translator.extension())
            .field("outdir", &self.outdir)
            .field("charset", &self.charset)
            .finish()
    }
}

/// The compilation of exactly one unit.
pub struct BuildJob {
    input: JobInput,
    context: BuildContext,
    toolchain: Toolchain,
}

impl BuildJob {
    pub fn new(input: JobInput, context: BuildContext, toolchain: Toolchain) -> Self {
        BuildJob {
            input,
            context,
            toolchain,
        }
    }

    /// Run to completion. Never panics on bad input; every outcome is a
    /// [`BuildResult`].
    pub fn run(self) -> BuildResult {
        let unit = match self.input {
            JobInput::Parsed(unit) => unit,
            JobInput::Path(path) => match parse_file(&path, self.toolchain.charset) {
                Ok(unit) => unit,
                Err(result) => return result,
            },
        };

        let span = tracing::info_span!("job", unit = %unit.id);
        let _guard = span.enter();

        let unit = match self.toolchain.pipeline.run(&self.context, unit) {
            Ok(unit) => unit,
            Err(PipelineError::Compiler(e)) => {
                tracing::debug!(errors = e.len(), "rejected");
                return e.into();
            }
            Err(e @ PipelineError::Renamed { .. }) => {
                return internal(InternalError::with_cause(
                    "a stage changed a registered unit",
                    e,
                ));
            }
        };

        let bytes = match self.toolchain.translator.translate(&unit) {
            Ok(bytes) => bytes,
            Err(e) => {
                return internal(InternalError::with_cause(
                    format!("failed to translate `{}`", unit.id),
                    e,
                ))
            }
        };

        let artifact = self.toolchain.artifact_path(&unit);
        if let Err(e) = write_artifact(&artifact, &bytes) {
            return internal(InternalError::with_cause(
                format!("failed to write '{}'", artifact.display()),
                e,
            ));
        }
        tracing::info!(artifact = %artifact.display(), bytes = bytes.len(), "built");
        BuildResult::Success { artifact }
    }
}

/// Read and parse `path`, as the orchestrator's front end does.
pub fn parse_file(path: &Path, charset: Charset) -> Result<Unit, BuildResult> {
    let text = read_source(path, charset)?;
    let unit = qux_parse::parse(&stem(path), &text)?;
    Ok(unit)
}

/// Create parent directories and replace any existing file.
fn write_artifact(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)
}

fn internal(error: InternalError) -> BuildResult {
    tracing::error!(error = %error, cause = ?error.cause(), "internal compiler error");
    BuildResult::Internal(error)
}
