//! Per-unit build outcomes.

use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

use qux_diagnostic::{BuildError, CompilerError};

/// A problem the user can act on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Failure {
    Compiler(CompilerError),
    Build(BuildError),
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Compiler(e) => fmt::Display::fmt(e, f),
            Failure::Build(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl From<CompilerError> for Failure {
    fn from(error: CompilerError) -> Self {
        Failure::Compiler(error)
    }
}

impl From<BuildError> for Failure {
    fn from(error: BuildError) -> Self {
        Failure::Build(error)
    }
}

/// Something went wrong inside the compiler itself.
///
/// Never shown to the user as a diagnostic; the detail goes to the log.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct InternalError {
    message: String,
    #[source]
    cause: Option<Box<dyn Error + Send + Sync>>,
}

impl InternalError {
    pub fn new(message: impl Into<String>) -> Self {
        InternalError {
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(message: impl Into<String>, cause: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        InternalError {
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }
}

/// The outcome of building one source unit.
#[derive(Debug)]
pub enum BuildResult {
    Success { artifact: PathBuf },
    Failure(Failure),
    Internal(InternalError),
}

impl BuildResult {
    pub fn is_success(&self) -> bool {
        matches!(self, BuildResult::Success { .. })
    }

    pub fn artifact(&self) -> Option<&Path> {
        match self {
            BuildResult::Success { artifact } => Some(artifact),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            BuildResult::Failure(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn internal(&self) -> Option<&InternalError> {
        match self {
            BuildResult::Internal(error) => Some(error),
            _ => None,
        }
    }
}

impl From<CompilerError> for BuildResult {
    fn from(error: CompilerError) -> Self {
        BuildResult::Failure(Failure::Compiler(error))
    }
}

impl From<BuildError> for BuildResult {
    fn from(error: BuildError) -> Self {
        BuildResult::Failure(Failure::Build(error))
    }
}

/// Results of one build invocation, one per input, in input order.
#[derive(Debug, Default)]
pub struct BuildReport {
    results: Vec<(PathBuf, BuildResult)>,
}

impl BuildReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: PathBuf, result: BuildResult) {
        self.results.push((path, result));
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &BuildResult)> {
        self.results.iter().map(|(path, result)| (path.as_path(), result))
    }

    /// The result for `path`, as given to the build.
    pub fn get(&self, path: &Path) -> Option<&BuildResult> {
        self.iter().find(|(p, _)| *p == path).map(|(_, result)| result)
    }

    pub fn succeeded(&self) -> usize {
        self.iter().filter(|(_, r)| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    pub fn internal_errors(&self) -> usize {
        self.iter().filter(|(_, r)| r.internal().is_some()).count()
    }

    /// Process exit code: 0 when everything built, 2 if anything hit an
    /// internal error, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.internal_errors() > 0 {
            2
        } else if self.failed() > 0 {
            1
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_exit_codes() {
        let mut report = BuildReport::new();
        report.push("A.qux".into(), BuildResult::Success { artifact: "A.class".into() });
        assert_eq!(report.exit_code(), 0);

        report.push("B.qux".into(), CompilerError::new("bad").into());
        assert_eq!(report.exit_code(), 1);
        assert_eq!((report.succeeded(), report.failed()), (1, 1));

        report.push("C.qux".into(), BuildResult::Internal(InternalError::new("boom")));
        assert_eq!(report.exit_code(), 2);
        assert_eq!(report.len(), 3);
    }

    #[test]
    fn test_lookup_by_path() {
        let mut report = BuildReport::new();
        report.push("A.qux".into(), BuildError::new("gone").into());
        let result = report.get(Path::new("A.qux")).unwrap();
        assert_eq!(result.failure(), Some(&Failure::Build(BuildError::new("gone"))));
        assert!(report.get(Path::new("B.qux")).is_none());
    }

    #[test]
    fn test_internal_error_keeps_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = InternalError::with_cause("failed to write", io);
        assert_eq!(err.to_string(), "failed to write");
        assert_eq!(err.cause().map(ToString::to_string), Some("disk full".to_string()));
        assert!(err.source().is_some());
    }
}
