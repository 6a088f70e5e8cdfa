//! Turning a [`BuildReport`] into terminal output.

use std::path::Path;

use qux_diagnostic::{render, SourceLines};

use crate::config::Charset;
use crate::result::{BuildReport, BuildResult, Failure};
use crate::sources::read_source;

/// Diagnostic text for one result, or `None` for a success.
///
/// Compiler errors are shown against the unit's source, re-read from
/// `path`; if that fails they are shown without snippets.
pub fn render_result(path: &Path, result: &BuildResult, charset: Charset) -> Option<String> {
    match result {
        BuildResult::Success { .. } => None,
        BuildResult::Failure(Failure::Compiler(e)) => {
            let source = read_source(path, charset).ok().map(|text| SourceLines::new(&text));
            Some(render(e, source.as_ref()))
        }
        BuildResult::Failure(Failure::Build(e)) => Some(render(e, None)),
        BuildResult::Internal(_) => Some(format!("{}: internal compiler error", path.display())),
    }
}

/// `N built, M failed`.
pub fn summary(report: &BuildReport) -> String {
    format!("{} built, {} failed", report.succeeded(), report.failed())
}

/// Print every failure and the summary to stderr.
pub fn print_report(report: &BuildReport, charset: Charset) {
    for (path, result) in report.iter() {
        if let Some(text) = render_result(path, result, charset) {
            eprintln!("{text}");
        }
    }
    eprintln!("{}", summary(report));
}
