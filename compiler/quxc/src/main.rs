//! `quxc`: compile Qux sources to JVM class files.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};

use quxc::report::print_report;
use quxc::{logging, sources, Charset, Config, Orchestrator, Properties};

#[derive(Parser, Debug)]
#[command(name = "quxc", version, about = "Compile Qux sources to JVM class files")]
struct Cli {
    /// Source files, or directories searched recursively for *.qux
    #[arg(required = true, value_name = "SOURCES")]
    sources: Vec<PathBuf>,

    /// Root directory for generated class files
    #[arg(short = 'd', long, value_name = "DIR")]
    outdir: Option<PathBuf>,

    /// Directories searched for imported units that are not being compiled
    #[arg(long, visible_alias = "cp", value_name = "PATH", value_delimiter = if cfg!(windows) { ';' } else { ':' })]
    classpath: Option<Vec<PathBuf>>,

    /// Source file encoding (utf-8 or iso-8859-1)
    #[arg(long, value_name = "NAME")]
    charset: Option<Charset>,

    /// More log output; repeat for more detail
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// TOML file with default settings
    #[arg(long, value_name = "FILE")]
    properties: Option<PathBuf>,

    /// Workers per available core
    #[arg(long, value_name = "N")]
    jobs_multiplier: Option<usize>,

    /// Per-unit time limit in milliseconds; 0 for none
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,
}

impl Cli {
    /// The command-line configuration layer.
    fn properties(&self) -> Properties {
        Properties {
            outdir: self.outdir.clone(),
            classpath: self.classpath.clone(),
            charset: self.charset,
            verbose: (self.verbose > 0).then_some(self.verbose),
            jobs_multiplier: self.jobs_multiplier,
            timeout_ms: self.timeout_ms,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(1);
        }
    };
    logging::init_tracing(config.verbose);
    tracing::debug!(?config, "configuration");

    let files = sources::discover(&cli.sources);
    if files.is_empty() {
        eprintln!("error: no .qux files found");
        return ExitCode::from(1);
    }

    let charset = config.charset;
    match Orchestrator::new(config).build(&files) {
        Ok(report) => {
            print_report(&report, charset);
            ExitCode::from(u8::try_from(report.exit_code()).unwrap_or(2))
        }
        Err(e) => {
            tracing::error!(error = %e, "build aborted");
            eprintln!("error: internal compiler error: {e}");
            ExitCode::from(2)
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config, quxc::ConfigError> {
    let file = cli.properties.as_deref().map(Properties::load).transpose()?;
    Config::layered(file.into_iter().chain([cli.properties()]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override() {
        let cli = Cli::try_parse_from([
            "quxc", "-vv", "-d", "out", "--cp", "a:b", "--charset", "latin1", "--timeout-ms", "10",
            "src",
        ])
        .unwrap();
        let config = Config::layered([cli.properties()]).unwrap();
        assert_eq!(config.verbose, 2);
        assert_eq!(config.outdir, PathBuf::from("out"));
        assert_eq!(config.charset, Charset::Latin1);
        assert_eq!(config.timeout, Some(std::time::Duration::from_millis(10)));
        if !cfg!(windows) {
            assert_eq!(config.classpath, vec![PathBuf::from("a"), PathBuf::from("b")]);
        }
        assert_eq!(cli.sources, vec![PathBuf::from("src")]);
    }

    #[test]
    fn test_sources_required() {
        assert!(Cli::try_parse_from(["quxc"]).is_err());
    }
}
