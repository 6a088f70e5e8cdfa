//! The Qux compiler driver.
//!
//! Turns a set of `.qux` source files into one JVM class file each:
//!
//! - [`Config`]: layered settings (defaults, properties file, flags)
//! - [`sources`]: input discovery and charset-aware reading
//! - [`BuildJob`]: parse, stages, translate and write for one unit
//! - [`Orchestrator`]: the sequential front end, the worker pool and
//!   result collection with per-job timeouts
//! - [`BuildReport`]: one [`BuildResult`] per input, plus the exit code
//!
//! ```no_run
//! use quxc::{Config, Orchestrator};
//!
//! let config = Config::default();
//! let sources = quxc::sources::discover(&["src".into()]);
//! let report = Orchestrator::new(config).build(&sources)?;
//! std::process::exit(report.exit_code());
//! # Ok::<(), quxc::PoolError>(())
//! ```

pub mod config;
mod job;
pub mod logging;
mod orchestrator;
pub mod report;
mod result;
pub mod sources;

pub use config::{Charset, Config, ConfigError, Properties};
pub use job::{parse_file, BuildJob, JobInput, Toolchain};
pub use orchestrator::{build, resolve_classpath, source_reader, Orchestrator, PoolError};
pub use result::{BuildReport, BuildResult, Failure, InternalError};
