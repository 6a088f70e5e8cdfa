//! Build configuration.
//!
//! Settings come from three layers, later ones winning: built-in defaults,
//! an optional TOML properties file, and command-line flags. Each layer is
//! a [`Properties`] with every key optional; [`Config::layered`] folds them
//! into a complete [`Config`].
//!
//! ```toml
//! outdir = "build/classes"
//! classpath = ["lib", "vendor/qux"]
//! charset = "utf-8"
//! verbose = 1
//! jobs_multiplier = 2
//! timeout_ms = 30000
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Errors while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read properties file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid properties file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("unsupported charset `{0}` (expected utf-8 or iso-8859-1)")]
    UnknownCharset(String),
    #[error("{0}")]
    Invalid(String),
}

/// Encoding of source files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Charset {
    #[default]
    Utf8,
    /// ISO-8859-1: every byte is the code point of the same value.
    Latin1,
}

impl Charset {
    /// Decode `bytes`, or describe why they are not in this charset.
    pub fn decode(self, bytes: Vec<u8>) -> Result<String, String> {
        match self {
            Charset::Utf8 => String::from_utf8(bytes).map_err(|e| {
                let at = e.utf8_error().valid_up_to();
                format!("invalid utf-8 sequence at byte {at}")
            }),
            Charset::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
        }
    }
}

impl FromStr for Charset {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Charset::Utf8),
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" => Ok(Charset::Latin1),
            _ => Err(ConfigError::UnknownCharset(name.to_string())),
        }
    }
}

impl TryFrom<String> for Charset {
    type Error = ConfigError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Charset::Utf8 => "utf-8",
            Charset::Latin1 => "iso-8859-1",
        })
    }
}

/// One configuration layer. Absent keys leave lower layers in force.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Properties {
    pub outdir: Option<PathBuf>,
    pub classpath: Option<Vec<PathBuf>>,
    pub charset: Option<Charset>,
    pub verbose: Option<u8>,
    pub jobs_multiplier: Option<usize>,
    pub timeout_ms: Option<u64>,
}

impl Properties {
    /// Read a properties file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Parse properties text; `path` is only used in errors.
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Complete settings for one build invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Root of the artifact tree.
    pub outdir: PathBuf,
    /// Directories searched for imported units that are not being built.
    pub classpath: Vec<PathBuf>,
    pub charset: Charset,
    /// 0 = warnings, 1 = info, 2 = debug, 3 or more = trace.
    pub verbose: u8,
    /// Workers per available core.
    pub jobs_multiplier: usize,
    /// Per-job limit, measured from the moment a worker picks the job up.
    pub timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            outdir: PathBuf::from("."),
            classpath: Vec::new(),
            charset: Charset::Utf8,
            verbose: 0,
            jobs_multiplier: 1,
            timeout: None,
        }
    }
}

impl Config {
    /// Apply `layers` over the defaults, lowest precedence first.
    pub fn layered(layers: impl IntoIterator<Item = Properties>) -> Result<Self, ConfigError> {
        let mut config = Config::default();
        for layer in layers {
            config.apply(layer);
        }
        config.validate()?;
        Ok(config)
    }

    fn apply(&mut self, layer: Properties) {
        if let Some(outdir) = layer.outdir {
            self.outdir = outdir;
        }
        if let Some(classpath) = layer.classpath {
            self.classpath = classpath;
        }
        if let Some(charset) = layer.charset {
            self.charset = charset;
        }
        if let Some(verbose) = layer.verbose {
            self.verbose = verbose;
        }
        if let Some(multiplier) = layer.jobs_multiplier {
            self.jobs_multiplier = multiplier;
        }
        if let Some(timeout_ms) = layer.timeout_ms {
            self.timeout = (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms));
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jobs_multiplier == 0 {
            return Err(ConfigError::Invalid(
                "jobs_multiplier must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of pool workers for this machine.
    pub fn worker_count(&self) -> usize {
        let cores = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
        cores.saturating_mul(self.jobs_multiplier)
    }
}
