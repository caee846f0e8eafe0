//! Repository configuration (`.vc/config.toml`).
//!
//! Every field has a default, and a missing file means "all defaults".
//!
//! ```toml
//! [diff]
//! strategy = "lcs"          # "greedy" (default) or "lcs"
//!
//! [scan]
//! ignore = ["target/**", "*.log"]
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use keyvc_core::model::DiffStrategy;
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level repository configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VcConfig {
    /// Line diff settings.
    #[serde(default)]
    pub diff: DiffConfig,

    /// Working tree scan settings.
    #[serde(default)]
    pub scan: ScanConfig,
}

/// Line diff settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiffConfig {
    /// Differ used for new diff commits. Existing chains replay the same
    /// way under either strategy.
    #[serde(default)]
    pub strategy: DiffStrategy,
}

/// Working tree scan settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanConfig {
    /// Glob patterns (matched against keys) to leave untracked, in addition
    /// to the always-skipped `.vc`, `.git` and `.commits` entries.
    #[serde(default)]
    pub ignore: Vec<String>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// A configuration file could not be read or parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigError {
    /// Path to the file, when loaded from disk.
    pub path: Option<PathBuf>,
    /// Human-readable description (with line number for parse errors).
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "invalid config {}: {}", path.display(), self.message),
            None => write!(f, "invalid config: {}", self.message),
        }
    }
}

impl std::error::Error for ConfigError {}

impl VcConfig {
    /// Load from `path`; a missing file yields the defaults.
    ///
    /// # Errors
    /// Returns [`ConfigError`] on I/O errors other than not-found, invalid
    /// TOML, unknown fields or malformed ignore patterns.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError {
                    path: Some(path.to_owned()),
                    message: format!("could not read file: {e}"),
                });
            }
        };
        Self::parse(&contents).map_err(|mut e| {
            e.path = Some(path.to_owned());
            e
        })
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns [`ConfigError`] on invalid TOML, unknown fields or malformed
    /// ignore patterns.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| {
            let mut message = e.message().to_owned();
            if let Some(span) = e.span() {
                let line = toml_str[..span.start]
                    .chars()
                    .filter(|&c| c == '\n')
                    .count()
                    + 1;
                message = format!("line {line}: {message}");
            }
            ConfigError {
                path: None,
                message,
            }
        })?;
        for pattern in &config.scan.ignore {
            glob::Pattern::new(pattern).map_err(|e| ConfigError {
                path: None,
                message: format!("scan.ignore pattern {pattern:?}: {e}"),
            })?;
        }
        Ok(config)
    }
}
