//! Harness Configuration (trellis.toml)
//!
//! Handles the settings stored in `trellis.toml` next to the code under test.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Log levels accepted by `[logging] level`
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Harness configuration from trellis.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct HarnessConfig {
    /// Exploration settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer: Option<ExplorerConfig>,

    /// Run phase settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runner: Option<RunnerConfig>,

    /// Logging settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

/// Exploration configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ExplorerConfig {
    /// Record extension faults as session diagnostics (they are always logged)
    #[serde(default = "default_true")]
    pub report_extension_faults: bool,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            report_extension_faults: true,
        }
    }
}

/// Run phase configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    /// Run leaf actions on the rayon thread pool
    #[serde(default = "default_true")]
    pub parallel: bool,

    /// Only run tests whose name contains this substring
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            filter: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter directive for the tracing subscriber (e.g. "info", "warn")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

fn default_true() -> bool {
    true
}

impl HarnessConfig {
    /// Load harness configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the harness configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(filter) = self.runner.as_ref().and_then(|r| r.filter.as_deref()) {
            if filter.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "runner.filter".to_string(),
                    reason: "filter cannot be empty".to_string(),
                });
            }
        }

        if let Some(level) = self.logging.as_ref().and_then(|l| l.level.as_deref()) {
            if !is_valid_level(level) {
                return Err(ConfigError::InvalidValue {
                    field: "logging.level".to_string(),
                    reason: format!("unknown log level '{}'", level),
                });
            }
        }

        Ok(())
    }

    /// Merge another harness config into this one
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &HarnessConfig) {
        if other.explorer.is_some() {
            self.explorer = other.explorer.clone();
        }
        if other.runner.is_some() {
            self.runner = other.runner.clone();
        }
        if other.logging.is_some() {
            self.logging = other.logging.clone();
        }
    }
}

/// Check a level directive; only the bare level names are accepted here
fn is_valid_level(level: &str) -> bool {
    LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str())
}
