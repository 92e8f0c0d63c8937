//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::harness::{ExplorerConfig, HarnessConfig, LoggingConfig, RunnerConfig};
use crate::{ConfigError, ConfigResult, CONFIG_FILE_NAME};
use std::env;
use std::path::{Path, PathBuf};

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Defaults - lowest priority
/// 2. Harness config (./trellis.toml) - overrides defaults
/// 3. Environment variables (TRELLIS_*) - overrides the file
/// 4. Host settings - highest priority (handled by caller)
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Skip environment overrides (used by hosts that pin their settings)
    ignore_env: bool,
}

/// Merged configuration result
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Harness configuration
    pub harness: HarnessConfig,

    /// Directory where trellis.toml was found
    pub config_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { ignore_env: false }
    }

    /// Do not apply TRELLIS_* environment overrides
    pub fn without_env(mut self) -> Self {
        self.ignore_env = true;
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find trellis.toml, then applies
    /// environment overrides.
    pub fn load_from_directory(&self, start_dir: &Path) -> ConfigResult<Config> {
        let (config_root, harness) = self.find_harness_config(start_dir)?;
        let harness = self.apply_env_overrides(harness)?;

        Ok(Config {
            harness,
            config_root,
        })
    }

    /// Load configuration from a specific config file
    pub fn load_from_file(&self, config_path: &Path) -> ConfigResult<Config> {
        let harness = HarnessConfig::load_from_file(config_path)?;
        let harness = self.apply_env_overrides(harness)?;

        Ok(Config {
            harness,
            config_root: config_path.parent().map(|p| p.to_path_buf()),
        })
    }

    /// Find harness configuration by walking up directory tree
    ///
    /// Returns (config_root, harness_config); defaults when no file exists
    fn find_harness_config(&self, start_dir: &Path) -> ConfigResult<(Option<PathBuf>, HarnessConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);

            if config_path.exists() {
                let harness = HarnessConfig::load_from_file(&config_path)?;
                return Ok((Some(current), harness));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, HarnessConfig::default())),
            }
        }
    }

    /// Apply environment variable overrides to the harness config
    ///
    /// Recognised variables: TRELLIS_PARALLEL, TRELLIS_FILTER, TRELLIS_LOG
    fn apply_env_overrides(&self, mut config: HarnessConfig) -> ConfigResult<HarnessConfig> {
        if self.ignore_env {
            return Ok(config);
        }

        if let Ok(parallel) = env::var("TRELLIS_PARALLEL") {
            let parallel = parse_bool("TRELLIS_PARALLEL", &parallel)?;
            config.runner.get_or_insert_with(RunnerConfig::default).parallel = parallel;
        }

        if let Ok(filter) = env::var("TRELLIS_FILTER") {
            config.runner.get_or_insert_with(RunnerConfig::default).filter = Some(filter);
        }

        if let Ok(level) = env::var("TRELLIS_LOG") {
            config.logging.get_or_insert_with(LoggingConfig::default).level = Some(level);
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_bool(field: &str, value: &str) -> ConfigResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("expected a boolean, got '{}'", other),
        }),
    }
}

impl Config {
    /// Effective exploration settings
    pub fn explorer(&self) -> ExplorerConfig {
        self.harness.explorer.clone().unwrap_or_default()
    }

    /// Effective run phase settings
    pub fn runner(&self) -> RunnerConfig {
        self.harness.runner.clone().unwrap_or_default()
    }

    /// Effective log filter (file/env > "info")
    pub fn log_level(&self) -> &str {
        self.harness
            .logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or("info")
    }

    /// Get the directory holding trellis.toml
    pub fn config_root(&self) -> Option<&Path> {
        self.config_root.as_deref()
    }
}
