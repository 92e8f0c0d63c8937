//! Trellis Configuration System
//!
//! Provides configuration management for the trellis test harness:
//! - Harness configuration (trellis.toml)
//! - Environment variable overrides (TRELLIS_*)
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Built-in defaults
//! 2. Harness config (./trellis.toml, searched upwards)
//! 3. Environment variables (TRELLIS_*)
//! 4. Explicit settings from the host (handled by caller)
//!
//! # Example
//!
//! ```no_run
//! use trellis_config::ConfigLoader;
//! use std::path::Path;
//!
//! let loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! let parallel = config.runner().parallel;
//! ```

pub mod harness;
pub mod loader;

use std::path::PathBuf;
use thiserror::Error;

/// Name of the configuration file searched for by the loader
pub const CONFIG_FILE_NAME: &str = "trellis.toml";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use harness::{ExplorerConfig, HarnessConfig, LoggingConfig, RunnerConfig};
pub use loader::{Config, ConfigLoader};
