//! Global subscriber installation
//!
//! Kept in its own test binary: the global subscriber can only be set once
//! per process.

use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;
use tracing::Level;
use trellis_config::{ConfigLoader, CONFIG_FILE_NAME};
use trellis_core::logging;

#[test]
#[serial]
fn test_init_from_config_installs_once_with_configured_level() {
    env::remove_var("RUST_LOG");
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, "[logging]\nlevel = \"warn\"\n").unwrap();
    let config = ConfigLoader::new().without_env().load_from_file(&path).unwrap();
    assert_eq!(config.log_level(), "warn");

    assert!(logging::init_from_config(&config));
    assert!(tracing::enabled!(Level::WARN));
    assert!(!tracing::enabled!(Level::INFO));

    // The first subscriber stays in place
    assert!(!logging::init("debug"));
    assert!(!logging::init_from_config(&config));
    assert!(!tracing::enabled!(Level::INFO));
}
