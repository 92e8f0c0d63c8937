//! Tracing subscriber setup for hosts

use tracing_subscriber::EnvFilter;
use trellis_config::Config;

/// Filter from `RUST_LOG`, falling back to `level`
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install a `fmt` subscriber filtered by `RUST_LOG`, falling back to `level`
///
/// Returns false when a global subscriber was already installed.
pub fn init(level: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .try_init()
        .is_ok()
}

/// Install a subscriber using the configured log level
pub fn init_from_config(config: &Config) -> bool {
    init(config.log_level())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tracing::Level;
    use trellis_config::{HarnessConfig, LoggingConfig};

    fn config_with_level(level: Option<&str>) -> Config {
        Config {
            harness: HarnessConfig {
                logging: Some(LoggingConfig {
                    level: level.map(str::to_string),
                }),
                ..HarnessConfig::default()
            },
            config_root: None,
        }
    }

    fn enabled_under(filter: EnvFilter) -> (bool, bool) {
        let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
        tracing::subscriber::with_default(subscriber, || {
            (tracing::enabled!(Level::WARN), tracing::enabled!(Level::INFO))
        })
    }

    #[test]
    #[serial]
    fn test_configured_level_drives_filter() {
        env::remove_var("RUST_LOG");
        let config = config_with_level(Some("warn"));

        assert_eq!(enabled_under(env_filter(config.log_level())), (true, false));
    }

    #[test]
    #[serial]
    fn test_missing_level_defaults_to_info() {
        env::remove_var("RUST_LOG");
        let config = config_with_level(None);

        assert_eq!(enabled_under(env_filter(config.log_level())), (true, true));
    }

    #[test]
    #[serial]
    fn test_rust_log_overrides_configured_level() {
        env::set_var("RUST_LOG", "error");
        let filter = env_filter("info");
        env::remove_var("RUST_LOG");

        assert_eq!(enabled_under(filter), (false, false));
    }
}
