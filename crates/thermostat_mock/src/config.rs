//! Configuration file parsing and structures.
//!
//! The mock runs without any configuration file. When one is given it is a
//! TOML document with three optional tables:
//! - `[server]`: where to listen
//! - `[logging]`: global level plus per-target overrides
//! - `[thermostat]`: initial state, any field omitted keeps its default

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::filter::Targets;

use crate::state::ThermostatState;

/// Top-level configuration structure
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub thermostat: ThermostatState,
}

#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: LogLevel,

    /// Per-target levels, e.g. `tower_http = "debug"`
    pub overrides: HashMap<String, LogLevel>,
}

impl LoggingConfig {
    /// Build the subscriber filter: global level plus per-target overrides
    pub fn targets(&self) -> Targets {
        self.overrides
            .iter()
            .fold(Targets::new().with_default(self.level), |targets, (target, level)| {
                targets.with_target(target.clone(), *level)
            })
    }
}

/// Listener configuration
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// IP address to bind
    pub listen: String,

    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().to_path_buf(), e))?;

        Self::parse(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;

        // TOML accepts nan/inf, which would serialize as null in /status
        if let Some(field) = config.thermostat.non_finite_field() {
            return Err(ConfigError::NonFinite(field));
        }

        Ok(config)
    }

    /// Apply command line overrides on top of the file values
    pub fn apply_overrides(
        &mut self,
        listen: Option<String>,
        port: Option<u16>,
        level: Option<LogLevel>,
    ) {
        if let Some(listen) = listen {
            self.server.listen = listen;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
        if let Some(level) = level {
            self.logging.level = level;
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("thermostat.{0} must be a finite number")]
    NonFinite(&'static str),
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.listen, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(config.logging.overrides.is_empty());
        assert_eq!(config.thermostat, ThermostatState::default());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [server]
            listen = "127.0.0.1"
            port = 8080

            [logging]
            level = "debug"

            [logging.overrides]
            tower_http = "trace"

            [thermostat]
            target_temperature = 20.5
            current_relative_humidity = 55.0
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.listen, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.overrides["tower_http"], LogLevel::Trace);
        assert_eq!(
            config.thermostat,
            ThermostatState {
                target_temperature: 20.5,
                current_relative_humidity: 55.0,
                ..ThermostatState::default()
            }
        );
    }

    #[test]
    fn test_partial_server_section() {
        let config: Config = toml::from_str("[server]\nport = 9000\n").unwrap();
        assert_eq!(config.server.listen, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_rejects_unknown_keys() {
        assert!(toml::from_str::<Config>("[thermostat]\ntarget_temp = 20.0\n").is_err());
        assert!(toml::from_str::<Config>("[unknown]\nkey = 1\n").is_err());
    }

    #[test]
    fn test_rejects_invalid_log_level() {
        assert!(toml::from_str::<Config>("[logging]\nlevel = \"loud\"\n").is_err());
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("thermostat.toml");
        std::fs::write(&path, "[server]\nport = 8123\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.server.port, 8123);
    }

    #[test]
    fn test_from_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.toml");

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Io(ref p, _) if p == &path));
    }

    #[test]
    fn test_rejects_non_finite_thermostat_values() {
        let err = Config::parse("[thermostat]\ntarget_temperature = nan\n").unwrap_err();
        assert!(matches!(err, ConfigError::NonFinite("target_temperature")));

        let err = Config::parse("[thermostat]\ncurrent_relative_humidity = -inf\n").unwrap_err();
        assert!(matches!(err, ConfigError::NonFinite("current_relative_humidity")));
    }

    #[test]
    fn test_from_file_rejects_non_finite() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("thermostat.toml");
        std::fs::write(
            &path,
            "[thermostat]\ntarget_temperature = nan\ncurrent_temperature = inf\n",
        )
        .unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::NonFinite("current_temperature")));
    }

    #[test]
    fn test_parse_finite_thermostat_values() {
        let config = Config::parse("[thermostat]\ntarget_temperature = 18\n").unwrap();
        assert_eq!(config.thermostat.target_temperature, 18.0);
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let mut config = Config::parse(
            "[server]\nlisten = \"127.0.0.1\"\nport = 8080\n[logging]\nlevel = \"warn\"\n",
        )
        .unwrap();

        config.apply_overrides(Some("::1".to_string()), Some(9090), Some(LogLevel::Trace));
        assert_eq!(config.server.listen, "::1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.logging.level, LogLevel::Trace);
    }

    #[test]
    fn test_absent_overrides_keep_file_values() {
        let mut config = Config::parse(
            "[server]\nlisten = \"127.0.0.1\"\nport = 8080\n[logging]\nlevel = \"warn\"\n",
        )
        .unwrap();

        config.apply_overrides(None, None, None);
        assert_eq!(config.server.listen, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[test]
    fn test_overrides_without_file() {
        let mut config = Config::default();
        config.apply_overrides(None, Some(8123), None);
        assert_eq!(config.server.listen, "0.0.0.0");
        assert_eq!(config.server.port, 8123);
    }

    #[test]
    fn test_targets_filter() {
        let logging = LoggingConfig {
            level: LogLevel::Warn,
            overrides: HashMap::from([("thermostat_mock".to_string(), LogLevel::Debug)]),
        };
        let targets = logging.targets();
        assert!(targets.would_enable("thermostat_mock::api", &tracing::Level::DEBUG));
        assert!(!targets.would_enable("tower_http::trace", &tracing::Level::INFO));
        assert!(targets.would_enable("tower_http::trace", &tracing::Level::WARN));
    }
}
