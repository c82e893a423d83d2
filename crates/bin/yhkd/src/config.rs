//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `yhk.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use yhk_adapter_yandex::YandexConfig;
use yhk_app::controller::ControllerConfig;
use yhk_app::debounce::DebounceConfig;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OAuth client and API endpoints.
    pub yandex: YandexConfig,
    /// Where snapshots and credentials live.
    pub storage: StorageConfig,
    /// Polling and debounce timings.
    pub sync: SyncConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Persistence configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding `devices.json` and `yandex.json`.
    pub data_dir: PathBuf,
}

/// Reconciliation timings, in milliseconds.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub fetch_interval_ms: u64,
    pub debounce_ms: u64,
    pub debounce_max_wait_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `yhk.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("yhk.toml")?;
        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("YANDEX_CLIENT_ID") {
            self.yandex.client_id = val;
        }
        if let Some(val) = var("YANDEX_CLIENT_SECRET") {
            self.yandex.client_secret = val;
        }
        if let Some(val) = var("YHK_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(val);
        }
        if let Some(val) = var("YHK_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.yandex.client_id.is_empty() || self.yandex.client_secret.is_empty() {
            return Err(ConfigError::Validation(
                "Yandex client id and secret are required".to_string(),
            ));
        }
        if self.sync.fetch_interval_ms == 0 || self.sync.debounce_ms == 0 {
            return Err(ConfigError::Validation(
                "sync intervals must be non-zero".to_string(),
            ));
        }
        if self.sync.debounce_max_wait_ms < self.sync.debounce_ms {
            return Err(ConfigError::Validation(
                "debounce_max_wait_ms must not be shorter than debounce_ms".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the controller timings.
    #[must_use]
    pub fn controller(&self) -> ControllerConfig {
        ControllerConfig {
            fetch_interval: Duration::from_millis(self.sync.fetch_interval_ms),
            debounce: DebounceConfig {
                wait: Duration::from_millis(self.sync.debounce_ms),
                max_wait: Duration::from_millis(self.sync.debounce_max_wait_ms),
            },
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".yhk"),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            fetch_interval_ms: 1500,
            debounce_ms: 400,
            debounce_max_wait_ms: 700,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "yhkd=info,yhk_app=info,yhk_adapter_yandex=info,yhk_adapter_accessory_memory=info"
                .to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> Config {
        let mut config = Config::default();
        config.yandex.client_id = "id".to_string();
        config.yandex.client_secret = "secret".to_string();
        config
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.storage.data_dir, PathBuf::from(".yhk"));
        assert_eq!(config.sync.fetch_interval_ms, 1500);
        assert_eq!(config.controller(), ControllerConfig::default());
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [yandex]
            client_id = 'abc'
            client_secret = 'def'
            api_url = 'http://localhost:8080/v1.0'
            timeout_secs = 3

            [storage]
            data_dir = '/var/lib/yhk'

            [sync]
            fetch_interval_ms = 5000
            debounce_ms = 200
            debounce_max_wait_ms = 900

            [logging]
            filter = 'debug'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.yandex.client_id, "abc");
        assert_eq!(config.yandex.api_url, "http://localhost:8080/v1.0");
        assert_eq!(config.yandex.timeout_secs, 3);
        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/yhk"));
        assert_eq!(config.logging.filter, "debug");
        let controller = config.controller();
        assert_eq!(controller.fetch_interval, Duration::from_secs(5));
        assert_eq!(controller.debounce.wait, Duration::from_millis(200));
        assert_eq!(controller.debounce.max_wait, Duration::from_millis(900));
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        let toml = "
            [sync]
            fetch_interval_ms = 3000
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.sync.fetch_interval_ms, 3000);
        assert_eq!(config.sync.debounce_ms, 400);
        assert_eq!(config.yandex.oauth_url, "https://oauth.yandex.ru");
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.sync.debounce_max_wait_ms, 700);
    }

    #[test]
    fn should_apply_environment_overrides() {
        let mut config = Config::default();
        config.apply_overrides(|name| match name {
            "YANDEX_CLIENT_ID" => Some("env-id".to_string()),
            "YANDEX_CLIENT_SECRET" => Some("env-secret".to_string()),
            "YHK_DATA_DIR" => Some("/tmp/yhk".to_string()),
            "YHK_LOG" => Some("warn".to_string()),
            _ => None,
        });
        assert_eq!(config.yandex.client_id, "env-id");
        assert_eq!(config.yandex.client_secret, "env-secret");
        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/yhk"));
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn should_prefer_rust_log_over_yhk_log() {
        let mut config = Config::default();
        config.apply_overrides(|name| match name {
            "YHK_LOG" => Some("warn".to_string()),
            "RUST_LOG" => Some("trace".to_string()),
            _ => None,
        });
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_reject_missing_client_credentials() {
        let config = Config::default();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_zero_intervals() {
        let mut config = configured();
        config.sync.fetch_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_max_wait_below_wait() {
        let mut config = configured();
        config.sync.debounce_max_wait_ms = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_accept_configured_client() {
        assert!(configured().validate().is_ok());
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
