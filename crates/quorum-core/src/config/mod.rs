//! Application configuration with layered loading.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in this order (later overrides earlier):
//!
//! 1. **Compiled defaults**: `Default` implementations and `set_default` keys
//! 2. **Config file**: TOML file named by the `QUORUM_CONFIG` env var
//!    (`config/config.toml` when unset); a missing file is not an error
//! 3. **Environment variables**: `QUORUM__*` env vars, `__` separating
//!    nested keys (e.g. `QUORUM__QUORUM__THRESHOLD=0.75`). `QUORUM__QUORUM__NODES`
//!    takes a comma-separated list.
//!
//! # Configuration Sections
//!
//! - [`QuorumConfig`]: nodes, thresholds, tolerance and defaults
//! - [`HttpClientConfig`]: shared HTTP transport
//! - [`LoggingConfig`]: log level and format
//!
//! # Example
//!
//! ```toml
//! [quorum]
//! nodes = ["https://node-a:14265", "https://node-b:14265", "https://node-c:14265"]
//! threshold = 0.75
//! no_response_tolerance = 0.34
//!
//! [http]
//! request_timeout_seconds = 30
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```

use crate::{node::HttpClientConfig, quorum::QuorumConfig};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Env var naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "QUORUM_CONFIG";

/// Config file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Logging output configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive. Defaults to `"info"`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: `"json"` or `"pretty"`. Defaults to `"pretty"`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), format: default_log_format() }
    }
}

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub quorum: QuorumConfig,

    #[serde(default)]
    pub http: HttpClientConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads configuration from `config_path` layered over defaults and under
    /// `QUORUM__` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or the merged result does
    /// not deserialize.
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let config_builder = Config::builder()
            .set_default("quorum.threshold", 0.95)?
            .set_default("quorum.no_response_tolerance", 0.0)?
            .set_default("quorum.max_freshness_delta", 1)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name(&config_path.as_ref().to_string_lossy()).required(false))
            .add_source(
                Environment::with_prefix("QUORUM")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("quorum.nodes")
                    .try_parsing(true),
            )
            .build()?;

        config_builder.try_deserialize()
    }

    /// Loads configuration from the file named by `QUORUM_CONFIG`.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_file`].
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_file(&config_path)
    }

    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid setting.
    pub fn validate(&self) -> Result<(), String> {
        self.quorum.validate().map_err(|e| e.to_string())?;

        if self.http.concurrent_limit == 0 {
            return Err("http.concurrent_limit must be greater than 0".to_string());
        }
        if self.http.request_timeout_seconds == 0 {
            return Err("http.request_timeout_seconds must be greater than 0".to_string());
        }
        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            return Err(format!(
                "logging.format must be \"json\" or \"pretty\", got \"{}\"",
                self.logging.format
            ));
        }

        Ok(())
    }
}
