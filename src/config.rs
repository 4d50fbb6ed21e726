//! Configuration module for the live energy bridge
//!
//! Loads configuration from a TOML file:
//! - [default] - General settings (log_level)
//! - [api] - Sensor API connection settings
//! - [live] - Window sizes and polling periods
//! - [selection] - Initially selected district/sensor (optional)
//! - [mqtt] - MQTT broker settings (optional, logs only when absent)

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::live::aggregator::{TOTAL_WINDOW_CAPACITY, TREND_WINDOW_CAPACITY};
use crate::live::selection::Selection;

/// Log level for the application
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to tracing LevelFilter string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub default: DefaultConfig,
    pub api: ApiConfig,
    #[serde(default)]
    pub live: LiveConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    pub mqtt: Option<MqttConfig>,
}

/// General application settings
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DefaultConfig {
    /// Log level: TRACE, DEBUG, INFO, WARN, ERROR
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Sensor API configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// API root including version prefix (e.g., "http://localhost:8080/api/v1")
    pub base_url: String,

    /// Per-request timeout (e.g., "10s")
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

/// Live view configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LiveConfig {
    /// Points kept by the total-energy window
    #[serde(default = "default_total_capacity")]
    pub total_capacity: usize,

    /// Points kept by the solar/grid trend window
    #[serde(default = "default_trend_capacity")]
    pub trend_capacity: usize,

    /// Polling period of both windows (e.g., "3s")
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    /// Polling period of the fleet summary (e.g., "5s")
    #[serde(default = "default_fleet_interval", with = "humantime_serde")]
    pub fleet_interval: Duration,
}

fn default_total_capacity() -> usize {
    TOTAL_WINDOW_CAPACITY
}

fn default_trend_capacity() -> usize {
    TREND_WINDOW_CAPACITY
}

fn default_interval() -> Duration {
    Duration::from_secs(3)
}

fn default_fleet_interval() -> Duration {
    Duration::from_secs(5)
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            total_capacity: default_total_capacity(),
            trend_capacity: default_trend_capacity(),
            interval: default_interval(),
            fleet_interval: default_fleet_interval(),
        }
    }
}

/// Initial selection
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SelectionConfig {
    pub district: Option<String>,
    pub sensor: Option<String>,
}

impl SelectionConfig {
    pub fn to_selection(&self) -> Selection {
        Selection {
            sensor: self.sensor.clone(),
            district: self.district.clone(),
        }
    }
}

/// MQTT broker configuration
#[derive(Deserialize, Clone)]
pub struct MqttConfig {
    /// MQTT root topic (e.g., "city-energy")
    #[serde(default = "default_mqtt_root")]
    pub root: String,

    /// MQTT broker hostname
    pub host: Option<String>,

    /// MQTT broker port (default 1883)
    #[serde(default = "default_mqtt_port")]
    pub port: u16,

    /// Unix socket path, used instead of host when set
    pub socket: Option<String>,

    /// MQTT username (empty for anonymous)
    #[serde(default)]
    pub username: String,

    /// MQTT password
    #[serde(default)]
    pub password: String,
}

fn default_mqtt_root() -> String {
    "city-energy".to_string()
}

fn default_mqtt_port() -> u16 {
    1883
}

impl std::fmt::Debug for MqttConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("MqttConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("socket", &self.socket)
            .field("username", &self.username)
            .field("password", &"***REDACTED***")
            .field("root", &self.root)
            .finish()
    }
}

impl Config {
    /// Load configuration from TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the config.toml file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(
                path.to_string_lossy().to_string(),
            ));
        }

        let contents =
            fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration logic (semantic validation beyond type checks)
    fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.api.base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "api.base_url must not be empty".to_string(),
            ));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "api.base_url must start with http:// or https://, got '{}'",
                base_url
            )));
        }

        if self.live.total_capacity == 0 || self.live.trend_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "live window capacities must be at least 1".to_string(),
            ));
        }

        if self.live.interval.is_zero() || self.live.fleet_interval.is_zero() {
            return Err(ConfigError::ValidationError(
                "live polling intervals must be greater than zero".to_string(),
            ));
        }

        if let Some(mqtt) = &self.mqtt {
            let has_host = mqtt.host.as_ref().is_some_and(|h| !h.is_empty());
            if !has_host && mqtt.socket.is_none() {
                return Err(ConfigError::ValidationError(
                    "mqtt.host or mqtt.socket must be set".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read configuration file: {0}")]
    ReadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [api]
        base_url = "http://localhost:8080/api/v1"
    "#;

    #[test]
    fn test_default_values() {
        let default = DefaultConfig::default();
        assert_eq!(default.log_level, LogLevel::Info);

        let config = Config::from_toml(MINIMAL).unwrap();
        assert_eq!(config.api.timeout, Duration::from_secs(10));
        assert_eq!(config.live.total_capacity, 30);
        assert_eq!(config.live.trend_capacity, 60);
        assert_eq!(config.live.interval, Duration::from_secs(3));
        assert_eq!(config.live.fleet_interval, Duration::from_secs(5));
        assert!(config.mqtt.is_none());
        assert!(config.selection.to_selection().is_empty());
    }

    #[test]
    fn test_log_level_parsing() {
        let toml_str = r#"
            [default]
            log_level = "DEBUG"

            [api]
            base_url = "http://localhost:8080/api/v1"

            [live]
            interval = "5s"
            trend_capacity = 120

            [selection]
            district = "Menteng"

            [mqtt]
            host = "test"
            username = "test"
            password = "test"
        "#;

        let config = Config::from_toml(toml_str).unwrap();
        assert_eq!(config.default.log_level, LogLevel::Debug);
        assert_eq!(config.live.interval, Duration::from_secs(5));
        assert_eq!(config.live.trend_capacity, 120);
        assert_eq!(config.selection.district.as_deref(), Some("Menteng"));
        let mqtt = config.mqtt.unwrap();
        assert_eq!(mqtt.port, 1883);
        assert_eq!(mqtt.root, "city-energy");
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let toml_str = r#"
            [api]
            base_url = "http://localhost:8080/api/v1"

            [live]
            total_capacity = 0
        "#;

        assert!(matches!(
            Config::from_toml(toml_str),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let toml_str = r#"
            [api]
            base_url = "ftp://example.com"
        "#;

        assert!(matches!(
            Config::from_toml(toml_str),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_mqtt_requires_host_or_socket() {
        let toml_str = r#"
            [api]
            base_url = "http://localhost:8080/api/v1"

            [mqtt]
            username = "test"
        "#;

        assert!(matches!(
            Config::from_toml(toml_str),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
