//! Configuration management for mongotask
//!
//! Settings come from a TOML file (by default `~/.mongotask/config.toml`)
//! and are then overridden by command-line flags.
//!
//! Configuration precedence (highest to lowest):
//! 1. Command-line arguments
//! 2. Configuration file
//! 3. Default values

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::task::{DEFAULT_HOST, ToolLocator};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Connection defaults applied to every task
    #[serde(default)]
    pub connection: ConnectionDefaults,

    /// Where the mongo tools are found
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Build file runner behavior
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection attributes used when a task leaves them unset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionDefaults {
    /// Host passed to the tools with `-h`
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// mongod data directory passed with `--dbpath`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dbpath: Option<PathBuf>,
}

/// Tool location configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Directory holding the mongo tools; `PATH` is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin_dir: Option<PathBuf>,
}

/// Build runner configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Keep running remaining tasks after one fails
    #[serde(default)]
    pub keep_going: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default)]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

impl Default for ConnectionDefaults {
    fn default() -> Self {
        Self {
            host: default_host(),
            username: None,
            password: None,
            dbpath: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a file
    ///
    /// With `None` the default path is used, and a missing default file
    /// yields the default configuration. An explicitly given path must exist.
    pub fn load_from_file(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::default_config_path(), false),
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigError::FileNotFound(path.display().to_string()).into());
            }
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        toml::from_str(&content).map_err(|e| {
            ConfigError::InvalidFormat(format!("{}: {}", path.display(), e)).into()
        })
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".mongotask")
            .join("config.toml")
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.connection.host.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "connection.host".to_string(),
                value: self.connection.host.clone(),
            }
            .into());
        }

        if let Some(dir) = &self.tools.bin_dir {
            if !dir.is_dir() {
                return Err(ConfigError::InvalidValue {
                    field: "tools.bin_dir".to_string(),
                    value: dir.display().to_string(),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Serialize to TOML with the password masked
    pub fn to_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        if shown.connection.password.is_some() {
            shown.connection.password = Some("***".to_string());
        }
        toml::to_string_pretty(&shown)
            .map_err(|e| ConfigError::Generic(format!("Failed to serialize config: {e}")).into())
    }

    /// Tool locator for the configured `bin_dir`
    pub fn tool_locator(&self) -> ToolLocator {
        ToolLocator::new(self.tools.bin_dir.clone())
    }
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MongoTaskError;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.connection.host, "127.0.0.1");
        assert!(config.connection.username.is_none());
        assert!(config.tools.bin_dir.is_none());
        assert!(!config.runner.keep_going);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [connection]
            username = "builder"
            password = "pw"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.connection.host, "127.0.0.1");
        assert_eq!(config.connection.username.as_deref(), Some("builder"));
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert!(!config.logging.timestamps);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = Config::from_toml_str("[logging]\nlevel = \"loud\"").unwrap_err();
        assert!(matches!(
            err,
            MongoTaskError::Config(ConfigError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        let err = Config::load_from_file(Some(path.as_path())).unwrap_err();
        assert!(matches!(
            err,
            MongoTaskError::Config(ConfigError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[runner]\nkeep_going = true\n").unwrap();
        let config = Config::load_from_file(Some(path.as_path())).unwrap();
        assert!(config.runner.keep_going);
    }

    #[test]
    fn test_validate_rejects_empty_host_and_missing_bin_dir() {
        let mut config = Config::default();
        config.connection.host = " ".to_string();
        assert!(config.validate().is_err());

        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.tools.bin_dir = Some(dir.path().join("missing"));
        assert!(config.validate().is_err());

        config.tools.bin_dir = Some(dir.path().to_path_buf());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_to_toml_masks_password() {
        let mut config = Config::default();
        config.connection.username = Some("admin".to_string());
        config.connection.password = Some("hunter2".to_string());
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(LogLevel::Warn.to_tracing_level(), tracing::Level::WARN);
        assert_eq!(LogLevel::Trace.to_tracing_level(), tracing::Level::TRACE);
    }
}
