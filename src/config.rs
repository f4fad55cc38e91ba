//! Configuration management for rabbitmq-zabbix
//!
//! Handles loading and validating configuration from YAML files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cli::LogLevel;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error reading the configuration file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Error parsing the configuration file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Management API endpoint configuration
    #[serde(default)]
    pub broker: BrokerConfig,

    /// zabbix_sender configuration
    #[serde(default)]
    pub sender: SenderConfig,

    /// Log output configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Management API endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// URL scheme (http or https)
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Broker host name
    #[serde(default = "default_host")]
    pub host: String,

    /// Management API port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Basic auth username
    #[serde(default = "default_credential")]
    pub username: String,

    /// Basic auth password
    #[serde(default = "default_credential")]
    pub password: String,
}

/// zabbix_sender configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderConfig {
    /// Sender executable
    #[serde(default = "default_sender_binary")]
    pub binary: String,

    /// Zabbix agent configuration file handed to the sender with `-c`
    #[serde(default = "default_agent_config")]
    pub agent_config: PathBuf,

    /// Zabbix server/proxy override (`-z`)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Host name the metrics are reported for (`-s`)
    #[serde(default)]
    pub sender_hostname: Option<String>,
}

/// Log output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log file, opened in append mode
    #[serde(default = "default_log_file")]
    pub file: PathBuf,

    /// Log level (trace, debug, info, warn/warning, error/critical)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_scheme() -> String {
    "http".to_string()
}

/// Local host name, read from the kernel when available
fn default_host() -> String {
    std::fs::read_to_string("/proc/sys/kernel/hostname")
        .or_else(|_| std::fs::read_to_string("/etc/hostname"))
        .map(|s| s.trim().to_string())
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

fn default_port() -> u16 {
    15672
}

fn default_credential() -> String {
    "guest".to_string()
}

fn default_sender_binary() -> String {
    "zabbix_sender".to_string()
}

fn default_agent_config() -> PathBuf {
    PathBuf::from("/etc/zabbix/zabbix_agentd.conf")
}

fn default_log_file() -> PathBuf {
    PathBuf::from("/var/log/zabbix-agent/rabbitmq_zabbix.log")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            host: default_host(),
            port: default_port(),
            username: default_credential(),
            password: default_credential(),
        }
    }
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            binary: default_sender_binary(),
            agent_config: default_agent_config(),
            proxy: None,
            sender_hostname: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            level: default_log_level(),
        }
    }
}

impl LoggingConfig {
    /// Configured level, or `None` when the name is not recognized
    pub fn tracing_level(&self) -> Option<tracing::Level> {
        LogLevel::from_name(&self.level).map(tracing::Level::from)
    }
}

impl BrokerConfig {
    /// Base URL of the management API, e.g. `http://localhost:15672/api`
    pub fn api_base_url(&self) -> String {
        format!("{}://{}:{}/api", self.scheme, self.host, self.port)
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file, falling back to defaults if not found
    ///
    /// The config file is optional: the tool is normally driven entirely by
    /// command line flags from a Zabbix `UserParameter`.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        Self::load(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.broker.port == 0 {
            return Err(ConfigError::ValidationError(
                "Broker port must be greater than 0".to_string(),
            ));
        }

        if !matches!(self.broker.scheme.as_str(), "http" | "https") {
            return Err(ConfigError::ValidationError(format!(
                "Unsupported protocol '{}', expected http or https",
                self.broker.scheme
            )));
        }

        if self.broker.host.is_empty() {
            return Err(ConfigError::ValidationError(
                "Broker host must not be empty".to_string(),
            ));
        }

        if self.logging.tracing_level().is_none() {
            return Err(ConfigError::ValidationError(format!(
                "Unknown log level '{}'",
                self.logging.level
            )));
        }

        if self.sender.binary.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Sender binary must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.broker.port, 15672);
        assert_eq!(config.broker.scheme, "http");
        assert_eq!(config.broker.username, "guest");
        assert_eq!(config.sender.binary, "zabbix_sender");
        assert_eq!(
            config.sender.agent_config,
            PathBuf::from("/etc/zabbix/zabbix_agentd.conf")
        );
        assert!(config.sender.proxy.is_none());
        assert_eq!(config.logging.level, "info");
        assert!(!config.broker.host.is_empty());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.broker.port = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.broker.scheme = "ftp".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.sender.binary = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_level_aliases_in_yaml() {
        let config: Config = serde_yaml::from_str("logging:\n  level: warning\n").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.logging.tracing_level(), Some(tracing::Level::WARN));

        let config: Config = serde_yaml::from_str("logging:\n  level: CRITICAL\n").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.logging.tracing_level(), Some(tracing::Level::ERROR));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
broker:
  host: rabbit.example.com
  scheme: https
sender:
  proxy: zabbix-proxy.example.com
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.broker.host, "rabbit.example.com");
        assert_eq!(config.broker.port, 15672);
        assert_eq!(
            config.sender.proxy.as_deref(),
            Some("zabbix-proxy.example.com")
        );
        assert_eq!(
            config.broker.api_base_url(),
            "https://rabbit.example.com:15672/api"
        );
        assert!(config.validate().is_ok());
    }
}
