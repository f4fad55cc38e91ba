//! CLI argument parsing for rabbitmq-zabbix
//!
//! This module provides the command-line interface using clap derive macros.
//! The tool is normally invoked from a Zabbix `UserParameter`, once per check.
//!
//! # Options
//!
//! - `--check`: Check to run (list_queues, list_exchanges, list_nodes, list_shovels,
//!   queues, exchanges, shovels, check_aliveness, server)
//! - `--metric`: Metric name for `--check server`
//! - `--node`: Node host name for `--check server` (default: broker host)
//! - `--filters`: JSON object or array of objects selecting records
//! - `--vhost`: Vhost tested by `--check check_aliveness` (default: /)
//! - `--config`: Optional YAML configuration file (env: RABBITMQ_ZABBIX_CONFIG)
//! - `--username` / `--password`: API credentials (env: RABBITMQ_ZABBIX_USERNAME / _PASSWORD)
//! - `--hostname` / `--port` / `--protocol`: Management API endpoint
//! - `--conf`: Zabbix agent config passed to zabbix_sender
//! - `--proxy`: Zabbix server/proxy override for zabbix_sender
//! - `--senderhostname`: Host name reported by zabbix_sender
//! - `--sender-bin`: zabbix_sender executable
//! - `--logfile` / `--loglevel`: Log output
//!
//! # Precedence
//!
//! Configuration values are resolved in the following order (highest to lowest priority):
//! 1. CLI arguments
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::{Config, ConfigError};
use crate::dispatcher::{Check, CheckRequest};

/// rabbitmq-zabbix - RabbitMQ monitoring for Zabbix
///
/// Queries the RabbitMQ management API and either prints low-level
/// discovery JSON, prints a single value, or pushes metrics through
/// zabbix_sender and prints its exit code.
#[derive(Parser, Debug)]
#[command(name = "rabbitmq-zabbix")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Type of check
    #[arg(long, value_enum)]
    pub check: Check,

    /// Which metric to evaluate (valid for --check server)
    #[arg(long, required_if_eq("check", "server"))]
    pub metric: Option<String>,

    /// Which node to check (valid for --check server)
    #[arg(long)]
    pub node: Option<String>,

    /// Filter used records, e.g. '[{"vhost": "/", "durable": true}]'
    #[arg(long, value_name = "JSON")]
    pub filters: Option<String>,

    /// Vhost tested by --check check_aliveness
    #[arg(long, default_value = "/")]
    pub vhost: String,

    /// Path to optional configuration file
    #[arg(
        long,
        value_name = "FILE",
        default_value = "/etc/zabbix/rabbitmq-zabbix.yaml",
        env = "RABBITMQ_ZABBIX_CONFIG"
    )]
    pub config: PathBuf,

    /// RabbitMQ API username
    #[arg(long, env = "RABBITMQ_ZABBIX_USERNAME")]
    pub username: Option<String>,

    /// RabbitMQ API password
    #[arg(long, env = "RABBITMQ_ZABBIX_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// RabbitMQ API host
    #[arg(long)]
    pub hostname: Option<String>,

    /// Use http or https
    #[arg(long)]
    pub protocol: Option<String>,

    /// RabbitMQ API port
    #[arg(long)]
    pub port: Option<u16>,

    /// Zabbix server/proxy override passed to zabbix_sender
    #[arg(long)]
    pub proxy: Option<String>,

    /// Zabbix agent configuration file passed to zabbix_sender
    #[arg(long, value_name = "FILE")]
    pub conf: Option<PathBuf>,

    /// Host name reported by zabbix_sender
    #[arg(long)]
    pub senderhostname: Option<String>,

    /// zabbix_sender executable
    #[arg(long, value_name = "PATH")]
    pub sender_bin: Option<String>,

    /// File to log to
    #[arg(long, value_name = "FILE")]
    pub logfile: Option<PathBuf>,

    /// Log level
    #[arg(long, value_enum, ignore_case = true)]
    pub loglevel: Option<LogLevel>,
}

impl Cli {
    /// Load the config file and apply command line overrides
    ///
    /// # Errors
    /// Returns an error if the config file is invalid or the merged
    /// configuration fails validation
    pub fn resolve_config(&self) -> Result<Config, ConfigError> {
        let mut config = Config::load_or_default(&self.config)?;
        self.apply_to(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Override config values with the ones given on the command line
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(username) = &self.username {
            config.broker.username = username.clone();
        }
        if let Some(password) = &self.password {
            config.broker.password = password.clone();
        }
        if let Some(hostname) = &self.hostname {
            config.broker.host = hostname.clone();
        }
        if let Some(protocol) = &self.protocol {
            config.broker.scheme = protocol.to_lowercase();
        }
        if let Some(port) = self.port {
            config.broker.port = port;
        }
        if let Some(proxy) = &self.proxy {
            config.sender.proxy = Some(proxy.clone());
        }
        if let Some(conf) = &self.conf {
            config.sender.agent_config = conf.clone();
        }
        if let Some(hostname) = &self.senderhostname {
            config.sender.sender_hostname = Some(hostname.clone());
        }
        if let Some(binary) = &self.sender_bin {
            config.sender.binary = binary.clone();
        }
        if let Some(file) = &self.logfile {
            config.logging.file = file.clone();
        }
        if let Some(level) = self.loglevel {
            config.logging.level = level.to_string();
        }
    }

    /// The check requested on the command line
    pub fn request(&self) -> CheckRequest {
        CheckRequest {
            check: self.check,
            metric: self.metric.clone(),
            node: self.node.clone(),
        }
    }
}

/// Log level options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Trace level - most verbose
    Trace,
    /// Debug level
    Debug,
    /// Info level - default
    Info,
    /// Warn level
    #[value(alias = "warning")]
    Warn,
    /// Error level - least verbose
    #[value(alias = "critical")]
    Error,
}

impl LogLevel {
    /// Parse a level name in any case, including the `warning` and `critical` aliases
    pub fn from_name(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name, true).ok()
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_display() {
        assert_eq!(LogLevel::Trace.to_string(), "trace");
        assert_eq!(LogLevel::Debug.to_string(), "debug");
        assert_eq!(LogLevel::Info.to_string(), "info");
        assert_eq!(LogLevel::Warn.to_string(), "warn");
        assert_eq!(LogLevel::Error.to_string(), "error");
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(tracing::Level::from(LogLevel::Trace), tracing::Level::TRACE);
        assert_eq!(tracing::Level::from(LogLevel::Warn), tracing::Level::WARN);
        assert_eq!(tracing::Level::from(LogLevel::Error), tracing::Level::ERROR);
    }

    #[test]
    fn test_log_level_from_name() {
        assert_eq!(LogLevel::from_name("INFO"), Some(LogLevel::Info));
        assert_eq!(LogLevel::from_name("warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_name("Critical"), Some(LogLevel::Error));
        assert_eq!(LogLevel::from_name("verbose"), None);
    }

    #[test]
    fn test_log_level_accepts_uppercase_and_aliases() {
        let cli = Cli::parse_from(["rabbitmq-zabbix", "--check", "list_nodes", "--loglevel", "DEBUG"]);
        assert_eq!(cli.loglevel, Some(LogLevel::Debug));

        let cli = Cli::parse_from(["rabbitmq-zabbix", "--check", "list_nodes", "--loglevel", "WARNING"]);
        assert_eq!(cli.loglevel, Some(LogLevel::Warn));
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["rabbitmq-zabbix", "--check", "queues"]);
        assert_eq!(cli.check, Check::Queues);
        assert_eq!(cli.metric, None);
        assert_eq!(cli.node, None);
        assert_eq!(cli.filters, None);
        assert_eq!(cli.vhost, "/");
        assert_eq!(cli.config, PathBuf::from("/etc/zabbix/rabbitmq-zabbix.yaml"));
        assert_eq!(cli.hostname, None);
        assert_eq!(cli.port, None);
        assert_eq!(cli.loglevel, None);
    }

    #[test]
    fn test_check_is_required() {
        assert!(Cli::try_parse_from(["rabbitmq-zabbix"]).is_err());
        assert!(Cli::try_parse_from(["rabbitmq-zabbix", "--check", "bogus"]).is_err());
    }

    #[test]
    fn test_server_requires_metric() {
        assert!(Cli::try_parse_from(["rabbitmq-zabbix", "--check", "server"]).is_err());

        let cli = Cli::parse_from([
            "rabbitmq-zabbix",
            "--check",
            "server",
            "--metric",
            "fd_used",
            "--node",
            "mq-01.example.com",
        ]);
        let request = cli.request();
        assert_eq!(request.check, Check::Server);
        assert_eq!(request.metric.as_deref(), Some("fd_used"));
        assert_eq!(request.node.as_deref(), Some("mq-01.example.com"));
    }

    #[test]
    fn test_overrides_applied_to_config() {
        let cli = Cli::parse_from([
            "rabbitmq-zabbix",
            "--check",
            "queues",
            "--username",
            "monitor",
            "--password",
            "secret",
            "--hostname",
            "mq.example.com",
            "--protocol",
            "HTTPS",
            "--port",
            "15671",
            "--proxy",
            "zbx-proxy",
            "--conf",
            "/tmp/agentd.conf",
            "--senderhostname",
            "mq-host",
            "--sender-bin",
            "/usr/local/bin/zabbix_sender",
            "--logfile",
            "/tmp/rabbitmq.log",
            "--loglevel",
            "debug",
        ]);

        let mut config = Config::default();
        cli.apply_to(&mut config);

        assert_eq!(config.broker.username, "monitor");
        assert_eq!(config.broker.password, "secret");
        assert_eq!(
            config.broker.api_base_url(),
            "https://mq.example.com:15671/api"
        );
        assert_eq!(config.sender.proxy.as_deref(), Some("zbx-proxy"));
        assert_eq!(config.sender.agent_config, PathBuf::from("/tmp/agentd.conf"));
        assert_eq!(config.sender.sender_hostname.as_deref(), Some("mq-host"));
        assert_eq!(config.sender.binary, "/usr/local/bin/zabbix_sender");
        assert_eq!(config.logging.file, PathBuf::from("/tmp/rabbitmq.log"));
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }
}
