//! Configuration management for otelui.
//!
//! This module provides configuration handling with:
//! - YAML file support
//! - Environment variable and CLI overrides (applied by `cli`)
//! - Validation and defaults

use crate::core::{OteluiError, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

/// Complete configuration for otelui
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Receiver configuration
    pub server: ServerConfig,
    /// Telemetry store configuration
    pub store: StoreConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Debug mode
    #[serde(skip)]
    pub debug: bool,
    /// Feed synthetic telemetry into the store
    #[serde(skip)]
    pub demo: bool,
}

/// Receiver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// GRPC port for the OTLP receiver
    pub grpc_port: u16,
    /// HTTP port for the OTLP receiver
    pub http_port: u16,
    /// Bind address for both receivers
    pub bind_address: IpAddr,
    /// Largest accepted request, in bytes
    pub max_message_bytes: usize,
}

/// Telemetry store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Change notifications buffered per subscriber before the oldest are dropped
    pub notification_capacity: usize,
    /// Period of the fallback change notification
    #[serde(with = "humantime_serde")]
    pub heartbeat_interval: Duration,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: LogLevel,
    /// Log file path; the terminal belongs to the display, so logs go here when set
    pub file: Option<PathBuf>,
    /// Emit JSON lines instead of the compact format
    pub structured: bool,
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            grpc_port: 4317,
            http_port: 4318,
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            max_message_bytes: 4 * 1024 * 1024,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            notification_capacity: 64,
            heartbeat_interval: Duration::from_secs(1),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Info,
            file: None,
            structured: false,
        }
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.grpc_port == self.server.http_port {
            return Err(OteluiError::config(format!(
                "GRPC and HTTP ports must be different: both set to {}",
                self.server.grpc_port
            )));
        }

        if self.server.max_message_bytes == 0 {
            return Err(OteluiError::config("max_message_bytes must be greater than 0"));
        }

        if self.store.notification_capacity == 0 {
            return Err(OteluiError::config("notification_capacity must be greater than 0"));
        }

        if self.store.heartbeat_interval.is_zero() {
            return Err(OteluiError::config("heartbeat_interval must be greater than 0"));
        }

        Ok(())
    }
}

impl LogLevel {
    /// Convert to tracing filter string
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

/// Configuration builder for programmatic construction
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from YAML string
    pub fn from_yaml(mut self, yaml: &str) -> Result<Self> {
        self.config = serde_yaml::from_str(yaml)
            .map_err(|e| OteluiError::config(format!("Failed to parse YAML config: {e}")))?;
        Ok(self)
    }

    /// Set GRPC port
    pub fn grpc_port(mut self, port: u16) -> Self {
        self.config.server.grpc_port = port;
        self
    }

    /// Set HTTP port
    pub fn http_port(mut self, port: u16) -> Self {
        self.config.server.http_port = port;
        self
    }

    /// Set the fallback notification period
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.config.store.heartbeat_interval = interval;
        self
    }

    /// Set debug mode; debug mode also lowers the log level and writes a log file
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        if debug {
            self.config.logging.level = LogLevel::Debug;
            if self.config.logging.file.is_none() {
                self.config.logging.file = Some(PathBuf::from("debug.log"));
            }
        }
        self
    }

    /// Enable the synthetic telemetry feed
    pub fn demo(mut self, demo: bool) -> Self {
        self.config.demo = demo;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
