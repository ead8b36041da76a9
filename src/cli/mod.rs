//! Command-line interface for otelui.
//!
//! Just run `otelui` to start receivers on the standard OTLP ports.

use crate::application::Application;
use crate::core::config::{ConfigBuilder, LoggingConfig};
use crate::core::{Config, OteluiError, Result};
use clap::Parser;
use std::path::PathBuf;

/// In-memory OTLP receiver and telemetry inspector
#[derive(Parser, Debug)]
#[command(name = "otelui")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// GRPC port for OTLP receiver
    #[arg(long, env = "OTELUI_GRPC_PORT")]
    pub grpc_port: Option<u16>,

    /// HTTP port for OTLP receiver
    #[arg(long, env = "OTELUI_HTTP_PORT")]
    pub http_port: Option<u16>,

    /// Configuration file path (default: ~/.config/otelui/config.yaml)
    #[arg(short, long, env = "OTELUI_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging to debug.log
    #[arg(short, long, env = "OTELUI_DEBUG")]
    pub debug: bool,

    /// Feed synthetic telemetry into the store
    #[arg(long, env = "OTELUI_DEMO")]
    pub demo: bool,

    /// Validate configuration and exit
    #[arg(long)]
    pub check_config: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Load configuration with proper precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Environment variables
    /// 3. Config file
    /// 4. Defaults (lowest priority)
    pub async fn load_config(&self) -> Result<Config> {
        let mut builder = ConfigBuilder::new();

        let config_path = match &self.config {
            Some(path) => Some(path.clone()),
            None => default_config_path().filter(|path| path.exists()),
        };

        if let Some(path) = config_path {
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => builder = builder.from_yaml(&content)?,
                Err(e) => {
                    return Err(OteluiError::config(format!(
                        "Failed to read config file {}: {}",
                        path.display(),
                        e
                    )));
                },
            }
        }

        self.build_config_from_args(builder)
    }

    fn build_config_from_args(&self, mut builder: ConfigBuilder) -> Result<Config> {
        if let Some(port) = self.grpc_port {
            builder = builder.grpc_port(port);
        }
        if let Some(port) = self.http_port {
            builder = builder.http_port(port);
        }

        builder.debug(self.debug).demo(self.demo).build()
    }

    /// Initialize logging based on configuration.
    ///
    /// The terminal belongs to the display, so logs go to `logging.file` when
    /// one is configured and to stderr otherwise.
    pub fn init_logging(&self, logging: &LoggingConfig) -> Result<()> {
        use tracing_subscriber::{
            fmt::writer::BoxMakeWriter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
        };

        let env_log_level = std::env::var("OTELUI_LOG_LEVEL").ok();
        let log_level = if self.debug {
            "debug"
        } else {
            env_log_level.as_deref().unwrap_or(logging.level.as_str())
        };

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

        let (writer, ansi) = match &logging.file {
            Some(path) => {
                let file = std::fs::File::create(path)?;
                (BoxMakeWriter::new(std::sync::Mutex::new(file)), false)
            },
            None => (BoxMakeWriter::new(std::io::stderr), true),
        };

        let registry = tracing_subscriber::registry().with(filter);
        let result = if logging.structured {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
                .try_init()
        } else {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_ansi(ansi)
                        .with_writer(writer)
                        .compact(),
                )
                .try_init()
        };

        result.map_err(|e| OteluiError::config(format!("Failed to initialize logging: {e}")))
    }
}

/// `<config_dir>/otelui/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("otelui").join("config.yaml"))
}

/// Execute the otelui application.
pub async fn execute(cli: Cli) -> Result<()> {
    let config = cli.load_config().await?;

    if cli.check_config {
        println!("Configuration is valid!");
        println!("  GRPC port: {}", config.server.grpc_port);
        println!("  HTTP port: {}", config.server.http_port);
        println!("  Bind address: {}", config.server.bind_address);
        println!("  Max message size: {} bytes", config.server.max_message_bytes);
        println!("  Heartbeat: {:?}", config.store.heartbeat_interval);
        return Ok(());
    }

    cli.init_logging(&config.logging)?;

    Application::new(config)?.run().await
}
