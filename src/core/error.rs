use thiserror::Error;

#[derive(Error, Debug)]
pub enum OteluiError {
    #[error("OTLP protocol error: {0}")]
    Protocol(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("GRPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("Async task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result type alias for otelui operations
pub type Result<T> = std::result::Result<T, OteluiError>;

impl OteluiError {
    /// Creates a new protocol error
    pub fn protocol<S: Into<String>>(msg: S) -> Self {
        Self::Protocol(msg.into())
    }

    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a new network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    /// Returns the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Protocol(_) => "protocol",
            Self::Config(_) => "config",
            Self::Network(_) | Self::Transport(_) => "network",
            Self::Io(_) => "io",
            Self::Serialization(_) | Self::Yaml(_) => "serialization",
            Self::Join(_) => "async",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = OteluiError::protocol("bad frame");
        assert_eq!(err.to_string(), "OTLP protocol error: bad frame");
        assert_eq!(err.category(), "protocol");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        let err: OteluiError = io.into();
        assert_eq!(err.category(), "io");
        assert!(err.to_string().contains("port taken"));
    }

    #[test]
    fn test_config_category() {
        assert_eq!(OteluiError::config("x").category(), "config");
        assert_eq!(OteluiError::network("x").category(), "network");
    }
}
