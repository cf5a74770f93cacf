use thiserror::Error;

/// Top-level error type for configuration and startup of the graph cleaner.
#[derive(Error, Debug)]
pub enum CleanerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid bind address {addr}: {reason}")]
    Bind { addr: String, reason: String },
}
