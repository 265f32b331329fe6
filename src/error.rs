//! Errors that abort server startup.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] figment::Error),

    #[error("invalid metrics.path '{0}': must start with '/' and not shadow another route")]
    MetricsPath(String),

    #[error("invalid logging configuration: {0}")]
    Logging(String),

    #[error("failed to register metrics: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}
