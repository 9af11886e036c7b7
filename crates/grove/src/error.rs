//! CLI error types.

use grove_config::ConfigError;
use grove_router::ConfigurationError;
use grove_server::ServerError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Discovery(#[from] ConfigurationError),

    #[error("{0}")]
    Server(#[from] ServerError),

    #[error("{0}")]
    Validation(String),

    #[error("Failed to create tokio runtime: {0}")]
    Runtime(std::io::Error),
}
