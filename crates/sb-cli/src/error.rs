//! CLI error types.

use thiserror::Error;

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Signing backend error.
    #[error("backend error: {0}")]
    Backend(#[from] sb_backend::BackendError),

    /// Local signer error.
    #[error("signer error: {0}")]
    Signer(#[from] sb_signer::SignerError),

    /// Pipeline error.
    #[error(transparent)]
    Pipeline(#[from] sb_core::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;
