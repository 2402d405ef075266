//! Error types for signing backend operations.

use thiserror::Error;

/// Result type for backend operations.
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Error type for signing backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend rejected the request (validation failure, bad signature
    /// bytes, unknown token). Not retryable.
    #[error("backend rejected the request: {0}")]
    Rejected(String),

    /// The backend answered with something the client could not interpret.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The backend could not be reached. Retryable.
    #[error("transport error: {0}")]
    Transport(String),

    /// The request timed out. Retryable.
    #[error("backend request timed out")]
    Timeout,
}

impl BackendError {
    /// Returns whether the failure is transient and worth retrying.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout)
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() || error.is_request() {
            Self::Transport(error.to_string())
        } else if error.is_decode() {
            Self::Protocol(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}
