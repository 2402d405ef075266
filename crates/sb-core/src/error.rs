//! Error handling for the sigbatch workspace.
//!
//! Pipeline-level errors are fatal and raised before any document is
//! processed; per-item failures during a batch are modeled separately (see
//! `sb-pipeline`) and never surface through this type.

use thiserror::Error;

/// Result type alias using the sigbatch error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for pipeline-level operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (e.g., a stage configured with zero workers).
    #[error("configuration error: {0}")]
    Config(String),

    /// Pre-authorization does not cover the batch.
    #[error("pre-authorization error: {0}")]
    Preauthorization(String),

    /// Signing backend error outside the per-item flow.
    #[error("backend error: {0}")]
    Backend(String),

    /// Local signer error outside the per-item flow.
    #[error("signer error: {0}")]
    Signer(String),

    /// Network transport error.
    #[error("transport error: {0}")]
    Transport(String),

    /// The batch was cancelled before completion.
    #[error("batch cancelled")]
    Cancelled,

    /// Internal error.
    #[error("internal error")]
    Internal,
}

impl Error {
    /// Returns whether this error was caused by the caller's inputs and is
    /// raised before any item is processed.
    #[must_use]
    pub const fn is_construction_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Preauthorization(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_names_the_problem() {
        let error = Error::Config("sign concurrency must be at least 1".to_string());
        assert_eq!(
            error.to_string(),
            "configuration error: sign concurrency must be at least 1"
        );
        assert!(error.is_construction_error());
    }

    #[test]
    fn cancelled_is_not_a_construction_error() {
        assert!(!Error::Cancelled.is_construction_error());
    }

    #[test]
    fn internal_error_is_generic() {
        // Don't expose internal details
        assert_eq!(Error::Internal.to_string(), "internal error");
    }
}
