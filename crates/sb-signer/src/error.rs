//! Error types for local signer operations.

use thiserror::Error;

/// Result type for signer operations.
pub type SignerResult<T> = std::result::Result<T, SignerError>;

/// Error type for local signer operations.
#[derive(Debug, Error)]
pub enum SignerError {
    /// The user declined or dismissed the signing prompt.
    #[error("signing cancelled by user")]
    Cancelled,

    /// The signing device failed or was disconnected.
    #[error("signing device error: {0}")]
    Hardware(String),

    /// The requested certificate is not present in the signer's store.
    #[error("certificate not found: {0}")]
    CertificateNotFound(String),

    /// The signer does not support the requested digest algorithm.
    #[error("unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The pre-authorization budget is spent.
    #[error("authorization exhausted: all {0} authorized operations consumed")]
    AuthorizationExhausted(u32),

    /// The data to sign is unusable (e.g., empty).
    #[error("invalid data to sign: {0}")]
    InvalidData(String),

    /// The private key material could not be loaded.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The signing operation itself failed.
    #[error("signing failed: {0}")]
    Signing(String),
}
