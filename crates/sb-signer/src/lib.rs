//! # sb-signer
//!
//! Local signer abstraction for the sigbatch workspace.
//!
//! The local signer is the capability that holds private keys and computes
//! raw signatures over backend-provided payloads. In production this is a
//! smartcard, a hardware token, or an OS key store; this crate defines the
//! trait seam plus a software implementation backed by aws-lc-rs, suitable
//! for servers holding file-based keys and for tests.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod certificate;
pub mod error;
pub mod preauth;
pub mod provider;
pub mod software;

pub use certificate::{Certificate, CertificateFilter};
pub use error::{SignerError, SignerResult};
pub use preauth::Preauthorization;
pub use provider::LocalSigner;
pub use software::SoftwareSigner;
