//! # sb-backend
//!
//! Signing backend abstraction for the sigbatch workspace.
//!
//! The signing backend is the remote service that owns the hard parts of
//! digital signing: data-to-sign assembly, signature assembly
//! (PAdES/CAdES/XAdES), and policy enforcement. This crate defines the
//! trait seam the pipeline consumes plus a REST client implementation.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod error;
pub mod provider;
pub mod rest;
pub mod types;

pub use error::{BackendError, BackendResult};
pub use provider::SigningBackend;
pub use rest::RestSigningBackend;
pub use types::{
    ArtifactRef, CompletedSignature, DocumentRef, SignatureHealth, SignaturePolicy,
    SignatureReport, SignatureToken, SignerCertificateInfo, StartSignatureRequest,
    StartedSignature, VisualOptions,
};
