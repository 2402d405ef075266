//! Signing backend domain types.
//!
//! These are the logical operation inputs and outputs the pipeline works
//! with; the REST wire encoding (base64 binary fields, JSON casing) lives
//! in the client module.

use std::fmt;

use sb_core::DigestAlgorithm;
use serde::{Deserialize, Serialize};

/// Reference to a document to be signed.
///
/// The identifier is opaque to the pipeline; it is whatever the backend
/// uses to locate the document content (an upload id, a repository path).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Backend-side identifier of the document.
    pub id: String,

    /// Human-readable name for progress reporting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl DocumentRef {
    /// Creates a reference with just an identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Returns the display name, falling back to the identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}

/// Signature format family produced by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignaturePolicy {
    /// PDF signatures (PAdES).
    Pades,
    /// Generic binary/CMS signatures (CAdES).
    Cades,
    /// XML signatures (XAdES).
    Xades,
}

impl fmt::Display for SignaturePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pades => "PAdES",
            Self::Cades => "CAdES",
            Self::Xades => "XAdES",
        };
        f.write_str(name)
    }
}

/// Visual representation options for PAdES signatures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualOptions {
    /// Name of the signature field to fill or create.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,

    /// One-based page number for the visible mark.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    /// Reason text rendered with the signature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Location text rendered with the signature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Request to begin a signature operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartSignatureRequest {
    /// The document to sign.
    pub document: DocumentRef,

    /// Signature format family.
    pub policy: SignaturePolicy,

    /// Visual options (PAdES only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual: Option<VisualOptions>,
}

/// Opaque token correlating a started signature with its completion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignatureToken(pub String);

impl SignatureToken {
    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SignatureToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Output of a successful start call.
#[derive(Debug, Clone)]
pub struct StartedSignature {
    /// Token to present when completing the signature.
    pub token: SignatureToken,

    /// The bytes the local signer must produce a signature over.
    /// Assembled by the backend, never locally. The signer hashes these
    /// bytes with `digest_algorithm` as part of the signature scheme.
    pub data_to_sign: Vec<u8>,

    /// Hash algorithm of the signature scheme.
    pub digest_algorithm: DigestAlgorithm,
}

/// Reference to a signed artifact held by the backend or a blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef(pub String);

impl ArtifactRef {
    /// Returns the reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Certificate information reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerCertificateInfo {
    /// Subject common name.
    pub subject: String,

    /// Issuer common name.
    pub issuer: String,

    /// Hex-encoded SHA-256 thumbprint.
    pub thumbprint: String,
}

/// Output of a successful complete call.
#[derive(Debug, Clone)]
pub struct CompletedSignature {
    /// Where the signed artifact can be retrieved.
    pub artifact: ArtifactRef,

    /// The certificate the backend embedded in the signature.
    pub signer: SignerCertificateInfo,
}

/// Overall verdict of a signature inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureHealth {
    /// All signatures verified against the policy.
    Valid,
    /// At least one signature failed verification.
    Invalid,
    /// Verification could not be concluded (e.g., missing revocation data).
    Indeterminate,
}

/// Report produced by opening and validating a signed artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureReport {
    /// Policy the artifact was validated against.
    pub policy: SignaturePolicy,

    /// Overall verdict.
    pub health: SignatureHealth,

    /// Certificates found in the artifact's signatures.
    pub signers: Vec<SignerCertificateInfo>,
}
