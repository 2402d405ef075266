//! Certificate metadata and selection filters.
//!
//! The pipeline never parses or validates certificates; it only needs
//! enough metadata to let a caller pick one and to correlate audit events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for a certificate available to a local signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// SHA-256 thumbprint of the DER-encoded certificate, hex-encoded.
    pub thumbprint: String,

    /// Subject common name.
    pub subject: String,

    /// Issuer common name.
    pub issuer: String,

    /// Start of the validity window.
    pub not_before: DateTime<Utc>,

    /// End of the validity window.
    pub not_after: DateTime<Utc>,
}

impl Certificate {
    /// Returns whether the certificate is valid at the given instant.
    #[must_use]
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        at >= self.not_before && at <= self.not_after
    }
}

/// Filter for listing certificates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CertificateFilter {
    /// Case-insensitive substring match against the subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_contains: Option<String>,

    /// Only certificates valid at this instant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_at: Option<DateTime<Utc>>,
}

impl CertificateFilter {
    /// A filter matching every certificate.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Restricts to certificates whose subject contains the given text.
    #[must_use]
    pub fn with_subject(mut self, text: impl Into<String>) -> Self {
        self.subject_contains = Some(text.into());
        self
    }

    /// Restricts to certificates valid at the given instant.
    #[must_use]
    pub const fn valid_at(mut self, at: DateTime<Utc>) -> Self {
        self.valid_at = Some(at);
        self
    }

    /// Returns whether the certificate matches this filter.
    #[must_use]
    pub fn matches(&self, certificate: &Certificate) -> bool {
        if let Some(needle) = &self.subject_contains {
            if !certificate
                .subject
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        if let Some(at) = self.valid_at {
            if !certificate.is_valid_at(at) {
                return false;
            }
        }
        true
    }
}
