//! Local signer provider trait.

use async_trait::async_trait;
use sb_core::DigestAlgorithm;

use crate::certificate::{Certificate, CertificateFilter};
use crate::error::SignerResult;
use crate::preauth::Preauthorization;

/// Provider for local private-key signing.
///
/// Implementations may wrap a hardware token, an OS key store, or (for
/// servers and tests) software keys. The common hardware case processes
/// one request at a time, which is why the pipeline's sign stage runs with
/// a single worker; implementations are nevertheless required to be safe
/// under concurrent calls.
#[async_trait]
pub trait LocalSigner: Send + Sync {
    /// Lists certificates matching the filter.
    async fn list_certificates(
        &self,
        filter: &CertificateFilter,
    ) -> SignerResult<Vec<Certificate>>;

    /// Obtains a single user consent covering `count` subsequent sign
    /// operations with the given certificate.
    ///
    /// For interactive signers this is the one prompt of the batch session.
    async fn preauthorize(&self, thumbprint: &str, count: u32) -> SignerResult<Preauthorization>;

    /// Produces a raw signature over the backend-assembled data-to-sign
    /// with the authorized certificate's private key, consuming one
    /// authorization slot.
    ///
    /// The input is the full data to sign, not a precomputed hash; the
    /// signature scheme applies `algorithm` as its hash step, so the
    /// result verifies against `data` as the message.
    async fn sign(
        &self,
        authorization: &Preauthorization,
        data: &[u8],
        algorithm: DigestAlgorithm,
    ) -> SignerResult<Vec<u8>>;
}
