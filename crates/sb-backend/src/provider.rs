//! Signing backend provider trait.

use async_trait::async_trait;

use crate::error::BackendResult;
use crate::types::{
    ArtifactRef, CompletedSignature, SignaturePolicy, SignatureReport, SignatureToken,
    StartSignatureRequest, StartedSignature,
};

/// Provider for remote signature operations.
///
/// Implementations talk to a hosted signing service; the pipeline only
/// depends on this seam. All certificate validation, data-to-sign
/// assembly, and artifact assembly happen on the other side of it.
#[async_trait]
pub trait SigningBackend: Send + Sync {
    /// Begins a signature operation for a document.
    ///
    /// Returns the token correlating this operation and the data the
    /// local signer must produce a signature over.
    async fn start_signature(
        &self,
        request: &StartSignatureRequest,
    ) -> BackendResult<StartedSignature>;

    /// Finalizes a signature operation with the raw signature bytes.
    ///
    /// Returns a reference to the signed artifact.
    async fn complete_signature(
        &self,
        token: &SignatureToken,
        raw_signature: &[u8],
    ) -> BackendResult<CompletedSignature>;

    /// Opens a signed artifact and validates its signatures against a
    /// policy. Used by inspection flows, not by the batch pipeline.
    async fn open_signature(
        &self,
        artifact: &ArtifactRef,
        policy: SignaturePolicy,
    ) -> BackendResult<SignatureReport>;
}
