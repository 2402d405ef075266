//! The three concrete pipeline stages.
//!
//! Each stage adapts one collaborator call (backend or signer) to the
//! runner's [`Stage`] contract and advances the item's state machine on
//! success. Stages hold no per-item state; everything item-specific
//! travels with the item itself.

use std::sync::Arc;

use async_trait::async_trait;
use sb_backend::{
    BackendError, SignaturePolicy, SigningBackend, StartSignatureRequest, VisualOptions,
};
use sb_signer::{LocalSigner, Preauthorization};

use crate::item::{FailureReason, StageKind, WorkItem};
use crate::runner::Stage;

fn backend_failure(stage: StageKind, error: BackendError) -> FailureReason {
    match error {
        BackendError::Rejected(message) | BackendError::Protocol(message) => {
            FailureReason::Backend { stage, message }
        }
        BackendError::Transport(message) => FailureReason::Transport { stage, message },
        BackendError::Timeout => FailureReason::Timeout { stage },
    }
}

/// Begins a signature operation at the backend for each document.
pub(crate) struct StartStage {
    pub(crate) backend: Arc<dyn SigningBackend>,
    pub(crate) policy: SignaturePolicy,
    pub(crate) visual: Option<VisualOptions>,
}

#[async_trait]
impl Stage for StartStage {
    fn kind(&self) -> StageKind {
        StageKind::Start
    }

    async fn apply(&self, item: &mut WorkItem) -> Result<(), FailureReason> {
        let request = StartSignatureRequest {
            document: item.document.clone(),
            policy: self.policy,
            visual: self.visual.clone(),
        };
        let started = self
            .backend
            .start_signature(&request)
            .await
            .map_err(|error| backend_failure(StageKind::Start, error))?;

        let advanced = item.mark_started(started);
        debug_assert!(advanced, "start stage received a non-pending item");
        Ok(())
    }
}

/// Signs each backend-provided payload with the local signer.
///
/// Runs with a single worker by default; the shared pre-authorization is
/// consumed one slot per signature either way.
pub(crate) struct SignStage {
    pub(crate) signer: Arc<dyn LocalSigner>,
    pub(crate) authorization: Arc<Preauthorization>,
}

#[async_trait]
impl Stage for SignStage {
    fn kind(&self) -> StageKind {
        StageKind::Sign
    }

    async fn apply(&self, item: &mut WorkItem) -> Result<(), FailureReason> {
        let (data, algorithm) = match (item.data_to_sign(), item.digest_algorithm()) {
            (Some(data), Some(algorithm)) => (data.to_vec(), algorithm),
            _ => {
                return Err(FailureReason::Signer {
                    message: "item reached the sign stage without data to sign".to_string(),
                })
            }
        };

        let signature = self
            .signer
            .sign(&self.authorization, &data, algorithm)
            .await
            .map_err(|error| FailureReason::Signer {
                message: error.to_string(),
            })?;

        let advanced = item.mark_signed(signature);
        debug_assert!(advanced, "sign stage received an unstarted item");
        Ok(())
    }
}

/// Finalizes each signature at the backend.
pub(crate) struct CompleteStage {
    pub(crate) backend: Arc<dyn SigningBackend>,
}

#[async_trait]
impl Stage for CompleteStage {
    fn kind(&self) -> StageKind {
        StageKind::Complete
    }

    async fn apply(&self, item: &mut WorkItem) -> Result<(), FailureReason> {
        let (token, raw_signature) = match (item.token(), item.raw_signature()) {
            (Some(token), Some(raw)) => (token.clone(), raw.to_vec()),
            _ => {
                return Err(FailureReason::Backend {
                    stage: StageKind::Complete,
                    message: "item reached the complete stage unsigned".to_string(),
                })
            }
        };

        let completed = self
            .backend
            .complete_signature(&token, &raw_signature)
            .await
            .map_err(|error| backend_failure(StageKind::Complete, error))?;

        let advanced = item.mark_completed(completed);
        debug_assert!(advanced, "complete stage received an unsigned item");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_errors_map_to_failure_reasons() {
        assert!(matches!(
            backend_failure(
                StageKind::Start,
                BackendError::Rejected("bad document".to_string())
            ),
            FailureReason::Backend {
                stage: StageKind::Start,
                ..
            }
        ));
        assert!(matches!(
            backend_failure(
                StageKind::Complete,
                BackendError::Protocol("missing field".to_string())
            ),
            FailureReason::Backend {
                stage: StageKind::Complete,
                ..
            }
        ));
        assert!(matches!(
            backend_failure(
                StageKind::Start,
                BackendError::Transport("refused".to_string())
            ),
            FailureReason::Transport {
                stage: StageKind::Start,
                ..
            }
        ));
        assert!(matches!(
            backend_failure(StageKind::Complete, BackendError::Timeout),
            FailureReason::Timeout {
                stage: StageKind::Complete
            }
        ));
    }
}
