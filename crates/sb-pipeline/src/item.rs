//! Work items and their per-item state machine.
//!
//! A work item represents one document's progress through the pipeline:
//! `Pending → Started → Signed → Completed`, or `Failed` from any
//! non-terminal state. `Completed` and `Failed` are terminal; the
//! transition methods refuse to leave them.
//!
//! Items are moved by value between queues and runners; there is exactly
//! one owner at any time, never a shared mutable item.

use std::fmt;

use sb_backend::{
    ArtifactRef, CompletedSignature, DocumentRef, SignatureToken, SignerCertificateInfo,
    StartedSignature,
};
use sb_core::DigestAlgorithm;
use serde::Serialize;
use thiserror::Error;

/// The three pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    /// Begin a signature operation at the backend.
    Start,
    /// Sign the data-to-sign with the local signer.
    Sign,
    /// Finalize the signature at the backend.
    Complete,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Sign => "sign",
            Self::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// Why a work item failed.
///
/// All of these are local to the item: the batch continues regardless.
#[derive(Debug, Clone, Error, Serialize)]
pub enum FailureReason {
    /// The backend refused the request during the named stage.
    #[error("backend rejected {stage}: {message}")]
    Backend {
        /// Stage during which the rejection happened.
        stage: StageKind,
        /// Backend-provided explanation.
        message: String,
    },

    /// The local signer failed (user cancel, hardware fault, bad input).
    #[error("signer failure: {message}")]
    Signer {
        /// Signer-provided explanation.
        message: String,
    },

    /// The backend could not be reached during the named stage.
    #[error("transport failure during {stage}: {message}")]
    Transport {
        /// Stage during which the failure happened.
        stage: StageKind,
        /// Transport-level explanation.
        message: String,
    },

    /// The stage call exceeded its timeout.
    #[error("{stage} stage timed out")]
    Timeout {
        /// Stage that timed out.
        stage: StageKind,
    },

    /// The batch was cancelled before this item was processed.
    #[error("batch cancelled")]
    Cancelled,
}

impl FailureReason {
    /// Returns whether a retry could plausibly succeed.
    ///
    /// Sign-stage timeouts are excluded: retrying would re-prompt the
    /// user and consume additional authorization slots.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Timeout { stage } => *stage != StageKind::Sign,
            Self::Backend { .. } | Self::Signer { .. } | Self::Cancelled => false,
        }
    }
}

/// Terminal and intermediate outcomes of a work item.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase", tag = "state", content = "reason")]
pub enum ItemOutcome {
    /// Not yet picked up by the start stage.
    Pending,
    /// Start succeeded; waiting for the sign stage.
    Started,
    /// Sign succeeded; waiting for the complete stage.
    Signed,
    /// Fully signed; artifact reference available. Terminal.
    Completed,
    /// Failed at some stage. Terminal.
    Failed(FailureReason),
}

impl ItemOutcome {
    /// Returns whether the outcome is terminal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }
}

/// One document's progress through the pipeline.
#[derive(Debug, Serialize)]
pub struct WorkItem {
    /// Stable position in the original batch, for caller correlation.
    pub index: usize,

    /// The document being signed.
    pub document: DocumentRef,

    outcome: ItemOutcome,

    token: Option<SignatureToken>,
    #[serde(skip)]
    data_to_sign: Option<Vec<u8>>,
    digest_algorithm: Option<DigestAlgorithm>,
    #[serde(skip)]
    raw_signature: Option<Vec<u8>>,
    artifact: Option<ArtifactRef>,
    signer_info: Option<SignerCertificateInfo>,
}

impl WorkItem {
    /// Creates a pending item for the document at the given batch index.
    #[must_use]
    pub fn new(index: usize, document: DocumentRef) -> Self {
        Self {
            index,
            document,
            outcome: ItemOutcome::Pending,
            token: None,
            data_to_sign: None,
            digest_algorithm: None,
            raw_signature: None,
            artifact: None,
            signer_info: None,
        }
    }

    /// Current outcome.
    #[must_use]
    pub const fn outcome(&self) -> &ItemOutcome {
        &self.outcome
    }

    /// Returns whether the item reached a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.outcome.is_terminal()
    }

    /// The failure reason, if the item failed.
    #[must_use]
    pub const fn failure(&self) -> Option<&FailureReason> {
        match &self.outcome {
            ItemOutcome::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    /// The backend token, once the start stage succeeded.
    #[must_use]
    pub const fn token(&self) -> Option<&SignatureToken> {
        self.token.as_ref()
    }

    /// The data to sign, once the start stage succeeded.
    #[must_use]
    pub fn data_to_sign(&self) -> Option<&[u8]> {
        self.data_to_sign.as_deref()
    }

    /// The digest algorithm, once the start stage succeeded.
    #[must_use]
    pub const fn digest_algorithm(&self) -> Option<DigestAlgorithm> {
        self.digest_algorithm
    }

    /// The raw signature bytes, once the sign stage succeeded.
    #[must_use]
    pub fn raw_signature(&self) -> Option<&[u8]> {
        self.raw_signature.as_deref()
    }

    /// The artifact reference, once the item completed.
    #[must_use]
    pub const fn artifact(&self) -> Option<&ArtifactRef> {
        self.artifact.as_ref()
    }

    /// Certificate info the backend embedded, once the item completed.
    #[must_use]
    pub const fn signer_info(&self) -> Option<&SignerCertificateInfo> {
        self.signer_info.as_ref()
    }

    /// Records a successful start stage. Returns `false` if the item is
    /// not `Pending` (the transition is refused).
    pub fn mark_started(&mut self, started: StartedSignature) -> bool {
        if !matches!(self.outcome, ItemOutcome::Pending) {
            return false;
        }
        self.token = Some(started.token);
        self.data_to_sign = Some(started.data_to_sign);
        self.digest_algorithm = Some(started.digest_algorithm);
        self.outcome = ItemOutcome::Started;
        true
    }

    /// Records a successful sign stage. Returns `false` if the item is
    /// not `Started`.
    pub fn mark_signed(&mut self, raw_signature: Vec<u8>) -> bool {
        if !matches!(self.outcome, ItemOutcome::Started) {
            return false;
        }
        self.raw_signature = Some(raw_signature);
        self.outcome = ItemOutcome::Signed;
        true
    }

    /// Records a successful complete stage. Returns `false` if the item
    /// is not `Signed`.
    pub fn mark_completed(&mut self, completed: CompletedSignature) -> bool {
        if !matches!(self.outcome, ItemOutcome::Signed) {
            return false;
        }
        self.artifact = Some(completed.artifact);
        self.signer_info = Some(completed.signer);
        self.outcome = ItemOutcome::Completed;
        true
    }

    /// Fails the item. Returns `false` if it is already terminal (terminal
    /// outcomes never change).
    pub fn fail(&mut self, reason: FailureReason) -> bool {
        if self.outcome.is_terminal() {
            return false;
        }
        self.outcome = ItemOutcome::Failed(reason);
        true
    }
}

#[cfg(test)]
mod tests {
    use sb_backend::{ArtifactRef, SignerCertificateInfo};
    use sb_core::DigestAlgorithm;

    use super::*;

    fn started_signature() -> StartedSignature {
        StartedSignature {
            token: SignatureToken("tok-1".to_string()),
            data_to_sign: vec![1, 2, 3],
            digest_algorithm: DigestAlgorithm::Sha384,
        }
    }

    fn completed_signature() -> CompletedSignature {
        CompletedSignature {
            artifact: ArtifactRef("artifacts/doc-1.p7s".to_string()),
            signer: SignerCertificateInfo {
                subject: "Alice Example".to_string(),
                issuer: "Example CA".to_string(),
                thumbprint: "ab12".to_string(),
            },
        }
    }

    #[test]
    fn success_path_walks_all_states() {
        let mut item = WorkItem::new(0, DocumentRef::new("doc-1"));
        assert!(matches!(item.outcome(), ItemOutcome::Pending));

        assert!(item.mark_started(started_signature()));
        assert!(matches!(item.outcome(), ItemOutcome::Started));
        assert_eq!(item.data_to_sign(), Some(&[1u8, 2, 3][..]));

        assert!(item.mark_signed(vec![9, 9]));
        assert!(matches!(item.outcome(), ItemOutcome::Signed));

        assert!(item.mark_completed(completed_signature()));
        assert!(item.is_terminal());
        assert_eq!(item.artifact().unwrap().as_str(), "artifacts/doc-1.p7s");
    }

    #[test]
    fn out_of_order_transitions_are_refused() {
        let mut item = WorkItem::new(0, DocumentRef::new("doc-1"));

        // Cannot sign or complete before starting
        assert!(!item.mark_signed(vec![1]));
        assert!(!item.mark_completed(completed_signature()));
        assert!(matches!(item.outcome(), ItemOutcome::Pending));

        // Cannot double-start
        assert!(item.mark_started(started_signature()));
        assert!(!item.mark_started(started_signature()));
    }

    #[test]
    fn terminal_states_never_change() {
        let mut item = WorkItem::new(0, DocumentRef::new("doc-1"));
        assert!(item.fail(FailureReason::Cancelled));
        assert!(item.is_terminal());

        assert!(!item.fail(FailureReason::Signer {
            message: "late failure".to_string(),
        }));
        assert!(!item.mark_started(started_signature()));
        assert!(matches!(item.failure(), Some(FailureReason::Cancelled)));
    }

    #[test]
    fn any_state_can_fail() {
        let mut item = WorkItem::new(0, DocumentRef::new("doc-1"));
        item.mark_started(started_signature());
        assert!(item.fail(FailureReason::Timeout {
            stage: StageKind::Sign,
        }));
        assert!(item.is_terminal());
    }

    #[test]
    fn transience_classification() {
        assert!(FailureReason::Transport {
            stage: StageKind::Start,
            message: "connection refused".to_string(),
        }
        .is_transient());
        assert!(FailureReason::Timeout {
            stage: StageKind::Complete,
        }
        .is_transient());

        // Sign timeouts would re-prompt the user
        assert!(!FailureReason::Timeout {
            stage: StageKind::Sign,
        }
        .is_transient());
        assert!(!FailureReason::Cancelled.is_transient());
        assert!(!FailureReason::Backend {
            stage: StageKind::Start,
            message: "invalid document".to_string(),
        }
        .is_transient());
    }
}
