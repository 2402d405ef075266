//! Batch cancellation token.
//!
//! Workers check the token at the top of each loop iteration: a cancelled
//! pipeline stops starting new stage calls and drains remaining items as
//! failed with a cancellation reason, so the batch report still covers
//! every item. In-flight stage calls are allowed to finish.

use std::sync::Arc;

use tokio::sync::watch;

/// Clone-able cancellation token for a batch run.
#[derive(Debug, Clone)]
pub struct CancelToken {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        let _ = self.sender.send(true);
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once cancellation is requested.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        // wait_for only errors when the sender is dropped; this token
        // holds the sender, so pending waiters outlive it.
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
