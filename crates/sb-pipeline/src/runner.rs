//! Generic bounded-concurrency stage runner.
//!
//! A runner drains one queue with a fixed number of worker tasks, applies
//! its stage function to each item, and hands successes to the downstream
//! queue. Failures are diverted to the terminal sink and reported through
//! the observer; they never propagate downstream or abort sibling items.
//!
//! Each worker owns one writer slot on the output queue and releases it
//! when it terminates, so downstream readers can distinguish "temporarily
//! empty" from "permanently exhausted".

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::cancel::CancelToken;
use crate::item::{FailureReason, StageKind, WorkItem};
use crate::observer::BatchObserver;
use crate::queue::WorkQueue;
use crate::report::TerminalSink;
use crate::retry::RetryPolicy;

/// A pipeline stage: one async transformation applied to each item.
///
/// On success the stage must have advanced the item's state machine; on
/// failure it must leave the item untouched so a retry starts clean.
#[async_trait]
pub(crate) trait Stage: Send + Sync + 'static {
    /// Which of the three stages this is.
    fn kind(&self) -> StageKind;

    /// Applies the stage to one item.
    async fn apply(&self, item: &mut WorkItem) -> Result<(), FailureReason>;
}

/// Bounded worker pool for one stage.
pub(crate) struct StageRunner {
    pub(crate) stage: Arc<dyn Stage>,
    pub(crate) input: Arc<WorkQueue<WorkItem>>,
    pub(crate) output: Option<Arc<WorkQueue<WorkItem>>>,
    pub(crate) concurrency: usize,
    pub(crate) timeout: Duration,
    pub(crate) retry: Arc<dyn RetryPolicy>,
    pub(crate) observer: Arc<dyn BatchObserver>,
    pub(crate) sink: Arc<TerminalSink>,
    pub(crate) cancel: CancelToken,
}

impl StageRunner {
    /// Runs the stage to completion: all workers terminate once the input
    /// is exhausted (or the batch is cancelled and drained).
    pub(crate) async fn run(self) {
        debug_assert!(self.concurrency > 0, "validated at pipeline construction");

        let runner = Arc::new(self);
        let workers: Vec<_> = (0..runner.concurrency)
            .map(|worker_id| {
                let runner = Arc::clone(&runner);
                tokio::spawn(runner.worker(worker_id))
            })
            .collect();

        for worker in workers {
            if let Err(error) = worker.await {
                tracing::error!(%error, "stage worker panicked");
            }
        }
    }

    async fn worker(self: Arc<Self>, worker_id: usize) {
        loop {
            // Cancellation wins over ready input: once the token is set,
            // no further stage call is dispatched, even for items that
            // were already queued.
            if self.cancel.is_cancelled() {
                self.drain_cancelled().await;
                break;
            }

            let item = tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    self.drain_cancelled().await;
                    break;
                }
                item = self.input.dequeue() => item,
            };

            let Some(item) = item else { break };
            self.process(item).await;
        }

        if let Some(output) = &self.output {
            output.close_writer();
        }
        tracing::debug!(stage = %self.stage.kind(), worker = worker_id, "worker terminated");
    }

    async fn process(&self, mut item: WorkItem) {
        let kind = self.stage.kind();
        let mut attempt = 0u32;

        loop {
            let outcome = match tokio::time::timeout(self.timeout, self.stage.apply(&mut item)).await
            {
                Ok(result) => result,
                Err(_) => Err(FailureReason::Timeout { stage: kind }),
            };

            match outcome {
                Ok(()) => {
                    tracing::debug!(stage = %kind, index = item.index, "stage succeeded");
                    match &self.output {
                        Some(output) => output.enqueue(item),
                        None => {
                            self.observer.item_completed(&item);
                            self.sink.record(item);
                        }
                    }
                    return;
                }
                Err(reason) if reason.is_transient() => {
                    if let Some(delay) = self.retry.next_delay(attempt) {
                        tracing::debug!(
                            stage = %kind,
                            index = item.index,
                            attempt,
                            %reason,
                            "retrying transient failure"
                        );
                        attempt += 1;
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    self.fail_item(item, reason);
                    return;
                }
                Err(reason) => {
                    self.fail_item(item, reason);
                    return;
                }
            }
        }
    }

    fn fail_item(&self, mut item: WorkItem, reason: FailureReason) {
        tracing::warn!(
            stage = %self.stage.kind(),
            index = item.index,
            document = item.document.name(),
            %reason,
            "item failed"
        );
        item.fail(reason);
        self.observer.item_failed(&item);
        self.sink.record(item);
    }

    /// After cancellation: keep draining until the input is permanently
    /// exhausted, failing everything without invoking the stage, so every
    /// item still reaches the terminal sink.
    async fn drain_cancelled(&self) {
        while let Some(item) = self.input.dequeue().await {
            self.fail_item(item, FailureReason::Cancelled);
        }
    }
}
