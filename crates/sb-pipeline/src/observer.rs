//! Progress hooks for batch runs.
//!
//! Observers let a caller (a UI, a CLI, an audit log) react to per-item
//! outcomes while the batch is still running, and to the terminal report.
//! All hooks default to no-ops so implementors pick what they need.

use sb_core::event::{Event, EventType};

use crate::item::WorkItem;
use crate::report::BatchReport;

/// Hooks invoked by the pipeline as items reach terminal states.
///
/// Hooks are called from worker tasks; implementations must be cheap and
/// non-blocking or they will stall the stage that calls them.
pub trait BatchObserver: Send + Sync {
    /// An item completed all three stages.
    fn item_completed(&self, item: &WorkItem) {
        let _ = item;
    }

    /// An item failed at some stage; the batch continues.
    fn item_failed(&self, item: &WorkItem) {
        let _ = item;
    }

    /// Every item reached a terminal state. Called exactly once per run.
    fn batch_finished(&self, report: &BatchReport) {
        let _ = report;
    }
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl BatchObserver for NoopObserver {}

/// Observer that emits structured audit events through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditObserver;

impl BatchObserver for AuditObserver {
    fn item_completed(&self, item: &WorkItem) {
        Event::builder(EventType::SignatureCompleted)
            .item(item.index)
            .document(item.document.name())
            .build()
            .emit();
    }

    fn item_failed(&self, item: &WorkItem) {
        let reason = item
            .failure()
            .map_or_else(|| "unknown".to_string(), ToString::to_string);
        Event::builder(EventType::ItemFailed)
            .failure(reason)
            .item(item.index)
            .document(item.document.name())
            .build()
            .emit();
    }

    fn batch_finished(&self, report: &BatchReport) {
        Event::builder(EventType::BatchFinished)
            .batch(report.batch_id)
            .detail("total", report.total().to_string())
            .detail("completed", report.completed_count().to_string())
            .detail("failed", report.failed_count().to_string())
            .build()
            .emit();
    }
}
