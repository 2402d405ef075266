//! Batch run report.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

use crate::item::WorkItem;

/// Terminal report of a batch run.
///
/// Produced exactly once per run, after every item has reached a terminal
/// state (successful or not).
#[derive(Debug, Serialize)]
pub struct BatchReport {
    /// Batch session identifier.
    pub batch_id: Uuid,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the last item reached a terminal state.
    pub finished_at: DateTime<Utc>,

    /// Every item of the batch, in original batch order.
    pub items: Vec<WorkItem>,
}

impl BatchReport {
    /// Total number of items in the batch.
    #[must_use]
    pub fn total(&self) -> usize {
        self.items.len()
    }

    /// Number of items that completed successfully.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.failure().is_none() && item.is_terminal())
            .count()
    }

    /// Number of items that failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.items.iter().filter(|item| item.failure().is_some()).count()
    }

    /// Items that failed, in batch order.
    pub fn failed_items(&self) -> impl Iterator<Item = &WorkItem> {
        self.items.iter().filter(|item| item.failure().is_some())
    }

    /// One-line human summary, e.g. `8 of 10 documents signed successfully`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} of {} documents signed successfully",
            self.completed_count(),
            self.total()
        )
    }
}

/// Collector for terminal items across all stage workers.
#[derive(Debug, Default)]
pub(crate) struct TerminalSink {
    items: Mutex<Vec<WorkItem>>,
}

impl TerminalSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records an item that reached a terminal state.
    pub(crate) fn record(&self, item: WorkItem) {
        debug_assert!(item.is_terminal(), "sink received a non-terminal item");
        self.items.lock().push(item);
    }

    /// Consumes the sink, returning items in batch order.
    pub(crate) fn into_report(self, batch_id: Uuid, started_at: DateTime<Utc>) -> BatchReport {
        let mut items = self.items.into_inner();
        items.sort_by_key(|item| item.index);
        BatchReport {
            batch_id,
            started_at,
            finished_at: Utc::now(),
            items,
        }
    }
}
