//! Structured audit events for batch signing sessions.
//!
//! Batch runs are security-relevant: each event records which certificate
//! authorized the operation, which document was affected, and the outcome,
//! so an operator can reconstruct a session after the fact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type categories for a batch signing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// Certificate pre-authorization granted.
    Preauthorized,
    /// Signature completed; artifact available.
    SignatureCompleted,
    /// A document failed at some stage.
    ItemFailed,
    /// The whole batch reached a terminal state.
    BatchFinished,
}

/// Outcome of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOutcome {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Failure,
}

/// An audit event emitted during a batch signing session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier.
    pub id: Uuid,

    /// Timestamp of the event (ISO 8601).
    pub timestamp: DateTime<Utc>,

    /// Type of event.
    pub event_type: EventType,

    /// Outcome of the event.
    pub outcome: EventOutcome,

    /// Batch session identifier.
    pub batch_id: Option<Uuid>,

    /// Index of the affected document within the batch.
    pub item_index: Option<usize>,

    /// Document identifier.
    pub document_id: Option<String>,

    /// Thumbprint of the authorizing certificate.
    pub certificate_thumbprint: Option<String>,

    /// Error message (for failure events).
    pub error: Option<String>,

    /// Additional details as key-value pairs.
    pub details: Vec<(String, String)>,
}

impl Event {
    /// Creates a new event builder.
    #[must_use]
    pub const fn builder(event_type: EventType) -> EventBuilder {
        EventBuilder::new(event_type)
    }

    /// Writes the event as JSON to the `sigbatch::audit` log target.
    ///
    /// Emission never fails the calling operation; a serialization error
    /// is logged and swallowed.
    pub fn emit(&self) {
        match serde_json::to_string(self) {
            Ok(json) => tracing::info!(target: "sigbatch::audit", event = %json),
            Err(error) => tracing::warn!(%error, "failed to serialize audit event"),
        }
    }
}

/// Builder for creating events.
pub struct EventBuilder {
    event_type: EventType,
    outcome: EventOutcome,
    batch_id: Option<Uuid>,
    item_index: Option<usize>,
    document_id: Option<String>,
    certificate_thumbprint: Option<String>,
    error: Option<String>,
    details: Vec<(String, String)>,
}

impl EventBuilder {
    /// Creates a new event builder.
    #[must_use]
    pub const fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            outcome: EventOutcome::Success,
            batch_id: None,
            item_index: None,
            document_id: None,
            certificate_thumbprint: None,
            error: None,
            details: Vec::new(),
        }
    }

    /// Sets the outcome to success.
    #[must_use]
    pub const fn success(mut self) -> Self {
        self.outcome = EventOutcome::Success;
        self
    }

    /// Sets the outcome to failure with an error message.
    #[must_use]
    pub fn failure(mut self, error: impl Into<String>) -> Self {
        self.outcome = EventOutcome::Failure;
        self.error = Some(error.into());
        self
    }

    /// Sets the batch session identifier.
    #[must_use]
    pub const fn batch(mut self, batch_id: Uuid) -> Self {
        self.batch_id = Some(batch_id);
        self
    }

    /// Sets the item index within the batch.
    #[must_use]
    pub const fn item(mut self, index: usize) -> Self {
        self.item_index = Some(index);
        self
    }

    /// Sets the document identifier.
    #[must_use]
    pub fn document(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }

    /// Sets the authorizing certificate thumbprint.
    #[must_use]
    pub fn certificate(mut self, thumbprint: impl Into<String>) -> Self {
        self.certificate_thumbprint = Some(thumbprint.into());
        self
    }

    /// Adds a detail key-value pair.
    #[must_use]
    pub fn detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.push((key.into(), value.into()));
        self
    }

    /// Builds the event.
    #[must_use]
    pub fn build(self) -> Event {
        Event {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            event_type: self.event_type,
            outcome: self.outcome,
            batch_id: self.batch_id,
            item_index: self.item_index,
            document_id: self.document_id,
            certificate_thumbprint: self.certificate_thumbprint,
            error: self.error,
            details: self.details,
        }
    }
}
