//! # sb-pipeline
//!
//! Three-stage bounded batch signing pipeline.
//!
//! Signs N independent documents with a single certificate
//! pre-authorization by overlapping the network-bound start and complete
//! stages with the serialized local sign stage:
//!
//! ```text
//! documents → Start (3 workers) → Sign (1 worker) → Complete (3 workers) → report
//! ```
//!
//! Worker counts are configuration ([`sb_core::PipelineConfig`]); the sign
//! stage defaults to one worker because the private-key capability
//! (typically a hardware token) processes one request at a time. Per-item
//! failures are diverted out of the pipeline and never abort sibling
//! items; the batch report covers every item once all of them reach a
//! terminal state.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod cancel;
pub mod item;
pub mod observer;
pub mod pipeline;
pub mod queue;
pub mod report;
pub mod retry;
mod runner;
mod stages;

pub use cancel::CancelToken;
pub use item::{FailureReason, ItemOutcome, StageKind, WorkItem};
pub use observer::{AuditObserver, BatchObserver, NoopObserver};
pub use pipeline::{BatchPipeline, BatchPipelineBuilder};
pub use report::BatchReport;
pub use retry::{ExponentialBackoff, NoRetry, RetryPolicy};
