//! Batch pipeline assembly and execution.
//!
//! Wiring per run:
//!
//! ```text
//! documents (1 writer)
//!   → StartStage runner (start_concurrency workers)
//!   → started queue (start_concurrency writers)
//!   → SignStage runner (sign_concurrency workers)
//!   → signed queue (sign_concurrency writers)
//!   → CompleteStage runner (complete_concurrency workers)
//!   → terminal sink → BatchReport
//! ```
//!
//! Every queue's writer count equals the number of upstream workers, so a
//! downstream runner terminates exactly when its input can never grow
//! again. The run resolves once all three runners have terminated, which
//! is also exactly when every item has reached a terminal state.

use std::sync::Arc;

use chrono::Utc;
use sb_backend::{DocumentRef, SignaturePolicy, SigningBackend, VisualOptions};
use sb_core::{Error, PipelineConfig, Result};
use sb_signer::{LocalSigner, Preauthorization};
use uuid::Uuid;

use crate::cancel::CancelToken;
use crate::item::WorkItem;
use crate::observer::{BatchObserver, NoopObserver};
use crate::queue::WorkQueue;
use crate::report::{BatchReport, TerminalSink};
use crate::retry::{NoRetry, RetryPolicy};
use crate::runner::StageRunner;
use crate::stages::{CompleteStage, SignStage, StartStage};

/// Builder for [`BatchPipeline`].
pub struct BatchPipelineBuilder {
    backend: Arc<dyn SigningBackend>,
    signer: Arc<dyn LocalSigner>,
    config: PipelineConfig,
    policy: SignaturePolicy,
    visual: Option<VisualOptions>,
    retry: Arc<dyn RetryPolicy>,
    observer: Arc<dyn BatchObserver>,
    cancel: CancelToken,
}

impl BatchPipelineBuilder {
    /// Overrides the default [`PipelineConfig`].
    #[must_use]
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the signature format family. Defaults to PAdES.
    #[must_use]
    pub fn policy(mut self, policy: SignaturePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets visual signature options, applied to every document.
    #[must_use]
    pub fn visual(mut self, visual: VisualOptions) -> Self {
        self.visual = Some(visual);
        self
    }

    /// Sets the retry policy for transient stage failures. Defaults to
    /// [`NoRetry`].
    #[must_use]
    pub fn retry(mut self, retry: Arc<dyn RetryPolicy>) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the progress observer. Defaults to [`NoopObserver`].
    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn BatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Validates the configuration and builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for invalid concurrency or timeout values;
    /// nothing has been started when this fails.
    pub fn build(self) -> Result<BatchPipeline> {
        self.config.validate()?;
        Ok(BatchPipeline {
            backend: self.backend,
            signer: self.signer,
            config: self.config,
            policy: self.policy,
            visual: self.visual,
            retry: self.retry,
            observer: self.observer,
            cancel: self.cancel,
        })
    }
}

/// Three-stage batch signing pipeline.
///
/// Construct via [`BatchPipeline::builder`], then call [`run`] once per
/// batch. The pipeline itself is stateless between runs; all per-run state
/// lives in the queues and items created inside `run`.
///
/// [`run`]: BatchPipeline::run
pub struct BatchPipeline {
    backend: Arc<dyn SigningBackend>,
    signer: Arc<dyn LocalSigner>,
    config: PipelineConfig,
    policy: SignaturePolicy,
    visual: Option<VisualOptions>,
    retry: Arc<dyn RetryPolicy>,
    observer: Arc<dyn BatchObserver>,
    cancel: CancelToken,
}

impl std::fmt::Debug for BatchPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchPipeline")
            .field("config", &self.config)
            .field("policy", &self.policy)
            .field("visual", &self.visual)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

impl BatchPipeline {
    /// Starts building a pipeline over the two collaborator seams.
    #[must_use]
    pub fn builder(
        backend: Arc<dyn SigningBackend>,
        signer: Arc<dyn LocalSigner>,
    ) -> BatchPipelineBuilder {
        BatchPipelineBuilder {
            backend,
            signer,
            config: PipelineConfig::default(),
            policy: SignaturePolicy::Pades,
            visual: None,
            retry: Arc::new(NoRetry),
            observer: Arc::new(NoopObserver),
            cancel: CancelToken::new(),
        }
    }

    /// Token that cancels an in-progress run of this pipeline.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Runs the batch to completion and returns the terminal report.
    ///
    /// The report covers every document exactly once, in input order,
    /// whether it completed, failed, or was cancelled. An empty batch
    /// yields an immediate empty report.
    ///
    /// # Errors
    ///
    /// Returns `Error::Preauthorization` when the authorization's
    /// remaining budget does not exactly match the batch size. This is
    /// checked before any backend call: a stale or partially spent
    /// authorization fails the whole batch up front rather than midway.
    pub async fn run(
        &self,
        documents: Vec<DocumentRef>,
        authorization: Arc<Preauthorization>,
    ) -> Result<BatchReport> {
        let count = u32::try_from(documents.len())
            .map_err(|_| Error::Preauthorization("batch size exceeds u32".to_string()))?;
        if authorization.remaining() != count {
            return Err(Error::Preauthorization(format!(
                "authorization covers {} operations but the batch has {} documents",
                authorization.remaining(),
                count
            )));
        }

        let batch_id = Uuid::now_v7();
        let started_at = Utc::now();
        tracing::info!(
            batch = %batch_id,
            documents = documents.len(),
            policy = %self.policy,
            "batch started"
        );

        let input = Arc::new(WorkQueue::new(1));
        input.enqueue_all(
            documents
                .into_iter()
                .enumerate()
                .map(|(index, document)| WorkItem::new(index, document)),
        );
        input.close_writer();

        let started = Arc::new(WorkQueue::new(self.config.start_concurrency));
        let signed = Arc::new(WorkQueue::new(self.config.sign_concurrency));
        let sink = Arc::new(TerminalSink::new());

        let start_runner = StageRunner {
            stage: Arc::new(StartStage {
                backend: Arc::clone(&self.backend),
                policy: self.policy,
                visual: self.visual.clone(),
            }),
            input,
            output: Some(Arc::clone(&started)),
            concurrency: self.config.start_concurrency,
            timeout: self.config.stage_timeout(),
            retry: Arc::clone(&self.retry),
            observer: Arc::clone(&self.observer),
            sink: Arc::clone(&sink),
            cancel: self.cancel.clone(),
        };
        let sign_runner = StageRunner {
            stage: Arc::new(SignStage {
                signer: Arc::clone(&self.signer),
                authorization,
            }),
            input: started,
            output: Some(Arc::clone(&signed)),
            concurrency: self.config.sign_concurrency,
            timeout: self.config.sign_timeout(),
            retry: Arc::clone(&self.retry),
            observer: Arc::clone(&self.observer),
            sink: Arc::clone(&sink),
            cancel: self.cancel.clone(),
        };
        let complete_runner = StageRunner {
            stage: Arc::new(CompleteStage {
                backend: Arc::clone(&self.backend),
            }),
            input: signed,
            output: None,
            concurrency: self.config.complete_concurrency,
            timeout: self.config.stage_timeout(),
            retry: Arc::clone(&self.retry),
            observer: Arc::clone(&self.observer),
            sink: Arc::clone(&sink),
            cancel: self.cancel.clone(),
        };

        tokio::join!(
            start_runner.run(),
            sign_runner.run(),
            complete_runner.run()
        );

        let report = Arc::into_inner(sink)
            .ok_or(Error::Internal)?
            .into_report(batch_id, started_at);
        tracing::info!(batch = %batch_id, summary = %report.summary(), "batch finished");
        self.observer.batch_finished(&report);
        Ok(report)
    }
}
