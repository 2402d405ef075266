//! End-to-end pipeline runs against in-memory collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sb_backend::{
    ArtifactRef, BackendError, BackendResult, CompletedSignature, DocumentRef, SignaturePolicy,
    SignatureReport, SignatureToken, SignerCertificateInfo, SigningBackend, StartSignatureRequest,
    StartedSignature,
};
use sb_core::{DigestAlgorithm, Error, PipelineConfig};
use sb_pipeline::{
    BatchPipeline, BatchReport, ExponentialBackoff, FailureReason, ItemOutcome, StageKind,
    WorkItem,
};
use sb_signer::{
    Certificate, CertificateFilter, LocalSigner, Preauthorization, SignerError, SignerResult,
};

/// Backend that derives signing payloads and artifacts from document ids.
#[derive(Default)]
struct MockBackend {
    start_calls: AtomicUsize,
    complete_calls: AtomicUsize,
    /// Document ids whose start call is rejected outright.
    reject_start: Vec<String>,
    /// Document ids whose start call never returns.
    stall_start: Vec<String>,
    /// Number of leading start calls that fail with a transport error.
    transport_failures: AtomicUsize,
}

impl MockBackend {
    fn payload_for(id: &str) -> Vec<u8> {
        id.as_bytes().to_vec()
    }
}

#[async_trait]
impl SigningBackend for MockBackend {
    async fn start_signature(
        &self,
        request: &StartSignatureRequest,
    ) -> BackendResult<StartedSignature> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if self
            .transport_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(BackendError::Transport("connection reset".to_string()));
        }
        if self.reject_start.contains(&request.document.id) {
            return Err(BackendError::Rejected("document failed validation".to_string()));
        }
        if self.stall_start.contains(&request.document.id) {
            std::future::pending::<()>().await;
        }
        Ok(StartedSignature {
            token: SignatureToken(format!("tok-{}", request.document.id)),
            data_to_sign: Self::payload_for(&request.document.id),
            digest_algorithm: DigestAlgorithm::Sha256,
        })
    }

    async fn complete_signature(
        &self,
        token: &SignatureToken,
        raw_signature: &[u8],
    ) -> BackendResult<CompletedSignature> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        if raw_signature.is_empty() {
            return Err(BackendError::Rejected("empty signature".to_string()));
        }
        Ok(CompletedSignature {
            artifact: ArtifactRef(format!("artifacts/{token}.p7s")),
            signer: SignerCertificateInfo {
                subject: "Alice Example".to_string(),
                issuer: "Example CA".to_string(),
                thumbprint: "ab12".to_string(),
            },
        })
    }

    async fn open_signature(
        &self,
        _artifact: &ArtifactRef,
        _policy: SignaturePolicy,
    ) -> BackendResult<SignatureReport> {
        Err(BackendError::Rejected("not supported".to_string()))
    }
}

/// Signer that tracks in-flight concurrency and fails selected payloads.
#[derive(Default)]
struct MockSigner {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    /// Payloads whose sign call fails with a hardware error.
    fail_payloads: Vec<Vec<u8>>,
    /// Artificial per-call latency, to surface concurrency violations.
    delay: Duration,
}

#[async_trait]
impl LocalSigner for MockSigner {
    async fn list_certificates(
        &self,
        _filter: &CertificateFilter,
    ) -> SignerResult<Vec<Certificate>> {
        Ok(Vec::new())
    }

    async fn preauthorize(&self, thumbprint: &str, count: u32) -> SignerResult<Preauthorization> {
        Ok(Preauthorization::new(thumbprint, count))
    }

    async fn sign(
        &self,
        authorization: &Preauthorization,
        data: &[u8],
        _algorithm: DigestAlgorithm,
    ) -> SignerResult<Vec<u8>> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;

        let result = if self.fail_payloads.iter().any(|d| d == data) {
            Err(SignerError::Hardware("token unplugged".to_string()))
        } else {
            authorization.consume()?;
            let mut signature = data.to_vec();
            signature.reverse();
            Ok(signature)
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

fn documents(ids: &[&str]) -> Vec<DocumentRef> {
    ids.iter().map(|id| DocumentRef::new(*id)).collect()
}

fn item_completed(item: &WorkItem) -> bool {
    matches!(item.outcome(), ItemOutcome::Completed)
}

async fn run_batch(
    backend: Arc<MockBackend>,
    signer: Arc<MockSigner>,
    ids: &[&str],
) -> BatchReport {
    let pipeline = BatchPipeline::builder(backend, Arc::clone(&signer) as Arc<dyn LocalSigner>)
        .build()
        .unwrap();
    let authorization = Arc::new(
        signer
            .preauthorize("ab12", u32::try_from(ids.len()).unwrap())
            .await
            .unwrap(),
    );
    pipeline.run(documents(ids), authorization).await.unwrap()
}

#[tokio::test]
async fn full_batch_completes_every_document() {
    let backend = Arc::new(MockBackend::default());
    let signer = Arc::new(MockSigner::default());

    let report = run_batch(Arc::clone(&backend), signer, &["doc-a", "doc-b", "doc-c"]).await;

    assert_eq!(report.total(), 3);
    assert_eq!(report.completed_count(), 3);
    assert_eq!(report.failed_count(), 0);
    assert_eq!(report.summary(), "3 of 3 documents signed successfully");

    // Report preserves input order and carries the artifacts
    for (index, id) in ["doc-a", "doc-b", "doc-c"].iter().enumerate() {
        let item = &report.items[index];
        assert_eq!(item.index, index);
        assert_eq!(item.document.id, *id);
        assert!(item_completed(item));
        assert_eq!(
            item.artifact().unwrap().as_str(),
            format!("artifacts/tok-{id}.p7s")
        );
    }

    // Exactly one call per document per stage
    assert_eq!(backend.start_calls.load(Ordering::SeqCst), 3);
    assert_eq!(backend.complete_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn sign_failure_is_isolated_to_its_item() {
    let backend = Arc::new(MockBackend::default());
    let signer = Arc::new(MockSigner {
        fail_payloads: vec![MockBackend::payload_for("doc-b")],
        ..MockSigner::default()
    });

    let report = run_batch(Arc::clone(&backend), signer, &["doc-a", "doc-b", "doc-c"]).await;

    assert_eq!(report.completed_count(), 2);
    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.summary(), "2 of 3 documents signed successfully");

    let failed: Vec<_> = report.failed_items().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].index, 1);
    assert!(matches!(
        failed[0].failure(),
        Some(FailureReason::Signer { .. })
    ));

    // The failed item never reached the complete stage
    assert_eq!(backend.complete_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn start_rejection_skips_sign_and_complete() {
    let backend = Arc::new(MockBackend {
        reject_start: vec!["doc-b".to_string()],
        ..MockBackend::default()
    });
    let signer = Arc::new(MockSigner::default());
    let authorization = Arc::new(Preauthorization::new("ab12", 3));
    let pipeline = BatchPipeline::builder(Arc::clone(&backend) as Arc<dyn SigningBackend>, signer)
        .build()
        .unwrap();

    let report = pipeline
        .run(documents(&["doc-a", "doc-b", "doc-c"]), Arc::clone(&authorization))
        .await
        .unwrap();

    assert_eq!(report.completed_count(), 2);
    let failed: Vec<_> = report.failed_items().collect();
    assert!(matches!(
        failed[0].failure(),
        Some(FailureReason::Backend {
            stage: StageKind::Start,
            ..
        })
    ));

    // The rejected document never consumed an authorization slot
    assert_eq!(authorization.remaining(), 1);
}

#[tokio::test]
async fn sign_stage_runs_serialized_by_default() {
    let backend = Arc::new(MockBackend::default());
    let signer = Arc::new(MockSigner {
        delay: Duration::from_millis(10),
        ..MockSigner::default()
    });

    let ids = ["d-0", "d-1", "d-2", "d-3", "d-4", "d-5"];
    let report = run_batch(backend, Arc::clone(&signer), &ids).await;

    assert_eq!(report.completed_count(), 6);
    assert_eq!(signer.max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn transient_start_failures_recover_with_backoff() {
    let backend = Arc::new(MockBackend {
        transport_failures: AtomicUsize::new(2),
        ..MockBackend::default()
    });
    let signer = Arc::new(MockSigner::default());

    let pipeline = BatchPipeline::builder(
        Arc::clone(&backend) as Arc<dyn SigningBackend>,
        Arc::clone(&signer) as Arc<dyn LocalSigner>,
    )
    .retry(Arc::new(ExponentialBackoff {
        base: Duration::from_millis(1),
        cap: Duration::from_millis(5),
        max_attempts: 3,
    }))
    .build()
    .unwrap();

    let authorization = Arc::new(Preauthorization::new("ab12", 2));
    let report = pipeline
        .run(documents(&["doc-a", "doc-b"]), authorization)
        .await
        .unwrap();

    assert_eq!(report.completed_count(), 2);
    // 2 documents + 2 retried transport failures
    assert_eq!(backend.start_calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn without_retry_transient_failures_are_final() {
    let backend = Arc::new(MockBackend {
        transport_failures: AtomicUsize::new(1),
        ..MockBackend::default()
    });
    let signer = Arc::new(MockSigner::default());

    let report = run_batch(Arc::clone(&backend), signer, &["doc-a", "doc-b"]).await;

    assert_eq!(report.completed_count(), 1);
    assert_eq!(report.failed_count(), 1);
    assert!(matches!(
        report.failed_items().next().unwrap().failure(),
        Some(FailureReason::Transport {
            stage: StageKind::Start,
            ..
        })
    ));
}

#[tokio::test]
async fn cancelled_pipeline_reports_every_document() {
    let backend = Arc::new(MockBackend::default());
    let signer = Arc::new(MockSigner::default());
    let pipeline = BatchPipeline::builder(backend, signer).build().unwrap();

    pipeline.cancel_token().cancel();

    let authorization = Arc::new(Preauthorization::new("ab12", 3));
    let report = pipeline
        .run(documents(&["doc-a", "doc-b", "doc-c"]), authorization)
        .await
        .unwrap();

    assert_eq!(report.total(), 3);
    assert_eq!(report.failed_count(), 3);
    assert!(report
        .failed_items()
        .all(|item| matches!(item.failure(), Some(FailureReason::Cancelled))));
}

#[tokio::test]
async fn cancelled_pipeline_never_reaches_the_backend() {
    // Cancellation racing against a full input queue must still win in
    // every worker; repeat to catch scheduling-order dependence.
    for _ in 0..20 {
        let backend = Arc::new(MockBackend::default());
        let signer = Arc::new(MockSigner::default());
        let pipeline = BatchPipeline::builder(
            Arc::clone(&backend) as Arc<dyn SigningBackend>,
            signer,
        )
        .build()
        .unwrap();

        pipeline.cancel_token().cancel();

        let ids = ["d-0", "d-1", "d-2", "d-3", "d-4", "d-5", "d-6", "d-7"];
        let authorization = Arc::new(Preauthorization::new("ab12", 8));
        let report = pipeline.run(documents(&ids), authorization).await.unwrap();

        assert_eq!(backend.start_calls.load(Ordering::SeqCst), 0);
        assert_eq!(backend.complete_calls.load(Ordering::SeqCst), 0);
        assert_eq!(report.failed_count(), 8);
    }
}

#[tokio::test(start_paused = true)]
async fn stalled_start_call_times_out_and_isolates_the_item() {
    let backend = Arc::new(MockBackend {
        stall_start: vec!["doc-b".to_string()],
        ..MockBackend::default()
    });
    let signer = Arc::new(MockSigner::default());
    let config = PipelineConfig {
        stage_timeout_secs: 1,
        ..PipelineConfig::default()
    };
    let pipeline = BatchPipeline::builder(
        Arc::clone(&backend) as Arc<dyn SigningBackend>,
        signer,
    )
    .config(config)
    .build()
    .unwrap();

    let authorization = Arc::new(Preauthorization::new("ab12", 3));
    let report = pipeline
        .run(documents(&["doc-a", "doc-b", "doc-c"]), Arc::clone(&authorization))
        .await
        .unwrap();

    assert_eq!(report.total(), 3);
    assert_eq!(report.completed_count(), 2);

    let failed: Vec<_> = report.failed_items().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].document.id, "doc-b");
    assert!(matches!(
        failed[0].failure(),
        Some(FailureReason::Timeout {
            stage: StageKind::Start
        })
    ));

    // The timed-out item never reached sign or complete
    assert_eq!(authorization.remaining(), 1);
    assert_eq!(backend.complete_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn over_provisioned_authorization_is_rejected() {
    let backend = Arc::new(MockBackend::default());
    let signer = Arc::new(MockSigner::default());
    let pipeline = BatchPipeline::builder(backend, signer).build().unwrap();

    let authorization = Arc::new(Preauthorization::new("ab12", 5));
    let error = pipeline
        .run(documents(&["doc-a", "doc-b"]), authorization)
        .await
        .unwrap_err();

    assert!(matches!(error, Error::Preauthorization(_)));
    assert!(error.is_construction_error());
}
