//! Batch signing command.

use std::sync::Arc;

use sb_backend::{DocumentRef, VisualOptions};
use sb_pipeline::{
    BatchObserver, BatchPipeline, BatchReport, ExponentialBackoff, NoRetry, RetryPolicy, WorkItem,
};
use sb_signer::LocalSigner;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::SignArgs;
use crate::config::{CliConfig, OutputFormat};
use crate::error::CliError;
use crate::output;
use crate::CliResult;

/// One work item row in the final report.
#[derive(Debug, Serialize, Tabled)]
struct ItemRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "DOCUMENT")]
    document: String,
    #[tabled(rename = "STATE")]
    state: String,
    #[tabled(rename = "RESULT")]
    result: String,
}

impl From<&WorkItem> for ItemRow {
    fn from(item: &WorkItem) -> Self {
        let (state, result) = match item.failure() {
            Some(reason) => ("failed".to_string(), reason.to_string()),
            None => (
                "completed".to_string(),
                item.artifact()
                    .map_or_else(String::new, ToString::to_string),
            ),
        };
        Self {
            index: item.index,
            document: item.document.name().to_string(),
            state,
            result,
        }
    }
}

/// Observer printing one line per terminal item as the batch runs.
struct ProgressObserver;

impl BatchObserver for ProgressObserver {
    fn item_completed(&self, item: &WorkItem) {
        output::success(&format!("{} signed", item.document.name()));
    }

    fn item_failed(&self, item: &WorkItem) {
        let reason = item
            .failure()
            .map_or_else(|| "unknown".to_string(), ToString::to_string);
        output::error(&format!("{} failed: {reason}", item.document.name()));
    }
}

/// Runs the sign command.
pub async fn run_sign(
    args: SignArgs,
    config: &CliConfig,
    backend_override: Option<&str>,
    format: OutputFormat,
) -> CliResult<()> {
    let thumbprint = config
        .effective_thumbprint(args.thumbprint.as_deref())
        .ok_or_else(|| {
            CliError::InvalidArgument(
                "no signing certificate: pass --thumbprint or set default_thumbprint".to_string(),
            )
        })?;

    let backend = super::build_backend(config, backend_override)?;
    let signer = super::build_signer(config)?;

    let documents: Vec<DocumentRef> = args
        .documents
        .iter()
        .map(|id| DocumentRef::new(id.clone()))
        .collect();
    let count = u32::try_from(documents.len())
        .map_err(|_| CliError::InvalidArgument("too many documents".to_string()))?;

    // The one consent gesture of the session
    let authorization = Arc::new(signer.preauthorize(&thumbprint, count).await?);

    let retry: Arc<dyn RetryPolicy> = if args.retries == 0 {
        Arc::new(NoRetry)
    } else {
        Arc::new(ExponentialBackoff {
            max_attempts: args.retries,
            ..ExponentialBackoff::default()
        })
    };
    let observer: Arc<dyn BatchObserver> = match format {
        OutputFormat::Table => Arc::new(ProgressObserver),
        OutputFormat::Json | OutputFormat::Quiet => Arc::new(sb_pipeline::NoopObserver),
    };

    let mut builder = BatchPipeline::builder(backend, signer)
        .config(config.pipeline.clone())
        .policy(args.policy.into())
        .retry(retry)
        .observer(observer);
    if args.has_visual() {
        builder = builder.visual(VisualOptions {
            field_name: args.field_name.clone(),
            page: args.page,
            reason: args.reason.clone(),
            location: args.location.clone(),
        });
    }
    let pipeline = builder.build()?;

    let report = pipeline.run(documents, authorization).await?;
    render_report(&report, format)
}

fn render_report(report: &BatchReport, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Table => {
            let rows: Vec<ItemRow> = report.items.iter().map(ItemRow::from).collect();
            output::output(&rows, format)?;
            if report.failed_count() == 0 {
                output::success(&report.summary());
            } else {
                output::warning(&report.summary());
            }
        }
        OutputFormat::Json => output::output_single(report, format)?,
        OutputFormat::Quiet => {
            println!("{}", report.summary());
        }
    }
    Ok(())
}
