//! Artifact inspection command.

use colored::Colorize;
use sb_backend::{ArtifactRef, SignatureHealth, SignatureReport, SignerCertificateInfo, SigningBackend};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::InspectArgs;
use crate::config::{CliConfig, OutputFormat};
use crate::output;
use crate::CliResult;

/// One signer row in the inspection report.
#[derive(Debug, Serialize, Tabled)]
struct SignerRow {
    #[tabled(rename = "SUBJECT")]
    subject: String,
    #[tabled(rename = "ISSUER")]
    issuer: String,
    #[tabled(rename = "THUMBPRINT")]
    thumbprint: String,
}

impl From<&SignerCertificateInfo> for SignerRow {
    fn from(signer: &SignerCertificateInfo) -> Self {
        Self {
            subject: signer.subject.clone(),
            issuer: signer.issuer.clone(),
            thumbprint: signer.thumbprint.clone(),
        }
    }
}

/// Runs the inspect command.
pub async fn run_inspect(
    args: InspectArgs,
    config: &CliConfig,
    backend_override: Option<&str>,
    format: OutputFormat,
) -> CliResult<()> {
    let backend = super::build_backend(config, backend_override)?;
    let artifact = ArtifactRef(args.artifact);

    let report = backend
        .open_signature(&artifact, args.policy.into())
        .await?;

    match format {
        OutputFormat::Table => render_table(&artifact, &report, format)?,
        OutputFormat::Json => output::output_single(&report, format)?,
        OutputFormat::Quiet => {
            let health = serde_json::to_value(report.health)?;
            println!("{}", health.as_str().unwrap_or_default());
        }
    }
    Ok(())
}

fn render_table(
    artifact: &ArtifactRef,
    report: &SignatureReport,
    format: OutputFormat,
) -> CliResult<()> {
    let health = match report.health {
        SignatureHealth::Valid => "valid".green().bold(),
        SignatureHealth::Invalid => "invalid".red().bold(),
        SignatureHealth::Indeterminate => "indeterminate".yellow().bold(),
    };
    println!("{artifact} ({}): {health}", report.policy);

    let rows: Vec<SignerRow> = report.signers.iter().map(SignerRow::from).collect();
    output::output(&rows, format)
}
