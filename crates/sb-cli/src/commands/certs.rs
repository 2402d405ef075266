//! Certificate listing command.

use chrono::Utc;
use sb_signer::{Certificate, CertificateFilter, LocalSigner};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::CertsArgs;
use crate::config::{CliConfig, OutputFormat};
use crate::output;
use crate::CliResult;

/// One certificate row in the listing.
#[derive(Debug, Serialize, Tabled)]
struct CertRow {
    #[tabled(rename = "THUMBPRINT")]
    thumbprint: String,
    #[tabled(rename = "SUBJECT")]
    subject: String,
    #[tabled(rename = "ISSUER")]
    issuer: String,
    #[tabled(rename = "NOT AFTER")]
    not_after: String,
}

impl From<&Certificate> for CertRow {
    fn from(certificate: &Certificate) -> Self {
        Self {
            thumbprint: certificate.thumbprint.clone(),
            subject: certificate.subject.clone(),
            issuer: certificate.issuer.clone(),
            not_after: certificate.not_after.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Runs the certs command.
pub async fn run_certs(args: CertsArgs, config: &CliConfig, format: OutputFormat) -> CliResult<()> {
    let signer = super::build_signer(config)?;

    let mut filter = CertificateFilter::any();
    if let Some(subject) = args.subject {
        filter = filter.with_subject(subject);
    }
    if args.valid_only {
        filter = filter.valid_at(Utc::now());
    }

    let certificates = signer.list_certificates(&filter).await?;
    let rows: Vec<CertRow> = certificates.iter().map(CertRow::from).collect();
    output::output(&rows, format)
}
