//! Command implementations.

use std::sync::Arc;

use sb_backend::RestSigningBackend;
use sb_signer::SoftwareSigner;
use url::Url;

use crate::config::{CliConfig, KeyKind};
use crate::error::{CliError, CliResult};

pub mod certs;
pub mod config;
pub mod inspect;
pub mod sign;

pub use certs::run_certs;
pub use config::run_config;
pub use inspect::run_inspect;
pub use sign::run_sign;

/// Builds the REST backend client from config plus CLI override.
pub(crate) fn build_backend(
    cli_config: &CliConfig,
    backend_override: Option<&str>,
) -> CliResult<Arc<RestSigningBackend>> {
    let url = cli_config.effective_backend(backend_override);
    let url = Url::parse(url).map_err(|e| CliError::Config(format!("invalid backend URL: {e}")))?;
    let api_key = cli_config.api_key.clone().unwrap_or_default();
    Ok(Arc::new(RestSigningBackend::new(url, api_key)?))
}

/// Builds the software signer with every key configured in the config file.
pub(crate) fn build_signer(cli_config: &CliConfig) -> CliResult<Arc<SoftwareSigner>> {
    let signer = SoftwareSigner::new();
    for entry in &cli_config.keys {
        let pkcs8 = std::fs::read(&entry.pkcs8).map_err(|e| {
            CliError::Config(format!("failed to read {}: {e}", entry.pkcs8.display()))
        })?;
        match entry.kind {
            KeyKind::Ecdsa => signer.add_ecdsa_key(entry.certificate(), &pkcs8)?,
            KeyKind::Rsa => signer.add_rsa_key(entry.certificate(), &pkcs8)?,
        }
    }
    Ok(Arc::new(signer))
}
