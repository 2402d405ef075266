//! CLI configuration.
//!
//! Loaded from `~/.sigbatch/sigbatch.toml`; a missing file yields defaults.
//! Key material is never stored in the config, only paths to PKCS#8 DER
//! files plus the certificate metadata the signer needs to list them.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use sb_core::PipelineConfig;
use sb_signer::Certificate;
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Signing backend base URL.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// API key presented to the backend.
    pub api_key: Option<String>,

    /// Thumbprint of the certificate to sign with, unless overridden.
    pub default_thumbprint: Option<String>,

    /// Output format.
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Pipeline tuning knobs.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Keys available to the software signer.
    #[serde(default)]
    pub keys: Vec<KeyEntry>,
}

fn default_backend_url() -> String {
    "http://localhost:8080/api/".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            api_key: None,
            default_thumbprint: None,
            output_format: OutputFormat::default(),
            pipeline: PipelineConfig::default(),
            keys: Vec::new(),
        }
    }
}

impl CliConfig {
    /// Loads configuration from file, falling back to defaults.
    pub fn load() -> CliResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Self = toml::from_str(&content)
                .map_err(|e| CliError::Config(format!("failed to parse config: {e}")))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Saves configuration to file.
    pub fn save(&self) -> CliResult<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Gets the configuration file path.
    pub fn config_path() -> CliResult<PathBuf> {
        let home = dirs_next::home_dir()
            .ok_or_else(|| CliError::Config("could not determine home directory".to_string()))?;
        Ok(home.join(".sigbatch").join("sigbatch.toml"))
    }

    /// The effective backend URL (from args or config).
    #[must_use]
    pub fn effective_backend<'a>(&'a self, arg_backend: Option<&'a str>) -> &'a str {
        arg_backend.unwrap_or(&self.backend_url)
    }

    /// The effective signing thumbprint (from args or config).
    #[must_use]
    pub fn effective_thumbprint(&self, arg_thumbprint: Option<&str>) -> Option<String> {
        arg_thumbprint
            .map(ToString::to_string)
            .or_else(|| self.default_thumbprint.clone())
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON format.
    Json,
    /// Quiet (minimal output).
    Quiet,
}

/// Private key algorithm family of a configured key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    /// ECDSA P-384 key.
    #[default]
    Ecdsa,
    /// RSA key.
    Rsa,
}

/// A key file plus the certificate metadata the signer exposes for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyEntry {
    /// Path to the PKCS#8 DER private key.
    pub pkcs8: PathBuf,

    /// Key algorithm family.
    #[serde(default)]
    pub kind: KeyKind,

    /// Certificate thumbprint (hex SHA-256).
    pub thumbprint: String,

    /// Certificate subject common name.
    pub subject: String,

    /// Certificate issuer common name.
    pub issuer: String,

    /// Start of the certificate validity window.
    pub not_before: DateTime<Utc>,

    /// End of the certificate validity window.
    pub not_after: DateTime<Utc>,
}

impl KeyEntry {
    /// The certificate metadata for this entry.
    #[must_use]
    pub fn certificate(&self) -> Certificate {
        Certificate {
            thumbprint: self.thumbprint.clone(),
            subject: self.subject.clone(),
            issuer: self.issuer.clone(),
            not_before: self.not_before,
            not_after: self.not_after,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = CliConfig::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        let parsed: CliConfig = toml::from_str(&toml).unwrap();

        assert_eq!(parsed.backend_url, "http://localhost:8080/api/");
        assert_eq!(parsed.pipeline.sign_concurrency, 1);
        assert!(parsed.keys.is_empty());
    }

    #[test]
    fn key_entries_parse_from_toml() {
        let config: CliConfig = toml::from_str(
            r#"
            backend_url = "https://sign.example.com/api/"
            default_thumbprint = "ab12"

            [[keys]]
            pkcs8 = "/etc/sigbatch/alice.p8"
            kind = "ecdsa"
            thumbprint = "ab12"
            subject = "Alice Example"
            issuer = "Example CA"
            not_before = "2026-01-01T00:00:00Z"
            not_after = "2027-01-01T00:00:00Z"
            "#,
        )
        .unwrap();

        assert_eq!(config.keys.len(), 1);
        let certificate = config.keys[0].certificate();
        assert_eq!(certificate.subject, "Alice Example");
        assert!(certificate.is_valid_at("2026-06-01T00:00:00Z".parse().unwrap()));
    }

    #[test]
    fn argument_overrides_win() {
        let config = CliConfig {
            default_thumbprint: Some("config-print".to_string()),
            ..CliConfig::default()
        };

        assert_eq!(
            config.effective_backend(Some("https://other.example.com/")),
            "https://other.example.com/"
        );
        assert_eq!(
            config.effective_thumbprint(Some("arg-print")).as_deref(),
            Some("arg-print")
        );
        assert_eq!(
            config.effective_thumbprint(None).as_deref(),
            Some("config-print")
        );
    }
}
