//! CLI argument parsing.

use clap::{Parser, Subcommand};
use sb_backend::SignaturePolicy;

use crate::config::OutputFormat;

/// sigbatch - batch document signing against a hosted signing service.
#[derive(Debug, Parser)]
#[command(name = "sigbatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Backend base URL (overrides config).
    #[arg(short, long, env = "SIGBATCH_BACKEND_URL")]
    pub backend: Option<String>,

    /// Output format.
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List certificates available to the signer.
    Certs(CertsArgs),

    /// Sign a batch of documents.
    Sign(SignArgs),

    /// Open a signed artifact and render its validation report.
    Inspect(InspectArgs),

    /// Configuration management.
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Certificate listing arguments.
#[derive(Debug, clap::Args)]
pub struct CertsArgs {
    /// Only certificates whose subject contains this text.
    #[arg(long)]
    pub subject: Option<String>,

    /// Only certificates currently within their validity window.
    #[arg(long)]
    pub valid_only: bool,
}

/// Batch signing arguments.
#[derive(Debug, clap::Args)]
pub struct SignArgs {
    /// Backend document identifiers to sign.
    #[arg(required = true)]
    pub documents: Vec<String>,

    /// Thumbprint of the signing certificate (overrides config).
    #[arg(short, long)]
    pub thumbprint: Option<String>,

    /// Signature format family.
    #[arg(short, long, value_enum, default_value = "pades")]
    pub policy: PolicyArg,

    /// Retries per item for transient failures (0 disables retrying).
    #[arg(long, default_value = "0")]
    pub retries: u32,

    /// Signature field name (PAdES visual signatures).
    #[arg(long)]
    pub field_name: Option<String>,

    /// One-based page for the visible mark (PAdES visual signatures).
    #[arg(long)]
    pub page: Option<u32>,

    /// Reason text rendered with the signature.
    #[arg(long)]
    pub reason: Option<String>,

    /// Location text rendered with the signature.
    #[arg(long)]
    pub location: Option<String>,
}

impl SignArgs {
    /// Returns whether any visual option was given.
    #[must_use]
    pub fn has_visual(&self) -> bool {
        self.field_name.is_some()
            || self.page.is_some()
            || self.reason.is_some()
            || self.location.is_some()
    }
}

/// Artifact inspection arguments.
#[derive(Debug, clap::Args)]
pub struct InspectArgs {
    /// Artifact reference returned by a sign run.
    pub artifact: String,

    /// Signature format family to validate against.
    #[arg(short, long, value_enum, default_value = "pades")]
    pub policy: PolicyArg,
}

/// Config commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,

    /// Set a configuration value.
    Set {
        /// Configuration key (backend-url, api-key, thumbprint).
        key: String,
        /// Configuration value.
        value: String,
    },
}

/// Signature policy as a CLI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PolicyArg {
    /// PDF signatures (PAdES).
    Pades,
    /// Generic binary/CMS signatures (CAdES).
    Cades,
    /// XML signatures (XAdES).
    Xades,
}

impl From<PolicyArg> for SignaturePolicy {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::Pades => Self::Pades,
            PolicyArg::Cades => Self::Cades,
            PolicyArg::Xades => Self::Xades,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn sign_requires_at_least_one_document() {
        assert!(Cli::try_parse_from(["sigbatch", "sign"]).is_err());
        assert!(Cli::try_parse_from(["sigbatch", "sign", "doc-1"]).is_ok());
    }

    #[test]
    fn sign_accepts_policy_and_visual_options() {
        let cli = Cli::try_parse_from([
            "sigbatch",
            "sign",
            "doc-1",
            "doc-2",
            "--policy",
            "cades",
            "--reason",
            "Quarterly filing",
        ])
        .unwrap();

        let Command::Sign(args) = cli.command else {
            panic!("expected sign command");
        };
        assert_eq!(args.documents, vec!["doc-1", "doc-2"]);
        assert_eq!(SignaturePolicy::from(args.policy), SignaturePolicy::Cades);
        assert!(args.has_visual());
    }

    #[test]
    fn backend_override_is_global() {
        let cli = Cli::try_parse_from([
            "sigbatch",
            "--backend",
            "https://sign.example.com/api/",
            "certs",
        ])
        .unwrap();
        assert_eq!(
            cli.backend.as_deref(),
            Some("https://sign.example.com/api/")
        );
    }
}
