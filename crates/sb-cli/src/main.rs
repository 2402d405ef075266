//! # sigbatch
//!
//! Operator CLI for batch document signing.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![allow(clippy::uninlined_format_args)]

use clap::Parser;
use sb_cli::{
    cli::{Cli, Command},
    commands::{run_certs, run_config, run_inspect, run_sign},
    config::CliConfig,
    output::error,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match CliConfig::load() {
        Ok(c) => c,
        Err(e) => {
            error(&format!("Failed to load configuration: {}", e));
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Certs(args) => run_certs(args, &config, cli.output).await,
        Command::Sign(args) => run_sign(args, &config, cli.backend.as_deref(), cli.output).await,
        Command::Inspect(args) => {
            run_inspect(args, &config, cli.backend.as_deref(), cli.output).await
        }
        Command::Config(cmd) => run_config(cmd, &mut config),
    };

    if let Err(e) = result {
        error(&e.to_string());
        std::process::exit(1);
    }
}

/// Logs go to stderr so they never interleave with command output.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
