//! # sb-cli
//!
//! Operator command line for the sigbatch workspace:
//! - `certs`: list certificates available to the configured signer
//! - `sign`: run a batch signing session over one or more documents
//! - `inspect`: open a signed artifact and render its validation report
//! - `config`: show and edit the CLI configuration

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::uninlined_format_args)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::Cli;
pub use config::CliConfig;
pub use error::{CliError, CliResult};
