//! # sb-core
//!
//! Core utilities, configuration, and error handling for the sigbatch
//! workspace.
//!
//! This crate provides foundational types used across all other sigbatch
//! crates: the workspace error type, the pipeline configuration, digest
//! algorithm identifiers, and structured batch audit events.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod algorithm;
pub mod config;
pub mod error;
pub mod event;

pub use algorithm::DigestAlgorithm;
pub use config::PipelineConfig;
pub use error::{Error, Result};
