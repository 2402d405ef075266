//! Pipeline configuration.
//!
//! Concurrency values are tuning knobs, not hard constants: the start and
//! complete stages are network-bound and parallelize well, while the sign
//! stage talks to a capability that processes one request at a time
//! (hardware tokens serialize internally), so its default is 1.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Configuration for a batch signing pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of parallel workers for the start stage.
    pub start_concurrency: usize,

    /// Number of parallel workers for the sign stage.
    ///
    /// Keep this at 1 unless the local signer is known to support
    /// concurrent private-key operations.
    pub sign_concurrency: usize,

    /// Number of parallel workers for the complete stage.
    pub complete_concurrency: usize,

    /// Per-call timeout for start and complete stage calls, in seconds.
    pub stage_timeout_secs: u64,

    /// Per-call timeout for sign stage calls, in seconds.
    ///
    /// Noticeably higher than the network timeout: a hardware token may
    /// require a PIN prompt, which can take tens of seconds.
    pub sign_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            start_concurrency: 3,
            sign_concurrency: 1,
            complete_concurrency: 3,
            stage_timeout_secs: 30,
            sign_timeout_secs: 120,
        }
    }
}

impl PipelineConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if any stage has zero workers or a timeout
    /// is zero.
    pub fn validate(&self) -> Result<()> {
        if self.start_concurrency == 0 {
            return Err(Error::Config(
                "start concurrency must be at least 1".to_string(),
            ));
        }
        if self.sign_concurrency == 0 {
            return Err(Error::Config(
                "sign concurrency must be at least 1".to_string(),
            ));
        }
        if self.complete_concurrency == 0 {
            return Err(Error::Config(
                "complete concurrency must be at least 1".to_string(),
            ));
        }
        if self.stage_timeout_secs == 0 || self.sign_timeout_secs == 0 {
            return Err(Error::Config("stage timeouts must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Timeout applied to each start/complete stage call.
    #[must_use]
    pub const fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_secs)
    }

    /// Timeout applied to each sign stage call.
    #[must_use]
    pub const fn sign_timeout(&self) -> Duration {
        Duration::from_secs(self.sign_timeout_secs)
    }
}
