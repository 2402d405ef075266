//! Counted pre-authorization for batch signing.
//!
//! A pre-authorization is a single user consent gesture covering a fixed
//! number of subsequent private-key operations, so a batch run prompts the
//! user once instead of once per document. Signer implementations consume
//! one slot per sign call; when the budget is spent, further calls fail.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::{SignerError, SignerResult};

/// A consent covering a fixed number of sign operations with one certificate.
#[derive(Debug)]
pub struct Preauthorization {
    thumbprint: String,
    total: u32,
    remaining: AtomicU32,
}

impl Preauthorization {
    /// Creates an authorization covering `count` operations for the
    /// certificate with the given thumbprint.
    #[must_use]
    pub fn new(thumbprint: impl Into<String>, count: u32) -> Self {
        Self {
            thumbprint: thumbprint.into(),
            total: count,
            remaining: AtomicU32::new(count),
        }
    }

    /// Thumbprint of the authorized certificate.
    #[must_use]
    pub fn thumbprint(&self) -> &str {
        &self.thumbprint
    }

    /// Number of operations this authorization was granted for.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.total
    }

    /// Number of operations still available.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining.load(Ordering::Acquire)
    }

    /// Consumes one authorization slot.
    ///
    /// # Errors
    ///
    /// Returns `SignerError::AuthorizationExhausted` when the budget is
    /// already spent.
    pub fn consume(&self) -> SignerResult<()> {
        let mut current = self.remaining.load(Ordering::Acquire);
        loop {
            if current == 0 {
                return Err(SignerError::AuthorizationExhausted(self.total));
            }
            match self.remaining.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(()),
                Err(observed) => current = observed,
            }
        }
    }
}
