//! Write-count flush policy.
//!
//! Amortizes commit cost by letting writes accumulate in one deferred
//! transaction until the threshold is crossed.

use crate::error::{Result, ShelfError};

/// Decides when buffered writes must be committed.
///
/// The strategy never touches the connection itself; [`on_write`] reports
/// whether the owning shelf has to flush.
///
/// [`on_write`]: SyncStrategy::on_write
#[derive(Debug, Clone)]
pub struct SyncStrategy {
    threshold: u64,
    pending: u64,
}

impl SyncStrategy {
    pub const DEFAULT_THRESHOLD: i64 = 10_000;

    /// Create a strategy that flushes once more than `threshold` writes are
    /// pending.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::Configuration`] if `threshold` is not positive.
    pub fn new(threshold: i64) -> Result<Self> {
        if threshold <= 0 {
            return Err(ShelfError::Configuration(format!(
                "Count '{threshold}' must be a positive int"
            )));
        }
        Ok(Self {
            threshold: threshold.unsigned_abs(),
            pending: 0,
        })
    }

    /// Record one executed write.
    ///
    /// Returns true when the caller must commit. The (threshold + 1)-th write
    /// since the last flush is the one that triggers; until the caller
    /// reports a successful commit through [`reset`](Self::reset), every
    /// further write keeps asking for one.
    pub fn on_write(&mut self) -> bool {
        self.pending += 1;
        self.pending > self.threshold
    }

    /// Forget pending writes after a successful commit.
    pub fn reset(&mut self) {
        self.pending = 0;
    }

    pub fn pending(&self) -> u64 {
        self.pending
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }
}

impl Default for SyncStrategy {
    fn default() -> Self {
        Self {
            threshold: Self::DEFAULT_THRESHOLD.unsigned_abs(),
            pending: 0,
        }
    }
}
