//! Cumulative mining statistics

use crate::core::HashRate;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters shared by every search an engine runs.
///
/// Workers flush their hash counts once per batch, so a snapshot taken while
/// a search is running may lag by up to one batch per worker.
#[derive(Debug, Default)]
pub struct MiningStats {
    hashes: AtomicU64,
    solutions: AtomicU64,
    exhausted: AtomicU64,
    cancelled: AtomicU64,
    busy: Mutex<Duration>,
}

/// Point-in-time copy of [`MiningStats`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Hashes computed
    pub hashes: u64,
    /// Searches that found a solution
    pub solutions: u64,
    /// Searches that ran out of nonces
    pub exhausted: u64,
    /// Searches stopped by cancellation
    pub cancelled: u64,
    /// Time spent searching
    #[serde(with = "crate::utils::humantime_duration")]
    pub busy: Duration,
}

impl StatsSnapshot {
    /// Average hash rate over the time spent searching
    pub fn hash_rate(&self) -> HashRate {
        HashRate::measured(self.hashes, self.busy)
    }
}

impl MiningStats {
    pub(crate) fn record_hashes(&self, count: u64) {
        self.hashes.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_solution(&self) {
        self.solutions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_exhausted(&self) {
        self.exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_busy(&self, elapsed: Duration) {
        *self.busy.lock() += elapsed;
    }

    /// Take a snapshot of the counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hashes: self.hashes.load(Ordering::Relaxed),
            solutions: self.solutions.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            busy: *self.busy.lock(),
        }
    }
}
