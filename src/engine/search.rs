//! Partitioned nonce search shared by all worker threads

use crate::core::{Digest, Hasher, Nonce, Target};
use crate::engine::{MiningResult, MiningStats, SearchMode};
use parking_lot::Mutex;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Split `range` into at most `parts` contiguous, non-overlapping ranges
/// covering it completely, in ascending order.
pub(crate) fn partition(range: Range<u64>, parts: usize) -> Vec<Range<u64>> {
    let count = range.end.saturating_sub(range.start);
    if count == 0 || parts == 0 {
        return Vec::new();
    }

    let parts = (parts as u64).min(count);
    let chunk = count / parts;
    let remainder = count % parts;

    let mut ranges = Vec::with_capacity(parts as usize);
    let mut start = range.start;
    for i in 0..parts {
        let len = chunk + u64::from(i < remainder);
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}

/// State shared by the workers of one search invocation
pub(crate) struct SearchContext<'a> {
    pub data: &'a [u8],
    pub hasher: &'a Hasher,
    pub target: Target,
    pub mode: SearchMode,
    pub batch_size: u64,
    pub cancel: Option<&'a CancellationToken>,
    pub stats: &'a MiningStats,
    stop: AtomicBool,
    cancelled: AtomicBool,
    best: AtomicU64,
    attempts: AtomicU64,
    slot: Mutex<Option<(Nonce, Digest)>>,
}

impl<'a> SearchContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        data: &'a [u8],
        hasher: &'a Hasher,
        target: Target,
        mode: SearchMode,
        batch_size: u64,
        cancel: Option<&'a CancellationToken>,
        stats: &'a MiningStats,
    ) -> Self {
        Self {
            data,
            hasher,
            target,
            mode,
            batch_size: batch_size.max(1),
            cancel,
            stats,
            stop: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            // No searchable nonce equals u64::MAX, the range end is exclusive
            best: AtomicU64::new(u64::MAX),
            attempts: AtomicU64::new(0),
            slot: Mutex::new(None),
        }
    }

    /// Scan one worker's range in ascending order
    pub fn scan(&self, worker: usize, range: Range<u64>) {
        debug!("Worker {} scanning nonces {}..{}", worker, range.start, range.end);

        let mut nonce = Nonce::new(range.start);
        let mut pending = 0u64;
        // Cleared when the scan ends on a hit or on a stop request
        let mut ran_out = true;

        while nonce.value() < range.end {
            if self.should_stop(nonce.value()) {
                ran_out = false;
                break;
            }

            let digest = self.hasher.digest(self.data, nonce);
            pending += 1;

            if self.target.accepts(&digest) {
                self.report(nonce, digest);
                ran_out = false;
                break;
            }

            if pending == self.batch_size {
                self.flush(pending);
                pending = 0;
                self.poll_cancellation();
            }

            if !nonce.checked_increment() {
                break;
            }
        }

        self.flush(pending);
        if ran_out {
            // Cancellation during the last partial batch
            self.poll_cancellation();
        }
        debug!("Worker {} stopped", worker);
    }

    fn should_stop(&self, value: u64) -> bool {
        if self.stop.load(Ordering::Relaxed) {
            return true;
        }
        // A worker whose next nonce is above the best solution cannot improve it
        self.mode == SearchMode::Lowest && value > self.best.load(Ordering::Relaxed)
    }

    fn report(&self, nonce: Nonce, digest: Digest) {
        let mut slot = self.slot.lock();
        match self.mode {
            SearchMode::Lowest => {
                self.best.fetch_min(nonce.value(), Ordering::Relaxed);
                if slot.as_ref().map_or(true, |(best, _)| nonce < *best) {
                    *slot = Some((nonce, digest));
                }
            }
            SearchMode::FirstFound => {
                if slot.is_none() {
                    *slot = Some((nonce, digest));
                }
                self.stop.store(true, Ordering::Relaxed);
            }
        }
    }

    fn flush(&self, pending: u64) {
        if pending > 0 {
            self.attempts.fetch_add(pending, Ordering::Relaxed);
            self.stats.record_hashes(pending);
        }
    }

    fn poll_cancellation(&self) {
        if self.cancel.is_some_and(CancellationToken::is_cancelled) {
            self.cancelled.store(true, Ordering::Relaxed);
            self.stop.store(true, Ordering::Relaxed);
        }
    }

    /// Whether an external cancellation stopped a worker before its range
    /// was done. A token fired after the workers finished does not count.
    pub fn was_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Hashes computed by all workers
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Final result of the search
    pub fn into_result(self) -> MiningResult {
        match self.slot.into_inner() {
            Some((nonce, digest)) => MiningResult::Found { nonce, digest },
            None => MiningResult::Exhausted,
        }
    }
}
