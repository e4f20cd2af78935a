//! Nonce search engine
//!
//! The engine searches `[start, start + max_attempts)` for the smallest nonce
//! whose digest the [`DifficultyOracle`] accepts. The range is split into
//! contiguous parts that run on a dedicated rayon pool; workers only share the
//! read-only input, a target snapshot and the result slot.

mod search;
mod stats;

pub use stats::{MiningStats, StatsSnapshot};

use crate::core::{Digest, DifficultyOracle, HashRate, Hasher, Nonce, Target};
use crate::error::{Error, Result};
use clap::ValueEnum;
use rayon::prelude::*;
use search::{partition, SearchContext};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How concurrent workers settle on a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchMode {
    /// Keep the smallest accepted nonce. Matches a single-threaded search.
    #[default]
    Lowest,
    /// The first worker to report wins and all others stop
    FirstFound,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::Lowest => write!(f, "lowest"),
            SearchMode::FirstFound => write!(f, "first-found"),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Number of worker threads (0 = all available cores)
    #[serde(default)]
    pub threads: usize,

    /// Nonces a worker hashes between cancellation checks and stats flushes
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,

    /// Result policy for concurrent workers
    #[serde(default)]
    pub mode: SearchMode,
}

fn default_batch_size() -> u64 {
    1_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            batch_size: default_batch_size(),
            mode: SearchMode::default(),
        }
    }
}

impl EngineConfig {
    /// Configuration for a single worker thread
    pub fn single_threaded() -> Self {
        Self {
            threads: 1,
            ..Self::default()
        }
    }

    /// Worker count with 0 resolved to the number of cores
    pub fn worker_count(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::config("Batch size must be greater than 0"));
        }
        Ok(())
    }
}

/// Outcome of one mining invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum MiningResult {
    /// An accepted nonce and its digest
    Found {
        /// Winning nonce
        nonce: Nonce,
        /// Digest of `data || nonce`
        digest: Digest,
    },
    /// No nonce in the range met the target
    Exhausted,
}

impl MiningResult {
    /// Whether a solution was found
    pub fn is_found(&self) -> bool {
        matches!(self, MiningResult::Found { .. })
    }

    /// Winning nonce, if any
    pub fn nonce(&self) -> Option<Nonce> {
        match self {
            MiningResult::Found { nonce, .. } => Some(*nonce),
            MiningResult::Exhausted => None,
        }
    }

    /// Winning digest, if any
    pub fn digest(&self) -> Option<Digest> {
        match self {
            MiningResult::Found { digest, .. } => Some(*digest),
            MiningResult::Exhausted => None,
        }
    }
}

/// A mining result together with what it cost
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// What the search produced
    pub result: MiningResult,
    /// Target the search ran against
    pub target: Target,
    /// Hashes computed
    pub attempts: u64,
    /// Wall-clock time of the search
    #[serde(with = "crate::utils::humantime_duration")]
    pub elapsed: Duration,
}

impl SearchOutcome {
    /// Hash rate of this search
    pub fn hash_rate(&self) -> HashRate {
        HashRate::measured(self.attempts, self.elapsed)
    }
}

/// Proof-of-work search engine
pub struct MiningEngine {
    hasher: Arc<Hasher>,
    oracle: Arc<DifficultyOracle>,
    config: EngineConfig,
    pool: rayon::ThreadPool,
    stats: MiningStats,
}

impl fmt::Debug for MiningEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiningEngine")
            .field("algorithm", &self.hasher.algorithm())
            .field("workers", &self.pool.current_num_threads())
            .field("mode", &self.config.mode)
            .finish()
    }
}

impl MiningEngine {
    /// Create an engine with its own worker pool
    pub fn new(
        hasher: Arc<Hasher>,
        oracle: Arc<DifficultyOracle>,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        let workers = config.worker_count();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("plutonium-worker-{}", i))
            .build()
            .map_err(|e| Error::worker(format!("Failed to build worker pool: {}", e)))?;

        info!(
            "Initialized {} mining engine with {} workers ({} mode)",
            hasher.algorithm(),
            workers,
            config.mode
        );

        Ok(Self {
            hasher,
            oracle,
            config,
            pool,
            stats: MiningStats::default(),
        })
    }

    /// Hasher used by this engine
    pub fn hasher(&self) -> &Arc<Hasher> {
        &self.hasher
    }

    /// Oracle used by this engine
    pub fn oracle(&self) -> &Arc<DifficultyOracle> {
        &self.oracle
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of worker threads
    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Cumulative statistics
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Search nonces `0..max_attempts`
    pub fn mine(&self, data: &[u8], max_attempts: u64) -> Result<MiningResult> {
        self.mine_from(data, Nonce::new(0), max_attempts)
    }

    /// Search `max_attempts` nonces starting at `start`.
    ///
    /// The searched range is `start..min(start + max_attempts, u64::MAX)`.
    /// The upper end is exclusive, so nonce `u64::MAX` itself is never tried
    /// and `mine_from(data, Nonce::new(u64::MAX), n)` reports
    /// [`MiningResult::Exhausted`] without hashing. The nonce never wraps.
    pub fn mine_from(&self, data: &[u8], start: Nonce, max_attempts: u64) -> Result<MiningResult> {
        Ok(self.search(data, start, max_attempts, None)?.result)
    }

    /// Search nonces `0..max_attempts`, stopping early with
    /// [`Error::Cancelled`] once `cancel` fires
    pub fn mine_with_cancel(
        &self,
        data: &[u8],
        max_attempts: u64,
        cancel: &CancellationToken,
    ) -> Result<MiningResult> {
        Ok(self.search(data, Nonce::new(0), max_attempts, Some(cancel))?.result)
    }

    /// Run a search and report its cost alongside the result
    pub fn search(
        &self,
        data: &[u8],
        start: Nonce,
        max_attempts: u64,
        cancel: Option<&CancellationToken>,
    ) -> Result<SearchOutcome> {
        if data.is_empty() {
            return Err(Error::invalid_input("Data must not be empty"));
        }
        if max_attempts == 0 {
            return Err(Error::invalid_input("Maximum attempts must be greater than 0"));
        }
        self.hasher.check_input(data)?;

        if cancel.is_some_and(CancellationToken::is_cancelled) {
            self.stats.record_cancelled();
            return Err(Error::cancelled("mining"));
        }

        let range = start.value()..start.value().saturating_add(max_attempts);
        let target = self.oracle.target();
        let ranges = partition(range.clone(), self.workers());

        debug!(
            "Searching nonces {}..{} on {} workers, target {} leading zero bits",
            range.start,
            range.end,
            ranges.len(),
            target.leading_zero_bits()
        );

        let started = Instant::now();
        let ctx = SearchContext::new(
            data,
            &self.hasher,
            target,
            self.config.mode,
            self.config.batch_size,
            cancel,
            &self.stats,
        );

        if ranges.len() <= 1 {
            for range in ranges {
                ctx.scan(0, range);
            }
        } else {
            self.pool.install(|| {
                ranges
                    .into_par_iter()
                    .enumerate()
                    .for_each(|(worker, range)| ctx.scan(worker, range));
            });
        }

        let elapsed = started.elapsed();
        self.stats.record_busy(elapsed);

        if ctx.was_cancelled() {
            self.stats.record_cancelled();
            info!("Mining cancelled after {} attempts", ctx.attempts());
            return Err(Error::cancelled("mining"));
        }

        let attempts = ctx.attempts();
        let result = ctx.into_result();
        match &result {
            MiningResult::Found { nonce, digest } => {
                self.stats.record_solution();
                info!("Found solution! Nonce: {}, digest: {}", nonce, digest);
            }
            MiningResult::Exhausted => {
                self.stats.record_exhausted();
                warn!("Search exhausted after {} attempts", attempts);
            }
        }

        Ok(SearchOutcome {
            result,
            target,
            attempts,
            elapsed,
        })
    }
}
