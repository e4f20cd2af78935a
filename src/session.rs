//! Multi-round mining sessions with difficulty retargeting
//!
//! Round `i` mines `payload || i.to_le_bytes()`, so every round searches a
//! fresh input. Found solutions are re-checked by the [`Verifier`] and, with
//! retargeting on, the oracle target moves between rounds so that a round
//! takes about `target_period`.

use crate::core::{
    adjust_difficulty, Difficulty, HashAlgorithm, HashRate, Nonce, Period, Target,
};
use crate::engine::{MiningEngine, MiningResult};
use crate::error::{Error, Result};
use crate::verifier::{Verdict, Verifier};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Nonces searched per round
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u64,

    /// Move the target between rounds
    #[serde(default = "default_true")]
    pub retarget: bool,

    /// Desired time per round
    #[serde(
        default = "default_target_period",
        with = "crate::utils::humantime_duration"
    )]
    pub target_period: Duration,

    /// Relative deviation from the target period that is tolerated
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

fn default_max_attempts() -> u64 {
    1_000_000
}

fn default_true() -> bool {
    true
}

fn default_target_period() -> Duration {
    Duration::from_secs(1)
}

fn default_tolerance() -> f64 {
    0.25
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retarget: default_true(),
            target_period: default_target_period(),
            tolerance: default_tolerance(),
        }
    }
}

impl SessionConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::config("Session max_attempts must be greater than 0"));
        }
        if self.target_period.is_zero() {
            return Err(Error::config("Session target_period must be greater than 0"));
        }
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(Error::config("Session tolerance must be a non-negative number"));
        }
        Ok(())
    }
}

/// What happened in one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundOutcome {
    /// Round index, also the salt appended to the payload
    pub round: u64,
    /// Search result
    pub result: MiningResult,
    /// Verifier verdict for a found solution
    pub verdict: Option<Verdict>,
    /// Difficulty the round was mined at
    pub difficulty: Difficulty,
    /// Hashes computed
    pub attempts: u64,
    /// Wall-clock time of the round
    #[serde(with = "crate::utils::humantime_duration")]
    pub elapsed: Duration,
    /// Hash rate of the round
    pub hash_rate: HashRate,
}

/// Summary of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Hash algorithm used
    pub algorithm: HashAlgorithm,
    /// Rounds asked for
    pub rounds_requested: u64,
    /// Completed rounds in order
    pub rounds: Vec<RoundOutcome>,
    /// Whether cancellation ended the session early
    pub cancelled: bool,
    /// Target after the last round
    pub final_target: Target,
    /// Total wall-clock time
    #[serde(with = "crate::utils::humantime_duration")]
    pub elapsed: Duration,
}

impl SessionReport {
    /// Rounds that produced a verified solution
    pub fn solutions(&self) -> usize {
        self.rounds
            .iter()
            .filter(|round| round.verdict == Some(Verdict::Valid))
            .count()
    }

    /// Hashes computed over all rounds
    pub fn total_attempts(&self) -> u64 {
        self.rounds.iter().map(|round| round.attempts).sum()
    }

    /// Average hash rate over the session
    pub fn hash_rate(&self) -> HashRate {
        let busy = self.rounds.iter().map(|round| round.elapsed).sum();
        HashRate::measured(self.total_attempts(), busy)
    }
}

/// Runs successive mining rounds on one engine
#[derive(Debug)]
pub struct MiningSession {
    engine: Arc<MiningEngine>,
    verifier: Verifier,
    config: SessionConfig,
    cancel: CancellationToken,
}

impl MiningSession {
    /// Create a session; the verifier shares the engine's hasher and oracle
    pub fn new(engine: Arc<MiningEngine>, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let verifier = Verifier::new(engine.hasher().clone(), engine.oracle().clone());

        Ok(Self {
            engine,
            verifier,
            config,
            cancel: CancellationToken::new(),
        })
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops the session
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Mine `rounds` rounds over `payload`
    pub fn run(&self, payload: &[u8], rounds: u64) -> Result<SessionReport> {
        if rounds == 0 {
            return Err(Error::invalid_input("Rounds must be greater than 0"));
        }

        let started = Instant::now();
        let mut outcomes = Vec::new();
        let mut cancelled = false;

        for round in 0..rounds {
            let data = salted(payload, round);
            let searched = self.engine.search(
                &data,
                Nonce::new(0),
                self.config.max_attempts,
                Some(&self.cancel),
            );

            let outcome = match searched {
                Ok(outcome) => outcome,
                Err(Error::Cancelled(_)) => {
                    cancelled = true;
                    break;
                }
                Err(e) => return Err(e),
            };

            let verdict = match outcome.result {
                MiningResult::Found { nonce, digest } => {
                    let verdict = self.verifier.check(&data, nonce, &digest);
                    if !verdict.is_valid() {
                        error!("Round {} produced an unverifiable solution: {}", round, verdict);
                    }
                    Some(verdict)
                }
                MiningResult::Exhausted => None,
            };

            let difficulty = Difficulty::from(outcome.target);
            let hash_rate = outcome.hash_rate();
            info!(
                round,
                found = outcome.result.is_found(),
                attempts = outcome.attempts,
                difficulty = difficulty.value(),
                hash_rate = hash_rate.0,
                "Round complete"
            );

            outcomes.push(RoundOutcome {
                round,
                result: outcome.result,
                verdict,
                difficulty,
                attempts: outcome.attempts,
                elapsed: outcome.elapsed,
                hash_rate,
            });

            if self.config.retarget {
                self.retarget(difficulty, hash_rate);
            }
        }

        Ok(SessionReport {
            algorithm: self.engine.hasher().algorithm(),
            rounds_requested: rounds,
            rounds: outcomes,
            cancelled,
            final_target: self.engine.oracle().target(),
            elapsed: started.elapsed(),
        })
    }

    fn retarget(&self, current: Difficulty, hash_rate: HashRate) {
        let adjusted = adjust_difficulty(
            self.config.tolerance,
            hash_rate,
            Period::from(self.config.target_period),
            current,
        );

        if adjusted != current {
            info!(
                "Retargeting difficulty {:.2} -> {:.2}",
                current.value(),
                adjusted.value()
            );
            self.engine.oracle().set_target(adjusted.to_target());
        }
    }
}

/// `payload || round.to_le_bytes()`
fn salted(payload: &[u8], round: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity(payload.len() + 8);
    data.extend_from_slice(payload);
    data.extend_from_slice(&round.to_le_bytes());
    data
}
