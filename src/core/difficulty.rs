//! Difficulty and hash rate calculations

use super::Target;
use serde::{Deserialize, Serialize};

/// Lowest difficulty a retarget may produce
pub const MIN_DIFFICULTY: f64 = 1.0;

/// Highest difficulty a retarget may produce
pub const MAX_DIFFICULTY: f64 = 1e15;

/// Represents mining difficulty relative to the maximum target
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Difficulty(pub f64);

impl Difficulty {
    /// Create a new difficulty
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    /// Get the inner value
    pub fn value(self) -> f64 {
        self.0
    }

    /// Convert to target, falling back to the easiest target for difficulties below one
    pub fn to_target(self) -> Target {
        Target::from_difficulty(self.0).unwrap_or_else(|_| Target::max())
    }
}

impl From<Target> for Difficulty {
    fn from(target: Target) -> Self {
        Self(target.to_difficulty())
    }
}

/// Represents hash rate in hashes per second
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashRate(pub f64);

impl HashRate {
    /// Create a new hash rate
    pub fn new(hashes_per_second: f64) -> Self {
        Self(hashes_per_second)
    }

    /// Hash rate from a count of hashes over an elapsed time
    pub fn measured(hashes: u64, elapsed: std::time::Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        if secs > 0.0 {
            Self(hashes as f64 / secs)
        } else {
            Self(0.0)
        }
    }
}

/// Represents a time period in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Period(pub f64);

impl Period {
    /// Create a new period
    pub fn new(seconds: f64) -> Self {
        Self(seconds)
    }
}

impl From<std::time::Duration> for Period {
    fn from(duration: std::time::Duration) -> Self {
        Self(duration.as_secs_f64())
    }
}

/// Adjust difficulty so that the expected time per solution approaches `target_period`.
///
/// The expected period is `difficulty / hash_rate`. Within the relative
/// `tolerance` dead band the current difficulty is kept. A hash rate or
/// target period that is not strictly positive leaves it unchanged too.
pub fn adjust_difficulty(
    tolerance: f64,
    estimated_hash_rate: HashRate,
    target_period: Period,
    current_difficulty: Difficulty,
) -> Difficulty {
    let HashRate(hr) = estimated_hash_rate;
    let Period(tp) = target_period;
    let Difficulty(d) = current_difficulty;

    if !(hr > 0.0 && tp > 0.0 && d > 0.0) {
        return current_difficulty;
    }

    let current_period = d / hr;

    let deviation = (current_period - tp).abs() / tp;
    if deviation <= tolerance {
        return current_difficulty;
    }

    // d * tp / (d / hr) simplifies to hr * tp
    prune_difficulty(Difficulty(hr * tp))
}

/// Clamp difficulty to `[MIN_DIFFICULTY, MAX_DIFFICULTY]`
pub fn prune_difficulty(difficulty: Difficulty) -> Difficulty {
    let Difficulty(d) = difficulty;
    Difficulty(d.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY))
}

/// Share difficulty for a miner that expects `expected_khs` kH/s and wants
/// `shares_per_second` shares: `(1000 * khs * sps) / 2^16`, never below one.
pub fn share_difficulty(expected_khs: f64, shares_per_second: f64) -> Difficulty {
    let raw = (1000.0 * expected_khs * shares_per_second) / f64::from(1u32 << 16);
    if raw.is_finite() && raw > MIN_DIFFICULTY {
        prune_difficulty(Difficulty(raw))
    } else {
        Difficulty(MIN_DIFFICULTY)
    }
}
