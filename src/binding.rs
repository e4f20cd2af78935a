//! Host-facing entry points
//!
//! Two calls with plain return shapes: [`test`] answers `1` or `0`, [`miner`]
//! returns a serializable [`MinerRecord`]. Both build their own engine over
//! the default payload and target; the `*_with` variants take a configured
//! engine instead.

use crate::core::{Digest, DifficultyOracle, HashAlgorithm, Hasher, Nonce, Target};
use crate::engine::{EngineConfig, MiningEngine, MiningResult};
use crate::error::Result;
use crate::verifier::Verifier;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Payload mined by the built-in entry points
pub const DEFAULT_PAYLOAD: &[u8] = b"plutonium";

/// Nonces searched by the built-in entry points
pub const DEFAULT_MAX_ATTEMPTS: u64 = 1 << 20;

/// Exponent of the default target, `value < 2^250`
pub const DEFAULT_TARGET_EXPONENT: u32 = 250;

/// Result of a [`miner`] call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinerRecord {
    /// Whether a solution was found
    pub found: bool,
    /// Winning nonce
    pub nonce: Option<Nonce>,
    /// Digest of the winning nonce
    pub digest: Option<Digest>,
    /// Hashes computed
    pub attempts: u64,
    /// Hash algorithm used
    pub algorithm: HashAlgorithm,
    /// Target mined against
    pub target: Target,
}

/// Loose target the built-in entry points mine against
pub fn default_target() -> Target {
    Target::below_power_of_two(DEFAULT_TARGET_EXPONENT).unwrap_or_else(|_| Target::max())
}

fn default_engine() -> Result<MiningEngine> {
    MiningEngine::new(
        Arc::new(Hasher::default()),
        Arc::new(DifficultyOracle::new(default_target())),
        EngineConfig::default(),
    )
}

/// Self-check: mine the default payload and verify the solution. `1` on pass, `0` on fail.
pub fn test() -> i32 {
    match default_engine().and_then(|engine| test_with(&engine)) {
        Ok(true) => 1,
        Ok(false) => 0,
        Err(e) => {
            error!("Self-test failed: {}", e);
            0
        }
    }
}

/// Self-check on a configured engine
pub fn test_with(engine: &MiningEngine) -> Result<bool> {
    let result = engine.mine(DEFAULT_PAYLOAD, DEFAULT_MAX_ATTEMPTS)?;
    let verifier = Verifier::new(engine.hasher().clone(), engine.oracle().clone());

    let passed = match result {
        MiningResult::Found { nonce, digest } => verifier.verify(DEFAULT_PAYLOAD, nonce, &digest),
        MiningResult::Exhausted => false,
    };

    info!("Self-test {}", if passed { "passed" } else { "failed" });
    Ok(passed)
}

/// Mine the default payload, reporting a not-found record on failure
pub fn miner() -> MinerRecord {
    let mined =
        default_engine().and_then(|engine| miner_with(&engine, DEFAULT_PAYLOAD, DEFAULT_MAX_ATTEMPTS));

    match mined {
        Ok(record) => record,
        Err(e) => {
            error!("Miner failed: {}", e);
            MinerRecord {
                found: false,
                nonce: None,
                digest: None,
                attempts: 0,
                algorithm: HashAlgorithm::default(),
                target: default_target(),
            }
        }
    }
}

/// Mine `payload` on a configured engine and describe the outcome
pub fn miner_with(engine: &MiningEngine, payload: &[u8], max_attempts: u64) -> Result<MinerRecord> {
    let outcome = engine.search(payload, Nonce::new(0), max_attempts, None)?;

    Ok(MinerRecord {
        found: outcome.result.is_found(),
        nonce: outcome.result.nonce(),
        digest: outcome.result.digest(),
        attempts: outcome.attempts,
        algorithm: engine.hasher().algorithm(),
        target: outcome.target,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_test_passes() {
        assert_eq!(test(), 1);
    }

    #[test]
    fn test_miner_record() {
        let record = miner();
        assert!(record.found);
        assert_eq!(record.algorithm, HashAlgorithm::Blake2s);
        assert_eq!(record.target, default_target());

        let nonce = record.nonce.unwrap();
        let digest = Hasher::default().digest(DEFAULT_PAYLOAD, nonce);
        assert_eq!(record.digest, Some(digest));
        assert!(record.target.accepts(&digest));
        assert!(record.attempts >= 1);
    }

    #[test]
    fn test_miner_with_impossible_target() {
        let engine = MiningEngine::new(
            Arc::new(Hasher::default()),
            Arc::new(DifficultyOracle::new(Target::zero())),
            EngineConfig::single_threaded(),
        )
        .unwrap();

        // The default bound against the zero target hashes every nonce, keep it short
        let record = miner_with(&engine, DEFAULT_PAYLOAD, 64).unwrap();
        assert!(!record.found);
        assert_eq!(record.attempts, 64);
        assert_eq!(record.nonce, None);
    }

    #[test]
    fn test_record_json_shape() {
        let record = miner();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["found"], true);
        assert_eq!(json["algorithm"], "blake2s");
        assert!(json["digest"].is_string());
        assert_eq!(json["target"].as_str().map(str::len), Some(64));
    }
}
