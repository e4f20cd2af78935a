//! Stateless verification of claimed solutions

use crate::core::{Digest, DifficultyOracle, Hasher, Nonce};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Why a claimed solution was accepted or rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    /// Digest recomputes and meets the target
    Valid,
    /// The claimed digest is not the digest of `data || nonce`
    DigestMismatch,
    /// The digest is genuine but above the target
    AboveTarget,
}

impl Verdict {
    /// Whether the solution is accepted
    pub fn is_valid(self) -> bool {
        self == Verdict::Valid
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Valid => write!(f, "valid"),
            Verdict::DigestMismatch => write!(f, "digest mismatch"),
            Verdict::AboveTarget => write!(f, "above target"),
        }
    }
}

/// Checks `(data, nonce, digest)` claims by recomputation.
///
/// The claimed digest is only compared, never trusted: the target check runs
/// against the recomputed digest.
#[derive(Debug, Clone)]
pub struct Verifier {
    hasher: Arc<Hasher>,
    oracle: Arc<DifficultyOracle>,
}

impl Verifier {
    /// Create a verifier sharing the engine's hasher and oracle
    pub fn new(hasher: Arc<Hasher>, oracle: Arc<DifficultyOracle>) -> Self {
        Self { hasher, oracle }
    }

    /// `true` iff `digest(data, nonce) == claimed` and the oracle accepts it
    pub fn verify(&self, data: &[u8], nonce: Nonce, claimed: &Digest) -> bool {
        self.check(data, nonce, claimed).is_valid()
    }

    /// Like [`Verifier::verify`], reporting the reason for a rejection
    pub fn check(&self, data: &[u8], nonce: Nonce, claimed: &Digest) -> Verdict {
        let recomputed = self.hasher.digest(data, nonce);

        let verdict = if recomputed != *claimed {
            Verdict::DigestMismatch
        } else if !self.oracle.accepts(&recomputed) {
            Verdict::AboveTarget
        } else {
            Verdict::Valid
        };

        debug!("Verified nonce {}: {}", nonce, verdict);
        verdict
    }
}
