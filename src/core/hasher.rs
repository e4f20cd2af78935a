//! Hash functions producing mining digests
//!
//! Every algorithm hashes `data || nonce` where the nonce is appended as
//! 8 little-endian bytes, and produces a 32-byte digest.

use crate::core::constants::{
    ARGON2_ITERATIONS, ARGON2_LANES, ARGON2_MEMORY_KIB, ARGON2_SALT, DIGEST_SIZE, NONCE_SIZE,
};
use crate::core::{Digest, Nonce};
use crate::error::{Error, Result};
use argon2::{Algorithm, Argon2, Params, Version};
use blake2::digest::consts::U32;
use blake2::{Blake2b, Blake2s256, Digest as _};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

type Blake2b256 = Blake2b<U32>;

/// Largest input the Argon2 password field can carry
const ARGON2_MAX_INPUT: usize = u32::MAX as usize;

/// Hash algorithms supported by the miner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// Blake2s-256
    #[default]
    Blake2s,
    /// Blake2b truncated to a 256-bit output
    Blake2b,
    /// Memory-hard Argon2d
    Argon2d,
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Blake2s => write!(f, "blake2s"),
            HashAlgorithm::Blake2b => write!(f, "blake2b"),
            HashAlgorithm::Argon2d => write!(f, "argon2d"),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "blake2s" => Ok(HashAlgorithm::Blake2s),
            "blake2b" => Ok(HashAlgorithm::Blake2b),
            "argon2d" => Ok(HashAlgorithm::Argon2d),
            other => Err(Error::config(format!("Unknown hash algorithm: {}", other))),
        }
    }
}

/// Deterministic `digest(data, nonce)` function.
///
/// A hasher is immutable after construction and can be shared between
/// threads; the engine and the verifier hold it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Hasher {
    algorithm: HashAlgorithm,
    argon2_params: Option<Params>,
}

impl Hasher {
    /// Create a hasher for the given algorithm.
    ///
    /// Argon2 parameters are checked here so that [`Hasher::digest`] has no
    /// failure path of its own.
    pub fn new(algorithm: HashAlgorithm) -> Result<Self> {
        let argon2_params = match algorithm {
            HashAlgorithm::Argon2d => Some(
                Params::new(
                    ARGON2_MEMORY_KIB,
                    ARGON2_ITERATIONS,
                    ARGON2_LANES,
                    Some(DIGEST_SIZE),
                )
                .map_err(|e| Error::config(format!("Invalid Argon2 parameters: {}", e)))?,
            ),
            HashAlgorithm::Blake2s | HashAlgorithm::Blake2b => None,
        };

        Ok(Self {
            algorithm,
            argon2_params,
        })
    }

    /// Blake2s hasher, which cannot fail to build
    pub fn blake2s() -> Self {
        Self {
            algorithm: HashAlgorithm::Blake2s,
            argon2_params: None,
        }
    }

    /// Algorithm this hasher computes
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Reject data the algorithm cannot absorb in a single call
    pub fn check_input(&self, data: &[u8]) -> Result<()> {
        if self.algorithm == HashAlgorithm::Argon2d && data.len() + NONCE_SIZE > ARGON2_MAX_INPUT {
            return Err(Error::invalid_input(format!(
                "Argon2d input is limited to {} bytes",
                ARGON2_MAX_INPUT - NONCE_SIZE
            )));
        }
        Ok(())
    }

    /// Hash `data || nonce` into a digest
    pub fn digest(&self, data: &[u8], nonce: Nonce) -> Digest {
        let nonce_bytes = nonce.to_le_bytes();

        match (self.algorithm, &self.argon2_params) {
            (HashAlgorithm::Argon2d, Some(params)) => argon2d(params, data, &nonce_bytes),
            (HashAlgorithm::Blake2b, _) => {
                let mut hasher = Blake2b256::new();
                hasher.update(data);
                hasher.update(nonce_bytes);
                Digest::from_bytes(hasher.finalize().into())
            }
            _ => {
                let mut hasher = Blake2s256::new();
                hasher.update(data);
                hasher.update(nonce_bytes);
                Digest::from_bytes(hasher.finalize().into())
            }
        }
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::blake2s()
    }
}

fn argon2d(params: &Params, data: &[u8], nonce: &[u8; NONCE_SIZE]) -> Digest {
    let mut input = Vec::with_capacity(data.len() + NONCE_SIZE);
    input.extend_from_slice(data);
    input.extend_from_slice(nonce);

    let argon2 = Argon2::new(Algorithm::Argon2d, Version::V0x13, params.clone());
    let mut output = [0u8; DIGEST_SIZE];

    // Only oversized input can fail here; the engine rejects it up front via
    // `check_input`, and an all-ones digest is above every target but the max.
    if let Err(e) = argon2.hash_password_into(&input, ARGON2_SALT, &mut output) {
        tracing::error!("Argon2d hashing failed: {}", e);
        return Digest::from_bytes([0xFF; DIGEST_SIZE]);
    }

    Digest::from_bytes(output)
}
