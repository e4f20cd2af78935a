//! Core types for proof-of-work mining
//!
//! Digests, targets and nonces, the hash functions that produce digests and
//! the oracle that decides whether a digest meets the current target.

mod difficulty;
mod digest;
mod hasher;
mod nonce;
mod oracle;
mod target;

pub use difficulty::{
    adjust_difficulty, prune_difficulty, share_difficulty, Difficulty, HashRate, Period,
    MAX_DIFFICULTY, MIN_DIFFICULTY,
};
pub use digest::Digest;
pub use hasher::{HashAlgorithm, Hasher};
pub use nonce::Nonce;
pub use oracle::DifficultyOracle;
pub use target::Target;

/// Constants shared by the mining types
pub mod constants {
    /// Size of a digest in bytes
    pub const DIGEST_SIZE: usize = 32;

    /// Width of a digest or target in bits
    pub const TARGET_BITS: u32 = (DIGEST_SIZE * 8) as u32;

    /// Size of the nonce in bytes
    pub const NONCE_SIZE: usize = 8;

    /// Salt used by the memory-hard Argon2d hash
    pub const ARGON2_SALT: &[u8] = b"nimiqrocks!";

    /// Argon2d memory cost in KiB
    pub const ARGON2_MEMORY_KIB: u32 = 512;

    /// Argon2d pass count
    pub const ARGON2_ITERATIONS: u32 = 1;

    /// Argon2d lane count
    pub const ARGON2_LANES: u32 = 1;
}


#[cfg(test)]
mod tests_property;
