//! Plutonium
//!
//! A deterministic proof-of-work engine:
//! - [`Hasher`]: `digest(data, nonce)` over Blake2s, Blake2b or Argon2d
//! - [`DifficultyOracle`]: accepts digests at or below the current [`Target`]
//! - [`MiningEngine`]: bounded nonce search, parallel across a worker pool,
//!   with cooperative cancellation
//! - [`Verifier`]: recomputation check of claimed solutions
//!
//! On top of these sit multi-round [`MiningSession`]s with difficulty
//! retargeting and the [`binding`] entry points `test` and `miner`.

pub mod binding;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod session;
pub mod utils;
pub mod verifier;

pub use crate::core::{
    Digest, Difficulty, DifficultyOracle, HashAlgorithm, HashRate, Hasher, Nonce, Period, Target,
};
pub use config::Config;
pub use engine::{EngineConfig, MiningEngine, MiningResult, SearchMode, SearchOutcome};
pub use error::{Error, Result};
pub use session::{MiningSession, SessionConfig, SessionReport};
pub use verifier::{Verdict, Verifier};

/// Application information
pub const APP_NAME: &str = "plutonium";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
