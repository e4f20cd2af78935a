//! Difficulty oracle holding the current mining target

use crate::core::{Digest, Target};
use parking_lot::RwLock;
use tracing::debug;

/// Decides whether a digest meets the current target.
///
/// The target can be replaced between mining invocations. The engine takes a
/// [`snapshot`](DifficultyOracle::target) when an invocation starts, so a
/// replacement never changes the rules of a search already running.
#[derive(Debug)]
pub struct DifficultyOracle {
    target: RwLock<Target>,
}

impl DifficultyOracle {
    /// Create an oracle with an initial target
    pub fn new(target: Target) -> Self {
        Self {
            target: RwLock::new(target),
        }
    }

    /// `value(digest) <= target`
    pub fn accepts(&self, digest: &Digest) -> bool {
        self.target.read().accepts(digest)
    }

    /// Current target
    pub fn target(&self) -> Target {
        *self.target.read()
    }

    /// Replace the target, returning the previous one
    pub fn set_target(&self, target: Target) -> Target {
        let mut guard = self.target.write();
        let previous = std::mem::replace(&mut *guard, target);
        debug!(
            "Target updated: {} -> {} leading zero bits",
            previous.leading_zero_bits(),
            target.leading_zero_bits()
        );
        previous
    }
}

impl Default for DifficultyOracle {
    fn default() -> Self {
        Self::new(Target::max())
    }
}

impl From<Target> for DifficultyOracle {
    fn from(target: Target) -> Self {
        Self::new(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oracle_accepts_by_target() {
        let oracle = DifficultyOracle::new(Target::from_leading_zeros(8).unwrap());

        let mut low = [0xFFu8; 32];
        low[0] = 0x00;
        assert!(oracle.accepts(&Digest::from_bytes(low)));

        let mut high = [0u8; 32];
        high[0] = 0x01;
        assert!(!oracle.accepts(&Digest::from_bytes(high)));
    }

    #[test]
    fn test_set_target_replaces() {
        let oracle = DifficultyOracle::default();
        let digest = Digest::from_bytes([0x80; 32]);
        assert!(oracle.accepts(&digest));

        let previous = oracle.set_target(Target::zero());
        assert_eq!(previous, Target::max());
        assert_eq!(oracle.target(), Target::zero());
        assert!(!oracle.accepts(&digest));
    }

    #[test]
    fn test_oracle_shared_between_threads() {
        let oracle = std::sync::Arc::new(DifficultyOracle::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let oracle = oracle.clone();
                std::thread::spawn(move || oracle.accepts(&Digest::from_bytes([0xAB; 32])))
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
