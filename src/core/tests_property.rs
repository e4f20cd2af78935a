//! Property-based tests for the core mining types

use super::*;
use proptest::prelude::*;

proptest! {
    #[test]
    fn nonce_byte_roundtrip(value in any::<u64>()) {
        let nonce = Nonce::new(value);
        prop_assert_eq!(Nonce::from_le_bytes(nonce.to_le_bytes()), nonce);
    }

    #[test]
    fn target_accepts_matches_numeric_order(
        target in prop::array::uniform32(any::<u8>()),
        digest in prop::array::uniform32(any::<u8>())
    ) {
        let target = Target::from_bytes(target);
        let digest = Digest::from_bytes(digest);
        prop_assert_eq!(target.accepts(&digest), digest.as_bytes() <= target.as_bytes());
        prop_assert!(target.accepts(&Digest::from_bytes(*target.as_bytes())));
    }

    #[test]
    fn compact_encoding_never_loosens(bytes in prop::array::uniform32(any::<u8>())) {
        let target = Target::from_bytes(bytes);
        let decoded = Target::from_compact(target.to_compact()).unwrap();
        prop_assert!(decoded <= target);
        prop_assert_eq!(decoded.to_compact(), target.to_compact());
    }

    #[test]
    fn power_of_two_targets_are_monotonic(k in 0u32..256) {
        let looser = Target::below_power_of_two(k + 1).unwrap();
        let tighter = Target::below_power_of_two(k).unwrap();
        prop_assert!(tighter < looser);
    }

    #[test]
    fn leading_zero_targets_report_their_level(bits in 0u32..=256) {
        let target = Target::from_leading_zeros(bits).unwrap();
        prop_assert_eq!(target.leading_zero_bits(), bits);
    }

    #[test]
    fn difficulty_targets_shrink(d in 1.0f64..1e12) {
        let target = Target::from_difficulty(d).unwrap();
        let harder = Target::from_difficulty(d * 2.0).unwrap();
        prop_assert!(harder <= target);
    }

    #[test]
    fn digest_deterministic(data in prop::collection::vec(any::<u8>(), 1..128), nonce in any::<u64>()) {
        let hasher = Hasher::blake2s();
        prop_assert_eq!(hasher.digest(&data, Nonce::new(nonce)), hasher.digest(&data, Nonce::new(nonce)));
    }

    #[test]
    fn digest_changes_with_nonce(
        data in prop::collection::vec(any::<u8>(), 1..64),
        nonce1 in any::<u64>(),
        nonce2 in any::<u64>()
    ) {
        prop_assume!(nonce1 != nonce2);
        let hasher = Hasher::new(HashAlgorithm::Blake2b).unwrap();
        prop_assert_ne!(hasher.digest(&data, Nonce::new(nonce1)), hasher.digest(&data, Nonce::new(nonce2)));
    }

    #[test]
    fn retarget_stays_in_bounds(
        hash_rate in 0.0f64..1e16,
        period in 0.001f64..1e6,
        current in 1.0f64..1e15
    ) {
        let adjusted = adjust_difficulty(0.25, HashRate::new(hash_rate), Period::new(period), Difficulty::new(current));
        prop_assert!(adjusted.value() >= MIN_DIFFICULTY);
        prop_assert!(adjusted.value() <= MAX_DIFFICULTY);
    }
}
