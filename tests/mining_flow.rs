//! Integration tests for the complete mine-then-verify flow

use assert_matches::assert_matches;
use plutonium::{
    binding, DifficultyOracle, EngineConfig, Error, HashAlgorithm, Hasher, MiningEngine,
    MiningResult, Nonce, Target, Verdict, Verifier,
};
use std::sync::Arc;

fn setup(algorithm: HashAlgorithm, target: Target) -> (MiningEngine, Verifier) {
    let hasher = Arc::new(Hasher::new(algorithm).unwrap());
    let oracle = Arc::new(DifficultyOracle::new(target));
    let verifier = Verifier::new(hasher.clone(), oracle.clone());
    let engine = MiningEngine::new(hasher, oracle, EngineConfig::single_threaded()).unwrap();
    (engine, verifier)
}

#[test]
fn test_hello_below_two_pow_250_is_found() {
    let (engine, verifier) = setup(HashAlgorithm::Blake2s, Target::below_power_of_two(250).unwrap());

    let result = engine.mine(b"hello", 100_000).unwrap();
    let (nonce, digest) = match result {
        MiningResult::Found { nonce, digest } => (nonce, digest),
        MiningResult::Exhausted => panic!("expected a solution"),
    };

    assert!(nonce.value() < 100_000);
    assert!(digest.leading_zero_bits() >= 6);
    assert!(verifier.verify(b"hello", nonce, &digest));
}

#[test]
fn test_target_of_one_exhausts() {
    // value < 2^0 only admits the all-zero digest
    let (engine, _) = setup(HashAlgorithm::Blake2s, Target::below_power_of_two(0).unwrap());
    assert_eq!(engine.mine(b"hello", 1000).unwrap(), MiningResult::Exhausted);
    assert_eq!(engine.stats().hashes, 1000);
}

#[test]
fn test_every_algorithm_mines_and_verifies() {
    for algorithm in [HashAlgorithm::Blake2s, HashAlgorithm::Blake2b, HashAlgorithm::Argon2d] {
        let (engine, verifier) = setup(algorithm, Target::from_leading_zeros(3).unwrap());
        let result = engine.mine(b"algorithms", 2_000).unwrap();

        let nonce = result.nonce().unwrap();
        let digest = result.digest().unwrap();
        assert_eq!(verifier.check(b"algorithms", nonce, &digest), Verdict::Valid, "{}", algorithm);
    }
}

#[test]
fn test_tighter_target_never_finds_earlier_nonce() {
    let data = b"monotonic";
    let mut previous = 0u64;

    for bits in [0u32, 2, 4, 6, 8] {
        let (engine, _) = setup(HashAlgorithm::Blake2s, Target::from_leading_zeros(bits).unwrap());
        let nonce = engine.mine(data, 1_000_000).unwrap().nonce().unwrap().value();
        assert!(nonce >= previous, "{} leading zero bits found {} before {}", bits, nonce, previous);
        previous = nonce;
    }
}

#[test]
fn test_verifier_rejects_tampered_claims() {
    let (engine, verifier) = setup(HashAlgorithm::Blake2s, Target::from_leading_zeros(4).unwrap());
    let result = engine.mine(b"tamper", 10_000).unwrap();
    let nonce = result.nonce().unwrap();
    let digest = result.digest().unwrap();

    assert_eq!(verifier.check(b"tamper!", nonce, &digest), Verdict::DigestMismatch);
    assert_eq!(
        verifier.check(b"tamper", Nonce::new(nonce.value() + 1), &digest),
        Verdict::DigestMismatch
    );

    let tighter = Verifier::new(
        Arc::new(Hasher::blake2s()),
        Arc::new(DifficultyOracle::new(Target::zero())),
    );
    assert_eq!(tighter.check(b"tamper", nonce, &digest), Verdict::AboveTarget);
}

#[test]
fn test_invalid_requests_fail_before_hashing() {
    let (engine, _) = setup(HashAlgorithm::Blake2s, Target::max());
    assert_matches!(engine.mine(b"", 100), Err(Error::InvalidInput(_)));
    assert_matches!(engine.mine(b"x", 0), Err(Error::InvalidInput(_)));
    assert_eq!(engine.stats().hashes, 0);
}

#[test]
fn test_binding_entry_points() {
    assert_eq!(binding::test(), 1);

    let record = binding::miner();
    assert!(record.found);
    let verifier = Verifier::new(
        Arc::new(Hasher::default()),
        Arc::new(DifficultyOracle::new(record.target)),
    );
    assert!(verifier.verify(binding::DEFAULT_PAYLOAD, record.nonce.unwrap(), &record.digest.unwrap()));
}
