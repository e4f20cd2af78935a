//! Target type for mining difficulty
//!
//! A target is a 256-bit unsigned integer stored big-endian. A digest is
//! accepted when its value is less than or equal to the target, so a larger
//! target is an easier one.

use crate::core::constants::{DIGEST_SIZE, TARGET_BITS};
use crate::core::Digest;
use crate::error::{Error, Result};
use num_bigint::BigUint;
use num_traits::{FromPrimitive, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed-point scale used when dividing the maximum target by a fractional difficulty
const DIFFICULTY_SCALE_BITS: usize = 32;

/// Mantissa bit that would read as a sign flag in the compact encoding
const COMPACT_SIGN_BIT: u32 = 0x0080_0000;

/// Represents a 256-bit mining target (difficulty threshold)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Target(pub [u8; DIGEST_SIZE]);

impl Target {
    /// Create a new Target from big-endian bytes
    pub const fn from_bytes(bytes: [u8; DIGEST_SIZE]) -> Self {
        Self(bytes)
    }

    /// Easiest possible target, 2^256 - 1. Every digest meets it.
    pub const fn max() -> Self {
        Self([0xFF; DIGEST_SIZE])
    }

    /// Hardest possible target. Only the all-zero digest meets it.
    pub const fn zero() -> Self {
        Self([0; DIGEST_SIZE])
    }

    /// Get the target as bytes
    pub fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
        &self.0
    }

    /// Create a Target from a hex string
    pub fn from_hex(hex: &str) -> Result<Self> {
        let bytes = hex::decode(hex.trim())
            .map_err(|e| Error::invalid_target(format!("Invalid hex: {}", e)))?;

        if bytes.len() != DIGEST_SIZE {
            return Err(Error::invalid_target(format!(
                "Expected {} bytes, got {}",
                DIGEST_SIZE,
                bytes.len()
            )));
        }

        let mut array = [0u8; DIGEST_SIZE];
        array.copy_from_slice(&bytes);
        Ok(Self(array))
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Check whether a digest satisfies this target (`value(digest) <= target`)
    pub fn accepts(&self, digest: &Digest) -> bool {
        // Byte-wise lexicographic order equals big-endian numeric order
        digest.as_bytes() <= &self.0
    }

    /// Target accepting exactly the digests with `value < 2^exponent`
    pub fn below_power_of_two(exponent: u32) -> Result<Self> {
        if exponent > TARGET_BITS {
            return Err(Error::invalid_target(format!(
                "Exponent {} exceeds the {}-bit digest range",
                exponent, TARGET_BITS
            )));
        }

        let mut bytes = [0u8; DIGEST_SIZE];
        let full_bytes = (exponent / 8) as usize;
        let remaining_bits = exponent % 8;

        for byte in bytes.iter_mut().rev().take(full_bytes) {
            *byte = 0xFF;
        }

        if full_bytes < DIGEST_SIZE && remaining_bits > 0 {
            bytes[DIGEST_SIZE - 1 - full_bytes] = (1u8 << remaining_bits) - 1;
        }

        Ok(Self(bytes))
    }

    /// Create a target requiring at least `leading_zeros` leading zero bits
    pub fn from_leading_zeros(leading_zeros: u32) -> Result<Self> {
        if leading_zeros > TARGET_BITS {
            return Err(Error::invalid_target(format!(
                "Cannot require {} leading zero bits of a {}-bit digest",
                leading_zeros, TARGET_BITS
            )));
        }
        Self::below_power_of_two(TARGET_BITS - leading_zeros)
    }

    /// Number of leading zero bits of the target value (difficulty level)
    pub fn leading_zero_bits(&self) -> u32 {
        Digest::from_bytes(self.0).leading_zero_bits()
    }

    /// Decode a compact ("nBits") target: `mantissa * 256^(exponent - 3)`
    pub fn from_compact(compact: u32) -> Result<Self> {
        let exponent = (compact >> 24) as usize;
        let mantissa = compact & 0x00FF_FFFF;
        let mut bytes = [0u8; DIGEST_SIZE];

        if exponent <= 3 {
            let value = mantissa >> (8 * (3 - exponent));
            bytes[DIGEST_SIZE - 4..].copy_from_slice(&value.to_be_bytes());
            return Ok(Self(bytes));
        }

        let shift = exponent - 3;
        for i in 0..3 {
            let byte = ((mantissa >> (8 * i)) & 0xFF) as u8;
            if byte == 0 {
                continue;
            }

            let position = shift + i;
            if position >= DIGEST_SIZE {
                return Err(Error::invalid_target(format!(
                    "Compact target {:#010x} overflows {} bits",
                    compact, TARGET_BITS
                )));
            }
            bytes[DIGEST_SIZE - 1 - position] = byte;
        }

        Ok(Self(bytes))
    }

    /// Encode as a compact target. Lossy: the low-order bytes are truncated,
    /// so `Target::from_compact(t.to_compact()) <= t`.
    pub fn to_compact(&self) -> u32 {
        let size = match self.0.iter().position(|&b| b != 0) {
            Some(first) => DIGEST_SIZE - first,
            None => return 0,
        };

        let mut mantissa = if size <= 3 {
            let low = u32::from_be_bytes([0, self.0[29], self.0[30], self.0[31]]);
            low << (8 * (3 - size))
        } else {
            let start = DIGEST_SIZE - size;
            u32::from_be_bytes([0, self.0[start], self.0[start + 1], self.0[start + 2]])
        };

        let mut size = size as u32;
        if mantissa & COMPACT_SIGN_BIT != 0 {
            mantissa >>= 8;
            size += 1;
        }

        (size << 24) | mantissa
    }

    /// Target for a difficulty relative to the maximum target: `floor(MAX / difficulty)`
    pub fn from_difficulty(difficulty: f64) -> Result<Self> {
        if !difficulty.is_finite() || difficulty < 1.0 {
            return Err(Error::invalid_target(format!(
                "Difficulty must be a finite number >= 1, got {}",
                difficulty
            )));
        }

        let scaled = difficulty * (1u64 << DIFFICULTY_SCALE_BITS) as f64;
        let denominator = BigUint::from_f64(scaled)
            .ok_or_else(|| Error::invalid_target(format!("Unrepresentable difficulty {}", difficulty)))?;

        let value = (Self::max().to_biguint() << DIFFICULTY_SCALE_BITS) / denominator;
        Self::from_biguint(&value)
    }

    /// Difficulty of this target relative to the maximum target
    pub fn to_difficulty(&self) -> f64 {
        let value = self.to_biguint();
        if value.is_zero() {
            return f64::MAX;
        }

        let max = Self::max().to_biguint().to_f64().unwrap_or(f64::MAX);
        let value = value.to_f64().unwrap_or(f64::MAX);
        max / value
    }

    fn to_biguint(self) -> BigUint {
        BigUint::from_bytes_be(&self.0)
    }

    fn from_biguint(value: &BigUint) -> Result<Self> {
        if value.bits() > u64::from(TARGET_BITS) {
            return Err(Error::invalid_target("Value exceeds 256 bits"));
        }

        let bytes = value.to_bytes_be();
        let mut target = [0u8; DIGEST_SIZE];
        target[DIGEST_SIZE - bytes.len()..].copy_from_slice(&bytes);
        Ok(Self(target))
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Target {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Target {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_hex_conversion() {
        let hex = "0000000000000000000000000000000000000000000000000000000000000001";
        let target = Target::from_hex(hex).unwrap();
        assert_eq!(target.to_hex(), hex);
    }

    #[test]
    fn test_invalid_target_hex() {
        assert!(Target::from_hex("invalid").is_err());
        assert!(Target::from_hex("00").is_err());
        assert!(Target::from_hex(&"00".repeat(33)).is_err());
    }

    #[test]
    fn test_accepts_is_inclusive() {
        let target = Target::from_hex("00000fff00000000000000000000000000000000000000000000000000000000").unwrap();

        assert!(target.accepts(&Digest::from_bytes(target.0)));
        assert!(target.accepts(&Digest::from_bytes([0u8; 32])));

        let mut above = target.0;
        above[31] = 1;
        assert!(!target.accepts(&Digest::from_bytes(above)));
    }

    #[test]
    fn test_extreme_targets() {
        assert!(Target::max().accepts(&Digest::from_bytes([0xFF; 32])));
        assert!(Target::zero().accepts(&Digest::from_bytes([0; 32])));

        let mut one = [0u8; 32];
        one[31] = 1;
        assert!(!Target::zero().accepts(&Digest::from_bytes(one)));
    }

    #[test]
    fn test_below_power_of_two() {
        assert_eq!(Target::below_power_of_two(0).unwrap(), Target::zero());
        assert_eq!(Target::below_power_of_two(256).unwrap(), Target::max());

        let target = Target::below_power_of_two(250).unwrap();
        assert_eq!(target.0[0], 0x03);
        assert!(target.0[1..].iter().all(|&b| b == 0xFF));

        let target = Target::below_power_of_two(12).unwrap();
        assert_eq!(target.0[30], 0x0F);
        assert_eq!(target.0[31], 0xFF);
        assert!(target.0[..30].iter().all(|&b| b == 0));

        assert!(Target::below_power_of_two(257).is_err());
    }

    #[test]
    fn test_from_leading_zeros() {
        let target = Target::from_leading_zeros(12).unwrap();
        assert_eq!(target.0[0], 0x00);
        assert_eq!(target.0[1], 0x0F);
        assert_eq!(target.0[2], 0xFF);
        assert_eq!(target.leading_zero_bits(), 12);

        assert_eq!(Target::from_leading_zeros(0).unwrap(), Target::max());
        assert_eq!(Target::from_leading_zeros(256).unwrap(), Target::zero());
        assert!(Target::from_leading_zeros(257).is_err());
    }

    #[test]
    fn test_compact_known_vectors() {
        let target = Target::from_compact(0x1d00ffff).unwrap();
        assert_eq!(
            target.to_hex(),
            "00000000ffff0000000000000000000000000000000000000000000000000000"
        );
        assert_eq!(target.to_compact(), 0x1d00ffff);

        let target = Target::from_compact(0x1f00ffff).unwrap();
        assert_eq!(
            target.to_hex(),
            "0000ffff00000000000000000000000000000000000000000000000000000000"
        );
        assert_eq!(target.to_compact(), 0x1f00ffff);
    }

    #[test]
    fn test_compact_small_exponents() {
        let target = Target::from_compact(0x0112_3456).unwrap();
        assert_eq!(target.0[31], 0x12);
        assert!(target.0[..31].iter().all(|&b| b == 0));

        assert_eq!(Target::from_compact(0).unwrap(), Target::zero());
        assert_eq!(Target::zero().to_compact(), 0);
    }

    #[test]
    fn test_compact_sign_bit_normalisation() {
        let mut bytes = [0u8; 32];
        bytes[31] = 0x80;
        let target = Target::from_bytes(bytes);

        let compact = target.to_compact();
        assert_eq!(compact & COMPACT_SIGN_BIT, 0);
        assert_eq!(Target::from_compact(compact).unwrap(), target);
    }

    #[test]
    fn test_compact_overflow() {
        assert!(Target::from_compact(0x2101_0000).is_err());
        assert!(Target::from_compact(0xff00_ffff).is_err());
        // Max target encodes into exponent 33 without overflowing
        let compact = Target::max().to_compact();
        assert!(Target::from_compact(compact).unwrap() <= Target::max());
    }

    #[test]
    fn test_difficulty_conversion() {
        assert_eq!(Target::from_difficulty(1.0).unwrap(), Target::max());

        let half = Target::from_difficulty(2.0).unwrap();
        assert_eq!(half.0[0], 0x7F);
        assert!((half.to_difficulty() - 2.0).abs() < 1e-9);

        let hard = Target::from_difficulty(65536.0).unwrap();
        assert_eq!(hard.leading_zero_bits(), 16);
        assert_eq!(Target::zero().to_difficulty(), f64::MAX);
    }

    #[test]
    fn test_invalid_difficulty() {
        assert!(Target::from_difficulty(0.0).is_err());
        assert!(Target::from_difficulty(0.5).is_err());
        assert!(Target::from_difficulty(-3.0).is_err());
        assert!(Target::from_difficulty(f64::NAN).is_err());
        assert!(Target::from_difficulty(f64::INFINITY).is_err());
    }

    #[test]
    fn test_target_serde() {
        let hex = "00000000ffff0000000000000000000000000000000000000000000000000000";
        let target = Target::from_hex(hex).unwrap();

        let json = serde_json::to_string(&target).unwrap();
        assert_eq!(json, format!("\"{}\"", hex));

        let deserialized: Target = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, target);
    }
}
