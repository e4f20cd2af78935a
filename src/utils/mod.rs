//! Utility functions and helpers

pub mod logging;

use crate::error::{Error, Result};

/// Prefix marking hex-encoded input on the command line
pub const HEX_PREFIX: &str = "hex:";

/// Format hash rate as a human-readable string
pub fn format_hash_rate(hashes_per_sec: f64) -> String {
    const UNITS: &[&str] = &["H/s", "KH/s", "MH/s", "GH/s", "TH/s", "PH/s"];
    let mut rate = hashes_per_sec;
    let mut unit_index = 0;

    while rate >= 1000.0 && unit_index < UNITS.len() - 1 {
        rate /= 1000.0;
        unit_index += 1;
    }

    format!("{:.2} {}", rate, UNITS[unit_index])
}

/// Decode payload input: `hex:`-prefixed strings are hex, anything else is taken as UTF-8 bytes
pub fn parse_payload(input: &str) -> Result<Vec<u8>> {
    match input.strip_prefix(HEX_PREFIX) {
        Some(hex) => hex::decode(hex)
            .map_err(|e| Error::invalid_input(format!("Invalid hex payload: {}", e))),
        None => Ok(input.as_bytes().to_vec()),
    }
}

/// Serde adapter writing durations the way `humantime` prints them (`1m 30s`)
pub mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
