//! Configuration management for the miner
//!
//! Settings come from an optional configuration file (YAML, JSON or TOML,
//! chosen by extension) overridden by command line flags and environment
//! variables. Everything is validated before any hashing starts.

use crate::core::{DifficultyOracle, HashAlgorithm, Hasher, Target};
use crate::engine::{EngineConfig, MiningEngine, SearchMode};
use crate::error::{Error, Result};
use crate::session::SessionConfig;
use crate::utils::logging::LogFormat;
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

/// How a target is written in configuration.
///
/// | form                  | meaning                                   |
/// |-----------------------|-------------------------------------------|
/// | `<64 hex chars>`      | big-endian target value                   |
/// | `bits:N`              | at least `N` leading zero bits            |
/// | `pow2:K`              | digest value below `2^K`                  |
/// | `compact:0x1d00ffff`  | compact (nBits) encoding                  |
/// | `difficulty:D`        | maximum target divided by `D`             |
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetSpec {
    Hex(Target),
    LeadingZeros(u32),
    PowerOfTwo(u32),
    Compact(u32),
    Difficulty(f64),
}

impl TargetSpec {
    /// Resolve to a concrete target
    pub fn resolve(&self) -> Result<Target> {
        match *self {
            TargetSpec::Hex(target) => Ok(target),
            TargetSpec::LeadingZeros(bits) => Target::from_leading_zeros(bits),
            TargetSpec::PowerOfTwo(exponent) => Target::below_power_of_two(exponent),
            TargetSpec::Compact(compact) => Target::from_compact(compact),
            TargetSpec::Difficulty(difficulty) => Target::from_difficulty(difficulty),
        }
    }
}

impl Default for TargetSpec {
    fn default() -> Self {
        TargetSpec::LeadingZeros(16)
    }
}

impl FromStr for TargetSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let Some((kind, value)) = s.split_once(':') else {
            return Target::from_hex(s).map(TargetSpec::Hex);
        };

        let invalid = |e: &dyn fmt::Display| Error::invalid_target(format!("Invalid target '{}': {}", s, e));

        match kind {
            "hex" => Target::from_hex(value).map(TargetSpec::Hex),
            "bits" => value.parse().map(TargetSpec::LeadingZeros).map_err(|e| invalid(&e)),
            "pow2" => value.parse().map(TargetSpec::PowerOfTwo).map_err(|e| invalid(&e)),
            "compact" => {
                let digits = value.trim_start_matches("0x").trim_start_matches("0X");
                u32::from_str_radix(digits, 16)
                    .map(TargetSpec::Compact)
                    .map_err(|e| invalid(&e))
            }
            "difficulty" => value.parse().map(TargetSpec::Difficulty).map_err(|e| invalid(&e)),
            other => Err(Error::invalid_target(format!("Unknown target form: {}", other))),
        }
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetSpec::Hex(target) => write!(f, "{}", target),
            TargetSpec::LeadingZeros(bits) => write!(f, "bits:{}", bits),
            TargetSpec::PowerOfTwo(exponent) => write!(f, "pow2:{}", exponent),
            TargetSpec::Compact(compact) => write!(f, "compact:{:#010x}", compact),
            TargetSpec::Difficulty(difficulty) => write!(f, "difficulty:{}", difficulty),
        }
    }
}

impl Serialize for TargetSpec {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TargetSpec {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "plutonium",
    version = env!("CARGO_PKG_VERSION"),
    about = "Deterministic proof-of-work miner and verifier"
)]
pub struct Cli {
    /// Configuration file path (YAML, JSON or TOML)
    #[arg(short, long, value_name = "FILE", global = true, env = "PLUTONIUM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Hash algorithm
    #[arg(short, long, value_enum, global = true, env = "PLUTONIUM_ALGORITHM")]
    pub algorithm: Option<HashAlgorithm>,

    /// Mining target (hex, bits:N, pow2:K, compact:0x.., difficulty:D)
    #[arg(short, long, global = true, env = "PLUTONIUM_TARGET")]
    pub target: Option<TargetSpec>,

    /// Number of worker threads (0 = all cores)
    #[arg(short = 'j', long, global = true, env = "PLUTONIUM_THREADS")]
    pub threads: Option<usize>,

    /// Result policy for concurrent workers
    #[arg(long, value_enum, global = true)]
    pub mode: Option<SearchMode>,

    /// Log level
    #[arg(short, long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Log format
    #[arg(long, value_enum, global = true)]
    pub log_format: Option<LogFormat>,

    /// Print the parsed configuration and exit
    #[arg(long, global = true)]
    pub print_config: bool,

    /// Nothing to run is only valid together with `--print-config`
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Search for a nonce whose digest meets the target
    Mine {
        /// Data to mine (`hex:` prefix for raw bytes)
        #[arg(short, long)]
        data: String,

        /// Number of nonces to try
        #[arg(short = 'n', long)]
        max_attempts: Option<u64>,

        /// First nonce to try
        #[arg(long, default_value = "0")]
        start: u64,
    },

    /// Check a claimed solution
    Verify {
        /// Data that was mined (`hex:` prefix for raw bytes)
        #[arg(short, long)]
        data: String,

        /// Claimed nonce
        #[arg(short, long)]
        nonce: u64,

        /// Claimed digest as 64 hex characters
        #[arg(long)]
        digest: String,
    },

    /// Mine several rounds, retargeting between them
    Run {
        /// Number of rounds
        #[arg(short, long, default_value = "10")]
        rounds: u64,

        /// Payload salted with the round number (`hex:` prefix for raw bytes)
        #[arg(short, long, default_value = "plutonium")]
        payload: String,

        /// Desired time per round, e.g. `2s` or `500ms`
        #[arg(long)]
        target_period: Option<humantime::Duration>,

        /// Keep the target fixed
        #[arg(long)]
        no_retarget: bool,

        /// Print the report as JSON instead of YAML
        #[arg(long)]
        json: bool,
    },

    /// Self-check, prints `Test 1` on success
    Test,

    /// Mine the default payload, prints `Miner <record>`
    Miner,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default)]
    pub level: LogLevel,

    /// Log format (plain, pretty, json)
    #[serde(default)]
    pub format: LogFormat,
}

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Hash algorithm
    #[serde(default)]
    pub algorithm: HashAlgorithm,

    /// Mining target
    #[serde(default)]
    pub target: TargetSpec,

    /// Nonces tried by a single `mine`
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u64,

    /// Engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Session settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_max_attempts() -> u64 {
    10_000_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            target: TargetSpec::default(),
            max_attempts: default_max_attempts(),
            engine: EngineConfig::default(),
            session: SessionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration file formats, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    /// Format for a path's extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("json") => Ok(ConfigFormat::Json),
            Some("toml") => Ok(ConfigFormat::Toml),
            other => Err(Error::config(format!(
                "Unsupported configuration file extension: {:?}",
                other.unwrap_or("")
            ))),
        }
    }
}

impl Config {
    /// Build the configuration from the command line and optional file
    pub async fn load(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path).await?,
            None => Self::default(),
        };

        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        let format = ConfigFormat::from_path(path)?;
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content, format)
    }

    /// Parse configuration text
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        let config: Self = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
            ConfigFormat::Toml => toml::from_str(content)?,
        };
        Ok(config)
    }

    /// Override file values with the flags given on the command line
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(algorithm) = cli.algorithm {
            self.algorithm = algorithm;
        }
        if let Some(target) = cli.target {
            self.target = target;
        }
        if let Some(threads) = cli.threads {
            self.engine.threads = threads;
        }
        if let Some(mode) = cli.mode {
            self.engine.mode = mode;
        }
        if let Some(level) = cli.log_level {
            self.logging.level = level;
        }
        if let Some(format) = cli.log_format {
            self.logging.format = format;
        }

        match &cli.command {
            Some(Command::Mine {
                max_attempts: Some(max_attempts),
                ..
            }) => self.max_attempts = *max_attempts,
            Some(Command::Run {
                target_period,
                no_retarget,
                ..
            }) => {
                if let Some(period) = target_period {
                    self.session.target_period = (*period).into();
                }
                if *no_retarget {
                    self.session.retarget = false;
                }
            }
            _ => {}
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.target.resolve()?;

        if self.max_attempts == 0 {
            return Err(Error::config("max_attempts must be greater than 0"));
        }

        self.engine.validate()?;
        self.session.validate()?;
        Ok(())
    }

    /// Resolved mining target
    pub fn target(&self) -> Result<Target> {
        self.target.resolve()
    }

    /// Hasher for the configured algorithm
    pub fn hasher(&self) -> Result<Hasher> {
        Hasher::new(self.algorithm)
    }

    /// Engine built from this configuration
    pub fn build_engine(&self) -> Result<MiningEngine> {
        MiningEngine::new(
            Arc::new(self.hasher()?),
            Arc::new(DifficultyOracle::new(self.target()?)),
            self.engine.clone(),
        )
    }
}
