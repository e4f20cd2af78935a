//! Configuration file loading

use assert_matches::assert_matches;
use clap::Parser;
use plutonium::config::{Cli, Config, LogLevel, TargetSpec};
use plutonium::{Error, HashAlgorithm, SearchMode};
use std::io::Write;
use std::time::Duration;
use tempfile::Builder;

fn write_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

#[tokio::test]
async fn test_load_yaml() {
    let file = write_config(
        ".yaml",
        r#"
algorithm: blake2b
target: "bits:12"
engine:
  threads: 4
  mode: first-found
session:
  target_period: 2s
logging:
  level: debug
"#,
    );

    let config = Config::from_file(file.path()).await.unwrap();
    assert_eq!(config.algorithm, HashAlgorithm::Blake2b);
    assert_eq!(config.target, TargetSpec::LeadingZeros(12));
    assert_eq!(config.engine.threads, 4);
    assert_eq!(config.engine.mode, SearchMode::FirstFound);
    assert_eq!(config.session.target_period, Duration::from_secs(2));
    assert_eq!(config.logging.level, LogLevel::Debug);
}

#[tokio::test]
async fn test_load_json() {
    let file = write_config(
        ".json",
        r#"{"algorithm": "argon2d", "target": "compact:0x1f00ffff", "max_attempts": 5000}"#,
    );

    let config = Config::from_file(file.path()).await.unwrap();
    assert_eq!(config.algorithm, HashAlgorithm::Argon2d);
    assert_eq!(config.target, TargetSpec::Compact(0x1f00ffff));
    assert_eq!(config.max_attempts, 5000);
    assert!(config.validate().is_ok());
}

#[tokio::test]
async fn test_load_toml() {
    let file = write_config(
        ".toml",
        r#"
target = "difficulty:1000"

[engine]
threads = 2
batch_size = 500

[session]
retarget = false
tolerance = 0.1
"#,
    );

    let config = Config::from_file(file.path()).await.unwrap();
    assert_eq!(config.target, TargetSpec::Difficulty(1000.0));
    assert_eq!(config.engine.batch_size, 500);
    assert!(!config.session.retarget);
    assert_eq!(config.session.tolerance, 0.1);
}

#[tokio::test]
async fn test_cli_takes_precedence_over_file() {
    let file = write_config(".yml", "algorithm: blake2b\ntarget: \"bits:12\"\n");
    let path = file.path().to_str().unwrap().to_string();

    let cli = Cli::try_parse_from([
        "plutonium",
        "--config",
        path.as_str(),
        "--algorithm",
        "blake2s",
        "mine",
        "--data",
        "hello",
    ])
    .unwrap();

    let config = Config::load(&cli).await.unwrap();
    assert_eq!(config.algorithm, HashAlgorithm::Blake2s);
    assert_eq!(config.target, TargetSpec::LeadingZeros(12));
}

#[tokio::test]
async fn test_out_of_range_target_rejected_on_load() {
    let file = write_config(".yaml", "target: \"pow2:257\"\n");
    let cli = Cli::try_parse_from([
        "plutonium",
        "--config",
        file.path().to_str().unwrap(),
        "test",
    ])
    .unwrap();

    let err = Config::load(&cli).await.unwrap_err();
    assert!(err.is_configuration());
}

#[tokio::test]
async fn test_malformed_files() {
    let file = write_config(".yaml", "engine: [not, a, map]\n");
    let err = Config::from_file(file.path()).await.unwrap_err();
    assert_matches!(err, Error::Yaml(_));
    assert!(err.is_configuration());

    let file = write_config(".toml", "engine = 3\n");
    assert_matches!(Config::from_file(file.path()).await, Err(Error::Toml(_)));

    let file = write_config(".json", "{\"engine\": ");
    let err = Config::from_file(file.path()).await.unwrap_err();
    assert_matches!(err, Error::Json(_));
    assert!(err.is_configuration());

    let file = write_config(".conf", "whatever");
    assert_matches!(Config::from_file(file.path()).await, Err(Error::Config(_)));
}

#[tokio::test]
async fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.yaml");
    assert_matches!(Config::from_file(&path).await, Err(Error::Io(_)));
}

#[test]
fn test_loaded_config_builds_engine() {
    let config = Config {
        target: TargetSpec::LeadingZeros(4),
        ..Config::default()
    };
    let engine = config.build_engine().unwrap();
    assert!(engine.mine(b"configured", 10_000).unwrap().is_found());
}
