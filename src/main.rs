//! Plutonium - command line front end
//!
//! Mining runs on the engine's worker pool inside `spawn_blocking`; Ctrl-C
//! cancels the running search through a shared token.

use anyhow::Context;
use clap::{CommandFactory, Parser};
use plutonium::{
    binding,
    config::{Cli, Command, Config},
    utils::{format_hash_rate, logging::init_logging, parse_payload},
    Digest, MiningEngine, MiningResult, MiningSession, Nonce, Verifier, APP_NAME, APP_VERSION,
};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::load(&cli)
        .await
        .context("Failed to load configuration")?;

    init_logging(&config.logging.level.to_string(), config.logging.format);

    if cli.print_config {
        print_configuration(&config)?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command.clone() else {
        Cli::command().print_help()?;
        return Ok(ExitCode::FAILURE);
    };

    info!("Starting {} v{}", APP_NAME, APP_VERSION);

    let engine = Arc::new(config.build_engine().context("Failed to build mining engine")?);
    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    match command {
        Command::Mine { data, start, .. } => {
            let data = parse_payload(&data)?;
            let max_attempts = config.max_attempts;
            let token = cancel.clone();
            let worker = engine.clone();

            let outcome = tokio::task::spawn_blocking(move || {
                worker.search(&data, Nonce::new(start), max_attempts, Some(&token))
            })
            .await??;

            match outcome.result {
                MiningResult::Found { nonce, digest } => {
                    println!("Found nonce {} digest {}", nonce, digest);
                }
                MiningResult::Exhausted => {
                    println!("Exhausted after {} attempts", outcome.attempts);
                }
            }
            println!(
                "{} attempts in {} ({})",
                outcome.attempts,
                humantime::format_duration(outcome.elapsed),
                format_hash_rate(outcome.hash_rate().0)
            );
            Ok(ExitCode::SUCCESS)
        }

        Command::Verify {
            data,
            nonce,
            digest,
        } => {
            let data = parse_payload(&data)?;
            let claimed = Digest::from_hex(&digest)?;
            let verifier = Verifier::new(engine.hasher().clone(), engine.oracle().clone());

            let verdict = verifier.check(&data, Nonce::new(nonce), &claimed);
            println!("{}", verdict);
            Ok(if verdict.is_valid() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }

        Command::Run {
            rounds,
            payload,
            json,
            ..
        } => {
            let payload = parse_payload(&payload)?;
            let session = MiningSession::new(engine.clone(), config.session.clone())?
                .with_cancellation(cancel.clone());

            let report = tokio::task::spawn_blocking(move || session.run(&payload, rounds)).await??;
            if report.cancelled {
                warn!("Session cancelled after {} rounds", report.rounds.len());
            }
            info!(
                "{} of {} rounds solved, {}",
                report.solutions(),
                report.rounds_requested,
                format_hash_rate(report.hash_rate().0)
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", serde_yaml::to_string(&report)?);
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Test => {
            let passed = blocking(engine, binding::test_with).await?;
            println!("Test {}", i32::from(passed));
            Ok(ExitCode::SUCCESS)
        }

        Command::Miner => {
            let max_attempts = config.max_attempts;
            let record = blocking(engine, move |engine| {
                binding::miner_with(engine, binding::DEFAULT_PAYLOAD, max_attempts)
            })
            .await?;
            println!("Miner {}", serde_json::to_string(&record)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Run an engine call off the async runtime
async fn blocking<T, F>(engine: Arc<MiningEngine>, f: F) -> anyhow::Result<T>
where
    T: Send + 'static,
    F: FnOnce(&MiningEngine) -> plutonium::Result<T> + Send + 'static,
{
    Ok(tokio::task::spawn_blocking(move || f(&engine)).await??)
}

/// Cancel `token` on Ctrl-C
fn spawn_interrupt_handler(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping workers");
            token.cancel();
        }
    });
}

/// Print current configuration
fn print_configuration(config: &Config) -> anyhow::Result<()> {
    let config_yaml = serde_yaml::to_string(config)?;
    println!("{}", config_yaml);
    Ok(())
}
