#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that replays recorded games through the fleet commander.

mod replay;

use std::{
    fs::{self, File},
    io::{self, BufReader},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use armada_core::Tuning;
use armada_system_commander::Commander;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Replays recorded snapshots and prints the commands the fleet would send.
#[derive(Debug, Parser)]
#[command(name = "armada", version, about)]
struct Args {
    /// File holding one JSON snapshot per line.
    #[arg(long, value_name = "FILE")]
    replay: PathBuf,
    /// TOML file overriding tuning constants.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Seed for the per-turn random source.
    #[arg(long)]
    seed: Option<u64>,
    /// Soft wall-clock budget per turn, in milliseconds.
    #[arg(long, value_name = "MS")]
    turn_budget_ms: Option<u64>,
    /// Log filter such as `info` or `armada_system_behavior=debug`; overrides `RUST_LOG`.
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,
}

/// Entry point for the Armada command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level.as_deref())?;

    let mut tuning = load_tuning(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        tuning.turn.seed = seed;
    }
    if let Some(budget) = args.turn_budget_ms {
        tuning.turn.budget_ms = budget;
    }

    let file = File::open(&args.replay)
        .with_context(|| format!("could not open replay {}", args.replay.display()))?;
    let mut commander = Commander::new(tuning);
    let stdout = io::stdout();
    let mut output = stdout.lock();
    let summary = replay::replay(BufReader::new(file), &mut commander, &mut output)
        .with_context(|| format!("replay of {} failed", args.replay.display()))?;

    info!(
        turns = summary.turns,
        commands = summary.commands,
        faults = summary.faults,
        "replay finished"
    );
    Ok(())
}

fn init_logging(filter: Option<&str>) -> Result<()> {
    let filter = match filter {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid log filter '{directives}'"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

fn load_tuning(path: Option<&Path>) -> Result<Tuning> {
    let Some(path) = path else {
        return Ok(Tuning::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("could not read config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("could not parse config {}", path.display()))
}
