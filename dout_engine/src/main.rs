//! # dout_sim
//!
//! Replays a scenario file against the output engine on a simulated clock.
//! The engine configuration comes from `--config` or the built-in defaults.

use clap::Parser;
use dout_common::config::{EngineConfig, LogLevel};
use dout_engine::scenario::Scenario;
use std::path::PathBuf;
use std::process;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

/// Digital output engine simulator
#[derive(Parser, Debug)]
#[command(name = "dout_sim")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Replay output-protection scenarios on a simulated clock")]
struct Args {
    /// Scenario TOML to replay.
    scenario: PathBuf,

    /// Engine configuration TOML (default: built-in profiles).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging (DEBUG level, overrides `shared.log_level`).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => EngineConfig::load_validated(path),
        None => Ok(EngineConfig::default()),
    };
    let log_level = config
        .as_ref()
        .map(|c| c.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, log_level);

    info!("dout_sim v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = match config {
        Ok(config) => run(&args, config),
        Err(e) => Err(e.into()),
    };
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }
}

fn run(args: &Args, config: EngineConfig) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = &args.config {
        info!(
            "Engine config {} ({}, variant {:?})",
            path.display(),
            config.shared.service_name,
            config.variant
        );
    }

    let scenario = Scenario::load(&args.scenario)?;
    info!(
        "Scenario {}: {} outputs, {} inputs, {} steps",
        args.scenario.display(),
        scenario.outputs.len(),
        scenario.inputs.len(),
        scenario.steps.len()
    );

    let summary = scenario.run(config)?;
    info!(
        "Sets rejected: {}, resets refused: {}, SPI frames: {}",
        summary.sets_rejected, summary.resets_refused, summary.spi_frames
    );
    for (channel, state) in &summary.final_states {
        info!("Output {channel}: {state:?}");
    }
    Ok(())
}

fn setup_tracing(args: &Args, configured: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        configured.as_tracing_level()
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
