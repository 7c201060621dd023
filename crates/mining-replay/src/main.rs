use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use feels_liquidity_mining::MiningConfig;
use feels_mining_replay::{Replay, Scenario};

#[derive(Parser, Debug)]
#[command(name = "feels-mining-replay")]
#[command(about = "Replay venue activity through the Feels liquidity mining engine")]
struct Args {
    /// Path to mining configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Path to JSON scenario file
    #[arg(short, long)]
    scenario: String,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if args.verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => MiningConfig::load(path).with_context(|| format!("Failed to load config {}", path))?,
        None => MiningConfig::default(),
    };
    info!(pools = config.pools.len(), "loaded mining configuration");

    let scenario = Scenario::load(&args.scenario)?;
    let mut replay = Replay::new(config)?;
    let report = replay.run(&scenario)?;

    let output = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", output);

    Ok(())
}
