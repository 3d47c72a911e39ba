//! Zone Combat - Headless Zone Server

use std::path::PathBuf;
use std::thread;

use clap::Parser;
use combat_server::zone::{Zone, ZoneSummary};
use combat_server::{load_config, load_scenario, Result, ServerConfig, ServerError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "combat-server")]
#[command(about = "Run one combat zone headless")]
struct Cli {
    /// Server config (RON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scenario to load; overrides the config
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Stop after this many ticks; overrides the config
    #[arg(long)]
    ticks: Option<u64>,

    /// Run as fast as possible instead of holding the tick rate
    #[arg(long)]
    fast: bool,
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Zone Combat server");

    match run(Cli::parse()) {
        Ok(summary) => tracing::info!(
            ticks = summary.ticks,
            kills = ?summary.kills,
            survivors = ?summary.survivors,
            "Server finished"
        ),
        Err(e) => {
            tracing::error!("Server failed: {e}");
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<ZoneSummary> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if cli.scenario.is_some() {
        config.scenario = cli.scenario;
    }
    if cli.ticks.is_some() {
        config.max_ticks = cli.ticks;
    }
    if cli.fast {
        config.realtime = false;
    }

    let scenario_path = config.scenario.clone().ok_or(ServerError::NoScenario)?;
    let scenario = load_scenario(&scenario_path)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads.max(1))
        .thread_name("damage-worker")
        .build()
        .map_err(ServerError::Runtime)?;
    let mut zone = Zone::from_scenario(&scenario, runtime.handle().clone())?;

    tracing::info!(
        zone = zone.name(),
        tick_rate = config.tick_rate,
        workers = config.worker_threads,
        "Zone ready"
    );

    // The zone thread blocks on the runtime to reap workers, so it must not
    // be one of the runtime's own threads.
    let tick_length = config.tick_length();
    let zone_thread = thread::Builder::new()
        .name("zone-tick".to_string())
        .spawn(move || zone.run(tick_length, config.max_ticks, config.realtime))
        .map_err(ServerError::Runtime)?;

    let summary = zone_thread.join().unwrap_or_else(|panic| {
        tracing::error!("Zone thread panicked");
        std::panic::resume_unwind(panic)
    })?;
    Ok(summary)
}
