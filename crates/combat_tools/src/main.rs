//! Zone Combat - Development Tools

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "combat-tools")]
#[command(about = "Development tools for Zone Combat")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate scenario files
    Validate {
        /// Scenario file or directory of scenarios
        #[arg(default_value = "assets/scenarios")]
        path: String,
    },
    /// Decode a hex-encoded terrain lock status packet
    Packet {
        /// 24 hex digits; whitespace is ignored
        hex: String,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path } => {
            tracing::info!("Validating scenarios in: {path}");
            match combat_tools::validate::validate_path(std::path::Path::new(&path)) {
                Ok(reports) => {
                    for report in &reports {
                        tracing::info!(
                            name = %report.name,
                            units = report.units,
                            engagements = report.engagements,
                            terrain_locks = report.terrain_locks,
                            "{} ok",
                            report.path.display()
                        );
                    }
                    tracing::info!("Validation passed ({} scenarios)", reports.len());
                }
                Err(e) => {
                    tracing::error!("Validation failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Packet { hex } => match combat_tools::packet::describe_status_hex(&hex) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                tracing::error!("Invalid packet: {e}");
                std::process::exit(1);
            }
        },
    }
}
