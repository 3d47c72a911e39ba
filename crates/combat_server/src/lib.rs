//! # Zone Combat Server
//!
//! Headless host for one combat zone.
//!
//! Loads a scenario, runs the zone tick on a dedicated thread and hands
//! damage resolution to a tokio runtime. Faulted damage workers stop the
//! zone.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod zone;

use std::path::{Path, PathBuf};
use std::time::Duration;

use combat_core::data::ScenarioData;
use combat_core::error::CombatError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Server-level errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The server config did not parse.
    #[error("Invalid server config {}: {message}", path.display())]
    Config {
        /// Config file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// No scenario was given on the command line or in the config.
    #[error("No scenario configured")]
    NoScenario,

    /// The async runtime could not be built.
    #[error("Failed to start runtime: {0}")]
    Runtime(std::io::Error),

    /// Combat core error.
    #[error(transparent)]
    Combat(#[from] CombatError),
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Server configuration.
///
/// # Example RON
///
/// ```ron
/// ServerConfig(
///     tick_rate: 20,
///     worker_threads: 4,
///     scenario: Some("assets/scenarios/skirmish.ron"),
///     max_ticks: Some(600),
///     realtime: true,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Zone ticks per second.
    pub tick_rate: u32,
    /// Threads of the damage worker runtime.
    pub worker_threads: usize,
    /// Scenario to load when none is given on the command line.
    pub scenario: Option<PathBuf>,
    /// Stop after this many ticks; run until the fight is over otherwise.
    pub max_ticks: Option<u64>,
    /// Sleep between ticks to hold the tick rate.
    pub realtime: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate: 20,
            worker_threads: 2,
            scenario: None,
            max_ticks: None,
            realtime: true,
        }
    }
}

impl ServerConfig {
    /// Length of one zone tick.
    #[must_use]
    pub fn tick_length(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate.max(1)
    }
}

/// Load a server config from a RON file.
pub fn load_config(path: &Path) -> Result<ServerConfig> {
    let text = read(path)?;
    ron::from_str(&text).map_err(|e| ServerError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load and validate a scenario file.
pub fn load_scenario(path: &Path) -> Result<ScenarioData> {
    let text = read(path)?;
    let scenario = ScenarioData::from_ron_str(&path.display().to_string(), &text)?;
    scenario.validate()?;
    tracing::info!(
        name = %scenario.name,
        units = scenario.units.len(),
        engagements = scenario.engagements.len(),
        "Scenario loaded"
    );
    Ok(scenario)
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| ServerError::Io {
        path: path.to_path_buf(),
        source,
    })
}
