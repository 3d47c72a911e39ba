//! Scenario validation utilities.

use std::path::{Path, PathBuf};

use combat_core::data::ScenarioData;
use combat_core::error::{CombatError, Result};

/// Summary of one valid scenario file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioReport {
    /// File that was checked.
    pub path: PathBuf,
    /// Scenario name.
    pub name: String,
    /// Number of units.
    pub units: usize,
    /// Number of engagements.
    pub engagements: usize,
    /// Number of terrain locks.
    pub terrain_locks: usize,
}

/// Parse and validate one scenario file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, does not parse, or fails
/// validation.
pub fn validate_scenario_file(path: &Path) -> Result<ScenarioReport> {
    let label = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|e| CombatError::DataParseError {
        path: label.clone(),
        message: e.to_string(),
    })?;

    let scenario = ScenarioData::from_ron_str(&label, &text)?;
    scenario.validate()?;

    Ok(ScenarioReport {
        path: path.to_path_buf(),
        name: scenario.name,
        units: scenario.units.len(),
        engagements: scenario.engagements.len(),
        terrain_locks: scenario.terrain_locks.len(),
    })
}

/// Validate every `.ron` file directly inside `dir`, in name order.
///
/// # Errors
///
/// Returns the first failure.
pub fn validate_scenario_directory(dir: &Path) -> Result<Vec<ScenarioReport>> {
    let entries = std::fs::read_dir(dir).map_err(|e| CombatError::DataParseError {
        path: dir.display().to_string(),
        message: e.to_string(),
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "ron"))
        .collect();
    paths.sort();

    paths
        .iter()
        .map(|path| {
            tracing::debug!("Validating {}", path.display());
            validate_scenario_file(path)
        })
        .collect()
}

/// Validate a file, or every scenario in a directory.
///
/// # Errors
///
/// Returns the first failure.
pub fn validate_path(path: &Path) -> Result<Vec<ScenarioReport>> {
    if path.is_dir() {
        validate_scenario_directory(path)
    } else {
        validate_scenario_file(path).map(|report| vec![report])
    }
}
