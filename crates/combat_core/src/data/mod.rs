//! Data structures for zone scenarios.
//!
//! Pure data deserialized from RON. This module performs no IO; callers
//! read the text and hand it to [`ScenarioData::from_ron_str`].

mod scenario_data;
mod unit_data;

pub use scenario_data::{EngagementData, ScenarioData, TerrainLockData};
pub use unit_data::UnitData;
