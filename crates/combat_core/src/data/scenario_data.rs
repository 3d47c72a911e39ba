//! Scenario data: who is in the zone and who shoots at whom.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::unit_data::UnitData;
use crate::components::{DamageType, EntityId};
use crate::error::{CombatError, Result};
use crate::math::Vec3;
use crate::targeting::{TerraformDirection, TerraformType};

/// A weapon that keeps firing at one target while its lock holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementData {
    /// Firing unit.
    pub attacker: EntityId,
    /// Target unit.
    pub target: EntityId,
    /// Lock time in milliseconds.
    pub lock_time_ms: u64,
    /// Time between shots in milliseconds.
    pub cycle_ms: u64,
    /// Raw damage per shot.
    pub damages: Vec<(DamageType, f64)>,
    /// Every shot is critical.
    #[serde(default)]
    pub critical: bool,
    /// How strongly the attacker's own blob penalty reduces its damage.
    #[serde(default = "default_blob_modifier")]
    pub blob_modifier: f64,
}

const fn default_blob_modifier() -> f64 {
    1.0
}

/// A terrain lock requested at scenario start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainLockData {
    /// Locking unit.
    pub owner: EntityId,
    /// Target location.
    pub location: Vec3,
    /// Lock time in milliseconds.
    pub lock_time_ms: u64,
    /// Terraform kind.
    #[serde(default)]
    pub terraform_type: TerraformType,
    /// Terraform direction.
    #[serde(default)]
    pub direction: TerraformDirection,
    /// Requested radius; clamped when applied.
    #[serde(default)]
    pub radius: i32,
    /// Falloff width.
    #[serde(default)]
    pub falloff: u8,
}

/// Complete scenario definition.
///
/// # Example RON
///
/// ```ron
/// ScenarioData(
///     name: "skirmish",
///     units: [...],
///     engagements: [...],
///     terrain_locks: [...],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioData {
    /// Scenario name.
    pub name: String,
    /// Units in the zone.
    pub units: Vec<UnitData>,
    /// Weapon engagements.
    #[serde(default)]
    pub engagements: Vec<EngagementData>,
    /// Terrain locks.
    #[serde(default)]
    pub terrain_locks: Vec<TerrainLockData>,
}

impl ScenarioData {
    /// Parse a scenario from RON text. `label` names the source in errors.
    pub fn from_ron_str(label: &str, text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| CombatError::DataParseError {
            path: label.to_string(),
            message: e.to_string(),
        })
    }

    /// Look up a unit by id.
    #[must_use]
    pub fn unit(&self, id: EntityId) -> Option<&UnitData> {
        self.units.iter().find(|unit| unit.id == id)
    }

    /// Check cross references and value ranges.
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for unit in &self.units {
            if !ids.insert(unit.id) {
                return Err(invalid(format!("duplicate unit id {}", unit.id)));
            }
            validate_unit(unit)?;
        }

        for engagement in &self.engagements {
            self.require_unit(engagement.attacker)?;
            self.require_unit(engagement.target)?;
            if engagement.attacker == engagement.target {
                return Err(invalid(format!(
                    "unit {} engages itself",
                    engagement.attacker
                )));
            }
            if engagement.lock_time_ms == 0 || engagement.cycle_ms == 0 {
                return Err(invalid(format!(
                    "engagement {} -> {} needs positive lock and cycle times",
                    engagement.attacker, engagement.target
                )));
            }
            if engagement
                .damages
                .iter()
                .any(|(_, amount)| !amount.is_finite() || *amount < 0.0)
            {
                return Err(invalid(format!(
                    "engagement {} -> {} has a negative damage amount",
                    engagement.attacker, engagement.target
                )));
            }
        }

        for terrain in &self.terrain_locks {
            self.require_unit(terrain.owner)?;
            if terrain.lock_time_ms == 0 {
                return Err(invalid(format!(
                    "terrain lock of unit {} needs a positive lock time",
                    terrain.owner
                )));
            }
        }

        Ok(())
    }

    fn require_unit(&self, id: EntityId) -> Result<()> {
        self.unit(id)
            .map(|_| ())
            .ok_or(CombatError::EntityNotFound(id))
    }
}

fn validate_unit(unit: &UnitData) -> Result<()> {
    let pools_ok = [unit.armor, unit.core, unit.core_recharge]
        .iter()
        .all(|v| v.is_finite() && *v >= 0.0);
    if !pools_ok {
        return Err(invalid(format!(
            "unit {} has a negative or non-finite armor/core value",
            unit.id
        )));
    }
    if unit.resist.values().any(|r| !(0.0..=1.0).contains(r)) {
        return Err(invalid(format!(
            "unit {} has a resist outside [0, 1]",
            unit.id
        )));
    }
    if unit.blob.low > unit.blob.high {
        return Err(invalid(format!(
            "unit {} has blob low threshold above high",
            unit.id
        )));
    }
    if unit.emitter.emission < 0.0 || unit.emitter.radius < 0.0 {
        return Err(invalid(format!(
            "unit {} has a negative blob emission",
            unit.id
        )));
    }
    Ok(())
}

fn invalid(message: String) -> CombatError {
    CombatError::InvalidScenario(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"ScenarioData(
        name: "duel",
        units: [
            (id: 1, name: "A", team: 0, position: (x: 0.0, y: 0.0, z: 0.0), armor: 100.0, core: 50.0),
            (id: 2, name: "B", team: 1, position: (x: 10.0, y: 0.0, z: 0.0), armor: 100.0, core: 50.0),
        ],
        engagements: [
            (attacker: 1, target: 2, lock_time_ms: 500, cycle_ms: 1000, damages: [(Kinetic, 20.0)]),
        ],
        terrain_locks: [
            (owner: 2, location: (x: 5.0, y: 5.0, z: 0.0), lock_time_ms: 200, direction: Raise, radius: 9),
        ],
    )"#;

    #[test]
    fn test_parse_and_validate() {
        let scenario = ScenarioData::from_ron_str("duel.ron", SCENARIO).unwrap();
        assert_eq!(scenario.units.len(), 2);
        assert_eq!(scenario.engagements[0].blob_modifier, 1.0);
        assert_eq!(scenario.terrain_locks[0].direction, TerraformDirection::Raise);
        scenario.validate().unwrap();
    }

    #[test]
    fn test_parse_error_names_source() {
        let err = ScenarioData::from_ron_str("broken.ron", "ScenarioData(").unwrap_err();
        assert!(err.to_string().contains("broken.ron"));
    }

    #[test]
    fn test_unknown_engagement_target() {
        let mut scenario = ScenarioData::from_ron_str("duel.ron", SCENARIO).unwrap();
        scenario.engagements[0].target = 99;
        assert!(matches!(
            scenario.validate(),
            Err(CombatError::EntityNotFound(99))
        ));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut scenario = ScenarioData::from_ron_str("duel.ron", SCENARIO).unwrap();
        scenario.units[1].id = 1;
        assert!(matches!(
            scenario.validate(),
            Err(CombatError::InvalidScenario(_))
        ));
    }

    #[test]
    fn test_bad_thresholds_rejected() {
        let mut scenario = ScenarioData::from_ron_str("duel.ron", SCENARIO).unwrap();
        scenario.units[0].blob.low = 50.0;
        scenario.units[0].blob.high = 10.0;
        assert!(scenario.validate().is_err());
    }

    #[test]
    fn test_self_engagement_rejected() {
        let mut scenario = ScenarioData::from_ron_str("duel.ron", SCENARIO).unwrap();
        scenario.engagements[0].target = 1;
        assert!(scenario.validate().is_err());
    }
}
