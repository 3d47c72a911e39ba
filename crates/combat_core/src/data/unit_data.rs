//! Unit data structures for data-driven scenarios.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::blob::BlobThresholds;
use crate::components::{
    BlobEmitter, CombatState, DamageTable, DamageType, EntityId, Module, ShieldGenerator,
    UnitFlags,
};
use crate::math::Vec3;
use crate::unit::Unit;

/// Data-driven unit definition.
///
/// # Example RON
///
/// ```ron
/// UnitData(
///     id: 1,
///     name: "Arkhe",
///     team: 0,
///     position: (x: 0.0, y: 0.0, z: 0.0),
///     armor: 800.0,
///     core: 400.0,
///     core_recharge: 5.0,
///     resist: { Kinetic: 0.3, Thermal: 0.2 },
///     kers: { Thermal: 0.5 },
///     shield_absorption: Some(1.2),
///     shield_effect: true,
///     emitter: (emission: 10.0, radius: 40.0),
///     blob: (low: 20.0, high: 100.0),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitData {
    /// Unique entity id inside the scenario.
    pub id: EntityId,

    /// Display name for logs.
    pub name: String,

    /// Units on different teams are hostile to each other.
    pub team: u32,

    /// Spawn position.
    pub position: Vec3,

    /// Maximum (and starting) armor.
    pub armor: f64,

    /// Maximum (and starting) core.
    pub core: f64,

    /// Core regained per second.
    #[serde(default)]
    pub core_recharge: f64,

    /// Resist fraction per damage type; missing types resist nothing.
    #[serde(default)]
    pub resist: BTreeMap<DamageType, f64>,

    /// Kers modifier per damage type; missing types have no kers (1.0).
    #[serde(default)]
    pub kers: BTreeMap<DamageType, f64>,

    /// Absorption of the fitted shield generator, if any.
    #[serde(default)]
    pub shield_absorption: Option<f64>,

    /// Whether the shield effect starts switched on.
    #[serde(default)]
    pub shield_effect: bool,

    /// Blob emission of this unit.
    #[serde(default)]
    pub emitter: BlobEmitter,

    /// Crowd penalty thresholds of this unit.
    #[serde(default)]
    pub blob: BlobThresholds,

    /// Spawn invulnerable.
    #[serde(default)]
    pub invulnerable: bool,
}

impl UnitData {
    /// Combat state with full pools.
    #[must_use]
    pub fn combat_state(&self) -> CombatState {
        let mut state = CombatState::new(self.core, self.armor);
        state.resist = table(&self.resist, 0.0);
        state.kers = table(&self.kers, 1.0);
        state
    }

    /// Fitted modules.
    #[must_use]
    pub fn modules(&self) -> Vec<Module> {
        self.shield_absorption
            .map(|absorption| Module::ShieldGenerator(ShieldGenerator::new(absorption)))
            .into_iter()
            .collect()
    }

    /// Build the runtime unit.
    #[must_use]
    pub fn to_unit(&self) -> Unit {
        Unit::new(self.id, self.combat_state())
            .with_position(self.position)
            .with_flags(UnitFlags {
                invulnerable: self.invulnerable,
                shield_effect: self.shield_effect,
                ..UnitFlags::default()
            })
            .with_modules(self.modules())
            .with_emitter(self.emitter)
            .with_blob_thresholds(self.blob)
    }
}

fn table(values: &BTreeMap<DamageType, f64>, fallback: f64) -> DamageTable {
    DamageType::ALL
        .iter()
        .fold(DamageTable::uniform(fallback), |acc, damage_type| {
            match values.get(damage_type) {
                Some(value) => acc.with(*damage_type, *value),
                None => acc,
            }
        })
}
