//! Test fixtures and helpers.
//!
//! Pre-built units and damage events for consistent testing.

use std::sync::Arc;

use combat_core::blob::BlobThresholds;
use combat_core::components::{
    BlobEmitter, CombatState, DamageTable, DamageType, EntityId, Module, ShieldGenerator,
    UnitFlags,
};
use combat_core::damage::DamageInfo;
use combat_core::math::Vec3;
use combat_core::unit::Unit;

/// Armor given to fixture units.
pub const FIXTURE_ARMOR: f64 = 1_000.0;

/// Core given to fixture units.
pub const FIXTURE_CORE: f64 = 100.0;

/// A live, attackable unit with full pools, no resists and no kers.
#[must_use]
pub fn plain_unit(id: EntityId) -> Unit {
    Unit::new(id, CombatState::new(FIXTURE_CORE, FIXTURE_ARMOR))
}

/// [`plain_unit`] wrapped for sharing with processors.
#[must_use]
pub fn shared_unit(id: EntityId) -> Arc<Unit> {
    Arc::new(plain_unit(id))
}

/// A unit with an active shield generator and the shield effect on.
#[must_use]
pub fn shielded_unit(id: EntityId, absorption: f64) -> Unit {
    plain_unit(id)
        .with_flags(UnitFlags {
            shield_effect: true,
            ..UnitFlags::default()
        })
        .with_modules(vec![Module::ShieldGenerator(ShieldGenerator::new(
            absorption,
        ))])
}

/// A unit with the same resist against every damage type.
#[must_use]
pub fn resistant_unit(id: EntityId, resist: f64) -> Unit {
    let mut state = CombatState::new(FIXTURE_CORE, FIXTURE_ARMOR);
    state.resist = DamageTable::uniform(resist);
    Unit::new(id, state)
}

/// A blob emitter standing at `position`.
#[must_use]
pub fn emitter_unit(id: EntityId, position: Vec3, emission: f64, radius: f64) -> Unit {
    plain_unit(id)
        .with_position(position)
        .with_emitter(BlobEmitter { emission, radius })
}

/// A unit that tracks crowding with the given thresholds.
#[must_use]
pub fn blob_target(id: EntityId, position: Vec3, low: f64, high: f64) -> Unit {
    plain_unit(id)
        .with_position(position)
        .with_blob_thresholds(BlobThresholds::new(low, high))
}

/// Single-component kinetic hit.
#[must_use]
pub fn kinetic_hit(attacker: EntityId, amount: f64) -> DamageInfo {
    DamageInfo::new(attacker).with(DamageType::Kinetic, amount)
}

/// Hit of `amount` in every damage type.
#[must_use]
pub fn mixed_hit(attacker: EntityId, amount: f64) -> DamageInfo {
    DamageType::ALL
        .iter()
        .fold(DamageInfo::new(attacker), |info, damage_type| {
            info.with(*damage_type, amount)
        })
}
