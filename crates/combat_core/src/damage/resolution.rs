//! Per-event damage resolution.
//!
//! Each damage component goes through three stages, in order:
//!
//! ```text
//! 1. Absorption  shield converts core into absorbed damage
//!                core_damage = amount * k
//!                core <  core_damage: absorb all core, amount -= core / k
//!                core >= core_damage: amount = 0, core -= core_damage
//!                skipped when k <= 0 or core < 1
//! 2. Resist      amount -= amount * resist[type]
//! 3. Kers        kers = amount * kers[type], skipped when kers[type] == 1
//!                core += kers * (sin(core / core_max * PI) / 2 + 0.5)
//! ```
//!
//! The post-resist amount is what counts toward total damage. Kers reads
//! the core after absorption has already changed it.

use crate::components::{CombatState, Pool, ShieldGenerator};
use crate::damage::info::{DamageInfo, DamageTaken};
use crate::math::{approx_eq, bell_ease};

/// Core below which the shield stops absorbing.
pub const MIN_ABSORB_CORE: f64 = 1.0;

/// Resolve one event against a unit's combat state.
///
/// `shield` is the unit's active shield generator when the shield effect is
/// on, `None` otherwise. Mutates core; armor is left to the caller.
pub fn resolve_damage(
    info: &DamageInfo,
    state: &mut CombatState,
    shield: Option<&ShieldGenerator>,
) -> DamageTaken {
    let mut total_damage = 0.0;
    let mut total_core_absorbed = 0.0;
    let mut total_kers = 0.0;

    for &(damage_type, raw) in &info.damages {
        // Negative components would feed core through the shield.
        let mut amount = raw.max(0.0);

        if let Some(shield) = shield {
            let (remaining, absorbed) = absorb(amount, shield.absorption, &mut state.core);
            amount = remaining;
            total_core_absorbed += absorbed;
        }

        amount -= amount * state.resist[damage_type];

        total_kers += drain_kers(amount, state.kers[damage_type], &mut state.core);
        total_damage += amount;
    }

    DamageTaken {
        attacker: info.attacker,
        total_damage,
        total_core_absorbed,
        total_kers,
        is_critical: info.is_critical,
        is_killing_blow: false,
    }
}

/// Shield stage. Returns `(amount passing through, core absorbed)`.
fn absorb(amount: f64, absorption: f64, core: &mut Pool) -> (f64, f64) {
    let reserve = core.current();
    if absorption <= 0.0 || reserve < MIN_ABSORB_CORE {
        return (amount, 0.0);
    }

    let core_damage = amount * absorption;
    if reserve < core_damage {
        core.set(0.0);
        (amount - reserve / absorption, reserve)
    } else {
        core.add(-core_damage);
        (0.0, core_damage)
    }
}

/// Kers stage. Returns the core added.
fn drain_kers(amount: f64, modifier: f64, core: &mut Pool) -> f64 {
    if approx_eq(modifier, 1.0) {
        return 0.0;
    }

    let kers = amount * modifier;
    if kers <= 0.0 {
        return 0.0;
    }

    let scaled = kers * bell_ease(core.ratio());
    core.add(scaled);
    scaled
}
