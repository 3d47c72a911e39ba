//! Property-based testing strategies.

use std::time::Duration;

use combat_core::components::{CombatState, DamageTable, DamageType};
use combat_core::damage::DamageInfo;
use proptest::prelude::*;

/// Any damage type.
pub fn damage_type() -> impl Strategy<Value = DamageType> {
    prop::sample::select(DamageType::ALL.to_vec())
}

/// A damage event with one to five non-negative components.
pub fn damage_info() -> impl Strategy<Value = DamageInfo> {
    (
        0u64..64,
        any::<bool>(),
        prop::collection::vec((damage_type(), 0.0f64..500.0), 1..=5),
    )
        .prop_map(|(attacker, is_critical, damages)| DamageInfo {
            attacker,
            is_critical,
            damages,
        })
}

/// Per-type table with values in `range`.
pub fn damage_table(range: std::ops::Range<f64>) -> impl Strategy<Value = DamageTable> {
    prop::array::uniform5(range).prop_map(|values| {
        DamageType::ALL
            .iter()
            .zip(values)
            .fold(DamageTable::ZERO, |acc, (damage_type, value)| {
                acc.with(*damage_type, value)
            })
    })
}

/// Combat state with a partly drained core, resists in `[0, 1]` and kers in
/// `[0, 1]`.
pub fn combat_state() -> impl Strategy<Value = CombatState> {
    (
        1.0f64..1_000.0,
        0.0f64..=1.0,
        1.0f64..5_000.0,
        damage_table(0.0..1.0),
        damage_table(0.0..1.0),
    )
        .prop_map(|(core_max, core_fill, armor_max, resist, kers)| {
            let mut state = CombatState::new(core_max, armor_max);
            state.core.set(core_max * core_fill);
            state.resist = resist;
            state.kers = kers;
            state
        })
}

/// A sequence of tick lengths between 1 and 250 ms.
pub fn tick_steps(max_len: usize) -> impl Strategy<Value = Vec<Duration>> {
    prop::collection::vec((1u64..=250).prop_map(Duration::from_millis), 0..max_len)
}
