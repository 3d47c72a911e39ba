//! Numeric invariants of the damage resolution pass.

use combat_core::components::{CombatState, DamageTable, ShieldGenerator};
use combat_core::damage::resolve_damage;
use combat_test_utils::fixtures::mixed_hit;
use combat_test_utils::strategies::{combat_state, damage_info};
use proptest::prelude::*;

const EPSILON: f64 = 1e-9;

#[test]
fn test_mixed_hit_through_every_stage() {
    let mut state = CombatState::new(100.0, 1_000.0);
    state.resist = DamageTable::uniform(0.5);
    let shield = ShieldGenerator::new(1.0);

    // 5 x 40 raw; the shield eats 100 core worth, the rest is halved.
    let taken = resolve_damage(&mixed_hit(1, 40.0), &mut state, Some(&shield));

    assert!((taken.total_core_absorbed - 100.0).abs() < EPSILON);
    assert!((taken.total_damage - 50.0).abs() < EPSILON);
    assert_eq!(taken.total_kers, 0.0);
    assert_eq!(state.core.current(), 0.0);
}

proptest! {
    /// Resolution never creates damage and never pushes core out of range.
    #[test]
    fn prop_damage_bounded_by_raw(
        info in damage_info(),
        mut state in combat_state(),
        absorption in prop::option::of(0.0f64..4.0),
    ) {
        let shield = absorption.map(ShieldGenerator::new);
        let core_before = state.core.current();
        let taken = resolve_damage(&info, &mut state, shield.as_ref());

        prop_assert!(taken.total_damage >= 0.0);
        prop_assert!(taken.total_damage <= info.raw_total() + EPSILON);
        // Kers may refill core that a later component's shield then spends.
        prop_assert!(taken.total_core_absorbed <= core_before + taken.total_kers + EPSILON);
        prop_assert!(state.core.current() >= 0.0);
        prop_assert!(state.core.current() <= state.core.max());
        prop_assert_eq!(taken.attacker, info.attacker);
        prop_assert_eq!(taken.is_critical, info.is_critical);
        prop_assert!(!taken.is_killing_blow);
    }

    /// With no shield, no resist and no kers the raw total passes through.
    #[test]
    fn prop_unmodified_unit_takes_raw_total(info in damage_info()) {
        let mut state = CombatState::new(100.0, 1_000.0);
        let taken = resolve_damage(&info, &mut state, None);

        prop_assert!((taken.total_damage - info.raw_total()).abs() < EPSILON);
        prop_assert_eq!(state.core.current(), 100.0);
    }
}
