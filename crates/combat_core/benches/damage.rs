//! Damage resolution benchmarks for combat_core.
//!
//! Run with: `cargo bench -p combat_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use combat_core::components::{CombatState, DamageTable, DamageType, ShieldGenerator};
use combat_core::damage::{resolve_damage, DamageInfo};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Resolve a mixed five-component hit against a shielded, kers-fitted unit.
pub fn resolution_benchmark(c: &mut Criterion) {
    let info = DamageType::ALL
        .iter()
        .fold(DamageInfo::new(1), |info, t| info.with(*t, 40.0));
    let shield = ShieldGenerator::new(0.8);

    let mut base = CombatState::new(2_000.0, 5_000.0);
    base.resist = DamageTable::uniform(0.3);
    base.kers = DamageTable::uniform(0.2);

    c.bench_function("resolve_damage_shielded", |b| {
        b.iter(|| {
            let mut state = base;
            black_box(resolve_damage(
                black_box(&info),
                &mut state,
                Some(&shield),
            ))
        })
    });

    c.bench_function("resolve_damage_unshielded", |b| {
        b.iter(|| {
            let mut state = base;
            black_box(resolve_damage(black_box(&info), &mut state, None))
        })
    });
}

criterion_group!(benches, resolution_benchmark);
criterion_main!(benches);
