//! Lock state machine properties.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use combat_core::math::Vec3;
use combat_core::targeting::{Lock, LockState, TerrainLockStatus, TerrainTarget};
use combat_test_utils::strategies::tick_steps;
use proptest::prelude::*;

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn notifications(lock: &mut Lock) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    lock.subscribe_changed(move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });
    count
}

#[test]
fn test_full_lifecycle_notifies_each_transition() {
    let mut lock = Lock::unit(1, 2);
    let count = notifications(&mut lock);
    assert_eq!(lock.state(), LockState::Disabled);

    lock.start(ms(500));
    lock.update(ms(499));
    assert_eq!(lock.state(), LockState::InProgress);
    lock.update(ms(1));
    assert!(lock.is_locked());

    // Locked is terminal until cancelled.
    lock.update(ms(1_000));
    assert!(lock.is_locked());

    lock.cancel();
    lock.cancel();
    assert_eq!(lock.state(), LockState::Disabled);
    assert_eq!(count.load(Ordering::SeqCst), 3);
}

#[test]
fn test_restart_after_cancel() {
    let mut lock = Lock::unit(1, 2);
    lock.start(ms(100));
    lock.update(ms(100));
    lock.cancel();

    lock.start(ms(300));
    lock.update(ms(100));
    assert_eq!(lock.state(), LockState::InProgress);
    assert!((lock.progress() - 1.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_primary_independent_of_state() {
    let mut lock = Lock::unit(1, 2);
    let count = notifications(&mut lock);

    lock.set_primary(true);
    lock.set_primary(true);
    assert!(lock.is_primary());
    assert_eq!(lock.state(), LockState::Disabled);

    lock.start(ms(10));
    lock.set_primary(false);
    assert_eq!(lock.state(), LockState::InProgress);
    assert_eq!(count.load(Ordering::SeqCst), 3);
}

#[test]
fn test_duplicate_requests_detected() {
    let first = Lock::unit(1, 42);
    let second = Lock::unit(3, 42);
    assert_ne!(first.id(), second.id());
    assert_eq!(first, second);
    assert_ne!(first, Lock::unit(1, 43));

    let here = Vec3::new(4.0, 5.0, 6.0);
    let mut raised = TerrainTarget::new(here);
    raised.set_radius(4);
    let terrain = Lock::terrain(1, raised);
    assert_eq!(terrain, Lock::terrain(1, TerrainTarget::new(here)));
    assert_ne!(terrain, first);
}

#[test]
fn test_terrain_status_packet_round_trip() {
    let mut target = TerrainTarget::new(Vec3::ZERO);
    target.set_radius(10);
    target.set_falloff(2);
    let lock = Lock::terrain(9, target);

    let status = lock.terrain_status().unwrap();
    assert_eq!(status.lock_id, lock.id().0);
    assert_eq!(status.radius, 5);

    let bytes = status.encode().unwrap();
    assert_eq!(TerrainLockStatus::decode(&bytes).unwrap(), status);
    assert!(Lock::unit(1, 2).terrain_status().is_none());
}

proptest! {
    /// However a lock duration is split into ticks, the lock completes
    /// exactly when the accumulated time reaches it.
    #[test]
    fn prop_locks_when_elapsed_reaches_duration(
        duration_ms in 1u64..2_000,
        steps in tick_steps(64),
    ) {
        let mut lock = Lock::unit(1, 2);
        lock.start(ms(duration_ms));

        let mut total = Duration::ZERO;
        for step in steps {
            lock.update(step);
            total += step;
            let expected = if total >= ms(duration_ms) {
                LockState::Locked
            } else {
                LockState::InProgress
            };
            prop_assert_eq!(lock.state(), expected);
            prop_assert!((0.0..=1.0).contains(&lock.progress()));
        }
    }

    /// Cancel always lands in Disabled, from any point in the lifecycle.
    #[test]
    fn prop_cancel_from_anywhere(
        duration_ms in 1u64..1_000,
        elapsed_ms in 0u64..2_000,
        started in any::<bool>(),
    ) {
        let mut lock = Lock::unit(1, 2);
        if started {
            lock.start(ms(duration_ms));
            lock.update(ms(elapsed_ms));
        }
        lock.cancel();
        prop_assert_eq!(lock.state(), LockState::Disabled);
        prop_assert_eq!(lock.progress(), 0.0);
    }

    /// Radius is always clamped into the supported range.
    #[test]
    fn prop_terrain_radius_clamped(radius in any::<i32>()) {
        let mut target = TerrainTarget::new(Vec3::ZERO);
        target.set_radius(radius);
        prop_assert_eq!(i32::from(target.radius()), radius.clamp(0, 5));
    }
}
