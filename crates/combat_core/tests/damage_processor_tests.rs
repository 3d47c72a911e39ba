//! Concurrency tests for per-unit damage serialization.
//!
//! These run on a multi-threaded runtime so workers genuinely race with
//! submitters.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use combat_core::damage::{DamageProcessor, DamageWorker};
use combat_core::error::CombatError;
use combat_test_utils::fixtures::{kinetic_hit, shared_unit, FIXTURE_ARMOR};
use combat_test_utils::recorder::DamageRecorder;

async fn join_all(workers: Vec<DamageWorker>) {
    for worker in workers {
        worker.join().await.unwrap();
    }
}

// =============================================================================
// Ordering
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_events_resolve_in_submission_order() {
    combat_test_utils::init_tracing();
    let processor = DamageProcessor::for_current_runtime(shared_unit(1));
    let recorder = DamageRecorder::new();
    recorder.attach(&processor);

    let workers: Vec<_> = (0..200)
        .filter_map(|attacker| processor.submit(kinetic_hit(attacker, 1.0)))
        .collect();
    join_all(workers).await;

    assert_eq!(recorder.attackers(), (0..200).collect::<Vec<_>>());
    assert!(!processor.is_resolving());
    assert_eq!(processor.pending(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submitters_never_overlap() {
    const THREADS: u64 = 8;
    const PER_THREAD: u64 = 50;

    let processor = Arc::new(DamageProcessor::for_current_runtime(shared_unit(1)));
    let in_flight = Arc::new(AtomicBool::new(false));
    let overlaps = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(Mutex::new(Vec::new()));

    {
        let in_flight = Arc::clone(&in_flight);
        let overlaps = Arc::clone(&overlaps);
        let seen = Arc::clone(&seen);
        processor.set_damage_taken_handler(move |taken| {
            if in_flight.swap(true, Ordering::SeqCst) {
                overlaps.fetch_add(1, Ordering::SeqCst);
            }
            seen.lock().unwrap().push(taken.attacker);
            thread::yield_now();
            in_flight.store(false, Ordering::SeqCst);
        });
    }

    let submitters: Vec<_> = (0..THREADS)
        .map(|t| {
            let processor = Arc::clone(&processor);
            thread::spawn(move || {
                (0..PER_THREAD)
                    .filter_map(|i| processor.submit(kinetic_hit(t * PER_THREAD + i, 1.0)))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut workers = Vec::new();
    for submitter in submitters {
        workers.extend(submitter.join().unwrap());
    }
    join_all(workers).await;

    assert_eq!(overlaps.load(Ordering::SeqCst), 0);

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len() as u64, THREADS * PER_THREAD);

    // Each submitter's own events keep their relative order.
    for t in 0..THREADS {
        let from_thread: Vec<_> = seen
            .iter()
            .copied()
            .filter(|attacker| attacker / PER_THREAD == t)
            .collect();
        let expected: Vec<_> = (t * PER_THREAD..(t + 1) * PER_THREAD).collect();
        assert_eq!(from_thread, expected);
    }
}

// =============================================================================
// Guard and kill handling
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_queued_events_dropped_after_kill() {
    let unit = shared_unit(1);
    let processor = DamageProcessor::for_current_runtime(Arc::clone(&unit));
    let recorder = DamageRecorder::new();
    let kills = Arc::new(AtomicUsize::new(0));

    {
        let unit = Arc::clone(&unit);
        let recorder = recorder.clone();
        let kills = Arc::clone(&kills);
        processor.set_damage_taken_handler(move |taken| {
            recorder.record(taken);
            if unit.apply_damage(taken.total_damage) {
                kills.fetch_add(1, Ordering::SeqCst);
            }
        });
    }

    let hit = FIXTURE_ARMOR * 0.3;
    let workers: Vec<_> = (0..10)
        .filter_map(|attacker| processor.submit(kinetic_hit(attacker, hit)))
        .collect();
    join_all(workers).await;

    // 300, 600, 900, 1200: the fourth hit kills, the rest are dropped.
    assert_eq!(recorder.len(), 4);
    assert_eq!(kills.load(Ordering::SeqCst), 1);
    assert!(unit.flags().dead);
    assert!(processor.submit(kinetic_hit(99, hit)).is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_fault_leaves_processor_usable() {
    let processor = DamageProcessor::for_current_runtime(shared_unit(7));
    let calls = Arc::new(AtomicUsize::new(0));
    {
        let calls = Arc::clone(&calls);
        processor.set_damage_taken_handler(move |_| {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("first event fails");
            }
        });
    }

    let err = processor
        .submit(kinetic_hit(1, 5.0))
        .unwrap()
        .join()
        .await
        .unwrap_err();
    assert!(matches!(err, CombatError::WorkerFault { unit: 7, .. }));

    processor
        .submit(kinetic_hit(2, 5.0))
        .unwrap()
        .join()
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_events_queued_behind_fault_still_resolve() {
    let processor = DamageProcessor::for_current_runtime(shared_unit(3));
    let recorder = DamageRecorder::new();
    let (open_gate, gate) = std::sync::mpsc::channel::<()>();
    let gate = Mutex::new(gate);

    {
        let recorder = recorder.clone();
        processor.set_damage_taken_handler(move |taken| {
            if taken.attacker == 1 {
                gate.lock().unwrap().recv().unwrap();
                panic!("first event fails");
            }
            recorder.record(taken);
        });
    }

    let faulted = processor.submit(kinetic_hit(1, 1.0)).unwrap();
    assert!(processor.submit(kinetic_hit(2, 1.0)).is_none());
    assert!(processor.submit(kinetic_hit(3, 1.0)).is_none());
    open_gate.send(()).unwrap();

    // No further submit: the faulted worker's successor drains the queue.
    let err = faulted.join().await.unwrap_err();
    assert!(matches!(err, CombatError::WorkerFault { unit: 3, .. }));
    assert_eq!(recorder.attackers(), vec![2, 3]);
    assert_eq!(processor.pending(), 0);
    assert!(!processor.is_resolving());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_repeated_faults_keep_draining_in_order() {
    let processor = DamageProcessor::for_current_runtime(shared_unit(4));
    let recorder = DamageRecorder::new();
    let (open_gate, gate) = std::sync::mpsc::channel::<()>();
    let gate = Mutex::new(gate);

    {
        let recorder = recorder.clone();
        processor.set_damage_taken_handler(move |taken| {
            if taken.attacker == 1 {
                gate.lock().unwrap().recv().unwrap();
            }
            if taken.attacker % 2 == 1 {
                panic!("odd attacker {}", taken.attacker);
            }
            recorder.record(taken);
        });
    }

    let faulted = processor.submit(kinetic_hit(1, 1.0)).unwrap();
    for attacker in 2..=6 {
        assert!(processor.submit(kinetic_hit(attacker, 1.0)).is_none());
    }
    open_gate.send(()).unwrap();

    // The first fault is reported; every later event still resolves.
    match faulted.join().await.unwrap_err() {
        CombatError::WorkerFault { unit, message } => {
            assert_eq!(unit, 4);
            assert!(message.contains("odd attacker 1"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(recorder.attackers(), vec![2, 4, 6]);
    assert_eq!(processor.pending(), 0);
    assert!(!processor.is_resolving());
}
