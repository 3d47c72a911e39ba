//! Per-unit damage serialization.
//!
//! Weapons on many units fire concurrently, but damage against one unit must
//! resolve one event at a time in arrival order. Each unit gets one
//! [`DamageProcessor`] holding a FIFO queue and an "active" flag behind a
//! single mutex:
//!
//! - idle processor: [`DamageProcessor::submit`] queues the event, marks the
//!   processor active and spawns a worker on the runtime's blocking pool, so
//!   the caller never resolves damage itself;
//! - active processor: the event is queued and `submit` returns at once;
//! - the worker drains the queue, one event per iteration, and clears the
//!   flag under the same lock that observed the queue empty.
//!
//! A worker that panics (for example inside the damage handler) reports the
//! panic through its [`DamageWorker`]. While unwinding it hands the rest of
//! the queue to a successor worker, keeping the processor active, so queued
//! events still resolve in order. Joining the faulted worker also joins its
//! successors. The flag is cleared only when a worker finds the queue empty.
//!
//! Handlers run on blocking-pool threads and may take their time, but they
//! hold up every later event for the same unit.

use std::any::Any;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, RwLock};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::components::{EntityId, ShieldGenerator};
use crate::damage::info::{DamageInfo, DamageTaken};
use crate::damage::resolution::resolve_damage;
use crate::error::{CombatError, Result};
use crate::sync::{lock, read, write};
use crate::unit::Unit;

/// Receiver of resolved damage totals.
pub type DamageTakenHandler = Arc<dyn Fn(&DamageTaken) + Send + Sync>;

#[derive(Debug, Default)]
struct DamageQueue {
    pending: VecDeque<DamageInfo>,
    active: bool,
}

/// Cached shield lookup; cleared only by an explicit invalidation.
#[derive(Debug, Clone, Copy)]
enum ShieldCache {
    Stale,
    Resolved(Option<ShieldGenerator>),
}

struct Shared {
    unit: Arc<Unit>,
    queue: Mutex<DamageQueue>,
    handler: RwLock<Option<DamageTakenHandler>>,
    shield: Mutex<ShieldCache>,
    runtime: Handle,
    successors: Mutex<Vec<JoinHandle<()>>>,
}

/// Serializes damage resolution for one unit.
pub struct DamageProcessor {
    shared: Arc<Shared>,
}

impl DamageProcessor {
    /// Bind a processor to `unit`; workers run on `runtime`.
    #[must_use]
    pub fn new(unit: Arc<Unit>, runtime: Handle) -> Self {
        Self {
            shared: Arc::new(Shared {
                unit,
                queue: Mutex::new(DamageQueue::default()),
                handler: RwLock::new(None),
                shield: Mutex::new(ShieldCache::Stale),
                runtime,
                successors: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Bind a processor using the runtime of the calling context.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    #[must_use]
    pub fn for_current_runtime(unit: Arc<Unit>) -> Self {
        Self::new(unit, Handle::current())
    }

    /// The unit this processor resolves damage for.
    #[must_use]
    pub fn unit(&self) -> &Arc<Unit> {
        &self.shared.unit
    }

    /// Register the damage-taken handler.
    ///
    /// There is one slot: a new registration replaces the previous one.
    pub fn set_damage_taken_handler(&self, handler: impl Fn(&DamageTaken) + Send + Sync + 'static) {
        *write(&self.shared.handler) = Some(Arc::new(handler));
    }

    /// Remove the damage-taken handler.
    pub fn clear_damage_taken_handler(&self) {
        *write(&self.shared.handler) = None;
    }

    /// Forget the cached shield generator; the next event looks it up again.
    ///
    /// Call after every refit of the unit.
    pub fn invalidate_shield_cache(&self) {
        *lock(&self.shared.shield) = ShieldCache::Stale;
    }

    /// Number of queued events not yet picked up by a worker.
    #[must_use]
    pub fn pending(&self) -> usize {
        lock(&self.shared.queue).pending.len()
    }

    /// Whether a worker currently owns this unit.
    #[must_use]
    pub fn is_resolving(&self) -> bool {
        lock(&self.shared.queue).active
    }

    /// Submit a damage event without blocking.
    ///
    /// Events against a unit that cannot take damage (outside the zone,
    /// dead, invulnerable, not attackable) are dropped silently. Returns the
    /// new worker when this call started one, `None` when the event was
    /// queued behind an active worker or dropped.
    pub fn submit(&self, info: DamageInfo) -> Option<DamageWorker> {
        if !self.shared.unit.can_take_damage() {
            tracing::trace!(
                unit = self.shared.unit.id(),
                attacker = info.attacker,
                "Damage dropped, unit cannot take damage"
            );
            return None;
        }

        {
            let mut queue = lock(&self.shared.queue);
            queue.pending.push_back(info);
            if queue.active {
                return None;
            }
            queue.active = true;
        }

        Some(DamageWorker {
            unit: self.shared.unit.id(),
            handle: spawn_drain(&self.shared),
            shared: Arc::clone(&self.shared),
        })
    }
}

impl std::fmt::Debug for DamageProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DamageProcessor")
            .field("unit", &self.shared.unit.id())
            .field("pending", &self.pending())
            .field("resolving", &self.is_resolving())
            .finish_non_exhaustive()
    }
}

/// Handle to a running damage worker.
///
/// Joining it is the fault channel: a panic inside resolution or the damage
/// handler comes back as [`CombatError::WorkerFault`]. Dropping it detaches
/// the worker and loses any fault.
#[must_use = "join the worker to observe faults"]
pub struct DamageWorker {
    unit: EntityId,
    handle: JoinHandle<()>,
    shared: Arc<Shared>,
}

impl std::fmt::Debug for DamageWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DamageWorker")
            .field("unit", &self.unit)
            .field("finished", &self.is_finished())
            .finish_non_exhaustive()
    }
}

impl DamageWorker {
    /// Unit the worker resolves damage for.
    #[must_use]
    pub const fn unit(&self) -> EntityId {
        self.unit
    }

    /// Whether the worker and any successor it handed the queue to have exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
            && lock(&self.shared.successors)
                .iter()
                .all(JoinHandle::is_finished)
    }

    /// Wait for the queue to drain.
    ///
    /// Successors started by a fault are joined too; the first fault wins.
    pub async fn join(self) -> Result<()> {
        let unit = self.unit;
        let mut outcome = worker_outcome(unit, self.handle.await);
        loop {
            let next = {
                let mut successors = lock(&self.shared.successors);
                (!successors.is_empty()).then(|| successors.remove(0))
            };
            let Some(handle) = next else {
                break;
            };
            outcome = outcome.and(worker_outcome(unit, handle.await));
        }
        outcome
    }
}

fn worker_outcome(
    unit: EntityId,
    result: std::result::Result<(), tokio::task::JoinError>,
) -> Result<()> {
    result.map_err(|err| {
        let message = if err.is_panic() {
            panic_message(err.into_panic())
        } else {
            err.to_string()
        };
        tracing::error!(unit, %message, "Damage worker failed");
        CombatError::WorkerFault { unit, message }
    })
}

fn spawn_drain(shared: &Arc<Shared>) -> JoinHandle<()> {
    let worker = Arc::clone(shared);
    shared.runtime.spawn_blocking(move || drain(&worker))
}

/// Runs when a worker unwinds mid-event: queued events go to a successor,
/// otherwise the active flag is cleared.
struct ActiveRelease<'a> {
    shared: &'a Arc<Shared>,
    armed: bool,
}

impl Drop for ActiveRelease<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let queued = {
            let mut queue = lock(&self.shared.queue);
            queue.active = !queue.pending.is_empty();
            queue.pending.len()
        };
        if queued > 0 {
            tracing::warn!(
                unit = self.shared.unit.id(),
                queued,
                "Damage worker faulted, handing queue to a successor"
            );
            let successor = spawn_drain(self.shared);
            lock(&self.shared.successors).push(successor);
        }
    }
}

fn drain(shared: &Arc<Shared>) {
    let mut release = ActiveRelease {
        shared,
        armed: true,
    };

    loop {
        let next = {
            let mut queue = lock(&shared.queue);
            let next = queue.pending.pop_front();
            if next.is_none() {
                queue.active = false;
                release.armed = false;
            }
            next
        };
        match next {
            Some(info) => shared.resolve(&info),
            None => break,
        }
    }
}

impl Shared {
    fn resolve(&self, info: &DamageInfo) {
        // Re-checked here: the unit may have died while the event was queued.
        if !self.unit.can_take_damage() {
            tracing::trace!(
                unit = self.unit.id(),
                attacker = info.attacker,
                "Queued damage dropped, unit cannot take damage"
            );
            return;
        }

        let shield = self.active_shield();
        let taken = self
            .unit
            .with_combat(|state| resolve_damage(info, state, shield.as_ref()));

        tracing::debug!(
            unit = self.unit.id(),
            attacker = taken.attacker,
            damage = taken.total_damage,
            absorbed = taken.total_core_absorbed,
            kers = taken.total_kers,
            critical = taken.is_critical,
            "Damage resolved"
        );

        let handler = read(&self.handler).clone();
        if let Some(handler) = handler {
            handler(&taken);
        }
    }

    fn active_shield(&self) -> Option<ShieldGenerator> {
        if !self.unit.flags().shield_effect {
            return None;
        }

        let mut cache = lock(&self.shield);
        match *cache {
            ShieldCache::Resolved(shield) => shield,
            ShieldCache::Stale => {
                let shield = self.unit.find_shield();
                *cache = ShieldCache::Resolved(shield);
                shield
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::components::{CombatState, DamageType, Module};

    fn processor(unit: Unit) -> DamageProcessor {
        DamageProcessor::for_current_runtime(Arc::new(unit))
    }

    fn counter(processor: &DamageProcessor) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        processor.set_damage_taken_handler(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    #[tokio::test]
    async fn test_submit_resolves_on_worker() {
        let p = processor(Unit::new(1, CombatState::new(100.0, 100.0)));
        let count = counter(&p);

        let worker = p.submit(DamageInfo::new(2).with(DamageType::Kinetic, 10.0));
        worker.expect("idle processor starts a worker").join().await.unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!p.is_resolving());
    }

    #[tokio::test]
    async fn test_guard_drops_silently() {
        let unit = Unit::new(1, CombatState::new(100.0, 100.0));
        unit.update_flags(|f| f.invulnerable = true);
        let p = processor(unit);
        let count = counter(&p);

        assert!(p.submit(DamageInfo::new(2).with(DamageType::Kinetic, 10.0)).is_none());
        assert_eq!(p.pending(), 0);
        assert!(!p.is_resolving());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_handler_last_registration_wins() {
        let p = processor(Unit::new(1, CombatState::new(100.0, 100.0)));
        let first = counter(&p);
        let second = counter(&p);

        p.submit(DamageInfo::new(2)).unwrap().join().await.unwrap();
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_handler_reports_fault() {
        let p = processor(Unit::new(1, CombatState::new(100.0, 100.0)));
        p.set_damage_taken_handler(|_| panic!("handler exploded"));

        let err = p.submit(DamageInfo::new(2)).unwrap().join().await.unwrap_err();
        match err {
            CombatError::WorkerFault { unit, message } => {
                assert_eq!(unit, 1);
                assert!(message.contains("handler exploded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Nothing was queued, so the flag was released.
        assert!(!p.is_resolving());
        p.clear_damage_taken_handler();
        assert!(p.submit(DamageInfo::new(2)).is_some());
    }

    #[tokio::test]
    async fn test_blocking_handler_leaves_runtime_free() {
        let p = processor(Unit::new(1, CombatState::new(100.0, 100.0)));
        let (release, wait) = std::sync::mpsc::channel::<()>();
        let wait = Mutex::new(wait);
        p.set_damage_taken_handler(move |_| {
            wait.lock().unwrap().recv().unwrap();
        });

        let worker = p.submit(DamageInfo::new(2)).unwrap();
        // Single-threaded runtime: this only gets back control if the
        // handler is parked off the runtime thread.
        tokio::task::yield_now().await;
        assert!(p.is_resolving());
        release.send(()).unwrap();

        worker.join().await.unwrap();
        assert!(!p.is_resolving());
    }

    #[tokio::test]
    async fn test_shield_cache_needs_invalidation() {
        let unit = Unit::new(1, CombatState::new(100.0, 1000.0));
        unit.update_flags(|f| f.shield_effect = true);
        let p = processor(unit);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        p.set_damage_taken_handler(move |taken| s.lock().unwrap().push(taken.total_core_absorbed));

        let hit = || DamageInfo::new(2).with(DamageType::Kinetic, 10.0);

        // No shield fitted; the miss is cached.
        p.submit(hit()).unwrap().join().await.unwrap();

        p.unit()
            .fit_modules(vec![Module::ShieldGenerator(ShieldGenerator::new(1.0))]);
        p.submit(hit()).unwrap().join().await.unwrap();

        p.invalidate_shield_cache();
        p.submit(hit()).unwrap().join().await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![0.0, 0.0, 10.0]);
    }
}
