//! Lock state machine.
//!
//! ```text
//!            start(d)              timer >= d
//! Disabled ──────────► InProgress ───────────► Locked
//!    ▲                     │  ▲                  │
//!    └──── cancel() ───────┘  └──── start(d) ────┘
//! ```
//!
//! `cancel()` returns to `Disabled` from any state. Every actual change of
//! state or of the primary flag notifies subscribers synchronously, before
//! the mutating call returns; reasserting the current value notifies no one.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::components::EntityId;
use crate::targeting::packet::TerrainLockStatus;
use crate::targeting::terrain::TerrainTarget;

/// Random 64-bit lock identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LockId(pub u64);

impl LockId {
    /// Draw a fresh random id.
    #[must_use]
    pub fn random() -> Self {
        Self(rand::random())
    }
}

impl fmt::Display for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Lifecycle of a lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LockState {
    /// Not locking. Initial state, and re-entered on cancel.
    #[default]
    Disabled,
    /// Timer running.
    InProgress,
    /// Timer expired; actions against the target are valid.
    Locked,
}

/// What a lock points at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LockTarget {
    /// Another simulated entity.
    Unit(EntityId),
    /// A terrain location with terraform parameters.
    Terrain(TerrainTarget),
}

impl LockTarget {
    /// Whether both targets refer to the same entity or location.
    ///
    /// Terraform parameters of terrain targets are ignored.
    #[must_use]
    pub fn is_same_target(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unit(a), Self::Unit(b)) => a == b,
            (Self::Terrain(a), Self::Terrain(b)) => a.location() == b.location(),
            _ => false,
        }
    }
}

/// Double-dispatch over lock variants.
///
/// The variant-specific methods fall through to [`LockVisitor::visit_lock`]
/// unless overridden.
pub trait LockVisitor {
    /// Called for any lock whose variant method is not overridden.
    fn visit_lock(&mut self, lock: &Lock);

    /// Called for unit locks.
    fn visit_unit_lock(&mut self, lock: &Lock, _target: EntityId) {
        self.visit_lock(lock);
    }

    /// Called for terrain locks.
    fn visit_terrain_lock(&mut self, lock: &Lock, _target: &TerrainTarget) {
        self.visit_lock(lock);
    }
}

type ChangedHandler = Box<dyn Fn(&Lock) + Send + Sync>;

/// A timed targeting handshake owned by one actor.
pub struct Lock {
    id: LockId,
    owner: EntityId,
    target: LockTarget,
    state: LockState,
    primary: bool,
    elapsed: Duration,
    duration: Duration,
    changed: Vec<ChangedHandler>,
}

impl Lock {
    /// Create a disabled lock with a fresh random id.
    #[must_use]
    pub fn new(owner: EntityId, target: LockTarget) -> Self {
        Self {
            id: LockId::random(),
            owner,
            target,
            state: LockState::Disabled,
            primary: false,
            elapsed: Duration::ZERO,
            duration: Duration::ZERO,
            changed: Vec::new(),
        }
    }

    /// Lock on another unit.
    #[must_use]
    pub fn unit(owner: EntityId, target: EntityId) -> Self {
        Self::new(owner, LockTarget::Unit(target))
    }

    /// Lock on a terrain location.
    #[must_use]
    pub fn terrain(owner: EntityId, target: TerrainTarget) -> Self {
        Self::new(owner, LockTarget::Terrain(target))
    }

    /// Lock id.
    #[must_use]
    pub const fn id(&self) -> LockId {
        self.id
    }

    /// Owning actor.
    #[must_use]
    pub const fn owner(&self) -> EntityId {
        self.owner
    }

    /// Lock target.
    #[must_use]
    pub const fn target(&self) -> &LockTarget {
        &self.target
    }

    /// Target entity, for unit locks.
    #[must_use]
    pub const fn unit_target(&self) -> Option<EntityId> {
        match self.target {
            LockTarget::Unit(id) => Some(id),
            LockTarget::Terrain(_) => None,
        }
    }

    /// Terrain target, for terrain locks.
    #[must_use]
    pub const fn terrain_target(&self) -> Option<&TerrainTarget> {
        match &self.target {
            LockTarget::Terrain(target) => Some(target),
            LockTarget::Unit(_) => None,
        }
    }

    /// Mutable terrain target, for adjusting terraform parameters.
    pub fn terrain_target_mut(&mut self) -> Option<&mut TerrainTarget> {
        match &mut self.target {
            LockTarget::Terrain(target) => Some(target),
            LockTarget::Unit(_) => None,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> LockState {
        self.state
    }

    /// Whether the lock has completed.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.state == LockState::Locked
    }

    /// Whether this is the owner's primary lock.
    #[must_use]
    pub const fn is_primary(&self) -> bool {
        self.primary
    }

    /// Timer progress in `[0, 1]`. 1 once locked, 0 while disabled.
    #[must_use]
    pub fn progress(&self) -> f64 {
        match self.state {
            LockState::Disabled => 0.0,
            LockState::Locked => 1.0,
            LockState::InProgress => {
                (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
            }
        }
    }

    /// Configured lock duration of the last start.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Register a change subscriber.
    pub fn subscribe_changed(&mut self, handler: impl Fn(&Lock) + Send + Sync + 'static) {
        self.changed.push(Box::new(handler));
    }

    /// Arm the timer and move to `InProgress`.
    ///
    /// Restarts the timer when already in progress.
    ///
    /// # Panics
    ///
    /// Panics if `duration` is zero.
    pub fn start(&mut self, duration: Duration) {
        assert!(!duration.is_zero(), "lock duration must be positive");
        self.duration = duration;
        self.elapsed = Duration::ZERO;
        self.set_state(LockState::InProgress);
    }

    /// Advance the timer; promotes to `Locked` once it reaches the duration.
    pub fn update(&mut self, elapsed: Duration) {
        if self.state != LockState::InProgress {
            return;
        }

        self.elapsed = self.elapsed.saturating_add(elapsed);
        if self.elapsed >= self.duration {
            self.set_state(LockState::Locked);
        }
    }

    /// Drop back to `Disabled`, discarding timer progress.
    pub fn cancel(&mut self) {
        self.elapsed = Duration::ZERO;
        self.set_state(LockState::Disabled);
    }

    /// Set the primary flag without touching the state.
    pub fn set_primary(&mut self, primary: bool) {
        if self.primary == primary {
            return;
        }
        self.primary = primary;
        self.notify_changed();
    }

    /// Dispatch to the visitor method for this lock's variant.
    pub fn accept<V: LockVisitor + ?Sized>(&self, visitor: &mut V) {
        match &self.target {
            LockTarget::Unit(target) => visitor.visit_unit_lock(self, *target),
            LockTarget::Terrain(target) => visitor.visit_terrain_lock(self, target),
        }
    }

    /// Status packet for terrain locks.
    #[must_use]
    pub fn terrain_status(&self) -> Option<TerrainLockStatus> {
        self.terrain_target().map(|target| TerrainLockStatus {
            lock_id: self.id.0,
            terraform_type: target.terraform_type() as u8,
            direction: target.direction() as u8,
            radius: target.radius(),
            falloff: target.falloff(),
        })
    }

    fn set_state(&mut self, state: LockState) {
        if self.state == state {
            return;
        }
        tracing::trace!(lock = %self.id, owner = self.owner, from = ?self.state, to = ?state, "Lock state changed");
        self.state = state;
        self.notify_changed();
    }

    fn notify_changed(&self) {
        for handler in &self.changed {
            handler(self);
        }
    }
}

/// Locks are equal when they point at the same target, whatever their ids.
impl PartialEq for Lock {
    fn eq(&self, other: &Self) -> bool {
        self.target.is_same_target(&other.target)
    }
}

impl fmt::Debug for Lock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lock")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("target", &self.target)
            .field("state", &self.state)
            .field("primary", &self.primary)
            .field("elapsed", &self.elapsed)
            .field("duration", &self.duration)
            .field("subscribers", &self.changed.len())
            .finish()
    }
}
