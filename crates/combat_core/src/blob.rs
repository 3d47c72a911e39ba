//! Crowd penalty ("blob") tracking.
//!
//! Every unit tracks the hostile emitters currently blobbing it. Each
//! emitter adds its emission value to the unit's level; the level is mapped
//! through the unit's low/high thresholds onto a penalty multiplier that
//! external calculations apply with [`BlobHandler::apply_penalty`].
//!
//! The level is maintained incrementally on enter/leave transitions and is
//! never rebuilt from the membership set.
//!
//! # Concurrency
//!
//! [`BlobHandler::evaluate`] and [`BlobHandler::tick`] are called only from
//! the owning unit's tick. The membership set is copy-on-write: every
//! mutation builds a new set and swaps the `Arc`, so readers on damage
//! workers always hold a complete snapshot. The multiplier is published
//! through an atomic and can be read without taking any lock.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::components::EntityId;
use crate::math::{clamp_lenient, Vec3};
use crate::sync::{lock, read, write};
use crate::unit::Unit;

/// Minimum time between two multiplier recomputations.
pub const BLOB_UPDATE_INTERVAL: Duration = Duration::from_secs(1);

/// Level range mapped onto the `[0, 1]` penalty multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BlobThresholds {
    /// Level at which the penalty starts.
    pub low: f64,
    /// Level at which the penalty is full.
    pub high: f64,
}

impl BlobThresholds {
    /// Create thresholds.
    #[must_use]
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }
}

/// Membership transition produced by one [`BlobHandler::evaluate`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobTransition {
    /// Candidate started blobbing the owner.
    Entered,
    /// Candidate stopped blobbing the owner.
    Left,
    /// Nothing changed.
    Unchanged,
}

#[derive(Debug)]
struct BlobState {
    level: f64,
    dirty: bool,
    since_update: Duration,
    thresholds: BlobThresholds,
    effect_value: f64,
}

/// Per-unit crowd penalty tracker.
#[derive(Debug)]
pub struct BlobHandler {
    members: RwLock<Arc<HashSet<EntityId>>>,
    state: Mutex<BlobState>,
    multiplier: AtomicU64,
}

impl BlobHandler {
    /// Create an empty tracker with multiplier 0.
    #[must_use]
    pub fn new(thresholds: BlobThresholds) -> Self {
        Self {
            members: RwLock::new(Arc::new(HashSet::new())),
            state: Mutex::new(BlobState {
                level: 0.0,
                dirty: false,
                since_update: Duration::ZERO,
                thresholds,
                effect_value: 0.0,
            }),
            multiplier: AtomicU64::new(0.0_f64.to_bits()),
        }
    }

    /// Re-check one nearby hostile candidate against the owner.
    ///
    /// `owner_position` is where the owning unit stands this tick. The
    /// candidate blobs the owner while it is live and the owner lies within
    /// the candidate's own emission radius.
    pub fn evaluate(&self, owner_position: Vec3, candidate: &Unit) -> BlobTransition {
        let id = candidate.id();
        let tracked = read(&self.members).contains(&id);
        let blobbing = candidate.is_blobbing(owner_position);

        match (tracked, blobbing) {
            (true, false) => {
                self.replace_members(|members| {
                    members.remove(&id);
                });
                let emission = candidate.emitter().emission;
                let mut state = lock(&self.state);
                state.level = (state.level - emission).max(0.0);
                state.dirty = true;
                tracing::trace!(emitter = id, level = state.level, "Blob emitter left");
                BlobTransition::Left
            }
            (false, true) => {
                self.replace_members(|members| {
                    members.insert(id);
                });
                let emission = candidate.emitter().emission;
                let mut state = lock(&self.state);
                state.level += emission;
                state.dirty = true;
                tracing::trace!(emitter = id, level = state.level, "Blob emitter entered");
                BlobTransition::Entered
            }
            _ => BlobTransition::Unchanged,
        }
    }

    /// Advance the recompute timer.
    ///
    /// Does nothing while the level is unchanged. Once dirty, the multiplier
    /// is recomputed when [`BLOB_UPDATE_INTERVAL`] has accumulated.
    pub fn tick(&self, elapsed: Duration) {
        let mut state = lock(&self.state);
        if !state.dirty {
            return;
        }

        state.since_update += elapsed;
        if state.since_update < BLOB_UPDATE_INTERVAL {
            return;
        }

        let BlobThresholds { low, high } = state.thresholds;
        let level = clamp_lenient(state.level, low, high);
        if high > low {
            let multiplier = ((level - low) / (high - low)).clamp(0.0, 1.0);
            self.multiplier.store(multiplier.to_bits(), Ordering::Release);
        }
        state.effect_value = clamp_lenient(level, 0.0, high);
        state.dirty = false;
        state.since_update = Duration::ZERO;

        tracing::debug!(
            level = state.level,
            multiplier = self.multiplier(),
            effect = state.effect_value,
            "Blob penalty recomputed"
        );
    }

    /// Scale `value` down by the current penalty.
    ///
    /// `modifier` says how strongly this particular effect is subject to the
    /// penalty (1.0 = fully).
    #[must_use]
    pub fn apply_penalty(&self, value: f64, modifier: f64) -> f64 {
        value * (1.0 - self.multiplier() * modifier)
    }

    /// Current penalty multiplier in `[0, 1]`.
    #[must_use]
    pub fn multiplier(&self) -> f64 {
        f64::from_bits(self.multiplier.load(Ordering::Acquire))
    }

    /// Accumulated emission level.
    #[must_use]
    pub fn level(&self) -> f64 {
        lock(&self.state).level
    }

    /// Level clamped to `[0, high]` at the last recomputation.
    #[must_use]
    pub fn effect_value(&self) -> f64 {
        lock(&self.state).effect_value
    }

    /// Whether a recomputation is pending.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        lock(&self.state).dirty
    }

    /// Current thresholds.
    #[must_use]
    pub fn thresholds(&self) -> BlobThresholds {
        lock(&self.state).thresholds
    }

    /// Change thresholds; picked up at the next recomputation.
    pub fn set_thresholds(&self, thresholds: BlobThresholds) {
        lock(&self.state).thresholds = thresholds;
    }

    /// Snapshot of the emitters currently blobbing this unit.
    #[must_use]
    pub fn members(&self) -> Arc<HashSet<EntityId>> {
        Arc::clone(&read(&self.members))
    }

    fn replace_members(&self, edit: impl FnOnce(&mut HashSet<EntityId>)) {
        let mut next = HashSet::clone(&read(&self.members));
        edit(&mut next);
        *write(&self.members) = Arc::new(next);
    }
}

impl Default for BlobHandler {
    fn default() -> Self {
        Self::new(BlobThresholds::default())
    }
}
