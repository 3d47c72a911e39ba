//! Shared combat unit.
//!
//! A [`Unit`] is handed around as `Arc<Unit>`: the zone tick thread moves it
//! and evaluates blob membership, damage workers mutate its combat state,
//! and other units read its position and emitter while blobbing.

use std::sync::{Mutex, RwLock};

use crate::blob::{BlobHandler, BlobThresholds};
use crate::components::{
    BlobEmitter, CombatState, EntityId, Module, ShieldGenerator, UnitFlags,
};
use crate::math::Vec3;
use crate::sync::{lock, read, write};

/// A simulated unit that can lock, be damaged and be blobbed.
#[derive(Debug)]
pub struct Unit {
    id: EntityId,
    flags: RwLock<UnitFlags>,
    position: RwLock<Vec3>,
    combat: Mutex<CombatState>,
    modules: RwLock<Vec<Module>>,
    emitter: RwLock<BlobEmitter>,
    blob: BlobHandler,
}

impl Unit {
    /// Create a unit with default flags at the origin.
    #[must_use]
    pub fn new(id: EntityId, combat: CombatState) -> Self {
        Self {
            id,
            flags: RwLock::new(UnitFlags::default()),
            position: RwLock::new(Vec3::ZERO),
            combat: Mutex::new(combat),
            modules: RwLock::new(Vec::new()),
            emitter: RwLock::new(BlobEmitter::default()),
            blob: BlobHandler::new(BlobThresholds::default()),
        }
    }

    /// Builder: initial position.
    #[must_use]
    pub fn with_position(self, position: Vec3) -> Self {
        *write(&self.position) = position;
        self
    }

    /// Builder: initial flags.
    #[must_use]
    pub fn with_flags(self, flags: UnitFlags) -> Self {
        *write(&self.flags) = flags;
        self
    }

    /// Builder: fitted modules.
    #[must_use]
    pub fn with_modules(self, modules: Vec<Module>) -> Self {
        *write(&self.modules) = modules;
        self
    }

    /// Builder: blob emitter.
    #[must_use]
    pub fn with_emitter(self, emitter: BlobEmitter) -> Self {
        *write(&self.emitter) = emitter;
        self
    }

    /// Builder: blob thresholds.
    #[must_use]
    pub fn with_blob_thresholds(self, thresholds: BlobThresholds) -> Self {
        self.blob.set_thresholds(thresholds);
        self
    }

    /// Unique id.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Snapshot of the status flags.
    #[must_use]
    pub fn flags(&self) -> UnitFlags {
        *read(&self.flags)
    }

    /// Mutate the status flags.
    pub fn update_flags(&self, f: impl FnOnce(&mut UnitFlags)) {
        f(&mut write(&self.flags));
    }

    /// Whether an incoming damage event may be resolved right now.
    #[must_use]
    pub fn can_take_damage(&self) -> bool {
        self.flags().can_take_damage()
    }

    /// Whether the unit is in the zone and alive.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.flags().is_active()
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        *read(&self.position)
    }

    /// Move the unit.
    pub fn set_position(&self, position: Vec3) {
        *write(&self.position) = position;
    }

    /// Snapshot of the numeric combat state.
    #[must_use]
    pub fn combat(&self) -> CombatState {
        *lock(&self.combat)
    }

    /// Run `f` with exclusive access to the combat state.
    ///
    /// Every mutation of core and armor goes through here, so damage
    /// workers and tick-thread recharge are serialized.
    pub fn with_combat<R>(&self, f: impl FnOnce(&mut CombatState) -> R) -> R {
        f(&mut lock(&self.combat))
    }

    /// Add core from passive recharge.
    pub fn recharge_core(&self, amount: f64) {
        self.with_combat(|state| state.core.add(amount));
    }

    /// Apply resolved damage to armor.
    ///
    /// Returns `true` when this call destroyed the unit. A unit that is
    /// already dead is left untouched.
    pub fn apply_damage(&self, amount: f64) -> bool {
        if self.flags().dead {
            return false;
        }
        let emptied = self.with_combat(|state| {
            state.armor.add(-amount.max(0.0));
            state.armor.is_empty()
        });
        if !emptied {
            return false;
        }

        let mut flags = write(&self.flags);
        if flags.dead {
            return false;
        }
        flags.dead = true;
        true
    }

    /// Snapshot of fitted modules.
    #[must_use]
    pub fn modules(&self) -> Vec<Module> {
        read(&self.modules).clone()
    }

    /// Replace fitted modules.
    ///
    /// Does not touch any damage processor's shield cache; callers invalidate
    /// it explicitly after a refit.
    pub fn fit_modules(&self, modules: Vec<Module>) {
        *write(&self.modules) = modules;
    }

    /// First active shield generator among the fitted modules.
    #[must_use]
    pub fn find_shield(&self) -> Option<ShieldGenerator> {
        read(&self.modules).iter().find_map(|module| match module {
            Module::ShieldGenerator(shield) if shield.active => Some(*shield),
            _ => None,
        })
    }

    /// Blob emission of this unit.
    #[must_use]
    pub fn emitter(&self) -> BlobEmitter {
        *read(&self.emitter)
    }

    /// Change the blob emission.
    pub fn set_emitter(&self, emitter: BlobEmitter) {
        *write(&self.emitter) = emitter;
    }

    /// Crowd penalty tracker of this unit.
    #[must_use]
    pub const fn blob(&self) -> &BlobHandler {
        &self.blob
    }

    /// Whether this unit is blobbing `other`: it is live and `other` sits
    /// inside its emission radius.
    #[must_use]
    pub fn is_blobbing(&self, other: Vec3) -> bool {
        self.is_active() && self.position().is_in_range_of(other, self.emitter().radius)
    }
}
