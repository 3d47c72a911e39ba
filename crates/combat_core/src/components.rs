//! Combat component definitions.
//!
//! Components are plain data. Behavior that mutates them lives in the
//! damage pipeline, the blob handler and the lock state machine.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// Unique identifier for entities.
pub type EntityId = u64;

// ============================================================================
// Damage Types
// ============================================================================

/// Damage type classification for weapons.
///
/// Every damage type has its own resist and kers value on the defender.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub enum DamageType {
    /// Chemical damage (missiles, acid payloads).
    Chemical,
    /// Thermal damage (lasers, plasma).
    Thermal,
    /// Kinetic damage (cannons, slugs).
    #[default]
    Kinetic,
    /// Explosive damage (bombs, mines).
    Explosive,
    /// Toxic damage (area denial).
    Toxic,
}

impl DamageType {
    /// Every damage type in table order.
    pub const ALL: [Self; 5] = [
        Self::Chemical,
        Self::Thermal,
        Self::Kinetic,
        Self::Explosive,
        Self::Toxic,
    ];

    /// Index of this damage type inside a [`DamageTable`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Chemical => 0,
            Self::Thermal => 1,
            Self::Kinetic => 2,
            Self::Explosive => 3,
            Self::Toxic => 4,
        }
    }
}

/// One `f64` per damage type.
///
/// Used for resist fractions and kers modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageTable([f64; 5]);

impl DamageTable {
    /// Table with the same value for every damage type.
    #[must_use]
    pub const fn uniform(value: f64) -> Self {
        Self([value; 5])
    }

    /// All zeroes.
    pub const ZERO: Self = Self::uniform(0.0);

    /// Builder: set one entry.
    #[must_use]
    pub fn with(mut self, damage_type: DamageType, value: f64) -> Self {
        self[damage_type] = value;
        self
    }

    /// Iterate `(type, value)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (DamageType, f64)> + '_ {
        DamageType::ALL.iter().map(move |t| (*t, self[*t]))
    }
}

impl Default for DamageTable {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Index<DamageType> for DamageTable {
    type Output = f64;

    fn index(&self, damage_type: DamageType) -> &f64 {
        &self.0[damage_type.index()]
    }
}

impl IndexMut<DamageType> for DamageTable {
    fn index_mut(&mut self, damage_type: DamageType) -> &mut f64 {
        &mut self.0[damage_type.index()]
    }
}

// ============================================================================
// Unit State
// ============================================================================

/// Status flags that gate whether a unit can be damaged or blob others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFlags {
    /// Unit is currently part of an active zone simulation.
    pub in_zone: bool,
    /// Unit has been destroyed.
    pub dead: bool,
    /// Unit ignores all damage.
    pub invulnerable: bool,
    /// Unit may be targeted by attacks at all.
    pub attackable: bool,
    /// The shield effect is switched on.
    pub shield_effect: bool,
}

impl Default for UnitFlags {
    fn default() -> Self {
        Self {
            in_zone: true,
            dead: false,
            invulnerable: false,
            attackable: true,
            shield_effect: false,
        }
    }
}

impl UnitFlags {
    /// Whether an incoming damage event may be resolved against this unit.
    #[must_use]
    pub const fn can_take_damage(&self) -> bool {
        self.in_zone && !self.dead && !self.invulnerable && self.attackable
    }

    /// Whether the unit counts as live for blob evaluation.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.in_zone && !self.dead
    }
}

/// Depletable pool clamped to `[0, max]` on every write.
///
/// Used for the core (energy reserve) and for armor (hit points).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    current: f64,
    max: f64,
}

impl Pool {
    /// Create a pool filled to `current`.
    ///
    /// # Panics
    ///
    /// Panics if `max` is negative or not finite.
    #[must_use]
    pub fn new(current: f64, max: f64) -> Self {
        assert!(
            max.is_finite() && max >= 0.0,
            "pool capacity must be finite and non-negative, got {max}"
        );
        Self {
            current: current.clamp(0.0, max),
            max,
        }
    }

    /// Create a full pool.
    #[must_use]
    pub fn full(max: f64) -> Self {
        Self::new(max, max)
    }

    /// Current value.
    #[must_use]
    pub const fn current(&self) -> f64 {
        self.current
    }

    /// Capacity.
    #[must_use]
    pub const fn max(&self) -> f64 {
        self.max
    }

    /// Fill ratio in `[0, 1]`; 0 for an empty-capacity pool.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.max > 0.0 {
            self.current / self.max
        } else {
            0.0
        }
    }

    /// Overwrite the current value (clamped).
    pub fn set(&mut self, value: f64) {
        self.current = value.clamp(0.0, self.max);
    }

    /// Add (or with a negative amount, remove) and clamp.
    pub fn add(&mut self, amount: f64) {
        self.set(self.current + amount);
    }

    /// Whether the pool is at zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current <= 0.0
    }
}

/// Numeric combat state of a unit.
///
/// Owned by the unit's damage processor: every mutation goes through the
/// unit's combat mutex so damage workers and tick-thread recharge never
/// lose updates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatState {
    /// Energy reserve ("core").
    pub core: Pool,
    /// Hit points.
    pub armor: Pool,
    /// Fractional damage reduction per type.
    pub resist: DamageTable,
    /// Kers modifier per type; exactly 1.0 disables kers for that type.
    pub kers: DamageTable,
}

impl CombatState {
    /// Create combat state with full pools, no resist and no kers.
    #[must_use]
    pub fn new(core_max: f64, armor_max: f64) -> Self {
        Self {
            core: Pool::full(core_max),
            armor: Pool::full(armor_max),
            resist: DamageTable::ZERO,
            kers: DamageTable::uniform(1.0),
        }
    }
}

/// Blob emission properties of a unit.
///
/// A unit "blobs" every hostile inside its emission radius, adding its
/// emission value to their crowd level.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BlobEmitter {
    /// Amount added to a blobbed unit's level.
    pub emission: f64,
    /// Radius of the emission.
    pub radius: f64,
}

/// A fitted module on a unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Module {
    /// Converts core into damage absorption.
    ShieldGenerator(ShieldGenerator),
    /// Passive plating; has no effect on damage resolution here.
    ArmorPlate {
        /// Hit points granted.
        armor: f64,
    },
}

/// Shield generator module parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShieldGenerator {
    /// Whether the module is switched on.
    pub active: bool,
    /// Core consumed per point of raw damage absorbed.
    pub absorption: f64,
}

impl ShieldGenerator {
    /// Create an active shield generator.
    #[must_use]
    pub const fn new(absorption: f64) -> Self {
        Self {
            active: true,
            absorption,
        }
    }
}
