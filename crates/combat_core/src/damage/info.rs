//! Damage events in and resolved totals out.

use serde::{Deserialize, Serialize};

use crate::components::{DamageType, EntityId};

/// One attack against one unit.
///
/// Built by the weapon that fired and consumed by exactly one resolution
/// pass. Components resolve in the order they were added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageInfo {
    /// Who fired.
    pub attacker: EntityId,
    /// Critical hit flag, passed through to the result.
    pub is_critical: bool,
    /// Raw amount per damage type.
    pub damages: Vec<(DamageType, f64)>,
}

impl DamageInfo {
    /// Empty, non-critical attack.
    #[must_use]
    pub const fn new(attacker: EntityId) -> Self {
        Self {
            attacker,
            is_critical: false,
            damages: Vec::new(),
        }
    }

    /// Builder: append a damage component.
    #[must_use]
    pub fn with(mut self, damage_type: DamageType, amount: f64) -> Self {
        self.damages.push((damage_type, amount));
        self
    }

    /// Builder: mark as critical.
    #[must_use]
    pub const fn critical(mut self) -> Self {
        self.is_critical = true;
        self
    }

    /// Sum of raw amounts.
    #[must_use]
    pub fn raw_total(&self) -> f64 {
        self.damages.iter().map(|(_, amount)| amount).sum()
    }
}

/// Resolved totals of one damage event.
///
/// Applying `total_damage` to armor, kill detection and notifications are
/// up to the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageTaken {
    /// Who fired.
    pub attacker: EntityId,
    /// Damage left after absorption and resist.
    pub total_damage: f64,
    /// Core spent by the shield.
    pub total_core_absorbed: f64,
    /// Core gained through kers.
    pub total_kers: f64,
    /// Copied from the event.
    pub is_critical: bool,
    /// Always `false` from the resolver; kill detection happens downstream.
    pub is_killing_blow: bool,
}
