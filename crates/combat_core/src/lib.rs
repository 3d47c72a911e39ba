//! # Combat Core
//!
//! Real-time combat resolution for a persistent zone simulation.
//!
//! This crate contains the computation and state transitions only:
//! - No persistence
//! - No networking beyond the terrain lock status packet layout
//! - No spatial queries (callers hand in nearby hostiles)
//!
//! ## Crate Structure
//!
//! - [`targeting`] - Lock state machine, terrain locks, status packet
//! - [`damage`] - Damage resolution pipeline and per-unit processors
//! - [`blob`] - Crowd penalty tracking
//! - [`unit`] - Shared unit combat model
//! - [`components`] - Plain combat data
//! - [`data`] - RON scenario definitions
//! - [`math`] - Vector and easing helpers

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod blob;
pub mod components;
pub mod damage;
pub mod data;
pub mod error;
pub mod math;
pub mod targeting;
pub mod unit;

mod sync;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::blob::{BlobHandler, BlobThresholds, BlobTransition, BLOB_UPDATE_INTERVAL};
    pub use crate::components::*;
    pub use crate::damage::{DamageInfo, DamageProcessor, DamageTaken, DamageWorker};
    pub use crate::error::{CombatError, Result};
    pub use crate::math::Vec3;
    pub use crate::targeting::{
        Lock, LockId, LockState, LockTarget, LockVisitor, TerraformDirection, TerraformType,
        TerrainLockStatus, TerrainTarget,
    };
    pub use crate::unit::Unit;
}
