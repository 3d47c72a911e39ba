//! Target locking.
//!
//! A [`Lock`] must reach [`LockState::Locked`] before any action against its
//! target is valid. Unit locks target another entity; terrain locks target
//! a location and carry terraform parameters that travel to clients in a
//! [`TerrainLockStatus`] packet.

mod lock;
mod packet;
mod terrain;

pub use lock::{Lock, LockId, LockState, LockTarget, LockVisitor};
pub use packet::{TerrainLockStatus, TERRAIN_LOCK_STATUS_LEN};
pub use terrain::{TerraformDirection, TerraformType, TerrainTarget, MAX_TERRAFORM_RADIUS};
