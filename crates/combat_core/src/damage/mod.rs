//! Damage resolution pipeline.
//!
//! - [`info`] - incoming events and resolved totals
//! - [`resolution`] - shield absorption, resist and kers for one event
//! - [`processor`] - per-unit FIFO serialization on background workers

pub mod info;
pub mod processor;
pub mod resolution;

pub use info::{DamageInfo, DamageTaken};
pub use processor::{DamageProcessor, DamageTakenHandler, DamageWorker};
pub use resolution::resolve_damage;
