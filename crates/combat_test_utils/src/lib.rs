//! # Combat Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Unit and scenario fixtures
//! - Recording damage handler
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod recorder;
pub mod strategies;

/// Re-export proptest for convenience.
pub use proptest;

/// Install a test subscriber that honours `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
