//! Error types for the combat core.
//!
//! Expected gameplay no-ops (dead target, invulnerable target, unit outside
//! the zone) are never errors; they are dropped silently on the hot path.
//! Out-of-range inputs such as terrain radius are clamped, not rejected.

use thiserror::Error;

use crate::components::EntityId;

/// Result type alias using [`CombatError`].
pub type Result<T> = std::result::Result<T, CombatError>;

/// Top-level error type for the combat core.
#[derive(Debug, Error)]
pub enum CombatError {
    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path (or label) of the data that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Scenario data is internally inconsistent.
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Packet had the wrong number of bytes.
    #[error("Malformed packet: expected {expected} bytes, got {actual}")]
    PacketLength {
        /// Required packet size.
        expected: usize,
        /// Received packet size.
        actual: usize,
    },

    /// Packet carried an unknown enum code.
    #[error("Malformed packet: unknown {field} code {code}")]
    PacketCode {
        /// Name of the offending field.
        field: &'static str,
        /// The raw byte.
        code: u8,
    },

    /// Packet (de)serialization failed.
    #[error("Packet codec error: {0}")]
    PacketCodec(String),

    /// A damage worker panicked or was aborted.
    #[error("Damage worker for unit {unit} failed: {message}")]
    WorkerFault {
        /// Unit whose damage processor owned the worker.
        unit: EntityId,
        /// Panic payload or cancellation reason.
        message: String,
    },
}

impl From<bincode::Error> for CombatError {
    fn from(err: bincode::Error) -> Self {
        Self::PacketCodec(err.to_string())
    }
}
