//! Recording damage handler.
//!
//! Collects every [`DamageTaken`] a processor reports so tests can assert
//! on order and totals after the workers have drained.

use std::sync::{Arc, Mutex};

use combat_core::components::EntityId;
use combat_core::damage::{DamageProcessor, DamageTaken};

/// Shared log of resolved damage.
#[derive(Debug, Clone, Default)]
pub struct DamageRecorder {
    events: Arc<Mutex<Vec<DamageTaken>>>,
}

impl DamageRecorder {
    /// Empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register this recorder as the processor's damage-taken handler.
    pub fn attach(&self, processor: &DamageProcessor) {
        let recorder = self.clone();
        processor.set_damage_taken_handler(move |taken| recorder.record(taken));
    }

    /// Append one event; for handlers that do more than record.
    pub fn record(&self, taken: &DamageTaken) {
        self.lock().push(*taken);
    }

    /// Copy of everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<DamageTaken> {
        self.lock().clone()
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Attackers in resolution order.
    #[must_use]
    pub fn attackers(&self) -> Vec<EntityId> {
        self.lock().iter().map(|taken| taken.attacker).collect()
    }

    /// Sum of all reported damage.
    #[must_use]
    pub fn total_damage(&self) -> f64 {
        self.lock().iter().map(|taken| taken.total_damage).sum()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<DamageTaken>> {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
