//! Vector and curve helpers for combat math.
//!
//! Combat resolution works in `f64` world units. Positions are full 3D
//! because emission ranges are measured through terrain height as well.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Tolerance used when comparing combat modifiers against exact values.
pub const MODIFIER_EPSILON: f64 = f64::EPSILON;

/// 3D vector in world units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z (height) coordinate.
    pub z: f64,
}

impl Vec3 {
    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Squared distance (avoids sqrt for range checks).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let d = self - other;
        d.x * d.x + d.y * d.y + d.z * d.z
    }

    /// Euclidean distance.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Whether `other` lies within `range` of this point (inclusive).
    #[must_use]
    pub fn is_in_range_of(self, other: Self, range: f64) -> bool {
        range >= 0.0 && self.distance_squared(other) <= range * range
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Whether `value` equals `target` within [`MODIFIER_EPSILON`].
#[must_use]
pub fn approx_eq(value: f64, target: f64) -> bool {
    (value - target).abs() <= MODIFIER_EPSILON
}

/// Bell-shaped easing over a fill ratio.
///
/// Returns `sin(ratio * PI) / 2 + 0.5`: 0.5 when empty or full, 1.0 at
/// half. `ratio` is not clamped.
#[must_use]
pub fn bell_ease(ratio: f64) -> f64 {
    (ratio * PI).sin() / 2.0 + 0.5
}

/// Clamp without panicking when the bounds are inverted.
///
/// `f64::clamp` asserts `min <= max`; thresholds arrive from unit data and
/// may cross while being edited, so the upper bound wins in that case.
#[must_use]
pub fn clamp_lenient(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}
