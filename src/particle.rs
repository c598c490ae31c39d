//! Per-element state and the exponential approach rule.
//!
//! Every animated element keeps its two immutable targets next to its mutable
//! interpolation state. Each frame the current state moves a fraction of the
//! remaining distance toward the active target:
//!
//! ```text
//! factor  = clamp(rate * delta, 0, 1)
//! current = current + (target - current) * factor
//! ```
//!
//! A factor of one lands exactly on the target; zero leaves state untouched.

use glam::{Quat, Vec3};

/// Interpolation factor for one frame, clamped to `[0, 1]`.
#[inline]
pub fn step_factor(rate: f32, delta: f32) -> f32 {
    let factor = rate * delta;
    if factor.is_nan() {
        0.0
    } else {
        factor.clamp(0.0, 1.0)
    }
}

/// Move `current` toward `target` by `factor` of the remaining distance.
#[inline]
pub fn approach(current: Vec3, target: Vec3, factor: f32) -> Vec3 {
    if factor <= 0.0 {
        current
    } else if factor >= 1.0 {
        target
    } else {
        // Not `Vec3::lerp`: this form is exact once current == target
        current + (target - current) * factor
    }
}

/// Rotate `current` toward `target` by `factor` along the shortest arc.
#[inline]
pub fn approach_rotation(current: Quat, target: Quat, factor: f32) -> Quat {
    if factor <= 0.0 {
        current
    } else if factor >= 1.0 {
        target
    } else {
        current.slerp(target, factor).normalize()
    }
}

/// Move a scalar toward `target` by `factor` of the remaining distance.
#[inline]
pub fn approach_scalar(current: f32, target: f32, factor: f32) -> f32 {
    if factor <= 0.0 {
        current
    } else if factor >= 1.0 {
        target
    } else {
        current + (target - current) * factor
    }
}

/// One element of a particle tier.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleRecord {
    /// Target in the tree formation.
    pub assembled_position: Vec3,
    /// Resting orientation in the tree formation.
    pub assembled_orientation: Quat,
    /// Target in the scatter formation.
    pub scattered_position: Vec3,
    /// Base Euler XYZ angles of the scattered orientation; tumbling tiers add
    /// elapsed time to each axis.
    pub scattered_euler: Vec3,
    pub current_position: Vec3,
    pub current_orientation: Quat,
    /// Uniform size multiplier.
    pub visual_scale: f32,
    /// Linear RGB.
    pub color: Vec3,
    /// Per-element multiplier on the tier's base speed.
    pub speed_factor: f32,
}

impl ParticleRecord {
    /// Distance from the current position to the given target.
    pub fn distance_to(&self, target: Vec3) -> f32 {
        self.current_position.distance(target)
    }
}
