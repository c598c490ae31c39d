//! The star on top of the tree.
//!
//! A single octahedron that spins about Y, pulses its scale, and glides
//! between an anchor on the tree tip and one hovering behind the scatter cloud.

use glam::{Quat, Vec3};

use crate::error::SceneError;
use crate::frame::{Animate, FrameTime};
use crate::mode::Mode;
use crate::palette::theme;
use crate::particle::{approach, approach_scalar, step_factor};
use crate::render::{BatchHandle, GeometryKind, InstanceRenderer};

/// Topper tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopperConfig {
    pub assembled_anchor: Vec3,
    pub scattered_anchor: Vec3,
    /// Convergence rate of the position, 1/s.
    pub position_rate: f32,
    /// Convergence rate of the pulsing scale, 1/s.
    pub scale_rate: f32,
    /// Yaw speed, rad/s.
    pub spin_rate: f32,
    /// Relative pulse amplitude.
    pub pulse_amplitude: f32,
    /// Pulse angular frequency, rad/s.
    pub pulse_frequency: f32,
    /// Base size of the octahedron.
    pub size: f32,
    pub color: Vec3,
}

impl Default for TopperConfig {
    fn default() -> Self {
        Self {
            assembled_anchor: Vec3::new(0.0, 6.2, 0.0),
            scattered_anchor: Vec3::new(0.0, 10.0, -5.0),
            position_rate: 2.0,
            scale_rate: 2.0,
            spin_rate: 0.5,
            pulse_amplitude: 0.1,
            pulse_frequency: 3.0,
            size: 0.4,
            color: theme::gold(),
        }
    }
}

impl TopperConfig {
    pub fn with_anchors(mut self, assembled: Vec3, scattered: Vec3) -> Self {
        self.assembled_anchor = assembled;
        self.scattered_anchor = scattered;
        self
    }

    pub fn with_spin_rate(mut self, rate: f32) -> Self {
        self.spin_rate = rate;
        self
    }

    pub fn with_pulse(mut self, amplitude: f32, frequency: f32) -> Self {
        self.pulse_amplitude = amplitude;
        self.pulse_frequency = frequency;
        self
    }
}

#[derive(Debug)]
pub struct Topper {
    config: TopperConfig,
    position: Vec3,
    yaw: f32,
    scale: f32,
    batch: BatchHandle,
}

impl Topper {
    /// Allocate the single-instance batch and place the star on the tree tip.
    pub fn new(config: TopperConfig, renderer: &mut dyn InstanceRenderer) -> Result<Self, SceneError> {
        let batch = renderer.allocate_batch(1, GeometryKind::Octahedron)?;
        let topper = Self {
            position: config.assembled_anchor,
            yaw: 0.0,
            scale: 1.0,
            config,
            batch,
        };
        renderer.set_color(batch, 0, topper.config.color);
        topper.write(renderer);
        Ok(topper)
    }

    pub fn config(&self) -> &TopperConfig {
        &self.config
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Accumulated rotation about Y, radians.
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Pulse multiplier on the base size.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn batch(&self) -> BatchHandle {
        self.batch
    }

    pub fn release(self, renderer: &mut dyn InstanceRenderer) {
        renderer.release_batch(self.batch);
    }

    pub fn step(&mut self, mode: Mode, frame: FrameTime, renderer: &mut dyn InstanceRenderer) {
        let FrameTime { elapsed, delta } = frame;
        let config = &self.config;

        self.yaw += config.spin_rate * delta;

        let pulse = 1.0 + (elapsed * config.pulse_frequency).sin() * config.pulse_amplitude;
        self.scale = approach_scalar(self.scale, pulse, step_factor(config.scale_rate, delta));

        let target = mode.select(config.assembled_anchor, config.scattered_anchor);
        self.position = approach(self.position, target, step_factor(config.position_rate, delta));

        self.write(renderer);
    }

    fn write(&self, renderer: &mut dyn InstanceRenderer) {
        renderer.set_transform(
            self.batch,
            0,
            self.position,
            Quat::from_rotation_y(self.yaw),
            Vec3::splat(self.config.size * self.scale),
        );
        renderer.mark_dirty(self.batch);
    }
}

impl Animate for Topper {
    fn step(&mut self, mode: Mode, frame: FrameTime, renderer: &mut dyn InstanceRenderer) {
        Topper::step(self, mode, frame, renderer);
    }
}
