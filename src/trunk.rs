//! Tree trunk.
//!
//! A tapered cylinder at the tree origin. It grows to full height in the tree
//! formation and collapses flat while the tree is scattered.

use glam::{Quat, Vec3};

use crate::error::SceneError;
use crate::frame::{Animate, FrameTime};
use crate::mode::Mode;
use crate::palette::theme;
use crate::particle::{approach_scalar, step_factor};
use crate::render::{BatchHandle, GeometryKind, InstanceRenderer};

/// Convergence rate of the vertical scale, 1/s.
pub const TRUNK_RATE: f32 = 3.0;

/// Cylinder extents: mean radius on X/Z, height on Y.
const TRUNK_SIZE: Vec3 = Vec3::new(0.5, 1.5, 0.5);

#[derive(Debug)]
pub struct Trunk {
    position: Vec3,
    vertical_scale: f32,
    batch: BatchHandle,
}

impl Trunk {
    pub fn new(renderer: &mut dyn InstanceRenderer) -> Result<Self, SceneError> {
        let batch = renderer.allocate_batch(1, GeometryKind::Cylinder)?;
        let trunk = Self {
            position: Vec3::ZERO,
            vertical_scale: 1.0,
            batch,
        };
        renderer.set_color(batch, 0, theme::bark());
        trunk.write(renderer);
        Ok(trunk)
    }

    /// Current Y scale; `1` is full height.
    pub fn vertical_scale(&self) -> f32 {
        self.vertical_scale
    }

    pub fn batch(&self) -> BatchHandle {
        self.batch
    }

    pub fn release(self, renderer: &mut dyn InstanceRenderer) {
        renderer.release_batch(self.batch);
    }

    pub fn step(&mut self, mode: Mode, frame: FrameTime, renderer: &mut dyn InstanceRenderer) {
        let target = mode.select(1.0, 0.0);
        self.vertical_scale = approach_scalar(self.vertical_scale, target, step_factor(TRUNK_RATE, frame.delta));
        self.write(renderer);
    }

    fn write(&self, renderer: &mut dyn InstanceRenderer) {
        let scale = TRUNK_SIZE * Vec3::new(1.0, self.vertical_scale, 1.0);
        renderer.set_transform(self.batch, 0, self.position, Quat::IDENTITY, scale);
        renderer.mark_dirty(self.batch);
    }
}

impl Animate for Trunk {
    fn step(&mut self, mode: Mode, frame: FrameTime, renderer: &mut dyn InstanceRenderer) {
        Trunk::step(self, mode, frame, renderer);
    }
}
