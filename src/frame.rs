//! Per-frame driver contract.
//!
//! Once per rendered frame the host produces a [`FrameTime`] (usually from
//! [`Clock`](crate::time::Clock)) and steps every component with it. A
//! component implements [`Animate`]; it receives the frame's single mode value
//! and the renderer it writes its instance batch into.

use crate::mode::Mode;
use crate::render::InstanceRenderer;

/// Timing of one frame, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Time since the animation started.
    pub elapsed: f32,
    /// Time since the previous frame.
    pub delta: f32,
}

impl FrameTime {
    pub const fn new(elapsed: f32, delta: f32) -> Self {
        Self { elapsed, delta }
    }
}

/// A component advanced once per frame.
///
/// Steps must not fail, block, or change the mode. Each implementation writes
/// its whole batch and then marks it dirty exactly once.
pub trait Animate {
    /// Advance one frame toward the formation selected by `mode`.
    fn step(&mut self, mode: Mode, frame: FrameTime, renderer: &mut dyn InstanceRenderer);
}
