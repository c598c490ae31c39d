//! Auto-rotating orbit camera for the viewer.

use std::f32::consts::TAU;

use glam::{Mat4, Vec3};

/// Auto-rotation while the tree is assembled, rad/s.
const ASSEMBLED_ROTATION: f32 = 0.5 * TAU / 60.0;
/// Auto-rotation while scattered; slower so the cloud is easier to follow.
const SCATTERED_ROTATION: f32 = 0.1 * TAU / 60.0;

pub struct Camera {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub target: Vec3,
    /// Vertical offset of the eye, animated for a slow drift.
    pub bob: f32,
    pub fov_y: f32,
}

impl Camera {
    /// Start at (6, 2, 8) looking at the origin.
    pub fn new() -> Self {
        let eye = Vec3::new(6.0, 2.0, 8.0);
        Self {
            yaw: eye.x.atan2(eye.z),
            pitch: (eye.y / eye.length()).asin(),
            distance: eye.length(),
            target: Vec3::ZERO,
            bob: 0.0,
            fov_y: 50.0_f32.to_radians(),
        }
    }

    /// Advance auto-rotation and drift.
    pub fn update(&mut self, elapsed: f32, delta: f32, assembled: bool) {
        let rate = if assembled { ASSEMBLED_ROTATION } else { SCATTERED_ROTATION };
        self.yaw += rate * delta;
        self.bob = (elapsed * 0.1).sin() * 0.5;
    }

    /// Mouse drag, in pixels.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * 0.005;
        // Stop slightly below the horizon
        self.pitch = (self.pitch + dy * 0.005).clamp(-0.17, 1.5);
    }

    pub fn zoom(&mut self, scroll: f32) {
        self.distance = (self.distance - scroll * 0.5).clamp(4.0, 15.0);
    }

    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin() + self.bob;
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect, 0.1, 100.0)
    }

    /// Camera right and up axes in world space, for billboards.
    pub fn basis(&self) -> (Vec3, Vec3) {
        let forward = (self.target - self.position()).normalize();
        let right = forward.cross(Vec3::Y).normalize();
        let up = right.cross(forward);
        (right, up)
    }
}
