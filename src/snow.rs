//! Ambient snowfall.
//!
//! Flakes fall through a box around the tree and wrap back to the top when
//! they pass the floor. The whole field turns slowly about Y. Snow ignores the
//! mode entirely.

use glam::{Quat, Vec3};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::SceneError;
use crate::frame::{Animate, FrameTime};
use crate::layout::sample_range;
use crate::mode::Mode;
use crate::palette::theme;
use crate::render::{BatchHandle, GeometryKind, InstanceRenderer};

/// Snowfall tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct SnowConfig {
    /// Flakes spawn within `±half_extent` on X and Z.
    pub half_extent: f32,
    /// Flakes below this height wrap to `ceiling`.
    pub floor: f32,
    pub ceiling: f32,
    /// Fall speed range in units/s, redrawn per flake every frame.
    pub fall_speed: (f32, f32),
    /// Rotation of the whole field about Y, rad/s.
    pub spin_rate: f32,
    /// Sprite scale of each flake.
    pub flake_size: f32,
    pub color: Vec3,
}

impl Default for SnowConfig {
    fn default() -> Self {
        Self {
            half_extent: 12.5,
            floor: -5.0,
            ceiling: 15.0,
            fall_speed: (1.2, 1.8),
            spin_rate: 0.06,
            flake_size: 1.5,
            color: theme::snow(),
        }
    }
}

#[derive(Debug)]
pub struct Snow {
    config: SnowConfig,
    /// Flake positions in field space, before the field rotation.
    flakes: Vec<Vec3>,
    rotation: f32,
    rng: SmallRng,
    batch: BatchHandle,
}

impl Snow {
    pub fn new(config: SnowConfig, count: usize, seed: u64, renderer: &mut dyn InstanceRenderer) -> Result<Self, SceneError> {
        let mut rng = SmallRng::seed_from_u64(seed);
        let flakes = (0..count)
            .map(|_| {
                let (x, z) = spread(&config, &mut rng);
                Vec3::new(x, sample_range(&mut rng, config.floor, config.ceiling), z)
            })
            .collect();
        let batch = renderer.allocate_batch(count, GeometryKind::PointSprite)?;

        let snow = Self {
            config,
            flakes,
            rotation: 0.0,
            rng,
            batch,
        };
        for i in 0..snow.flakes.len() {
            renderer.set_color(batch, i, snow.config.color);
        }
        snow.write(renderer);
        log::debug!("built snow: {} flakes", count);
        Ok(snow)
    }

    /// Flake positions in field space.
    pub fn flakes(&self) -> &[Vec3] {
        &self.flakes
    }

    /// Accumulated field rotation, radians.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn len(&self) -> usize {
        self.flakes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flakes.is_empty()
    }

    pub fn batch(&self) -> BatchHandle {
        self.batch
    }

    pub fn release(self, renderer: &mut dyn InstanceRenderer) {
        renderer.release_batch(self.batch);
    }

    pub fn step(&mut self, frame: FrameTime, renderer: &mut dyn InstanceRenderer) {
        if self.flakes.is_empty() {
            return;
        }
        let delta = frame.delta;
        let (min_speed, max_speed) = self.config.fall_speed;

        // A paused frame must not consume randomness
        if delta > 0.0 {
            for flake in &mut self.flakes {
                flake.y -= sample_range(&mut self.rng, min_speed, max_speed) * delta;
                if flake.y < self.config.floor {
                    let (x, z) = spread(&self.config, &mut self.rng);
                    *flake = Vec3::new(x, self.config.ceiling, z);
                }
            }
        }
        self.rotation += self.config.spin_rate * delta;

        self.write(renderer);
    }

    fn write(&self, renderer: &mut dyn InstanceRenderer) {
        if self.flakes.is_empty() {
            return;
        }
        debug_assert_eq!(
            renderer.batch_len(self.batch),
            Some(self.flakes.len()),
            "snow flakes and instance batch disagree in length"
        );
        let field = Quat::from_rotation_y(self.rotation);
        let scale = Vec3::splat(self.config.flake_size);
        for (i, &flake) in self.flakes.iter().enumerate() {
            renderer.set_transform(self.batch, i, field * flake, Quat::IDENTITY, scale);
        }
        renderer.mark_dirty(self.batch);
    }
}

impl Animate for Snow {
    fn step(&mut self, _mode: Mode, frame: FrameTime, renderer: &mut dyn InstanceRenderer) {
        Snow::step(self, frame, renderer);
    }
}

fn spread<R: Rng + ?Sized>(config: &SnowConfig, rng: &mut R) -> (f32, f32) {
    let e = config.half_extent;
    (sample_range(rng, -e, e), sample_range(rng, -e, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::InstanceBuffers;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_spawn_within_box() {
        let mut buffers = InstanceBuffers::new();
        let snow = Snow::new(SnowConfig::default(), 600, 5, &mut buffers).unwrap();
        assert_eq!(snow.len(), 600);

        for flake in snow.flakes() {
            assert!(flake.x.abs() <= 12.5 && flake.z.abs() <= 12.5);
            assert!(flake.y >= -5.0 && flake.y <= 15.0);
        }
    }

    #[test]
    fn test_flakes_stay_in_band() {
        let mut buffers = InstanceBuffers::new();
        let mut snow = Snow::new(SnowConfig::default(), 200, 6, &mut buffers).unwrap();

        // 40 simulated seconds: every flake wraps at least once
        for frame in 1..2400 {
            snow.step(FrameTime::new(frame as f32 * DT, DT), &mut buffers);
            for flake in snow.flakes() {
                assert!(flake.y >= -5.0 && flake.y <= 15.0, "flake at y = {}", flake.y);
            }
        }
    }

    #[test]
    fn test_fall_rate() {
        let mut buffers = InstanceBuffers::new();
        let config = SnowConfig {
            floor: -1000.0,
            ..SnowConfig::default()
        };
        let mut snow = Snow::new(config, 50, 7, &mut buffers).unwrap();
        let before: Vec<f32> = snow.flakes().iter().map(|f| f.y).collect();

        snow.step(FrameTime::new(0.5, 0.5), &mut buffers);
        for (flake, y) in snow.flakes().iter().zip(before) {
            let fallen = y - flake.y;
            assert!((0.6 - 1e-4..=0.9 + 1e-4).contains(&fallen), "fell {fallen}");
        }
    }

    #[test]
    fn test_field_rotates_and_ignores_mode() {
        let mut buffers = InstanceBuffers::new();
        let mut a = Snow::new(SnowConfig::default(), 20, 8, &mut buffers).unwrap();
        let mut b = Snow::new(SnowConfig::default(), 20, 8, &mut buffers).unwrap();

        for frame in 1..=100 {
            let ft = FrameTime::new(frame as f32 * DT, DT);
            Animate::step(&mut a, Mode::Assembled, ft, &mut buffers);
            Animate::step(&mut b, Mode::Scattered, ft, &mut buffers);
        }
        assert_eq!(a.flakes(), b.flakes());
        assert!((a.rotation() - 0.1).abs() < 1e-4);

        let instances = buffers.instances(a.batch()).unwrap();
        let field = Quat::from_rotation_y(a.rotation());
        assert!(instances[0].position().abs_diff_eq(field * a.flakes()[0], 1e-5));
    }

    #[test]
    fn test_zero_delta_is_idempotent() {
        let mut buffers = InstanceBuffers::new();
        let mut paused = Snow::new(SnowConfig::default(), 50, 3, &mut buffers).unwrap();
        let mut running = Snow::new(SnowConfig::default(), 50, 3, &mut buffers).unwrap();

        let before = paused.flakes().to_vec();
        paused.step(FrameTime::new(0.0, 0.0), &mut buffers);
        assert_eq!(paused.flakes(), before.as_slice());
        assert_eq!(paused.rotation(), 0.0);

        paused.step(FrameTime::new(0.1, 0.1), &mut buffers);
        running.step(FrameTime::new(0.1, 0.1), &mut buffers);
        assert_eq!(paused.flakes(), running.flakes());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "disagree in length")]
    fn test_length_mismatch_panics() {
        let mut buffers = InstanceBuffers::new();
        let mut snow = Snow::new(SnowConfig::default(), 10, 1, &mut buffers).unwrap();
        snow.batch = buffers.allocate_batch(2, GeometryKind::PointSprite).unwrap();
        snow.step(FrameTime::new(0.1, 0.1), &mut buffers);
    }

    #[test]
    fn test_empty_field() {
        let mut buffers = InstanceBuffers::new();
        let mut snow = Snow::new(SnowConfig::default(), 0, 0, &mut buffers).unwrap();
        snow.step(FrameTime::new(1.0, DT), &mut buffers);
        assert!(snow.is_empty());
        assert_eq!(buffers.write_count(snow.batch()), 0);
    }
}
