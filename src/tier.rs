//! Tiered particle animator.
//!
//! A [`ParticleTier`] is one visual class of element: fine needles, mid-weight
//! ornaments or heavy gifts. All three share the same update rule and differ
//! only in their [`TierConfig`]: base speed, per-element inertia, palette,
//! placement, and how orientation is handled.
//!
//! | Tier | Geometry | Base speed | Orientation | Drift |
//! |------|----------|------------|-------------|-------|
//! | [`needles`](TierConfig::needles) | point sprite | 4.0 | tumble | yes |
//! | [`ornaments`](TierConfig::ornaments) | sphere | 2.5 | shimmer | no |
//! | [`gifts`](TierConfig::gifts) | box | 1.5 | tumble | no |
//!
//! Lighter tiers converge faster, so the needles snap into shape first and the
//! gifts lag behind.
//!
//! # Example
//!
//! ```ignore
//! let profile = TreeProfile::default();
//! let mut rng = SmallRng::seed_from_u64(42);
//! let mut buffers = InstanceBuffers::new();
//!
//! let mut gifts = ParticleTier::new(TierConfig::gifts(), &profile, 40, &mut rng, &mut buffers)?;
//! gifts.step(Mode::Scattered, FrameTime::new(0.016, 0.016), &mut buffers);
//! ```

use std::ops::Range;

use glam::Vec3;
use rand::Rng;

use crate::error::{ConfigError, SceneError};
use crate::frame::{Animate, FrameTime};
use crate::layout::{euler_quat, sample_range, sample_scatter, sample_tree, RadialSpread, ScatterBand, TreeProfile, TreeSampling};
use crate::mode::Mode;
use crate::palette::WeightedPalette;
use crate::particle::{approach, approach_rotation, step_factor, ParticleRecord};
use crate::render::{BatchHandle, GeometryKind, InstanceRenderer};

/// How a tier treats element orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrientationMode {
    /// Orientation is never touched.
    Static,
    /// Settle to the resting orientation when assembled; tumble while
    /// scattered, with elapsed time added to each Euler axis of the target.
    Tumble,
    /// Spin continuously about X and Y at `rate` rad/s, in either mode.
    Shimmer { rate: f32 },
}

/// Tuning of one tier.
#[derive(Debug, Clone, PartialEq)]
pub struct TierConfig {
    /// Name used in logs.
    pub name: &'static str,
    pub geometry: GeometryKind,
    /// Convergence rate in 1/s before the per-element multiplier.
    pub base_speed: f32,
    /// Per-element speed multiplier range.
    pub speed_factor: Range<f32>,
    /// Per-element visual scale range.
    pub scale: Range<f32>,
    pub palette: WeightedPalette,
    pub tree: TreeSampling,
    pub scatter: ScatterBand,
    pub orientation: OrientationMode,
    /// Vertical drift amplitude (units/s) applied only while scattered.
    pub drift: Option<f32>,
}

impl TierConfig {
    /// Fine glowing points. Light and fast.
    ///
    /// Needles tumble like the other tiers so renderers that orient sprites
    /// can use it; the bundled viewer billboards them and ignores orientation.
    pub fn needles() -> Self {
        Self {
            name: "needles",
            geometry: GeometryKind::PointSprite,
            base_speed: 4.0,
            speed_factor: 1.0..1.0,
            scale: 0.5..1.0,
            palette: WeightedPalette::needles(),
            tree: TreeSampling::needles(),
            scatter: ScatterBand::needles(),
            orientation: OrientationMode::Tumble,
            drift: Some(0.12),
        }
    }

    /// Shiny baubles. Medium weight with a constant shimmer spin.
    pub fn ornaments() -> Self {
        Self {
            name: "ornaments",
            geometry: GeometryKind::Sphere,
            base_speed: 2.5,
            speed_factor: 1.0..1.0,
            scale: 0.08..0.18,
            palette: WeightedPalette::ornaments(),
            tree: TreeSampling::ornaments(),
            scatter: ScatterBand::ornaments(),
            orientation: OrientationMode::Shimmer { rate: 0.6 },
            drift: None,
        }
    }

    /// Gift boxes. Heavy, each with its own inertia.
    pub fn gifts() -> Self {
        Self {
            name: "gifts",
            geometry: GeometryKind::Box,
            base_speed: 1.5,
            speed_factor: 0.5..1.0,
            scale: 0.15..0.30,
            palette: WeightedPalette::gifts(),
            tree: TreeSampling::gifts(),
            scatter: ScatterBand::gifts(),
            orientation: OrientationMode::Tumble,
            drift: None,
        }
    }

    pub fn with_base_speed(mut self, speed: f32) -> Self {
        self.base_speed = speed;
        self
    }

    pub fn with_speed_factor(mut self, range: Range<f32>) -> Self {
        self.speed_factor = range;
        self
    }

    pub fn with_scale(mut self, range: Range<f32>) -> Self {
        self.scale = range;
        self
    }

    pub fn with_palette(mut self, palette: WeightedPalette) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_tree_sampling(mut self, tree: TreeSampling) -> Self {
        self.tree = tree;
        self
    }

    pub fn with_scatter(mut self, scatter: ScatterBand) -> Self {
        self.scatter = scatter;
        self
    }

    pub fn with_orientation(mut self, orientation: OrientationMode) -> Self {
        self.orientation = orientation;
        self
    }

    /// `None` disables drift.
    pub fn with_drift(mut self, drift: Option<f32>) -> Self {
        self.drift = drift;
        self
    }

    /// Reject values that would break the update rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_speed.is_finite() || self.base_speed <= 0.0 {
            return Err(ConfigError::InvalidSpeed {
                what: "base speed",
                value: self.base_speed,
            });
        }
        check_range("speed factor", self.speed_factor.start, self.speed_factor.end)?;
        if self.speed_factor.start <= 0.0 {
            return Err(ConfigError::InvalidSpeed {
                what: "speed factor",
                value: self.speed_factor.start,
            });
        }
        check_range("scale", self.scale.start, self.scale.end)?;
        check_range("scatter radius", self.scatter.min_radius, self.scatter.max_radius)?;
        check_range("height fraction", 0.0, self.tree.max_height_fraction)?;
        if self.tree.max_height_fraction > 1.0 {
            return Err(ConfigError::InvalidRange {
                what: "height fraction",
                min: 0.0,
                max: self.tree.max_height_fraction,
            });
        }
        if let RadialSpread::Shell { min, max } = self.tree.radial {
            check_range("radial spread", min, max)?;
        }
        if let OrientationMode::Shimmer { rate } = self.orientation {
            if !rate.is_finite() {
                return Err(ConfigError::InvalidSpeed { what: "shimmer rate", value: rate });
            }
        }
        if let Some(drift) = self.drift {
            if !drift.is_finite() {
                return Err(ConfigError::InvalidSpeed { what: "drift", value: drift });
            }
        }
        Ok(())
    }
}

fn check_range(what: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    if min.is_finite() && max.is_finite() && min >= 0.0 && min <= max {
        Ok(())
    } else {
        Err(ConfigError::InvalidRange { what, min, max })
    }
}

/// One tier of animated elements and its instance batch.
#[derive(Debug)]
pub struct ParticleTier {
    config: TierConfig,
    records: Vec<ParticleRecord>,
    batch: BatchHandle,
}

impl ParticleTier {
    /// Generate `count` elements and allocate their instance batch.
    ///
    /// Fails if the config is invalid or the renderer cannot allocate.
    pub fn new<R: Rng + ?Sized>(
        config: TierConfig,
        profile: &TreeProfile,
        count: usize,
        rng: &mut R,
        renderer: &mut dyn InstanceRenderer,
    ) -> Result<Self, SceneError> {
        config.validate()?;
        let records = generate(&config, profile, count, rng);
        let batch = renderer.allocate_batch(count, config.geometry)?;

        let tier = Self { config, records, batch };
        tier.write_initial(renderer);
        log::debug!("built {} tier: {} elements", tier.config.name, count);
        Ok(tier)
    }

    /// Re-seed with a new element count.
    ///
    /// Targets are regenerated for every element. On failure the tier keeps
    /// its previous records and batch.
    pub fn resize<R: Rng + ?Sized>(
        &mut self,
        count: usize,
        profile: &TreeProfile,
        rng: &mut R,
        renderer: &mut dyn InstanceRenderer,
    ) -> Result<(), SceneError> {
        let records = generate(&self.config, profile, count, rng);
        let batch = renderer.allocate_batch(count, self.config.geometry)?;
        renderer.release_batch(self.batch);

        self.records = records;
        self.batch = batch;
        self.write_initial(renderer);
        log::debug!("resized {} tier to {} elements", self.config.name, count);
        Ok(())
    }

    /// Free the instance batch. The tier cannot be stepped afterwards.
    pub fn release(self, renderer: &mut dyn InstanceRenderer) {
        renderer.release_batch(self.batch);
        log::debug!("released {} tier", self.config.name);
    }

    pub fn config(&self) -> &TierConfig {
        &self.config
    }

    pub fn records(&self) -> &[ParticleRecord] {
        &self.records
    }

    pub fn batch(&self) -> BatchHandle {
        self.batch
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Largest distance between an element and its target for `mode`.
    pub fn max_offset(&self, mode: Mode) -> f32 {
        self.records
            .iter()
            .map(|r| r.distance_to(mode.select(r.assembled_position, r.scattered_position)))
            .fold(0.0, f32::max)
    }

    fn write_initial(&self, renderer: &mut dyn InstanceRenderer) {
        if self.records.is_empty() {
            return;
        }
        for (i, record) in self.records.iter().enumerate() {
            renderer.set_color(self.batch, i, record.color);
            renderer.set_transform(
                self.batch,
                i,
                record.current_position,
                record.current_orientation,
                Vec3::splat(record.visual_scale),
            );
        }
        renderer.mark_dirty(self.batch);
    }

    /// Advance every element one frame.
    pub fn step(&mut self, mode: Mode, frame: FrameTime, renderer: &mut dyn InstanceRenderer) {
        if self.records.is_empty() {
            return;
        }
        debug_assert_eq!(
            renderer.batch_len(self.batch),
            Some(self.records.len()),
            "{} tier records and instance batch disagree in length",
            self.config.name
        );

        let FrameTime { elapsed, delta } = frame;
        let base_speed = self.config.base_speed;
        let drift = match mode {
            Mode::Scattered => self.config.drift,
            Mode::Assembled => None,
        };
        let tumble = Vec3::splat(elapsed);
        // Shared scattered target for untilted elements (every needle)
        let untilted = euler_quat(tumble);

        for (i, record) in self.records.iter_mut().enumerate() {
            let factor = step_factor(base_speed * record.speed_factor, delta);

            let target = mode.select(record.assembled_position, record.scattered_position);
            record.current_position = approach(record.current_position, target, factor);

            if let Some(amplitude) = drift {
                record.current_position.y += (elapsed + i as f32).sin() * amplitude * delta;
            }

            match self.config.orientation {
                OrientationMode::Static => {}
                OrientationMode::Tumble => {
                    let target = match mode {
                        Mode::Assembled => record.assembled_orientation,
                        Mode::Scattered if record.scattered_euler == Vec3::ZERO => untilted,
                        Mode::Scattered => euler_quat(record.scattered_euler + tumble),
                    };
                    record.current_orientation = approach_rotation(record.current_orientation, target, factor);
                }
                OrientationMode::Shimmer { rate } => {
                    let angle = rate * delta;
                    if angle != 0.0 {
                        let spin = euler_quat(Vec3::new(angle, angle, 0.0));
                        record.current_orientation = (record.current_orientation * spin).normalize();
                    }
                }
            }

            renderer.set_transform(
                self.batch,
                i,
                record.current_position,
                record.current_orientation,
                Vec3::splat(record.visual_scale),
            );
        }

        renderer.mark_dirty(self.batch);
    }
}

impl Animate for ParticleTier {
    fn step(&mut self, mode: Mode, frame: FrameTime, renderer: &mut dyn InstanceRenderer) {
        ParticleTier::step(self, mode, frame, renderer);
    }
}

fn generate<R: Rng + ?Sized>(config: &TierConfig, profile: &TreeProfile, count: usize, rng: &mut R) -> Vec<ParticleRecord> {
    (0..count)
        .map(|_| {
            let placement = sample_tree(profile, &config.tree, rng);
            let scattered_position = sample_scatter(&config.scatter, rng);
            let visual_scale = sample_range(rng, config.scale.start, config.scale.end);
            let color = config.palette.pick(rng);
            let speed_factor = sample_range(rng, config.speed_factor.start, config.speed_factor.end);

            ParticleRecord {
                assembled_position: placement.position,
                assembled_orientation: placement.orientation,
                scattered_position,
                scattered_euler: Vec3::new(placement.euler.x, placement.euler.y, 0.0),
                current_position: placement.position,
                current_orientation: placement.orientation,
                visual_scale,
                color,
                speed_factor,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayerProfile;
    use crate::render::InstanceBuffers;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    const DT: f32 = 1.0 / 60.0;

    fn build(config: TierConfig, count: usize) -> (ParticleTier, InstanceBuffers) {
        let mut buffers = InstanceBuffers::new();
        let mut rng = SmallRng::seed_from_u64(11);
        let tier = ParticleTier::new(config, &TreeProfile::default(), count, &mut rng, &mut buffers).unwrap();
        (tier, buffers)
    }

    #[test]
    fn test_records_start_assembled() {
        let (tier, buffers) = build(TierConfig::gifts(), 40);
        assert_eq!(tier.len(), 40);
        for record in tier.records() {
            assert_eq!(record.current_position, record.assembled_position);
            assert_eq!(record.current_orientation, record.assembled_orientation);
            assert!(record.speed_factor >= 0.5 && record.speed_factor < 1.0);
            assert!(record.visual_scale >= 0.15 && record.visual_scale < 0.30);
        }
        assert!(buffers.is_dirty(tier.batch()));
        assert_eq!(buffers.kind(tier.batch()), Some(GeometryKind::Box));
    }

    #[test]
    fn test_assembled_heights_within_profile() {
        let profile = TreeProfile::default();
        for config in [TierConfig::needles(), TierConfig::ornaments(), TierConfig::gifts()] {
            let (tier, _) = build(config, 500);
            for record in tier.records() {
                let y = record.assembled_position.y;
                assert!(y >= profile.min_y() && y <= profile.max_y(), "y = {y}");
            }
        }
    }

    #[test]
    fn test_zero_delta_is_idempotent() {
        for config in [TierConfig::needles(), TierConfig::ornaments(), TierConfig::gifts()] {
            let (mut tier, mut buffers) = build(config, 64);
            tier.step(Mode::Scattered, FrameTime::new(0.5, 0.25), &mut buffers);

            let before = tier.records().to_vec();
            tier.step(Mode::Scattered, FrameTime::new(0.5, 0.0), &mut buffers);
            assert_eq!(tier.records(), before.as_slice());

            tier.step(Mode::Assembled, FrameTime::new(0.5, 0.0), &mut buffers);
            assert_eq!(tier.records(), before.as_slice());
        }
    }

    #[test]
    fn test_distance_non_increasing() {
        let (mut tier, mut buffers) = build(TierConfig::gifts(), 40);
        let mut last: Vec<f32> = tier
            .records()
            .iter()
            .map(|r| r.distance_to(r.scattered_position))
            .collect();

        for frame in 1..300 {
            tier.step(Mode::Scattered, FrameTime::new(frame as f32 * DT, DT), &mut buffers);
            for (record, previous) in tier.records().iter().zip(last.iter_mut()) {
                let d = record.distance_to(record.scattered_position);
                assert!(d <= *previous, "distance grew from {} to {}", previous, d);
                *previous = d;
            }
        }
    }

    #[test]
    fn test_heavy_step_clamps_to_target() {
        let config = TierConfig::gifts().with_speed_factor(1.0..1.0);
        let (mut tier, mut buffers) = build(config, 5);

        tier.step(Mode::Scattered, FrameTime::new(1.0, 1.0), &mut buffers);
        for record in tier.records() {
            assert_eq!(record.current_position, record.scattered_position);
        }
    }

    #[test]
    fn test_round_trip_returns_to_tree() {
        let (mut tier, mut buffers) = build(TierConfig::ornaments(), 150);
        let mut t = 0.0;

        for _ in 0..600 {
            t += DT;
            tier.step(Mode::Scattered, FrameTime::new(t, DT), &mut buffers);
        }
        assert!(tier.max_offset(Mode::Scattered) < 1e-3);

        for _ in 0..600 {
            t += DT;
            tier.step(Mode::Assembled, FrameTime::new(t, DT), &mut buffers);
        }
        assert!(tier.max_offset(Mode::Assembled) < 1e-3);
    }

    #[test]
    fn test_lighter_tiers_settle_first() {
        let (mut needles, mut buffers) = build(TierConfig::needles().with_drift(None), 200);
        let mut rng = SmallRng::seed_from_u64(12);
        let profile = TreeProfile::default();
        let mut ornaments = ParticleTier::new(TierConfig::ornaments(), &profile, 200, &mut rng, &mut buffers).unwrap();
        let mut gifts = ParticleTier::new(TierConfig::gifts(), &profile, 200, &mut rng, &mut buffers).unwrap();

        let frames_to_settle = |tier: &mut ParticleTier, buffers: &mut InstanceBuffers| {
            let start = tier.max_offset(Mode::Scattered);
            (1..10_000)
                .find(|&n| {
                    tier.step(Mode::Scattered, FrameTime::new(n as f32 * DT, DT), buffers);
                    tier.max_offset(Mode::Scattered) < start * 0.01
                })
                .unwrap()
        };

        let n = frames_to_settle(&mut needles, &mut buffers);
        let o = frames_to_settle(&mut ornaments, &mut buffers);
        let g = frames_to_settle(&mut gifts, &mut buffers);
        assert!(n < o && o < g, "needles {n}, ornaments {o}, gifts {g}");
    }

    #[test]
    fn test_drift_only_when_scattered() {
        let (mut tier, mut buffers) = build(TierConfig::needles(), 16);

        // Assembled and already on target: nothing moves
        tier.step(Mode::Assembled, FrameTime::new(1.0, DT), &mut buffers);
        for record in tier.records() {
            assert_eq!(record.current_position, record.assembled_position);
        }

        // Snap to the scatter shell, then drift moves elements off it vertically
        tier.step(Mode::Scattered, FrameTime::new(1.0, 1.0), &mut buffers);
        tier.step(Mode::Scattered, FrameTime::new(1.1, 0.1), &mut buffers);
        let moved = tier
            .records()
            .iter()
            .filter(|r| r.current_position.y != r.scattered_position.y)
            .count();
        assert!(moved > 0);
        for record in tier.records() {
            assert!((record.current_position.y - record.scattered_position.y).abs() <= 0.12 + 1e-5);
            assert_eq!(record.current_position.x, record.scattered_position.x);
        }
    }

    #[test]
    fn test_shimmer_spins_in_both_modes() {
        let (mut tier, mut buffers) = build(TierConfig::ornaments(), 4);
        let start: Vec<_> = tier.records().iter().map(|r| r.current_orientation).collect();

        tier.step(Mode::Assembled, FrameTime::new(0.5, 0.5), &mut buffers);
        for (record, q) in tier.records().iter().zip(&start) {
            assert!(record.current_orientation.angle_between(*q) > 0.1);
        }
    }

    #[test]
    fn test_tumble_tracks_elapsed_while_scattered() {
        let config = TierConfig::gifts().with_speed_factor(1.0..1.0);
        let (mut tier, mut buffers) = build(config, 3);

        tier.step(Mode::Scattered, FrameTime::new(2.0, 1.0), &mut buffers);
        for record in tier.records() {
            let expected = euler_quat(record.scattered_euler + Vec3::splat(2.0));
            assert_eq!(record.current_orientation, expected);
        }

        tier.step(Mode::Assembled, FrameTime::new(3.0, 1.0), &mut buffers);
        for record in tier.records() {
            assert_eq!(record.current_orientation, record.assembled_orientation);
        }
    }

    #[test]
    fn test_untilted_needles_share_tumble() {
        let config = TierConfig::needles().with_drift(None);
        let (mut tier, mut buffers) = build(config, 20);
        assert!(tier.records().iter().all(|r| r.scattered_euler == Vec3::ZERO));

        tier.step(Mode::Scattered, FrameTime::new(1.5, 1.0), &mut buffers);
        let expected = euler_quat(Vec3::splat(1.5));
        for record in tier.records() {
            assert_eq!(record.current_orientation, expected);
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "disagree in length")]
    fn test_length_mismatch_panics() {
        let (mut tier, mut buffers) = build(TierConfig::ornaments(), 10);
        tier.batch = buffers.allocate_batch(3, GeometryKind::Sphere).unwrap();
        tier.step(Mode::Scattered, FrameTime::new(0.1, 0.1), &mut buffers);
    }

    #[test]
    fn test_step_writes_instance_buffer() {
        let (mut tier, mut buffers) = build(TierConfig::gifts(), 10);
        buffers.take_dirty();

        tier.step(Mode::Scattered, FrameTime::new(0.1, 0.1), &mut buffers);
        assert_eq!(buffers.take_dirty(), vec![tier.batch()]);

        let instances = buffers.instances(tier.batch()).unwrap();
        for (record, instance) in tier.records().iter().zip(instances) {
            assert_eq!(instance.position(), record.current_position);
            assert_eq!(instance.color(), record.color);
            assert_eq!(instance.scale(), Vec3::splat(record.visual_scale));
        }
    }

    #[test]
    fn test_empty_tier() {
        let (mut tier, mut buffers) = build(TierConfig::needles(), 0);
        assert!(tier.is_empty());

        tier.step(Mode::Scattered, FrameTime::new(1.0, DT), &mut buffers);
        assert_eq!(buffers.write_count(tier.batch()), 0);
        assert!(!buffers.is_dirty(tier.batch()));
        assert_eq!(tier.max_offset(Mode::Scattered), 0.0);
    }

    #[test]
    fn test_empty_profile_rejected() {
        assert!(matches!(TreeProfile::new(vec![]), Err(ConfigError::EmptyProfile)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut buffers = InstanceBuffers::new();
        let mut rng = SmallRng::seed_from_u64(0);
        let profile = TreeProfile::default();

        let bad = [
            TierConfig::needles().with_base_speed(0.0),
            TierConfig::needles().with_base_speed(f32::NAN),
            TierConfig::gifts().with_speed_factor(1.0..0.5),
            TierConfig::ornaments().with_scale(-1.0..1.0),
            TierConfig::ornaments().with_scatter(ScatterBand::new(5.0, 1.0, 0.0)),
            TierConfig::needles().with_drift(Some(f32::INFINITY)),
        ];
        for config in bad {
            let err = ParticleTier::new(config, &profile, 10, &mut rng, &mut buffers).unwrap_err();
            assert!(matches!(err, SceneError::Config(_)));
        }
        // Nothing was allocated for rejected configs
        assert_eq!(buffers.batch_count(), 0);
    }

    #[test]
    fn test_allocation_failure_propagates() {
        let mut buffers = InstanceBuffers::new().with_instance_limit(10);
        let mut rng = SmallRng::seed_from_u64(0);
        let err = ParticleTier::new(TierConfig::gifts(), &TreeProfile::default(), 40, &mut rng, &mut buffers).unwrap_err();
        assert!(matches!(err, SceneError::Render(_)));
    }

    #[test]
    fn test_resize_reseeds() {
        let (mut tier, mut buffers) = build(TierConfig::ornaments(), 10);
        let old_batch = tier.batch();
        let mut rng = SmallRng::seed_from_u64(99);

        tier.resize(25, &TreeProfile::default(), &mut rng, &mut buffers).unwrap();
        assert_eq!(tier.len(), 25);
        assert!(!buffers.contains(old_batch));
        assert_eq!(buffers.instances(tier.batch()).unwrap().len(), 25);
    }

    #[test]
    fn test_release_frees_batch() {
        let (tier, mut buffers) = build(TierConfig::needles(), 100);
        let batch = tier.batch();
        tier.release(&mut buffers);
        assert!(!buffers.contains(batch));
    }

    #[test]
    fn test_single_layer_profile() {
        let profile = TreeProfile::new(vec![LayerProfile::new(0.0, 1.0, 1.0)]).unwrap();
        let mut buffers = InstanceBuffers::new();
        let mut rng = SmallRng::seed_from_u64(3);
        let tier = ParticleTier::new(TierConfig::needles(), &profile, 2, &mut rng, &mut buffers).unwrap();

        for record in tier.records() {
            let p = record.assembled_position;
            let surface = 1.0 - p.y;
            let radial = Vec3::new(p.x, 0.0, p.z).length();
            assert!(radial >= surface * 0.8 - 1e-5 && radial <= surface * 1.1 + 1e-5);
        }
    }
}
