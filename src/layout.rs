//! Procedural layout generation.
//!
//! Targets for both formations are computed once per element when a tier is
//! built. The tree silhouette is a stack of frustum layers; each sample picks
//! a layer, a height within it, and a point on (or near) the tapered surface.
//! The scatter formation is a thick spherical shell lifted above the base.
//!
//! Sampling is split into *draw* (consume randomness) and *place* (pure
//! geometry) so placement can be checked with fixed draws.

use std::f32::consts::TAU;

use glam::{EulerRot, Quat, Vec3};
use rand::Rng;

use crate::error::ConfigError;

/// One frustum band of the tree silhouette.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerProfile {
    /// Y of the band's base.
    pub bottom_y: f32,
    /// Vertical extent of the band.
    pub height: f32,
    /// Radius at the band's base; it tapers linearly to zero at the top.
    pub base_width: f32,
}

impl LayerProfile {
    pub const fn new(bottom_y: f32, height: f32, base_width: f32) -> Self {
        Self {
            bottom_y,
            height,
            base_width,
        }
    }

    /// Surface radius at height fraction `h`.
    #[inline]
    pub fn radius_at(&self, h: f32) -> f32 {
        self.base_width * (1.0 - h)
    }
}

/// Validated, ordered stack of layers, bottom first.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeProfile {
    layers: Vec<LayerProfile>,
}

impl TreeProfile {
    /// Validate and wrap a layer stack.
    pub fn new(layers: Vec<LayerProfile>) -> Result<Self, ConfigError> {
        if layers.is_empty() {
            return Err(ConfigError::EmptyProfile);
        }
        for (index, layer) in layers.iter().enumerate() {
            if !(layer.bottom_y.is_finite() && layer.height.is_finite() && layer.base_width.is_finite()) {
                return Err(ConfigError::InvalidLayer {
                    index,
                    reason: "dimensions must be finite",
                });
            }
            if layer.height < 0.0 {
                return Err(ConfigError::InvalidLayer {
                    index,
                    reason: "height must not be negative",
                });
            }
            if layer.base_width < 0.0 {
                return Err(ConfigError::InvalidLayer {
                    index,
                    reason: "width must not be negative",
                });
            }
        }
        Ok(Self { layers })
    }

    pub fn layers(&self) -> &[LayerProfile] {
        &self.layers
    }

    /// Lowest layer base.
    pub fn min_y(&self) -> f32 {
        self.layers.iter().map(|l| l.bottom_y).fold(f32::INFINITY, f32::min)
    }

    /// Highest layer top.
    pub fn max_y(&self) -> f32 {
        self.layers
            .iter()
            .map(|l| l.bottom_y + l.height)
            .fold(f32::NEG_INFINITY, f32::max)
    }
}

impl Default for TreeProfile {
    /// Four overlapping bands spanning y = 0.5 to 6.0.
    fn default() -> Self {
        Self {
            layers: vec![
                LayerProfile::new(0.5, 2.0, 2.2),
                LayerProfile::new(2.0, 1.8, 1.8),
                LayerProfile::new(3.5, 1.5, 1.4),
                LayerProfile::new(4.8, 1.2, 1.0),
            ],
        }
    }
}

/// Radial placement relative to the layer surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RadialSpread {
    /// Fixed multiple of the surface radius.
    Fixed(f32),
    /// Uniform multiple in `min..max`.
    Shell { min: f32, max: f32 },
}

impl RadialSpread {
    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        match *self {
            RadialSpread::Fixed(k) => k,
            RadialSpread::Shell { min, max } => sample_range(rng, min, max),
        }
    }
}

/// How a tier places elements on the tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeSampling {
    /// Height fractions are drawn from `[0, max_height_fraction)`.
    pub max_height_fraction: f32,
    /// Radial multiplier on the surface radius.
    pub radial: RadialSpread,
    /// Maximum random tilt about X and Z; `None` leaves orientation identity.
    pub tilt: Option<f32>,
}

impl TreeSampling {
    /// Needles: full height, biased to the outer shell for a crisp silhouette.
    pub fn needles() -> Self {
        Self {
            max_height_fraction: 1.0,
            radial: RadialSpread::Shell { min: 0.8, max: 1.1 },
            tilt: None,
        }
    }

    /// Ornaments: exactly on the surface.
    pub fn ornaments() -> Self {
        Self {
            max_height_fraction: 1.0,
            radial: RadialSpread::Fixed(1.0),
            tilt: None,
        }
    }

    /// Gifts: lower 90% of each band, nested slightly inward, tilted.
    pub fn gifts() -> Self {
        Self {
            max_height_fraction: 0.9,
            radial: RadialSpread::Fixed(0.85),
            tilt: Some(0.5),
        }
    }
}

/// Spherical shell for the scatter formation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterBand {
    pub min_radius: f32,
    pub max_radius: f32,
    /// Vertical offset of the shell's center.
    pub lift: f32,
}

impl ScatterBand {
    pub const fn new(min_radius: f32, max_radius: f32, lift: f32) -> Self {
        Self {
            min_radius,
            max_radius,
            lift,
        }
    }

    pub fn needles() -> Self {
        Self::new(10.0, 20.0, 5.0)
    }

    pub fn ornaments() -> Self {
        Self::new(8.0, 16.0, 4.0)
    }

    pub fn gifts() -> Self {
        Self::new(6.0, 12.0, 3.0)
    }
}

/// Random draws behind one assembled placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeDraw {
    pub layer: usize,
    /// Height fraction within the layer.
    pub h: f32,
    /// Angle around the trunk.
    pub theta: f32,
    /// Radial multiplier.
    pub k: f32,
}

/// Assembled target of one element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreePlacement {
    pub position: Vec3,
    pub orientation: Quat,
    /// Euler XYZ angles the orientation was built from.
    pub euler: Vec3,
}

/// Draw the randomness for one assembled placement.
pub fn draw_tree<R: Rng + ?Sized>(profile: &TreeProfile, sampling: &TreeSampling, rng: &mut R) -> TreeDraw {
    let layer = rng.gen_range(0..profile.layers().len());
    let h = rng.gen::<f32>() * sampling.max_height_fraction;
    let k = sampling.radial.draw(rng);
    let theta = rng.gen::<f32>() * TAU;
    TreeDraw { layer, h, theta, k }
}

/// Position on the tree for a given layer and draw.
pub fn place_on_layer(layer: &LayerProfile, h: f32, theta: f32, k: f32) -> Vec3 {
    let y = layer.bottom_y + h * layer.height;
    let r = layer.radius_at(h) * k;
    Vec3::new(r * theta.cos(), y, r * theta.sin())
}

/// Sample one complete assembled placement.
pub fn sample_tree<R: Rng + ?Sized>(profile: &TreeProfile, sampling: &TreeSampling, rng: &mut R) -> TreePlacement {
    let draw = draw_tree(profile, sampling, rng);
    let position = place_on_layer(&profile.layers()[draw.layer], draw.h, draw.theta, draw.k);

    let euler = match sampling.tilt {
        Some(tilt) => Vec3::new(rng.gen::<f32>() * tilt, rng.gen::<f32>() * TAU, rng.gen::<f32>() * tilt),
        None => Vec3::ZERO,
    };

    TreePlacement {
        position,
        orientation: euler_quat(euler),
        euler,
    }
}

/// Point on a shell for fixed draws `u, v` in `[0, 1)` and radius `r`.
pub fn place_on_shell(u: f32, v: f32, r: f32, lift: f32) -> Vec3 {
    let theta = TAU * u;
    let phi = (2.0 * v - 1.0).clamp(-1.0, 1.0).acos();
    Vec3::new(
        r * phi.sin() * theta.cos(),
        lift + r * phi.sin() * theta.sin(),
        r * phi.cos(),
    )
}

/// Sample a scattered position, uniform in direction over the shell.
pub fn sample_scatter<R: Rng + ?Sized>(band: &ScatterBand, rng: &mut R) -> Vec3 {
    let u = rng.gen::<f32>();
    let v = rng.gen::<f32>();
    let r = sample_range(rng, band.min_radius, band.max_radius);
    place_on_shell(u, v, r, band.lift)
}

/// Quaternion for intrinsic XYZ Euler angles.
#[inline]
pub fn euler_quat(euler: Vec3) -> Quat {
    Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z)
}

/// Uniform draw from `min..max`, or `min` when the range is empty.
pub(crate) fn sample_range<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max > min {
        rng.gen_range(min..max)
    } else {
        min
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_profile_validation() {
        assert_eq!(TreeProfile::new(vec![]), Err(ConfigError::EmptyProfile));
        assert!(matches!(
            TreeProfile::new(vec![LayerProfile::new(0.0, -1.0, 1.0)]),
            Err(ConfigError::InvalidLayer { index: 0, .. })
        ));
        assert!(matches!(
            TreeProfile::new(vec![LayerProfile::new(0.0, 1.0, 1.0), LayerProfile::new(f32::NAN, 1.0, 1.0)]),
            Err(ConfigError::InvalidLayer { index: 1, .. })
        ));
    }

    #[test]
    fn test_default_profile_extent() {
        let profile = TreeProfile::default();
        assert_eq!(profile.layers().len(), 4);
        assert!((profile.min_y() - 0.5).abs() < 1e-6);
        assert!((profile.max_y() - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_place_on_layer_half_height() {
        let layer = LayerProfile::new(0.0, 1.0, 1.0);
        let pos = place_on_layer(&layer, 0.5, 0.0, 0.9);
        assert!((pos.x - 0.45).abs() < 1e-6);
        assert!((pos.y - 0.5).abs() < 1e-6);
        assert!(pos.z.abs() < 1e-6);
    }

    #[test]
    fn test_tree_samples_within_silhouette() {
        let profile = TreeProfile::default();
        let mut rng = SmallRng::seed_from_u64(1);

        for sampling in [TreeSampling::needles(), TreeSampling::ornaments(), TreeSampling::gifts()] {
            for _ in 0..2000 {
                let draw = draw_tree(&profile, &sampling, &mut rng);
                let layer = profile.layers()[draw.layer];
                let pos = place_on_layer(&layer, draw.h, draw.theta, draw.k);

                assert!(draw.h >= 0.0 && draw.h <= sampling.max_height_fraction);
                assert!(pos.y >= profile.min_y() && pos.y <= profile.max_y());

                let radial = Vec3::new(pos.x, 0.0, pos.z).length();
                assert!(radial <= layer.base_width * 1.1 + 1e-4);
            }
        }
    }

    #[test]
    fn test_gift_tilt_bounds() {
        let profile = TreeProfile::default();
        let mut rng = SmallRng::seed_from_u64(2);
        for _ in 0..500 {
            let placement = sample_tree(&profile, &TreeSampling::gifts(), &mut rng);
            assert!(placement.euler.x >= 0.0 && placement.euler.x <= 0.5);
            assert!(placement.euler.z >= 0.0 && placement.euler.z <= 0.5);
            assert!(placement.euler.y >= 0.0 && placement.euler.y <= TAU);
            assert!(placement.orientation.is_normalized());
        }
    }

    #[test]
    fn test_untilted_orientation_is_identity() {
        let profile = TreeProfile::default();
        let mut rng = SmallRng::seed_from_u64(3);
        let placement = sample_tree(&profile, &TreeSampling::ornaments(), &mut rng);
        assert_eq!(placement.orientation, Quat::IDENTITY);
    }

    #[test]
    fn test_scatter_within_band() {
        let band = ScatterBand::needles();
        let mut rng = SmallRng::seed_from_u64(4);
        for _ in 0..2000 {
            let pos = sample_scatter(&band, &mut rng);
            let d = (pos - Vec3::new(0.0, band.lift, 0.0)).length();
            assert!(d >= band.min_radius - 1e-3 && d < band.max_radius + 1e-3, "distance {d}");
        }
    }

    #[test]
    fn test_scatter_is_centered() {
        // Inverse-transform sampling covers both hemispheres evenly
        let band = ScatterBand::gifts();
        let mut rng = SmallRng::seed_from_u64(5);
        let n = 5000;
        let mean = (0..n).map(|_| sample_scatter(&band, &mut rng)).sum::<Vec3>() / n as f32;
        assert!(mean.x.abs() < 0.5);
        assert!((mean.y - band.lift).abs() < 0.5);
        assert!(mean.z.abs() < 0.5);
    }

    #[test]
    fn test_place_on_shell_poles() {
        let top = place_on_shell(0.0, 1.0 - f32::EPSILON, 2.0, 0.0);
        assert!((top.z - 2.0).abs() < 1e-3);
        let bottom = place_on_shell(0.0, 0.0, 2.0, 0.0);
        assert!((bottom.z + 2.0).abs() < 1e-3);
    }
}
