//! Theme colors and weighted palettes.
//!
//! Each tier draws one color per element at construction time from a
//! [`WeightedPalette`]. Colors are stored in linear RGB; the theme constants
//! are authored as sRGB hex values.

use glam::Vec3;
use rand::Rng;

use crate::error::ConfigError;

/// Convert an sRGB hex color (`0xRRGGBB`) to linear RGB.
pub fn srgb_hex(hex: u32) -> Vec3 {
    let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xFF) as f32 / 255.0);
    Vec3::new(channel(16), channel(8), channel(0))
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Scene theme colors.
pub mod theme {
    use super::srgb_hex;
    use glam::Vec3;

    /// Needle green.
    pub fn emerald() -> Vec3 {
        srgb_hex(0x0B6623)
    }

    /// Dark needle green, also the background.
    pub fn deep_emerald() -> Vec3 {
        srgb_hex(0x002B16)
    }

    pub fn gold() -> Vec3 {
        srgb_hex(0xFFD700)
    }

    pub fn red() -> Vec3 {
        srgb_hex(0xD42426)
    }

    pub fn champagne() -> Vec3 {
        srgb_hex(0xF7E7CE)
    }

    /// Gift wrap crimson.
    pub fn crimson() -> Vec3 {
        srgb_hex(0xC41E3A)
    }

    /// Gift wrap antique gold.
    pub fn antique_gold() -> Vec3 {
        srgb_hex(0xD6AF36)
    }

    pub fn bark() -> Vec3 {
        srgb_hex(0x3D2817)
    }

    pub fn snow() -> Vec3 {
        Vec3::ONE
    }
}

/// A palette whose entries are drawn with relative probabilities.
///
/// Weights need not sum to one; they are normalized on sampling.
///
/// ```ignore
/// let palette = WeightedPalette::new(vec![
///     (theme::red(), 0.2),
///     (theme::champagne(), 0.4),
///     (theme::gold(), 0.4),
/// ])?;
/// let color = palette.pick(&mut rng);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedPalette {
    entries: Vec<(Vec3, f32)>,
    total: f32,
}

impl WeightedPalette {
    /// Build a palette, rejecting empty lists and bad weights.
    pub fn new(entries: Vec<(Vec3, f32)>) -> Result<Self, ConfigError> {
        if entries.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        for (index, &(_, weight)) in entries.iter().enumerate() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::InvalidWeight { index, weight });
            }
        }
        let total: f32 = entries.iter().map(|(_, w)| w).sum();
        if total <= 0.0 {
            return Err(ConfigError::InvalidWeight { index: 0, weight: total });
        }
        Ok(Self { entries, total })
    }

    /// Palette with a single color.
    pub fn solid(color: Vec3) -> Self {
        Self {
            entries: vec![(color, 1.0)],
            total: 1.0,
        }
    }

    /// Needles: 40% deep emerald, 30% emerald, 15% red, 15% gold.
    pub fn needles() -> Self {
        Self::from_preset(vec![
            (theme::deep_emerald(), 0.40),
            (theme::emerald(), 0.30),
            (theme::red(), 0.15),
            (theme::gold(), 0.15),
        ])
    }

    /// Ornaments: 20% red, 40% champagne, 40% gold.
    pub fn ornaments() -> Self {
        Self::from_preset(vec![
            (theme::red(), 0.20),
            (theme::champagne(), 0.40),
            (theme::gold(), 0.40),
        ])
    }

    /// Gifts: saturated reds and golds, evenly weighted.
    pub fn gifts() -> Self {
        Self::from_preset(vec![
            (theme::red(), 0.25),
            (theme::gold(), 0.25),
            (theme::crimson(), 0.25),
            (theme::antique_gold(), 0.25),
        ])
    }

    fn from_preset(entries: Vec<(Vec3, f32)>) -> Self {
        let total = entries.iter().map(|(_, w)| w).sum();
        Self { entries, total }
    }

    /// Entries as `(color, weight)` pairs.
    pub fn entries(&self) -> &[(Vec3, f32)] {
        &self.entries
    }

    /// Draw one color.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        self.pick_at(rng.gen::<f32>())
    }

    /// Color at cumulative fraction `t` in `[0, 1)`.
    pub fn pick_at(&self, t: f32) -> Vec3 {
        let mut remaining = t * self.total;
        for &(color, weight) in &self.entries {
            if remaining < weight {
                return color;
            }
            remaining -= weight;
        }
        // Rounding can leave `remaining` just past the last cutoff
        self.entries[self.entries.len() - 1].0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_srgb_hex() {
        assert!(srgb_hex(0xFFFFFF).abs_diff_eq(Vec3::ONE, 1e-5));
        assert_eq!(srgb_hex(0x000000), Vec3::ZERO);

        let red = srgb_hex(0xFF0000);
        assert!((red.x - 1.0).abs() < 1e-6);
        assert_eq!(red.y, 0.0);

        // Mid-gray is darker in linear space
        let gray = srgb_hex(0x808080);
        assert!((gray.x - 0.2158).abs() < 0.001);
    }

    #[test]
    fn test_pick_at_cutoffs() {
        let palette = WeightedPalette::needles();
        assert_eq!(palette.pick_at(0.0), theme::deep_emerald());
        assert_eq!(palette.pick_at(0.39), theme::deep_emerald());
        assert_eq!(palette.pick_at(0.41), theme::emerald());
        assert_eq!(palette.pick_at(0.71), theme::red());
        assert_eq!(palette.pick_at(0.86), theme::gold());
        assert_eq!(palette.pick_at(0.999_999), theme::gold());
    }

    #[test]
    fn test_pick_frequencies() {
        let palette = WeightedPalette::ornaments();
        let mut rng = SmallRng::seed_from_u64(7);
        let samples = 20_000;

        let reds = (0..samples)
            .filter(|_| palette.pick(&mut rng) == theme::red())
            .count();
        let fraction = reds as f32 / samples as f32;
        assert!((fraction - 0.2).abs() < 0.02, "red fraction {fraction}");
    }

    #[test]
    fn test_new_rejects_bad_input() {
        assert_eq!(WeightedPalette::new(vec![]), Err(ConfigError::EmptyPalette));
        assert!(matches!(
            WeightedPalette::new(vec![(Vec3::ONE, -1.0)]),
            Err(ConfigError::InvalidWeight { index: 0, .. })
        ));
        assert!(WeightedPalette::new(vec![(Vec3::ONE, 0.0), (Vec3::ZERO, 0.0)]).is_err());
        assert!(WeightedPalette::new(vec![(Vec3::ONE, 0.0), (Vec3::ZERO, 2.0)]).is_ok());
    }

    #[test]
    fn test_zero_weight_entry_never_picked() {
        let palette = WeightedPalette::new(vec![(Vec3::X, 0.0), (Vec3::Y, 1.0)]).unwrap();
        assert_eq!(palette.pick_at(0.0), Vec3::Y);
    }
}
