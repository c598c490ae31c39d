//! Viewer command line.

use clap::Parser;

use evergreen::{Mode, SceneConfig};

#[derive(Parser, Debug)]
#[command(name = "evergreen")]
#[command(about = "Morphing particle Christmas tree. Press Space to scatter or assemble.", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Seed for all placement randomness
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of needles
    #[arg(long, default_value_t = 5000)]
    pub needles: usize,

    /// Number of ornaments
    #[arg(long, default_value_t = 150)]
    pub ornaments: usize,

    /// Number of gifts
    #[arg(long, default_value_t = 40)]
    pub gifts: usize,

    /// Number of snowflakes
    #[arg(long, default_value_t = 600)]
    pub snow: usize,

    /// Start in the scattered formation
    #[arg(long)]
    pub scattered: bool,

    /// Animation speed multiplier
    #[arg(long, default_value_t = 1.0)]
    pub time_scale: f32,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn scene_config(&self) -> SceneConfig {
        let config = SceneConfig::default()
            .with_needles(self.needles)
            .with_ornaments(self.ornaments)
            .with_gifts(self.gifts)
            .with_snow(self.snow)
            .with_start_mode(if self.scattered { Mode::Scattered } else { Mode::Assembled });

        match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["evergreen"]);
        let config = cli.scene_config();
        assert_eq!(config.needle_count, 5000);
        assert_eq!(config.snow_count, 600);
        assert_eq!(config.seed, None);
        assert_eq!(config.start_mode, Mode::Assembled);
        assert_eq!(cli.time_scale, 1.0);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from(["evergreen", "--seed", "9", "--gifts", "3", "--scattered", "--time-scale", "0.5"]);
        let config = cli.scene_config();
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.gift_count, 3);
        assert_eq!(config.start_mode, Mode::Scattered);
        assert_eq!(cli.time_scale, 0.5);
    }
}
