//! The assembled scene.
//!
//! [`Scene`] builds every component from a [`SceneConfig`], owns the single
//! [`ModeController`], and steps the components once per frame in a fixed
//! order: trunk, needles, ornaments, gifts, topper, snow.
//!
//! ```ignore
//! let mut buffers = InstanceBuffers::new();
//! let mut scene = Scene::new(SceneConfig::default().with_seed(7), &mut buffers)?;
//! let mut clock = Clock::new();
//!
//! loop {
//!     scene.frame(clock.update(), &mut buffers);
//!     if space_pressed {
//!         scene.toggle_mode();
//!     }
//! }
//! ```

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::SceneError;
use crate::frame::{Animate, FrameTime};
use crate::layout::TreeProfile;
use crate::mode::{Mode, ModeController};
use crate::render::{BatchHandle, InstanceRenderer};
use crate::snow::{Snow, SnowConfig};
use crate::tier::{ParticleTier, TierConfig};
use crate::topper::{Topper, TopperConfig};
use crate::trunk::Trunk;

/// Everything needed to build a [`Scene`].
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub profile: TreeProfile,
    pub needles: TierConfig,
    pub ornaments: TierConfig,
    pub gifts: TierConfig,
    pub topper: TopperConfig,
    pub snow: SnowConfig,
    pub needle_count: usize,
    pub ornament_count: usize,
    pub gift_count: usize,
    pub snow_count: usize,
    /// Seed for all placement randomness; `None` seeds from the OS.
    pub seed: Option<u64>,
    pub start_mode: Mode,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            profile: TreeProfile::default(),
            needles: TierConfig::needles(),
            ornaments: TierConfig::ornaments(),
            gifts: TierConfig::gifts(),
            topper: TopperConfig::default(),
            snow: SnowConfig::default(),
            needle_count: 5000,
            ornament_count: 150,
            gift_count: 40,
            snow_count: 600,
            seed: None,
            start_mode: Mode::Assembled,
        }
    }
}

impl SceneConfig {
    pub fn with_profile(mut self, profile: TreeProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_needles(mut self, count: usize) -> Self {
        self.needle_count = count;
        self
    }

    pub fn with_ornaments(mut self, count: usize) -> Self {
        self.ornament_count = count;
        self
    }

    pub fn with_gifts(mut self, count: usize) -> Self {
        self.gift_count = count;
        self
    }

    pub fn with_snow(mut self, count: usize) -> Self {
        self.snow_count = count;
        self
    }

    pub fn with_needle_tier(mut self, config: TierConfig) -> Self {
        self.needles = config;
        self
    }

    pub fn with_ornament_tier(mut self, config: TierConfig) -> Self {
        self.ornaments = config;
        self
    }

    pub fn with_gift_tier(mut self, config: TierConfig) -> Self {
        self.gifts = config;
        self
    }

    pub fn with_topper(mut self, config: TopperConfig) -> Self {
        self.topper = config;
        self
    }

    pub fn with_snow_config(mut self, config: SnowConfig) -> Self {
        self.snow = config;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_start_mode(mut self, mode: Mode) -> Self {
        self.start_mode = mode;
        self
    }
}

/// The whole animated tree.
#[derive(Debug)]
pub struct Scene {
    mode: ModeController,
    profile: TreeProfile,
    rng: SmallRng,
    trunk: Trunk,
    needles: ParticleTier,
    ornaments: ParticleTier,
    gifts: ParticleTier,
    topper: Topper,
    snow: Snow,
}

struct Parts {
    trunk: Trunk,
    needles: ParticleTier,
    ornaments: ParticleTier,
    gifts: ParticleTier,
    topper: Topper,
    snow: Snow,
}

impl Scene {
    /// Build every component and allocate its batch.
    ///
    /// Tier configs are validated before anything is allocated. If an
    /// allocation fails, batches already allocated are released.
    pub fn new(config: SceneConfig, renderer: &mut dyn InstanceRenderer) -> Result<Self, SceneError> {
        config.needles.validate()?;
        config.ornaments.validate()?;
        config.gifts.validate()?;

        let mut rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        let mut allocated = Vec::new();
        let parts = match build_parts(&config, &mut rng, renderer, &mut allocated) {
            Ok(parts) => parts,
            Err(err) => {
                log::warn!("scene build failed, releasing {} batches: {}", allocated.len(), err);
                for handle in allocated {
                    renderer.release_batch(handle);
                }
                return Err(err);
            }
        };

        log::info!(
            "scene built: {} needles, {} ornaments, {} gifts, {} snowflakes ({:?})",
            parts.needles.len(),
            parts.ornaments.len(),
            parts.gifts.len(),
            parts.snow.len(),
            config.start_mode,
        );

        Ok(Self {
            mode: ModeController::new(config.start_mode),
            profile: config.profile,
            rng,
            trunk: parts.trunk,
            needles: parts.needles,
            ornaments: parts.ornaments,
            gifts: parts.gifts,
            topper: parts.topper,
            snow: parts.snow,
        })
    }

    /// Step every component once. The mode is read once for the whole frame.
    pub fn frame(&mut self, frame: FrameTime, renderer: &mut dyn InstanceRenderer) {
        let mode = self.mode.current();
        for component in self.components_mut() {
            component.step(mode, frame, renderer);
        }
    }

    /// Flip between the tree and scatter formations.
    pub fn toggle_mode(&mut self) -> Mode {
        self.mode.toggle()
    }

    pub fn is_assembled(&self) -> bool {
        self.mode.is_assembled()
    }

    pub fn mode(&self) -> Mode {
        self.mode.current()
    }

    pub fn profile(&self) -> &TreeProfile {
        &self.profile
    }

    pub fn trunk(&self) -> &Trunk {
        &self.trunk
    }

    pub fn needles(&self) -> &ParticleTier {
        &self.needles
    }

    pub fn ornaments(&self) -> &ParticleTier {
        &self.ornaments
    }

    pub fn gifts(&self) -> &ParticleTier {
        &self.gifts
    }

    pub fn topper(&self) -> &Topper {
        &self.topper
    }

    pub fn snow(&self) -> &Snow {
        &self.snow
    }

    /// Instance batches in draw order.
    pub fn batches(&self) -> [BatchHandle; 6] {
        [
            self.trunk.batch(),
            self.needles.batch(),
            self.ornaments.batch(),
            self.gifts.batch(),
            self.topper.batch(),
            self.snow.batch(),
        ]
    }

    /// Largest distance of any tier element from its current target.
    pub fn max_offset(&self) -> f32 {
        let mode = self.mode.current();
        [&self.needles, &self.ornaments, &self.gifts]
            .iter()
            .map(|tier| tier.max_offset(mode))
            .fold(0.0, f32::max)
    }

    /// Change the needle count, re-seeding every needle.
    pub fn resize_needles(&mut self, count: usize, renderer: &mut dyn InstanceRenderer) -> Result<(), SceneError> {
        self.needles.resize(count, &self.profile, &mut self.rng, renderer)
    }

    /// Free every batch.
    pub fn release(self, renderer: &mut dyn InstanceRenderer) {
        self.trunk.release(renderer);
        self.needles.release(renderer);
        self.ornaments.release(renderer);
        self.gifts.release(renderer);
        self.topper.release(renderer);
        self.snow.release(renderer);
        log::info!("scene released");
    }

    fn components_mut(&mut self) -> [&mut dyn Animate; 6] {
        [
            &mut self.trunk,
            &mut self.needles,
            &mut self.ornaments,
            &mut self.gifts,
            &mut self.topper,
            &mut self.snow,
        ]
    }
}

fn build_parts(
    config: &SceneConfig,
    rng: &mut SmallRng,
    renderer: &mut dyn InstanceRenderer,
    allocated: &mut Vec<BatchHandle>,
) -> Result<Parts, SceneError> {
    let profile = &config.profile;

    let trunk = Trunk::new(renderer)?;
    allocated.push(trunk.batch());

    let needles = ParticleTier::new(config.needles.clone(), profile, config.needle_count, rng, renderer)?;
    allocated.push(needles.batch());

    let ornaments = ParticleTier::new(config.ornaments.clone(), profile, config.ornament_count, rng, renderer)?;
    allocated.push(ornaments.batch());

    let gifts = ParticleTier::new(config.gifts.clone(), profile, config.gift_count, rng, renderer)?;
    allocated.push(gifts.batch());

    let topper = Topper::new(config.topper, renderer)?;
    allocated.push(topper.batch());

    let snow = Snow::new(config.snow.clone(), config.snow_count, rng.gen(), renderer)?;
    allocated.push(snow.batch());

    Ok(Parts {
        trunk,
        needles,
        ornaments,
        gifts,
        topper,
        snow,
    })
}
