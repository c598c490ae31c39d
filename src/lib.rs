//! # Evergreen - Morphing Particle Tree
//!
//! Thousands of independently animated elements that morph between a
//! Christmas tree and a scattered cloud.
//!
//! Evergreen handles the per-element bookkeeping (targets, interpolation,
//! instance buffers) so a renderer only has to draw instanced geometry.
//!
//! ## Quick Start
//!
//! ```ignore
//! use evergreen::prelude::*;
//!
//! let mut buffers = InstanceBuffers::new();
//! let mut scene = Scene::new(SceneConfig::default().with_seed(42), &mut buffers)?;
//! let mut clock = Clock::new();
//!
//! // Once per redraw
//! scene.frame(clock.update(), &mut buffers);
//! for handle in buffers.take_dirty() {
//!     upload(buffers.instances(handle).unwrap());
//! }
//!
//! // On user input
//! scene.toggle_mode();
//! ```
//!
//! ## Core Concepts
//!
//! ### Two formations
//!
//! Every element has two fixed targets: one on the tree silhouette and one on
//! a spherical scatter shell. The [`Mode`] selects which one all elements are
//! heading toward. Each frame, an element covers a fraction of the remaining
//! distance:
//!
//! ```text
//! factor  = clamp(base_speed * speed_factor * delta, 0, 1)
//! current = current + (target - current) * factor
//! ```
//!
//! ### Tiers
//!
//! A [`ParticleTier`] is one visual class of element. The same animator is
//! configured three times with different weights:
//!
//! | Tier | Default count | Base speed | Geometry |
//! |------|---------------|------------|----------|
//! | Needles | 5000 | 4.0 | point sprite |
//! | Ornaments | 150 | 2.5 | sphere |
//! | Gifts | 40 | 1.5 | box |
//!
//! Lighter tiers settle first, so the tree visibly assembles from the outside
//! in while gifts drift in last.
//!
//! ### Renderer contract
//!
//! Components never touch the GPU. They write transforms and colors through
//! [`InstanceRenderer`] and mark their batch dirty once per frame.
//! [`InstanceBuffers`] keeps everything in memory for the host to upload.

pub mod error;
pub mod frame;
pub mod layout;
pub mod mode;
pub mod palette;
pub mod particle;
pub mod render;
pub mod scene;
pub mod snow;
pub mod tier;
pub mod time;
pub mod topper;
pub mod trunk;

pub use error::{ConfigError, RenderError, SceneError};
pub use frame::{Animate, FrameTime};
pub use glam::{Quat, Vec3};
pub use layout::{LayerProfile, RadialSpread, ScatterBand, TreeProfile, TreeSampling};
pub use mode::{Mode, ModeController};
pub use palette::WeightedPalette;
pub use particle::ParticleRecord;
pub use render::{BatchHandle, GeometryKind, InstanceBuffers, InstanceData, InstanceRenderer};
pub use scene::{Scene, SceneConfig};
pub use snow::{Snow, SnowConfig};
pub use tier::{OrientationMode, ParticleTier, TierConfig};
pub use time::Clock;
pub use topper::{Topper, TopperConfig};
pub use trunk::Trunk;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use evergreen::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ConfigError, RenderError, SceneError};
    pub use crate::frame::{Animate, FrameTime};
    pub use crate::layout::{LayerProfile, TreeProfile};
    pub use crate::mode::Mode;
    pub use crate::palette::{theme, WeightedPalette};
    pub use crate::render::{GeometryKind, InstanceBuffers, InstanceRenderer};
    pub use crate::scene::{Scene, SceneConfig};
    pub use crate::tier::{OrientationMode, ParticleTier, TierConfig};
    pub use crate::time::Clock;
    pub use crate::{Quat, Vec3};
}
