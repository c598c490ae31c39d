//! Error types for Evergreen.
//!
//! Construction is the only fallible phase: configuration is validated when a
//! tier or scene is built, and instance batches are allocated from the
//! renderer. Per-frame stepping never fails.

use thiserror::Error;

use crate::render::{BatchHandle, GeometryKind};

/// Invalid construction-time parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The tree profile has no layers.
    #[error("tree profile must contain at least one layer")]
    EmptyProfile,

    /// A layer has a non-finite or negative dimension.
    #[error("layer {index} is invalid: {reason}")]
    InvalidLayer {
        /// Position of the layer in the profile (bottom first).
        index: usize,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A `min..max` range is inverted or non-finite.
    #[error("invalid {what} range {min}..{max}")]
    InvalidRange {
        /// Which parameter the range belongs to.
        what: &'static str,
        /// Lower bound.
        min: f32,
        /// Upper bound.
        max: f32,
    },

    /// A convergence rate is zero, negative or non-finite.
    #[error("invalid {what}: {value}")]
    InvalidSpeed {
        /// Which rate.
        what: &'static str,
        /// Offending value.
        value: f32,
    },

    /// A palette has no entries.
    #[error("palette must contain at least one color")]
    EmptyPalette,

    /// A palette weight is negative, non-finite, or all weights are zero.
    #[error("palette weight {weight} at index {index} is invalid")]
    InvalidWeight {
        /// Entry index.
        index: usize,
        /// Offending weight.
        weight: f32,
    },
}

/// Failures reported by the renderer collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// The renderer could not provide an instance batch.
    #[error("failed to allocate {count} {kind:?} instances: {reason}")]
    AllocationFailed {
        /// Requested instance count.
        count: usize,
        /// Requested geometry.
        kind: GeometryKind,
        /// Renderer-specific reason.
        reason: String,
    },

    /// The handle does not refer to a live batch.
    #[error("unknown instance batch {0:?}")]
    UnknownBatch(BatchHandle),
}

/// Errors that can occur while building a scene or one of its components.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// Configuration was rejected.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The renderer refused a resource.
    #[error("render resource error: {0}")]
    Render(#[from] RenderError),
}
