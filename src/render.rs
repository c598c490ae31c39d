//! Renderer collaborator contract.
//!
//! The engine never talks to the GPU directly. Every animated component owns
//! one instance batch obtained from an [`InstanceRenderer`], writes per-instance
//! transforms and colors into it, and marks it dirty once per frame.
//!
//! [`InstanceBuffers`] is the in-memory implementation used by tests and by the
//! viewer, which uploads dirty batches to the GPU after each frame.
//!
//! ```ignore
//! let mut buffers = InstanceBuffers::new();
//! let handle = buffers.allocate_batch(150, GeometryKind::Sphere)?;
//! buffers.set_transform(handle, 0, Vec3::ZERO, Quat::IDENTITY, Vec3::splat(0.1));
//! buffers.mark_dirty(handle);
//!
//! for handle in buffers.take_dirty() {
//!     upload(buffers.instances(handle).unwrap());
//! }
//! ```

use std::collections::BTreeMap;

use bytemuck::{Pod, Zeroable};
use glam::{Quat, Vec3};

use crate::error::RenderError;

/// Geometry drawn for each instance of a batch.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    /// Camera-facing glowing point (needles, snow).
    PointSprite = 0,
    /// Sphere (ornaments).
    Sphere = 1,
    /// Unit box (gifts).
    Box = 2,
    /// Octahedron (the topper star).
    Octahedron = 3,
    /// Tapered cylinder (the trunk).
    Cylinder = 4,
}

/// Opaque handle to an instance batch owned by a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BatchHandle(u32);

impl BatchHandle {
    /// Raw id, stable for the lifetime of the batch.
    pub fn id(self) -> u32 {
        self.0
    }
}

/// GPU-ready per-instance record.
///
/// Layout matches the viewer's vertex attributes: 64 bytes, every vec3
/// followed by a scalar so nothing straddles a 16-byte boundary.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    pub position: [f32; 3],
    pub kind: u32,
    pub orientation: [f32; 4],
    pub scale: [f32; 3],
    pub _pad: f32,
    pub color: [f32; 4],
}

impl InstanceData {
    fn new(kind: GeometryKind) -> Self {
        Self {
            position: [0.0; 3],
            kind: kind as u32,
            orientation: Quat::IDENTITY.to_array(),
            scale: [1.0; 3],
            _pad: 0.0,
            color: [1.0; 4],
        }
    }

    /// Instance position.
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    /// Instance orientation.
    pub fn orientation(&self) -> Quat {
        Quat::from_array(self.orientation)
    }

    /// Instance scale.
    pub fn scale(&self) -> Vec3 {
        Vec3::from_array(self.scale)
    }

    /// Instance RGB color.
    pub fn color(&self) -> Vec3 {
        Vec3::new(self.color[0], self.color[1], self.color[2])
    }
}

/// The operations the engine needs from a renderer.
///
/// Writes to a released or unknown handle are ignored. An index past the end
/// of a live batch means the caller's records and the batch disagree in
/// length; implementations panic on it in debug builds.
pub trait InstanceRenderer {
    /// Allocate a batch of `count` instances of `kind`.
    fn allocate_batch(&mut self, count: usize, kind: GeometryKind) -> Result<BatchHandle, RenderError>;

    /// Instance count of a live batch, `None` for an unknown handle.
    fn batch_len(&self, handle: BatchHandle) -> Option<usize>;

    /// Set the transform of one instance.
    fn set_transform(&mut self, handle: BatchHandle, index: usize, position: Vec3, orientation: Quat, scale: Vec3);

    /// Set the color of one instance.
    fn set_color(&mut self, handle: BatchHandle, index: usize, color: Vec3);

    /// Flag the batch for upload. Called once per frame after all writes.
    fn mark_dirty(&mut self, handle: BatchHandle);

    /// Free the batch. The handle must not be used afterwards.
    fn release_batch(&mut self, handle: BatchHandle);
}

#[derive(Debug)]
struct Batch {
    kind: GeometryKind,
    instances: Vec<InstanceData>,
    dirty: bool,
    writes: u64,
}

/// CPU-side instance storage implementing [`InstanceRenderer`].
#[derive(Debug, Default)]
pub struct InstanceBuffers {
    batches: BTreeMap<BatchHandle, Batch>,
    next_id: u32,
    /// Total instance budget; allocations beyond it fail.
    instance_limit: Option<usize>,
}

impl InstanceBuffers {
    /// Create empty storage with no instance limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the total number of live instances.
    ///
    /// Allocations that would exceed the limit fail with
    /// [`RenderError::AllocationFailed`], which is how a GPU-backed renderer
    /// reports exhausted memory.
    pub fn with_instance_limit(mut self, limit: usize) -> Self {
        self.instance_limit = Some(limit);
        self
    }

    /// Instances of a live batch.
    pub fn instances(&self, handle: BatchHandle) -> Option<&[InstanceData]> {
        self.batches.get(&handle).map(|b| b.instances.as_slice())
    }

    /// Geometry of a live batch.
    pub fn kind(&self, handle: BatchHandle) -> Option<GeometryKind> {
        self.batches.get(&handle).map(|b| b.kind)
    }

    /// Whether the batch was marked dirty since the last [`take_dirty`](Self::take_dirty).
    pub fn is_dirty(&self, handle: BatchHandle) -> bool {
        self.batches.get(&handle).is_some_and(|b| b.dirty)
    }

    /// Number of transform/color writes the batch has received.
    pub fn write_count(&self, handle: BatchHandle) -> u64 {
        self.batches.get(&handle).map_or(0, |b| b.writes)
    }

    /// Whether the handle refers to a live batch.
    pub fn contains(&self, handle: BatchHandle) -> bool {
        self.batches.contains_key(&handle)
    }

    /// Handles of all live batches, in allocation order.
    pub fn handles(&self) -> impl Iterator<Item = BatchHandle> + '_ {
        self.batches.keys().copied()
    }

    /// Number of live batches.
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// Total live instances across all batches.
    pub fn total_instances(&self) -> usize {
        self.batches.values().map(|b| b.instances.len()).sum()
    }

    /// Return the dirty batches and clear their flags.
    pub fn take_dirty(&mut self) -> Vec<BatchHandle> {
        self.batches
            .iter_mut()
            .filter(|(_, b)| b.dirty)
            .map(|(handle, b)| {
                b.dirty = false;
                *handle
            })
            .collect()
    }

    fn slot(&mut self, handle: BatchHandle, index: usize) -> Option<&mut InstanceData> {
        let batch = match self.batches.get_mut(&handle) {
            Some(batch) => batch,
            None => {
                log::warn!("write to unknown instance batch {:?} ignored", handle);
                return None;
            }
        };
        let len = batch.instances.len();
        debug_assert!(index < len, "instance index {} out of range for batch {:?} of {}", index, handle, len);
        let slot = batch.instances.get_mut(index)?;
        batch.writes += 1;
        Some(slot)
    }
}

impl InstanceRenderer for InstanceBuffers {
    fn allocate_batch(&mut self, count: usize, kind: GeometryKind) -> Result<BatchHandle, RenderError> {
        if let Some(limit) = self.instance_limit {
            let live = self.total_instances();
            if live + count > limit {
                return Err(RenderError::AllocationFailed {
                    count,
                    kind,
                    reason: format!("instance budget exhausted ({live} of {limit} in use)"),
                });
            }
        }

        let handle = BatchHandle(self.next_id);
        self.next_id += 1;
        self.batches.insert(
            handle,
            Batch {
                kind,
                instances: vec![InstanceData::new(kind); count],
                dirty: false,
                writes: 0,
            },
        );
        Ok(handle)
    }

    fn batch_len(&self, handle: BatchHandle) -> Option<usize> {
        self.batches.get(&handle).map(|b| b.instances.len())
    }

    fn set_transform(&mut self, handle: BatchHandle, index: usize, position: Vec3, orientation: Quat, scale: Vec3) {
        if let Some(slot) = self.slot(handle, index) {
            slot.position = position.to_array();
            slot.orientation = orientation.to_array();
            slot.scale = scale.to_array();
        }
    }

    fn set_color(&mut self, handle: BatchHandle, index: usize, color: Vec3) {
        if let Some(slot) = self.slot(handle, index) {
            slot.color = [color.x, color.y, color.z, 1.0];
        }
    }

    fn mark_dirty(&mut self, handle: BatchHandle) {
        if let Some(batch) = self.batches.get_mut(&handle) {
            batch.dirty = true;
        }
    }

    fn release_batch(&mut self, handle: BatchHandle) {
        if self.batches.remove(&handle).is_none() {
            log::warn!("release of unknown instance batch {:?} ignored", handle);
        }
    }
}
