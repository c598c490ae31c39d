use bytemuck::{Pod, Zeroable};

pub const SHADER_SOURCE: &str = include_str!("shader.wgsl");

/// Vertices drawn per instance for each geometry kind, indexed by kind.
pub const VERTICES_PER_KIND: [u32; 5] = [6, 6, 36, 24, 36];

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct Uniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_right: [f32; 4],
    pub camera_up: [f32; 4],
    pub camera_position: [f32; 4],
    /// Offset applied to every instance; lowers the tree into frame.
    pub origin: [f32; 4],
    pub fog_color: [f32; 4],
    pub time: f32,
    pub delta_time: f32,
    pub fog_near: f32,
    pub fog_far: f32,
}
