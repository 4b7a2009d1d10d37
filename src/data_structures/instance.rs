//! Per-node transform data uploaded to the GPU.
//!
//! Every figure node owns a single-entry instance buffer holding its world
//! matrix. The buffer is bound at vertex slot 1 with instance step mode, so
//! the same mesh can be drawn once per node with a different model matrix
//! and no rebuilt vertex data.

use cgmath::Matrix4;

use crate::data_structures::model;

/// The raw per-node payload as stored on the GPU: one column-major 4x4
/// model matrix.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
}

impl InstanceRaw {
    pub fn from_matrix(world: Matrix4<f32>) -> Self {
        Self {
            model: world.into(),
        }
    }
}

impl From<Matrix4<f32>> for InstanceRaw {
    fn from(world: Matrix4<f32>) -> Self {
        Self::from_matrix(world)
    }
}

/// A mat4 occupies four vertex slots (four vec4 columns), hence locations
/// 5 through 8.
impl model::Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}
