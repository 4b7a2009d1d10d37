//! Loading meshes and textures from external files.
//!
//! Everything under `assets/` is resolved relative to the working directory;
//! the build script mirrors the directory next to the build output. Geometry
//! is validated here, at load time, so the GPU never sees out-of-range
//! indices or ragged triangle lists.

pub mod mesh;
pub mod texture;

use crate::data_structures::model;

/// Load a wavefront obj file into a GPU-resident [`model::Model`].
///
/// Materials are classified (diffuse/specular) and uploaded first, then each
/// mesh is built with generated tangent data and validated indices.
pub async fn load_model_obj(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
) -> anyhow::Result<model::Model> {
    let (materials, models) = texture::load_textures(file_name, queue, device, layout).await?;
    let meshes = mesh::load_meshes(&models, file_name, device)?;

    Ok(model::Model { meshes, materials })
}
