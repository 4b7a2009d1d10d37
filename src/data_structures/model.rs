//! Mesh, material and vertex definitions plus the draw trait over render passes.

use std::ops::Range;

use crate::data_structures::texture;

/// Types that can describe their GPU vertex buffer layout.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// Maximum number of bones that may influence a single vertex.
pub const MAX_BONE_INFLUENCE: usize = 4;

/// One vertex of a loaded model.
///
/// Bone indices and weights are part of the vertex layout contract shared
/// with skinned formats; the figure viewer never animates them and the
/// loader zero-fills both fields.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
    pub bone_indices: [u32; MAX_BONE_INFLUENCE],
    pub bone_weights: [f32; MAX_BONE_INFLUENCE],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 11]>() as wgpu::BufferAddress,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Bone data rides along for layout compatibility; the figure
                // shader has no consumers for locations 9 and 10.
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 14]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Uint32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 18]>() as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Semantic role of a texture within a material.
///
/// Classification happens in the loader (a `map_Kd` entry is diffuse, a
/// `map_Ks` entry is specular); everything downstream only sees the kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureKind {
    Diffuse,
    Specular,
}

impl TextureKind {
    pub fn binding_base(&self) -> &'static str {
        match self {
            TextureKind::Diffuse => "texture_diffuse",
            TextureKind::Specular => "texture_specular",
        }
    }
}

/// A texture reference as produced by the loader.
#[derive(Debug)]
pub struct MaterialTexture {
    pub texture: texture::Texture,
    pub kind: TextureKind,
    pub path: String,
}

/// Derive one binding name per texture: the kind's base name plus a 1-based
/// per-kind counter, prefixed with `material.`.
///
/// `[Diffuse, Diffuse, Specular]` yields `material.texture_diffuse1`,
/// `material.texture_diffuse2`, `material.texture_specular1`. The name at
/// index `i` labels the texture bound to slot `i`.
pub fn texture_binding_names(kinds: &[TextureKind]) -> Vec<String> {
    let mut num_diffuse = 0;
    let mut num_specular = 0;
    kinds
        .iter()
        .map(|kind| {
            let n = match kind {
                TextureKind::Diffuse => {
                    num_diffuse += 1;
                    num_diffuse
                }
                TextureKind::Specular => {
                    num_specular += 1;
                    num_specular
                }
            };
            format!("material.{}{}", kind.binding_base(), n)
        })
        .collect()
}

/// A material: its textures and the bind group exposing them to the shader.
///
/// Each texture occupies one sequential slot starting at 0; slot `i` maps to
/// bind group entries `2i` (view) and `2i + 1` (sampler).
#[derive(Debug)]
pub struct Material {
    pub name: String,
    pub textures: Vec<MaterialTexture>,
    pub bind_group: wgpu::BindGroup,
}

impl Material {
    pub fn new(
        device: &wgpu::Device,
        name: &str,
        textures: Vec<MaterialTexture>,
        layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let mut entries = Vec::with_capacity(textures.len() * 2);
        for (unit, tex) in textures.iter().enumerate() {
            entries.push(wgpu::BindGroupEntry {
                binding: unit as u32 * 2,
                resource: wgpu::BindingResource::TextureView(&tex.texture.view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: unit as u32 * 2 + 1,
                resource: wgpu::BindingResource::Sampler(&tex.texture.sampler),
            });
        }
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &entries,
            label: Some(name),
        });

        Self {
            name: name.to_string(),
            textures,
            bind_group,
        }
    }

    /// Binding names of this material's textures, in slot order.
    pub fn binding_names(&self) -> Vec<String> {
        let kinds: Vec<_> = self.textures.iter().map(|t| t.kind).collect();
        texture_binding_names(&kinds)
    }
}

/// GPU-resident geometry for one drawable primitive.
#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub material: usize,
}

/// A loaded model: meshes plus the materials they index into.
#[derive(Debug)]
pub struct Model {
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
}

pub trait DrawModel<'a> {
    fn draw_mesh_instanced(
        &mut self,
        mesh: &'a Mesh,
        material: &'a Material,
        instances: Range<u32>,
        camera_bind_group: &'a wgpu::BindGroup,
    );

    fn draw_model_instanced(
        &mut self,
        model: &'a Model,
        instances: Range<u32>,
        camera_bind_group: &'a wgpu::BindGroup,
    );
}

impl<'a, 'b> DrawModel<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh_instanced(
        &mut self,
        mesh: &'b Mesh,
        material: &'b Material,
        instances: Range<u32>,
        camera_bind_group: &'b wgpu::BindGroup,
    ) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, &material.bind_group, &[]);
        self.set_bind_group(1, camera_bind_group, &[]);
        // One indexed draw over the full index sequence.
        self.draw_indexed(0..mesh.num_elements, 0, instances);
    }

    fn draw_model_instanced(
        &mut self,
        model: &'b Model,
        instances: Range<u32>,
        camera_bind_group: &'b wgpu::BindGroup,
    ) {
        for mesh in &model.meshes {
            let material = &model.materials[mesh.material];
            self.draw_mesh_instanced(mesh, material, instances.clone(), camera_bind_group);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_names_count_per_kind() {
        let names = texture_binding_names(&[
            TextureKind::Diffuse,
            TextureKind::Diffuse,
            TextureKind::Specular,
        ]);
        assert_eq!(
            names,
            vec![
                "material.texture_diffuse1",
                "material.texture_diffuse2",
                "material.texture_specular1",
            ]
        );
    }

    #[test]
    fn binding_names_are_one_per_texture() {
        let kinds = [
            TextureKind::Specular,
            TextureKind::Diffuse,
            TextureKind::Specular,
            TextureKind::Diffuse,
        ];
        let names = texture_binding_names(&kinds);
        assert_eq!(names.len(), kinds.len());
        assert_eq!(
            names,
            vec![
                "material.texture_specular1",
                "material.texture_diffuse1",
                "material.texture_specular2",
                "material.texture_diffuse2",
            ]
        );
    }

    #[test]
    fn binding_names_empty_material() {
        assert!(texture_binding_names(&[]).is_empty());
    }
}
