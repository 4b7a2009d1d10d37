//! Texture and material loading for obj models.

use std::io::{BufReader, Cursor};

use anyhow::Context;

use crate::data_structures::{
    model::{self, MaterialTexture, TextureKind},
    texture,
};

/// Bind group layout for the material slots every loaded model carries:
/// slot 0 is the diffuse map, slot 1 the specular map, each as
/// view (binding 2i) + sampler (binding 2i + 1).
pub fn diffuse_specular_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    };
    let sampler_entry = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            texture_entry(0),
            sampler_entry(1),
            texture_entry(2),
            sampler_entry(3),
        ],
        label: Some("material_bind_group_layout"),
    })
}

pub async fn load_string(file_name: &str) -> anyhow::Result<String> {
    let path = std::path::Path::new("./").join("assets").join(file_name);
    std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    let path = std::path::Path::new("./").join("assets").join(file_name);
    std::fs::read(&path).with_context(|| format!("reading {}", path.display()))
}

pub async fn load_texture(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    format: Option<&str>,
) -> anyhow::Result<texture::Texture> {
    let data = load_binary(file_name).await?;
    texture::Texture::from_bytes(device, queue, &data, file_name, format)
}

/// Parse an obj file and build a [`model::Material`] per mtl material.
///
/// Texture classification happens here: `map_Kd` references become
/// [`TextureKind::Diffuse`], `map_Ks` references become
/// [`TextureKind::Specular`]. Missing maps fall back to solid colors (white
/// diffuse, black specular) so every material fills the same layout and the
/// render pipeline never needs an untextured variant.
pub async fn load_textures(
    file_name: &str,
    queue: &wgpu::Queue,
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
) -> anyhow::Result<(Vec<model::Material>, Vec<tobj::Model>)> {
    let obj_text: String = load_string(file_name).await?;
    let obj_cursor = Cursor::new(obj_text);
    let mut obj_reader = BufReader::new(obj_cursor);

    let (models, obj_materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |p| async move {
            let mat_text = load_string(&p)
                .await
                .unwrap_or_else(|e| panic!("material file not found for {p}: {e}"));
            tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mat_text)))
        },
    )
    .await?;

    let mut materials = Vec::new();
    for m in obj_materials? {
        let mut textures = Vec::new();
        match &m.diffuse_texture {
            Some(path) => {
                let diffuse = load_texture(path, device, queue, None).await?;
                textures.push(MaterialTexture {
                    texture: diffuse,
                    kind: TextureKind::Diffuse,
                    path: path.clone(),
                });
            }
            None => {
                log::warn!("material {} in {file_name} has no diffuse map, using white", m.name);
                let diffuse =
                    texture::Texture::create_solid_color(1, 1, [255; 4], device, queue);
                textures.push(MaterialTexture {
                    texture: diffuse,
                    kind: TextureKind::Diffuse,
                    path: String::new(),
                });
            }
        }
        match &m.specular_texture {
            Some(path) => {
                let specular = load_texture(path, device, queue, None).await?;
                textures.push(MaterialTexture {
                    texture: specular,
                    kind: TextureKind::Specular,
                    path: path.clone(),
                });
            }
            None => {
                let specular =
                    texture::Texture::create_solid_color(1, 1, [0, 0, 0, 255], device, queue);
                textures.push(MaterialTexture {
                    texture: specular,
                    kind: TextureKind::Specular,
                    path: String::new(),
                });
            }
        }
        let material = model::Material::new(device, &m.name, textures, layout);
        log::debug!(
            "material {} binds {}",
            material.name,
            material.binding_names().join(", ")
        );
        materials.push(material);
    }

    // An obj without any mtl still has to draw; give it the fallbacks.
    if materials.is_empty() {
        let diffuse = texture::Texture::create_solid_color(1, 1, [255; 4], device, queue);
        let specular =
            texture::Texture::create_solid_color(1, 1, [0, 0, 0, 255], device, queue);
        materials.push(model::Material::new(
            device,
            file_name,
            vec![
                MaterialTexture {
                    texture: diffuse,
                    kind: TextureKind::Diffuse,
                    path: String::new(),
                },
                MaterialTexture {
                    texture: specular,
                    kind: TextureKind::Specular,
                    path: String::new(),
                },
            ],
            layout,
        ));
    }

    Ok((materials, models))
}
