//! Building GPU meshes from parsed obj geometry.

use anyhow::{bail, ensure};
use wgpu::util::DeviceExt;

use crate::data_structures::model;

/// Reject index streams the GPU would misbehave on: every index has to
/// address an existing vertex and the stream has to form whole triangles.
pub fn validate_indices(indices: &[u32], vertex_count: usize) -> anyhow::Result<()> {
    ensure!(
        indices.len() % 3 == 0,
        "index stream of length {} is not a whole number of triangles",
        indices.len()
    );
    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        bail!("index {bad} is out of range for {vertex_count} vertices");
    }
    Ok(())
}

/// Build one GPU mesh per obj model.
///
/// Obj files carry no tangent data, so tangents and bitangents are derived
/// from the triangles' uv edges and averaged per vertex. Bone fields are
/// part of the vertex layout but have no source in obj; they stay zeroed.
pub fn load_meshes(
    models: &[tobj::Model],
    file_name: &str,
    device: &wgpu::Device,
) -> anyhow::Result<Vec<model::Mesh>> {
    models
        .iter()
        .map(|m| {
            let mut vertices = (0..m.mesh.positions.len() / 3)
                .map(|i| model::ModelVertex {
                    position: [
                        m.mesh.positions[i * 3],
                        m.mesh.positions[i * 3 + 1],
                        m.mesh.positions[i * 3 + 2],
                    ],
                    tex_coords: [
                        m.mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                        1.0 - m.mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
                    ],
                    normal: [
                        m.mesh.normals.get(i * 3).map_or(0.0, |f| *f),
                        m.mesh.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                        m.mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
                    ],
                    tangent: [0.0; 3],
                    bitangent: [0.0; 3],
                    bone_indices: [0; model::MAX_BONE_INFLUENCE],
                    bone_weights: [0.0; model::MAX_BONE_INFLUENCE],
                })
                .collect::<Vec<_>>();

            let indices = &m.mesh.indices;
            validate_indices(indices, vertices.len())?;

            compute_tangents(&mut vertices, indices);

            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{file_name:?} Vertex Buffer")),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{file_name:?} Index Buffer")),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });

            Ok(model::Mesh {
                name: file_name.to_string(),
                vertex_buffer,
                index_buffer,
                num_elements: indices.len() as u32,
                material: m.mesh.material_id.unwrap_or(0),
            })
        })
        .collect()
}

fn compute_tangents(vertices: &mut [model::ModelVertex], indices: &[u32]) {
    let mut triangles_included = vec![0u32; vertices.len()];

    for c in indices.chunks(3) {
        let v0 = vertices[c[0] as usize];
        let v1 = vertices[c[1] as usize];
        let v2 = vertices[c[2] as usize];

        let pos0: cgmath::Vector3<f32> = v0.position.into();
        let pos1: cgmath::Vector3<f32> = v1.position.into();
        let pos2: cgmath::Vector3<f32> = v2.position.into();
        let uv0: cgmath::Vector2<f32> = v0.tex_coords.into();
        let uv1: cgmath::Vector2<f32> = v1.tex_coords.into();
        let uv2: cgmath::Vector2<f32> = v2.tex_coords.into();

        let delta_pos1 = pos1 - pos0;
        let delta_pos2 = pos2 - pos0;
        let delta_uv1 = uv1 - uv0;
        let delta_uv2 = uv2 - uv0;

        // Solve delta_pos = delta_uv.x * T + delta_uv.y * B for T and B.
        // Degenerate uv triangles contribute nothing.
        let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
        if det.abs() < f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;
        // Flipped so right-handed normal maps match wgpu's uv orientation.
        let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * -r;

        for &i in c {
            let v = &mut vertices[i as usize];
            v.tangent = (tangent + cgmath::Vector3::from(v.tangent)).into();
            v.bitangent = (bitangent + cgmath::Vector3::from(v.bitangent)).into();
            triangles_included[i as usize] += 1;
        }
    }

    for (i, n) in triangles_included.into_iter().enumerate() {
        if n == 0 {
            continue;
        }
        let denom = 1.0 / n as f32;
        let v = &mut vertices[i];
        v.tangent = (cgmath::Vector3::from(v.tangent) * denom).into();
        v.bitangent = (cgmath::Vector3::from(v.bitangent) * denom).into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_full_triangle_list() {
        validate_indices(&[0, 1, 2, 2, 1, 3], 4).unwrap();
    }

    #[test]
    fn rejects_out_of_range_index() {
        let err = validate_indices(&[0, 1, 4], 4).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn rejects_ragged_triangle_list() {
        let err = validate_indices(&[0, 1], 4).unwrap_err();
        assert!(err.to_string().contains("whole number of triangles"));
    }

    #[test]
    fn accepts_empty_stream() {
        validate_indices(&[], 0).unwrap();
    }
}
