//! The articulated figure: assembly, pose state and drawing.
//!
//! The figure is ten scene graph nodes. The torso cube is the root; the
//! sphere head and four limb chains hang off it, with each lower limb
//! segment parented to its upper segment so that posing an upper segment
//! carries the lower one along.

use cgmath::vec3;
use instant::Duration;
use wgpu::util::DeviceExt;

use crate::{
    context::Context,
    data_structures::{
        instance::InstanceRaw,
        model::{DrawModel, Model},
        scene_graph::{ModelId, NodeId, SceneGraph, SceneGraphError},
    },
    resources,
};

/// Handles to the ten figure nodes, by body part.
#[derive(Debug, Clone, Copy)]
pub struct FigureParts {
    pub torso: NodeId,
    pub head: NodeId,
    pub left_upper_arm: NodeId,
    pub left_lower_arm: NodeId,
    pub right_upper_arm: NodeId,
    pub right_lower_arm: NodeId,
    pub left_upper_leg: NodeId,
    pub left_lower_leg: NodeId,
    pub right_upper_leg: NodeId,
    pub right_lower_leg: NodeId,
}

impl FigureParts {
    /// The fixed order parts are drawn and their buffers are laid out in.
    pub fn draw_order(&self) -> [NodeId; 10] {
        [
            self.torso,
            self.head,
            self.left_upper_arm,
            self.left_lower_arm,
            self.right_upper_arm,
            self.right_lower_arm,
            self.left_upper_leg,
            self.left_lower_leg,
            self.right_upper_leg,
            self.right_lower_leg,
        ]
    }
}

/// Wire up the figure hierarchy and its rest pose.
///
/// The torso sits 5 units in front of the origin and is stretched to twice
/// its height. Upper limb segments attach at the shoulders and hips with a
/// half-size scale; lower segments hang 1.1 units below their upper segment
/// and inherit its scale through the hierarchy.
pub fn assemble(
    graph: &mut SceneGraph,
    cube: ModelId,
    sphere: ModelId,
) -> Result<FigureParts, SceneGraphError> {
    let torso = graph.insert(cube, None)?;
    graph.set_translate(torso, vec3(0.0, 0.0, -5.0));
    graph.set_scale(torso, vec3(1.0, 2.0, 1.0));

    let head = graph.insert(sphere, Some(torso))?;
    graph.set_translate(head, vec3(0.0, 1.5, 0.0));
    graph.set_scale(head, vec3(1.0, 0.5, 1.0));

    let left_upper_arm = graph.insert(cube, Some(torso))?;
    graph.set_translate(left_upper_arm, vec3(-1.0, 0.5, 0.0));
    graph.set_scale(left_upper_arm, vec3(0.5, 0.5, 1.0));

    let left_lower_arm = graph.insert(cube, Some(left_upper_arm))?;
    graph.set_translate(left_lower_arm, vec3(0.0, -1.1, 0.0));

    let right_upper_arm = graph.insert(cube, Some(torso))?;
    graph.set_translate(right_upper_arm, vec3(1.0, 0.5, 0.0));
    graph.set_scale(right_upper_arm, vec3(0.5, 0.5, 1.0));

    let right_lower_arm = graph.insert(cube, Some(right_upper_arm))?;
    graph.set_translate(right_lower_arm, vec3(0.0, -1.1, 0.0));

    let left_upper_leg = graph.insert(cube, Some(torso))?;
    graph.set_translate(left_upper_leg, vec3(-0.5, -2.0, 0.0));
    graph.set_scale(left_upper_leg, vec3(0.5, 0.5, 1.0));

    let left_lower_leg = graph.insert(cube, Some(left_upper_leg))?;
    graph.set_translate(left_lower_leg, vec3(0.0, -1.1, 0.0));

    let right_upper_leg = graph.insert(cube, Some(torso))?;
    graph.set_translate(right_upper_leg, vec3(0.5, -2.0, 0.0));
    graph.set_scale(right_upper_leg, vec3(0.5, 0.5, 1.0));

    let right_lower_leg = graph.insert(cube, Some(right_upper_leg))?;
    graph.set_translate(right_lower_leg, vec3(0.0, -1.1, 0.0));

    Ok(FigureParts {
        torso,
        head,
        left_upper_arm,
        left_lower_arm,
        right_upper_arm,
        right_lower_arm,
        left_upper_leg,
        left_lower_leg,
        right_upper_leg,
        right_lower_leg,
    })
}

/// The assembled figure with its GPU-side per-part transform buffers.
#[derive(Debug)]
pub struct Figure {
    pub graph: SceneGraph,
    pub parts: FigureParts,
    models: Vec<Model>,
    node_buffers: Vec<wgpu::Buffer>,
    animating: bool,
}

impl Figure {
    const CUBE: ModelId = ModelId(0);
    const SPHERE: ModelId = ModelId(1);

    /// Load the cube and sphere models and assemble the figure.
    ///
    /// Each part gets its own single-instance buffer so parts can be drawn
    /// one by one in a fixed order while sharing the two models.
    pub async fn load(context: &Context) -> anyhow::Result<Self> {
        let (cube, sphere) = futures::join!(
            resources::load_model_obj(
                "cube.obj",
                &context.device,
                &context.queue,
                &context.material_layout,
            ),
            resources::load_model_obj(
                "sphere.obj",
                &context.device,
                &context.queue,
                &context.material_layout,
            ),
        );
        let models = vec![cube?, sphere?];

        let mut graph = SceneGraph::new();
        let parts = assemble(&mut graph, Self::CUBE, Self::SPHERE)?;

        let node_buffers = parts
            .draw_order()
            .iter()
            .map(|&id| {
                let raw = InstanceRaw::from_matrix(graph.world_transform(id));
                context
                    .device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Figure Part Buffer"),
                        contents: bytemuck::cast_slice(&[raw]),
                        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    })
            })
            .collect();

        Ok(Self {
            graph,
            parts,
            models,
            node_buffers,
            animating: true,
        })
    }

    pub fn animating(&self) -> bool {
        self.animating
    }

    pub fn toggle_animation(&mut self) {
        self.animating = !self.animating;
        log::info!(
            "animation {}",
            if self.animating { "running" } else { "paused" }
        );
    }

    /// Advance the pose by `dt`. Skipped entirely while paused.
    ///
    /// The rest pose is static; joint motion (rotating shoulder and hip
    /// nodes over time) plugs in here without touching the draw path.
    pub fn update(&mut self, _dt: Duration) {
        if !self.animating {
            return;
        }
    }

    /// Push the current world transforms into the per-part buffers.
    pub fn write_to_buffers(&self, queue: &wgpu::Queue) {
        for (buffer, id) in self.node_buffers.iter().zip(self.parts.draw_order()) {
            let raw = InstanceRaw::from_matrix(self.graph.world_transform(id));
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[raw]));
        }
    }

    /// Draw every part in the fixed order, one instanced draw per part.
    pub fn draw<'a>(
        &'a self,
        render_pass: &mut wgpu::RenderPass<'a>,
        camera_bind_group: &'a wgpu::BindGroup,
    ) {
        for (buffer, id) in self.node_buffers.iter().zip(self.parts.draw_order()) {
            render_pass.set_vertex_buffer(1, buffer.slice(..));
            let model = &self.models[self.graph.model(id).0];
            render_pass.draw_model_instanced(model, 0..1, camera_bind_group);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Matrix4;

    const CUBE: ModelId = ModelId(0);
    const SPHERE: ModelId = ModelId(1);

    fn assembled() -> (SceneGraph, FigureParts) {
        let mut graph = SceneGraph::new();
        let parts = assemble(&mut graph, CUBE, SPHERE).unwrap();
        (graph, parts)
    }

    #[test]
    fn figure_has_ten_nodes() {
        let (graph, parts) = assembled();
        assert_eq!(graph.len(), 10);
        assert_eq!(parts.draw_order().len(), 10);
    }

    #[test]
    fn only_the_head_is_a_sphere() {
        let (graph, parts) = assembled();
        for id in parts.draw_order() {
            let expected = if id == parts.head { SPHERE } else { CUBE };
            assert_eq!(graph.model(id), expected);
        }
    }

    #[test]
    fn limbs_chain_through_the_torso() {
        let (graph, parts) = assembled();
        assert_eq!(graph.parent(parts.torso), None);
        assert_eq!(graph.parent(parts.head), Some(parts.torso));
        assert_eq!(graph.parent(parts.left_upper_arm), Some(parts.torso));
        assert_eq!(graph.parent(parts.left_lower_arm), Some(parts.left_upper_arm));
        assert_eq!(graph.parent(parts.right_upper_arm), Some(parts.torso));
        assert_eq!(graph.parent(parts.right_lower_arm), Some(parts.right_upper_arm));
        assert_eq!(graph.parent(parts.left_upper_leg), Some(parts.torso));
        assert_eq!(graph.parent(parts.left_lower_leg), Some(parts.left_upper_leg));
        assert_eq!(graph.parent(parts.right_upper_leg), Some(parts.torso));
        assert_eq!(graph.parent(parts.right_lower_leg), Some(parts.right_upper_leg));
    }

    #[test]
    fn torso_rest_pose_matches_its_literals() {
        let (graph, parts) = assembled();
        let expected = Matrix4::from_translation(vec3(0.0, 0.0, -5.0))
            * Matrix4::from_nonuniform_scale(1.0, 2.0, 1.0);
        assert_eq!(graph.world_transform(parts.torso), expected);
    }

    #[test]
    fn lower_arm_inherits_the_whole_chain() {
        let (graph, parts) = assembled();
        let expected = Matrix4::from_translation(vec3(0.0, -1.1, 0.0))
            * (Matrix4::from_translation(vec3(-1.0, 0.5, 0.0))
                * Matrix4::from_nonuniform_scale(0.5, 0.5, 1.0)
                * (Matrix4::from_translation(vec3(0.0, 0.0, -5.0))
                    * Matrix4::from_nonuniform_scale(1.0, 2.0, 1.0)));
        let actual = graph.world_transform(parts.left_lower_arm);
        let a: [[f32; 4]; 4] = actual.into();
        let e: [[f32; 4]; 4] = expected.into();
        for col in 0..4 {
            for row in 0..4 {
                assert!((a[col][row] - e[col][row]).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn draw_order_starts_at_the_torso_and_pairs_limb_segments() {
        let (_, parts) = assembled();
        let order = parts.draw_order();
        assert_eq!(order[0], parts.torso);
        assert_eq!(order[1], parts.head);
        assert_eq!(order[2], parts.left_upper_arm);
        assert_eq!(order[3], parts.left_lower_arm);
        assert_eq!(order[8], parts.right_upper_leg);
        assert_eq!(order[9], parts.right_lower_leg);
    }
}
