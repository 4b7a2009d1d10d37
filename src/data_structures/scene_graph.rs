//! Hierarchical transform nodes for the articulated figure.
//!
//! The scene graph is an insert-only arena of transform nodes addressed by
//! stable [`NodeId`] handles. Each node references a mesh through a
//! [`ModelId`] (the GPU data itself lives with the renderer), optionally a
//! parent node, and three local matrices: translate, scale and rotate. The
//! world transform of a node composes its local matrices with its ancestor
//! chain:
//!
//! ```text
//! world(node) = translate · rotate · scale · world(parent)
//! ```
//!
//! with identity for a parentless root. Scale applies first in the node's
//! local frame, then rotation, then translation, and the parent's world
//! transform carries the result into the parent's frame.
//!
//! Because a node can only be inserted under an already-existing parent, the
//! initial wiring is acyclic by construction. Re-wiring via
//! [`SceneGraph::set_parent`] checks the prospective ancestor chain and
//! rejects cycles instead of recursing unboundedly.

use cgmath::{Deg, InnerSpace, Matrix4, SquareMatrix, Vector3};
use thiserror::Error;

/// Stable handle to a node in a [`SceneGraph`].
///
/// Handles are only ever produced by [`SceneGraph::insert`] and stay valid
/// for the lifetime of the graph (nodes are never removed).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Handle to a model owned by the renderer.
///
/// The graph never touches GPU data; it only records which model a node
/// draws with. Many nodes may share the same model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelId(pub usize);

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneGraphError {
    #[error("parent {0:?} does not exist in this graph")]
    UnknownParent(NodeId),
    #[error("node {0:?} does not exist in this graph")]
    UnknownNode(NodeId),
    #[error("making {parent:?} the parent of {child:?} would create a cycle")]
    WouldCycle { child: NodeId, parent: NodeId },
}

#[derive(Debug)]
struct Node {
    model: ModelId,
    parent: Option<NodeId>,
    translate: Matrix4<f32>,
    scale: Matrix4<f32>,
    rotate: Matrix4<f32>,
}

impl Node {
    fn new(model: ModelId, parent: Option<NodeId>) -> Self {
        Self {
            model,
            parent,
            translate: Matrix4::identity(),
            scale: Matrix4::identity(),
            rotate: Matrix4::identity(),
        }
    }
}

/// Arena of transform nodes. See the module docs for the composition rule.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Insert a node drawing `model`, optionally wired under `parent`.
    ///
    /// The parent has to exist already, which keeps every insertion acyclic:
    /// a handle always pre-dates the nodes that reference it.
    pub fn insert(
        &mut self,
        model: ModelId,
        parent: Option<NodeId>,
    ) -> Result<NodeId, SceneGraphError> {
        if let Some(parent) = parent {
            if parent.0 >= self.nodes.len() {
                return Err(SceneGraphError::UnknownParent(parent));
            }
        }
        self.nodes.push(Node::new(model, parent));
        Ok(NodeId(self.nodes.len() - 1))
    }

    /// Re-wire `child` under `parent` (or detach it with `None`).
    ///
    /// Walks the new ancestor chain first and refuses wiring that would make
    /// `child` its own ancestor.
    pub fn set_parent(
        &mut self,
        child: NodeId,
        parent: Option<NodeId>,
    ) -> Result<(), SceneGraphError> {
        if child.0 >= self.nodes.len() {
            return Err(SceneGraphError::UnknownNode(child));
        }
        if let Some(parent) = parent {
            if parent.0 >= self.nodes.len() {
                return Err(SceneGraphError::UnknownParent(parent));
            }
            let mut ancestor = Some(parent);
            while let Some(id) = ancestor {
                if id == child {
                    return Err(SceneGraphError::WouldCycle { child, parent });
                }
                ancestor = self.nodes[id.0].parent;
            }
        }
        self.nodes[child.0].parent = parent;
        Ok(())
    }

    /// Replace the node's local translation matrix.
    ///
    /// Repeated calls overwrite, they never compose.
    pub fn set_translate(&mut self, id: NodeId, offset: Vector3<f32>) {
        self.nodes[id.0].translate = Matrix4::from_translation(offset);
    }

    /// Replace the node's local scale matrix.
    pub fn set_scale(&mut self, id: NodeId, factors: Vector3<f32>) {
        self.nodes[id.0].scale = Matrix4::from_nonuniform_scale(factors.x, factors.y, factors.z);
    }

    /// Replace the node's local rotation matrix with a rotation of `angle`
    /// around `axis`.
    pub fn set_rotate(&mut self, id: NodeId, angle: Deg<f32>, axis: Vector3<f32>) {
        self.nodes[id.0].rotate = Matrix4::from_axis_angle(axis.normalize(), angle);
    }

    pub fn model(&self, id: NodeId) -> ModelId {
        self.nodes[id.0].model
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Compute the node's world transform by walking its ancestor chain.
    ///
    /// Pure and recomputed on every call; for this crate's scenes (a handful
    /// of nodes, chains of depth three) that is cheaper than caching.
    pub fn world_transform(&self, id: NodeId) -> Matrix4<f32> {
        let node = &self.nodes[id.0];
        let local = node.translate * node.rotate * node.scale;
        match node.parent {
            Some(parent) => local * self.world_transform(parent),
            None => local,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::vec3;

    const CUBE: ModelId = ModelId(0);

    fn assert_mat4_eq(actual: Matrix4<f32>, expected: Matrix4<f32>) {
        let a: [[f32; 4]; 4] = actual.into();
        let e: [[f32; 4]; 4] = expected.into();
        for col in 0..4 {
            for row in 0..4 {
                assert!(
                    (a[col][row] - e[col][row]).abs() < 1e-5,
                    "matrices differ at [{col}][{row}]: {a:?} vs {e:?}"
                );
            }
        }
    }

    #[test]
    fn rootless_world_transform_is_local_product() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(CUBE, None).unwrap();
        graph.set_translate(root, vec3(1.0, 2.0, 3.0));
        graph.set_rotate(root, Deg(90.0), vec3(0.0, 1.0, 0.0));
        graph.set_scale(root, vec3(2.0, 2.0, 2.0));

        let expected = Matrix4::from_translation(vec3(1.0, 2.0, 3.0))
            * Matrix4::from_axis_angle(vec3(0.0, 1.0, 0.0), Deg(90.0))
            * Matrix4::from_nonuniform_scale(2.0, 2.0, 2.0);
        assert_eq!(graph.world_transform(root), expected);
    }

    #[test]
    fn fresh_node_has_identity_world_transform() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(CUBE, None).unwrap();
        assert_eq!(graph.world_transform(root), Matrix4::identity());
    }

    #[test]
    fn child_composes_with_parent_world_transform() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(CUBE, None).unwrap();
        graph.set_translate(root, vec3(0.0, 0.0, -5.0));
        graph.set_scale(root, vec3(1.0, 2.0, 1.0));

        let child = graph.insert(CUBE, Some(root)).unwrap();
        graph.set_translate(child, vec3(0.0, 1.5, 0.0));
        graph.set_scale(child, vec3(1.0, 0.5, 1.0));

        // child world = child.t · child.s · root.t · root.s
        let expected = Matrix4::from_translation(vec3(0.0, 1.5, 0.0))
            * Matrix4::from_nonuniform_scale(1.0, 0.5, 1.0)
            * (Matrix4::from_translation(vec3(0.0, 0.0, -5.0))
                * Matrix4::from_nonuniform_scale(1.0, 2.0, 1.0));
        assert_mat4_eq(graph.world_transform(child), expected);
    }

    #[test]
    fn setters_overwrite_instead_of_composing() {
        let mut graph = SceneGraph::new();
        let node = graph.insert(CUBE, None).unwrap();
        graph.set_translate(node, vec3(1.0, 0.0, 0.0));
        graph.set_translate(node, vec3(0.0, 7.0, 0.0));
        assert_eq!(
            graph.world_transform(node),
            Matrix4::from_translation(vec3(0.0, 7.0, 0.0))
        );

        graph.set_scale(node, vec3(3.0, 3.0, 3.0));
        graph.set_scale(node, vec3(1.0, 1.0, 1.0));
        assert_eq!(
            graph.world_transform(node),
            Matrix4::from_translation(vec3(0.0, 7.0, 0.0))
        );
    }

    #[test]
    fn depth_three_chain_matches_direct_product() {
        let mut graph = SceneGraph::new();
        let torso = graph.insert(CUBE, None).unwrap();
        graph.set_translate(torso, vec3(0.0, 0.0, -5.0));
        graph.set_scale(torso, vec3(1.0, 2.0, 1.0));
        let upper = graph.insert(CUBE, Some(torso)).unwrap();
        graph.set_translate(upper, vec3(-0.5, -2.0, 0.0));
        graph.set_scale(upper, vec3(0.5, 0.5, 1.0));
        let lower = graph.insert(CUBE, Some(upper)).unwrap();
        graph.set_translate(lower, vec3(0.0, -1.1, 0.0));

        let local = |t: Vector3<f32>, s: Vector3<f32>| {
            Matrix4::from_translation(t) * Matrix4::from_nonuniform_scale(s.x, s.y, s.z)
        };
        let expected = local(vec3(0.0, -1.1, 0.0), vec3(1.0, 1.0, 1.0))
            * local(vec3(-0.5, -2.0, 0.0), vec3(0.5, 0.5, 1.0))
            * local(vec3(0.0, 0.0, -5.0), vec3(1.0, 2.0, 1.0));
        assert_mat4_eq(graph.world_transform(lower), expected);
    }

    #[test]
    fn insert_rejects_unknown_parent() {
        let mut graph = SceneGraph::new();
        let mut other = SceneGraph::new();
        let foreign = other.insert(CUBE, None).unwrap();
        assert_eq!(
            graph.insert(CUBE, Some(foreign)),
            Err(SceneGraphError::UnknownParent(foreign))
        );
    }

    #[test]
    fn set_parent_rejects_self_parenting() {
        let mut graph = SceneGraph::new();
        let node = graph.insert(CUBE, None).unwrap();
        assert_eq!(
            graph.set_parent(node, Some(node)),
            Err(SceneGraphError::WouldCycle {
                child: node,
                parent: node
            })
        );
    }

    #[test]
    fn set_parent_rejects_two_node_loop() {
        let mut graph = SceneGraph::new();
        let a = graph.insert(CUBE, None).unwrap();
        let b = graph.insert(CUBE, Some(a)).unwrap();
        assert_eq!(
            graph.set_parent(a, Some(b)),
            Err(SceneGraphError::WouldCycle { child: a, parent: b })
        );
    }

    #[test]
    fn set_parent_reattaches_valid_wiring() {
        let mut graph = SceneGraph::new();
        let a = graph.insert(CUBE, None).unwrap();
        let b = graph.insert(CUBE, Some(a)).unwrap();
        let c = graph.insert(CUBE, Some(b)).unwrap();

        graph.set_parent(c, Some(a)).unwrap();
        assert_eq!(graph.parent(c), Some(a));
        graph.set_parent(c, None).unwrap();
        assert_eq!(graph.parent(c), None);
    }
}
