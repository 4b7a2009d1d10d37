//! Figure assembly checks that run without a GPU.

use cgmath::vec4;
use mannequin::data_structures::scene_graph::{ModelId, SceneGraph};
use mannequin::figure::assemble;

const CUBE: ModelId = ModelId(0);
const SPHERE: ModelId = ModelId(1);

#[test]
fn figure_parts_occupy_distinct_nodes() {
    let mut graph = SceneGraph::new();
    let parts = assemble(&mut graph, CUBE, SPHERE).unwrap();

    let order = parts.draw_order();
    for (i, a) in order.iter().enumerate() {
        for b in &order[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn head_sits_above_the_torso_centre() {
    let mut graph = SceneGraph::new();
    let parts = assemble(&mut graph, CUBE, SPHERE).unwrap();

    let torso = graph.world_transform(parts.torso) * vec4(0.0, 0.0, 0.0, 1.0);
    let head = graph.world_transform(parts.head) * vec4(0.0, 0.0, 0.0, 1.0);
    assert!(head.y > torso.y);
    assert!((head.z - torso.z).abs() < 1e-5);
}

#[test]
fn arms_and_legs_mirror_across_the_torso() {
    let mut graph = SceneGraph::new();
    let parts = assemble(&mut graph, CUBE, SPHERE).unwrap();

    let origin = vec4(0.0, 0.0, 0.0, 1.0);
    let left_arm = graph.world_transform(parts.left_upper_arm) * origin;
    let right_arm = graph.world_transform(parts.right_upper_arm) * origin;
    assert!((left_arm.x + right_arm.x).abs() < 1e-5);
    assert!((left_arm.y - right_arm.y).abs() < 1e-5);

    let left_leg = graph.world_transform(parts.left_upper_leg) * origin;
    let right_leg = graph.world_transform(parts.right_upper_leg) * origin;
    assert!((left_leg.x + right_leg.x).abs() < 1e-5);
    assert!(left_leg.y < left_arm.y);
}

#[test]
fn rotating_an_upper_segment_moves_its_lower_segment() {
    let mut graph = SceneGraph::new();
    let parts = assemble(&mut graph, CUBE, SPHERE).unwrap();

    let before = graph.world_transform(parts.left_lower_arm) * vec4(0.0, 0.0, 0.0, 1.0);
    graph.set_rotate(parts.left_upper_arm, cgmath::Deg(45.0), cgmath::vec3(0.0, 1.0, 0.0));
    let after = graph.world_transform(parts.left_lower_arm) * vec4(0.0, 0.0, 0.0, 1.0);

    assert!((before.x - after.x).abs() > 1e-3 || (before.z - after.z).abs() > 1e-3);

    // The torso itself must not move when a limb is posed.
    let torso = graph.world_transform(parts.torso) * vec4(0.0, 0.0, 0.0, 1.0);
    assert!((torso.z - -5.0).abs() < 1e-5);
}
