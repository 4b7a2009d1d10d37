//! World transform composition through the public scene graph API.

use cgmath::{Deg, Matrix4, SquareMatrix, vec3};
use mannequin::data_structures::scene_graph::{ModelId, SceneGraph, SceneGraphError};

const MODEL: ModelId = ModelId(0);

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
fn world_transform_orders_scale_rotate_translate() {
    let mut graph = SceneGraph::new();
    let node = graph.insert(MODEL, None).unwrap();
    graph.set_scale(node, vec3(2.0, 1.0, 1.0));
    graph.set_rotate(node, Deg(90.0), vec3(0.0, 0.0, 1.0));
    graph.set_translate(node, vec3(0.0, 3.0, 0.0));

    // A point at local x=1 is first stretched to x=2, then rotated onto the
    // y axis, then lifted by the translation.
    let p = graph.world_transform(node) * cgmath::vec4(1.0, 0.0, 0.0, 1.0);
    assert!((p.x - 0.0).abs() < 1e-5);
    assert!((p.y - 5.0).abs() < 1e-5);
    assert!((p.z - 0.0).abs() < 1e-5);
}

#[test]
fn reparenting_changes_the_composed_transform() {
    let mut graph = SceneGraph::new();
    let a = graph.insert(MODEL, None).unwrap();
    graph.set_translate(a, vec3(10.0, 0.0, 0.0));
    let b = graph.insert(MODEL, None).unwrap();
    graph.set_translate(b, vec3(0.0, 20.0, 0.0));
    let child = graph.insert(MODEL, Some(a)).unwrap();
    graph.set_translate(child, vec3(1.0, 0.0, 0.0));

    assert_mat4_eq(
        graph.world_transform(child),
        Matrix4::from_translation(vec3(1.0, 0.0, 0.0))
            * Matrix4::from_translation(vec3(10.0, 0.0, 0.0)),
    );

    graph.set_parent(child, Some(b)).unwrap();
    assert_mat4_eq(
        graph.world_transform(child),
        Matrix4::from_translation(vec3(1.0, 0.0, 0.0))
            * Matrix4::from_translation(vec3(0.0, 20.0, 0.0)),
    );
}

#[test]
fn detached_node_falls_back_to_its_local_transform() {
    let mut graph = SceneGraph::new();
    let root = graph.insert(MODEL, None).unwrap();
    graph.set_translate(root, vec3(5.0, 5.0, 5.0));
    let child = graph.insert(MODEL, Some(root)).unwrap();

    graph.set_parent(child, None).unwrap();
    assert_eq!(graph.world_transform(child), Matrix4::identity());
}

#[test]
fn cycles_are_rejected_across_long_chains() {
    let mut graph = SceneGraph::new();
    let mut ids = vec![graph.insert(MODEL, None).unwrap()];
    for _ in 0..5 {
        let parent = *ids.last().unwrap();
        ids.push(graph.insert(MODEL, Some(parent)).unwrap());
    }

    let head = ids[0];
    let tail = *ids.last().unwrap();
    assert_eq!(
        graph.set_parent(head, Some(tail)),
        Err(SceneGraphError::WouldCycle {
            child: head,
            parent: tail
        })
    );
    // The failed call must leave the wiring untouched.
    assert_eq!(graph.parent(head), None);
}
