//! Whole-scene invariants checked on loaded documents

use approx::assert_relative_eq;
use serde_json::json;

use super::fixtures::{load, stage};
use crate::assets::AttributeBuffers;
use crate::core::config::RuntimeConfig;
use crate::foundation::math::{Mat4, Vec3};
use crate::scene::{
    local_to_world, world_to_local, SceneContext, SceneDocument, SceneError, USER_CAMERA_NAME,
};

fn articulated() -> serde_json::Value {
    json!([
        {"type": "SCENE", "roots": ["base"]},
        {"type": "NODE", "name": "base", "translation": [1, -2, 3],
         "rotation": [0, 0.3826834, 0, 0.9238795], "scale": [2, 1, 1], "children": ["upper"]},
        {"type": "NODE", "name": "upper", "translation": [0, 4, 0],
         "rotation": [0.5, 0.5, 0.5, 0.5], "scale": [1, 0.5, 3], "children": ["hand"]},
        {"type": "NODE", "name": "hand", "translation": [0, 1, -1], "scale": [0.1, 0.1, 0.1]},
        {"type": "DRIVER", "name": "swing", "node": "upper", "channel": "rotation",
         "times": [0, 1], "values": [0, 0, 0, 1, 0, 0.7071068, 0, 0.7071068],
         "interpolation": "SLERP"}
    ])
}

#[test]
fn test_world_to_local_inverts_local_to_world() {
    let mut context = load(&articulated(), RuntimeConfig::default());
    for time in [0.0, 0.4, 1.3] {
        context.seek(time);
        let nodes = &context.document().nodes;
        for &id in &context.graph().traversal {
            let world = local_to_world(nodes, id);
            assert_relative_eq!(world_to_local(nodes, id) * world, Mat4::identity(), epsilon = 1e-4);
            assert_relative_eq!(*context.world_transform(id).unwrap(), world, epsilon = 1e-4);
        }
    }
}

#[test]
fn test_root_by_index_matches_root_by_name() {
    let mut by_name = stage();
    let mut by_index = stage();
    by_name[1]["roots"] = json!(["world", "far-away"]);
    // "world" is node 0 and "far-away" is node 4 in declaration order
    by_index[1]["roots"] = json!([0, 4]);

    let mut a = load(&by_name, RuntimeConfig::default().with_culling(false));
    let mut b = load(&by_index, RuntimeConfig::default().with_culling(false));
    let (frame_a, frame_b) = (a.update(0.7), b.update(0.7));

    assert_eq!(a.graph().roots, b.graph().roots);
    assert_eq!(frame_a.instances.len(), frame_b.instances.len());
    assert_eq!(frame_a.clip_from_world, frame_b.clip_from_world);
    for (x, y) in frame_a.instances.iter().zip(&frame_b.instances) {
        assert_eq!(x.world_from_local, y.world_from_local);
    }
}

#[test]
fn test_animation_loops_continuously() {
    let context = load(&stage(), RuntimeConfig::default());
    let document = context.document();
    let duration = document.animation_duration;
    for driver in &document.drivers {
        assert_eq!(driver.sample(duration, duration), driver.sample(0.0, duration));
    }
}

#[test]
fn test_malformed_driver_never_moves_its_node() {
    let value = json!([
        {"type": "SCENE", "roots": ["n"]},
        {"type": "NODE", "name": "n", "translation": [1, 2, 3]},
        {"type": "DRIVER", "node": "n", "channel": "translation",
         "times": [0, 1], "values": [0, 0, 0, 5, 5]}
    ]);
    let mut context = load(&value, RuntimeConfig::default());
    assert!(context.document().drivers[0].frames.is_empty());

    let id = context.graph().node_by_name("n").unwrap();
    for _ in 0..5 {
        context.update(0.3);
        assert_eq!(context.document().nodes[id].position, Vec3::new(1.0, 2.0, 3.0));
    }
}

#[test]
fn test_driver_for_unreachable_node_is_inert() {
    let value = json!([
        {"type": "SCENE", "roots": ["a"]},
        {"type": "NODE", "name": "a"},
        {"type": "NODE", "name": "hidden"},
        {"type": "DRIVER", "node": "hidden", "channel": "scale",
         "times": [0, 1], "values": [1, 1, 1, 3, 3, 3]}
    ]);
    let mut context = load(&value, RuntimeConfig::default());
    context.update(0.5);

    let hidden = context.document().nodes.id_at(1).unwrap();
    assert_eq!(context.document().nodes[hidden].scale, Vec3::new(1.0, 1.0, 1.0));
}

#[test]
fn test_cyclic_scene_fails_to_load() {
    let value = json!([
        {"type": "SCENE", "roots": ["a"]},
        {"type": "NODE", "name": "a", "children": ["b"]},
        {"type": "NODE", "name": "b", "children": ["c"]},
        {"type": "NODE", "name": "c", "children": ["a"]}
    ]);
    let document = SceneDocument::from_value(&value).unwrap();
    let result = SceneContext::load(document, &mut AttributeBuffers::new(), RuntimeConfig::default());
    assert!(matches!(result, Err(SceneError::CyclicGraph { .. })));
}

#[test]
fn test_exactly_one_camera_is_synthesized() {
    let value = json!([
        {"type": "SCENE", "roots": ["a"]},
        {"type": "NODE", "name": "a", "translation": [0, 1, 0]}
    ]);
    let context = load(&value, RuntimeConfig::default());
    let document = context.document();

    assert_eq!(document.cameras.len(), 1);
    assert_eq!(document.cameras[0].name, USER_CAMERA_NAME);
    assert!(context.graph().camera_path(USER_CAMERA_NAME).is_some());
    assert_eq!(context.graph().camera_paths.len(), 1);
}

#[test]
fn test_unparseable_text_is_an_error() {
    assert!(matches!(SceneDocument::parse_str("[{"), Err(SceneError::Json(_))));
    assert!(matches!(
        SceneContext::from_file("/definitely/not/here.s72", RuntimeConfig::default()),
        Err(SceneError::Io(_))
    ));
}
