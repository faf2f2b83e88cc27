//! Shared test scenes

use serde_json::{json, Value};

use crate::assets::AttributeBuffers;
use crate::core::config::RuntimeConfig;
use crate::foundation::math::Vec3;
use crate::scene::{SceneContext, SceneDocument};

/// A unit cube around the origin
pub fn cube_positions() -> Vec<Vec3> {
    let mut positions = Vec::new();
    for x in [-1.0, 1.0] {
        for y in [-1.0, 1.0] {
            for z in [-1.0, 1.0] {
                positions.push(Vec3::new(x, y, z));
            }
        }
    }
    positions
}

/// Two cameras looking down -Z at a cube that slides along X, plus a cube
/// far beyond the far plane
pub fn stage() -> Value {
    json!([
        "s72-v2",
        {"type": "SCENE", "name": "stage", "roots": ["world", "far-away"]},
        {"type": "NODE", "name": "world", "children": ["box", "eye", "side-eye"]},
        {"type": "NODE", "name": "box", "mesh": "cube"},
        {"type": "NODE", "name": "eye", "translation": [0, 0, 10], "camera": "main"},
        {"type": "NODE", "name": "side-eye", "translation": [0, 0, 20], "camera": "wide"},
        {"type": "NODE", "name": "far-away", "translation": [0, 0, -500], "mesh": "cube"},
        {"type": "NODE", "name": "unreachable", "mesh": "cube"},
        {"type": "MESH", "name": "cube", "count": 36, "material": "red",
         "attributes": {"POSITION": {"src": "cube.b72", "offset": 0, "stride": 12,
                                     "format": "R32G32B32_SFLOAT"}}},
        {"type": "MATERIAL", "name": "red", "lambertian": {"albedo": [1, 0, 0]}},
        {"type": "CAMERA", "name": "main",
         "perspective": {"aspect": 1.5, "vfov": 1.0, "near": 0.1, "far": 100}},
        {"type": "CAMERA", "name": "wide",
         "perspective": {"aspect": 1.5, "vfov": 1.6, "near": 0.1, "far": 100}},
        {"type": "CAMERA", "name": "broken",
         "perspective": {"aspect": 1.5, "vfov": 1.0, "near": 5, "far": 1}},
        {"type": "DRIVER", "name": "slide", "node": "box", "channel": "translation",
         "times": [0, 1, 2], "values": [0,0,0, 2,0,0, 4,0,0], "interpolation": "LINEAR"}
    ])
}

/// Load a scene value with cube positions available
pub fn load(value: &Value, config: RuntimeConfig) -> SceneContext {
    let document = SceneDocument::from_value(value).unwrap();
    let mut buffers = AttributeBuffers::new().with_positions("cube", cube_positions());
    SceneContext::load(document, &mut buffers, config).unwrap()
}

/// Load the stage with default configuration
pub fn load_stage() -> SceneContext {
    load(&stage(), RuntimeConfig::default())
}
