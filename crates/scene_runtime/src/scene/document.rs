//! Scene description parser
//!
//! A scene file is a JSON array of records. Each object record carries a
//! `"type"` discriminator (SCENE, NODE, MESH, CAMERA, DRIVER, MATERIAL,
//! ENVIRONMENT); anything else, including the leading format tag string, is
//! skipped. Every field is optional at this level: a missing or mistyped field
//! leaves the entity's default in place and never fails the load.

use std::path::Path;

use log::{debug, info, warn};
use serde_json::{Map, Value};

use crate::foundation::collections::NodeArena;
use crate::foundation::math::{quat_from_xyzw, Vec3};
use crate::scene::entities::{
    Attribute, Camera, Channel, ColorSource, Driver, Environment, IndexBuffer, Interpolation,
    Keyframe, Material, MaterialKind, Mesh, Node, NodeRef, Perspective, Radiance, ScalarSource,
    Scene, Texture, DEFAULT_ALBEDO,
};
use crate::scene::error::{SceneError, SceneResult};

type Record = Map<String, Value>;

/// Every entity parsed from one scene description, before graph build
#[derive(Debug, Clone, Default)]
pub struct SceneDocument {
    /// The (last) SCENE record
    pub scene: Scene,
    /// All NODE records in declaration order
    pub nodes: NodeArena<Node>,
    /// All MESH records
    pub meshes: Vec<Mesh>,
    /// All CAMERA records
    pub cameras: Vec<Camera>,
    /// All DRIVER records
    pub drivers: Vec<Driver>,
    /// All MATERIAL records
    pub materials: Vec<Material>,
    /// All ENVIRONMENT records
    pub environments: Vec<Environment>,
    /// Loop length: latest keyframe time plus the final inter-frame delta
    pub animation_duration: f32,
}

impl SceneDocument {
    /// Read and parse a scene file
    pub fn from_file(path: impl AsRef<Path>) -> SceneResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let document = Self::parse_str(&text)?;
        info!(
            "Loaded scene '{}' from {}: {} nodes, {} meshes, {} cameras, {} drivers, {} materials",
            document.scene.name,
            path.display(),
            document.nodes.len(),
            document.meshes.len(),
            document.cameras.len(),
            document.drivers.len(),
            document.materials.len(),
        );
        Ok(document)
    }

    /// Parse scene text
    pub fn parse_str(text: &str) -> SceneResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    /// Parse an already decoded JSON document
    pub fn from_value(value: &Value) -> SceneResult<Self> {
        let records = value.as_array().ok_or(SceneError::NotARecordList)?;
        Ok(Self::from_records(records))
    }

    /// Parse a sequence of generic records; never fails
    pub fn from_records(records: &[Value]) -> Self {
        let mut document = Self::default();
        for (index, item) in records.iter().enumerate() {
            let Some(record) = item.as_object() else {
                continue;
            };
            let Some(kind) = record.get("type").and_then(Value::as_str) else {
                debug!("Record {index} has no type, skipping");
                continue;
            };
            match kind {
                "SCENE" => document.scene = parse_scene(record),
                "NODE" => {
                    document.nodes.push(parse_node(record));
                }
                "MESH" => document.meshes.push(parse_mesh(record)),
                "CAMERA" => document.cameras.push(parse_camera(record)),
                "DRIVER" => {
                    let driver = parse_driver(record);
                    document.extend_duration(&driver);
                    document.drivers.push(driver);
                }
                "MATERIAL" => document.materials.push(parse_material(record)),
                "ENVIRONMENT" => document.environments.push(parse_environment(record)),
                other => debug!("Record {index} has unknown type '{other}', skipping"),
            }
        }
        document
    }

    // Running maximum over keyframe times; the last increase is added once
    // more so the final frame has an interval to blend back into the first.
    fn extend_duration(&mut self, driver: &Driver) {
        let mut last_increase = 0.0;
        for frame in &driver.frames {
            if frame.time > self.animation_duration {
                last_increase = frame.time - self.animation_duration;
                self.animation_duration = frame.time;
            }
        }
        self.animation_duration += last_increase;
    }
}

fn string_field(record: &Record, key: &str) -> Option<String> {
    record.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn number_field(record: &Record, key: &str) -> Option<f32> {
    record.get(key).and_then(Value::as_f64).map(|n| n as f32)
}

fn u32_field(record: &Record, key: &str) -> Option<u32> {
    record
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
}

fn object_field<'a>(record: &'a Record, key: &str) -> Option<&'a Record> {
    record.get(key).and_then(Value::as_object)
}

fn number_array<const N: usize>(value: &Value) -> Option<[f32; N]> {
    let array = value.as_array()?;
    if array.len() != N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, item) in out.iter_mut().zip(array) {
        *slot = item.as_f64()? as f32;
    }
    Some(out)
}

fn array_field<const N: usize>(record: &Record, key: &str) -> Option<[f32; N]> {
    let value = record.get(key)?;
    let parsed = number_array(value);
    if parsed.is_none() {
        warn!("Field '{key}' is not an array of {N} numbers, using default");
    }
    parsed
}

fn refs_field(record: &Record, key: &str) -> Vec<NodeRef> {
    let Some(items) = record.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(name) => Some(NodeRef::Name(name.clone())),
            Value::Number(n) if n.is_i64() => n.as_i64().map(NodeRef::Index),
            other => {
                debug!("Ignoring node reference {other} in '{key}'");
                None
            }
        })
        .collect()
}

fn texture_field(record: &Record, key: &str) -> Option<Texture> {
    object_field(record, key)
        .and_then(|obj| string_field(obj, "src"))
        .map(|src| Texture { src })
}

fn parse_scene(record: &Record) -> Scene {
    Scene {
        name: string_field(record, "name").unwrap_or_default(),
        roots: refs_field(record, "roots"),
    }
}

fn parse_node(record: &Record) -> Node {
    let mut node = Node {
        name: string_field(record, "name").unwrap_or_default(),
        children: refs_field(record, "children"),
        mesh_name: string_field(record, "mesh"),
        camera_name: string_field(record, "camera"),
        environment_name: string_field(record, "environment"),
        light_name: string_field(record, "light"),
        ..Node::default()
    };
    if let Some([x, y, z]) = array_field(record, "translation") {
        node.position = Vec3::new(x, y, z);
    }
    if let Some([x, y, z, w]) = array_field(record, "rotation") {
        node.rotation = quat_from_xyzw(x, y, z, w);
    }
    if let Some([x, y, z]) = array_field(record, "scale") {
        node.scale = Vec3::new(x, y, z);
    }
    node
}

fn parse_mesh(record: &Record) -> Mesh {
    let mut mesh = Mesh {
        name: string_field(record, "name").unwrap_or_default(),
        topology: string_field(record, "topology").unwrap_or_default(),
        count: u32_field(record, "count").unwrap_or(0),
        material: string_field(record, "material"),
        ..Mesh::default()
    };

    if let Some(indices) = object_field(record, "indices") {
        mesh.indices = Some(IndexBuffer {
            src: string_field(indices, "src").unwrap_or_default(),
            offset: u32_field(indices, "offset").unwrap_or(0),
            format: string_field(indices, "format").unwrap_or_default(),
        });
    }

    match object_field(record, "attributes") {
        Some(attributes) => {
            for (semantic, value) in attributes {
                let Some(attr) = value.as_object() else {
                    warn!("Mesh '{}': attribute {semantic} is not an object", mesh.name);
                    continue;
                };
                mesh.attributes.insert(
                    semantic.clone(),
                    Attribute {
                        src: string_field(attr, "src").unwrap_or_default(),
                        offset: u32_field(attr, "offset").unwrap_or(0),
                        stride: u32_field(attr, "stride").unwrap_or(0),
                        format: string_field(attr, "format").unwrap_or_default(),
                    },
                );
            }
        }
        None => warn!("Mesh '{}' has no attributes", mesh.name),
    }

    mesh
}

fn parse_camera(record: &Record) -> Camera {
    let mut camera = Camera {
        name: string_field(record, "name").unwrap_or_default(),
        perspective: Perspective::default(),
    };
    if let Some(perspective) = object_field(record, "perspective") {
        let p = &mut camera.perspective;
        p.aspect = number_field(perspective, "aspect").unwrap_or(p.aspect);
        p.vfov = number_field(perspective, "vfov").unwrap_or(p.vfov);
        p.near = number_field(perspective, "near").unwrap_or(p.near);
        p.far = number_field(perspective, "far").unwrap_or(p.far);
    }
    if !camera.is_valid() {
        warn!("Camera '{}' has an unusable projection {:?}", camera.name, camera.perspective);
    }
    camera
}

fn parse_channel(name: &str) -> Option<Channel> {
    match name {
        "translation" => Some(Channel::Translation),
        "scale" => Some(Channel::Scale),
        "rotation" => Some(Channel::Rotation),
        _ => None,
    }
}

fn parse_interpolation(name: &str) -> Option<Interpolation> {
    match name {
        "STEP" => Some(Interpolation::Step),
        "LINEAR" => Some(Interpolation::Linear),
        "SLERP" => Some(Interpolation::Slerp),
        _ => None,
    }
}

fn parse_driver(record: &Record) -> Driver {
    let mut driver = Driver {
        name: string_field(record, "name").unwrap_or_default(),
        node: string_field(record, "node").unwrap_or_default(),
        channel: string_field(record, "channel").as_deref().and_then(parse_channel),
        ..Driver::default()
    };
    if let Some(mode) = string_field(record, "interpolation") {
        match parse_interpolation(&mode) {
            Some(interpolation) => driver.interpolation = interpolation,
            None => warn!("Driver '{}': unknown interpolation '{mode}'", driver.name),
        }
    }

    let times = record.get("times").and_then(Value::as_array);
    let values = record.get("values").and_then(Value::as_array);
    match (driver.channel, times, values) {
        (Some(channel), Some(times), Some(values)) => {
            driver.frames = parse_keyframes(&driver.name, channel, times, values);
        }
        (None, _, _) => warn!("Driver '{}' has no valid channel, keyframes dropped", driver.name),
        _ => warn!("Driver '{}' is missing times or values", driver.name),
    }
    driver
}

fn parse_keyframes(name: &str, channel: Channel, times: &[Value], values: &[Value]) -> Vec<Keyframe> {
    let dim = channel.dimension();
    if times.len() * dim != values.len() {
        warn!(
            "Driver '{name}': {} times need {} values, got {}; keyframes dropped",
            times.len(),
            times.len() * dim,
            values.len()
        );
        return Vec::new();
    }

    let mut frames = Vec::with_capacity(times.len());
    for (time, chunk) in times.iter().zip(values.chunks(dim)) {
        let time = time.as_f64().map(|t| t as f32);
        let value: Option<Vec<f32>> = chunk.iter().map(|v| v.as_f64().map(|n| n as f32)).collect();
        match (time, value) {
            (Some(time), Some(value)) if time.is_finite() => frames.push(Keyframe { time, value }),
            _ => {
                warn!("Driver '{name}': non-numeric keyframe data; keyframes dropped");
                return Vec::new();
            }
        }
    }

    if frames.windows(2).any(|pair| pair[1].time < pair[0].time) {
        warn!("Driver '{name}': keyframe times decrease; keyframes dropped");
        return Vec::new();
    }
    frames
}

fn color_source(value: &Value) -> Option<ColorSource> {
    if let Some([r, g, b]) = number_array(value) {
        return Some(ColorSource::Value(Vec3::new(r, g, b)));
    }
    value
        .as_object()
        .and_then(|obj| string_field(obj, "src"))
        .map(|src| ColorSource::Texture(Texture { src }))
}

fn scalar_source(value: &Value) -> Option<ScalarSource> {
    if let Some(n) = value.as_f64() {
        return Some(ScalarSource::Value(n as f32));
    }
    value
        .as_object()
        .and_then(|obj| string_field(obj, "src"))
        .map(|src| ScalarSource::Texture(Texture { src }))
}

fn default_albedo() -> ColorSource {
    ColorSource::Value(Vec3::from(DEFAULT_ALBEDO))
}

fn parse_material(record: &Record) -> Material {
    let kind = if let Some(pbr) = object_field(record, "pbr") {
        MaterialKind::Pbr {
            albedo: pbr.get("albedo").and_then(color_source).unwrap_or_else(default_albedo),
            roughness: pbr
                .get("roughness")
                .and_then(scalar_source)
                .unwrap_or(ScalarSource::Value(1.0)),
            metalness: pbr
                .get("metalness")
                .and_then(scalar_source)
                .unwrap_or(ScalarSource::Value(0.0)),
        }
    } else if let Some(lambertian) = object_field(record, "lambertian") {
        MaterialKind::Lambertian {
            albedo: lambertian
                .get("albedo")
                .and_then(color_source)
                .unwrap_or_else(default_albedo),
        }
    } else if object_field(record, "mirror").is_some() {
        MaterialKind::Mirror
    } else if object_field(record, "environment").is_some() {
        MaterialKind::Environment
    } else {
        MaterialKind::default()
    };

    Material {
        name: string_field(record, "name").unwrap_or_default(),
        kind,
        normal_map: texture_field(record, "normalMap"),
        displacement_map: texture_field(record, "displacementMap"),
    }
}

fn parse_environment(record: &Record) -> Environment {
    Environment {
        name: string_field(record, "name").unwrap_or_default(),
        radiance: object_field(record, "radiance").map(|radiance| Radiance {
            src: string_field(radiance, "src").unwrap_or_default(),
            kind: string_field(radiance, "type").unwrap_or_default(),
            format: string_field(radiance, "format").unwrap_or_default(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Quat;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn parse(value: Value) -> SceneDocument {
        SceneDocument::from_value(&value).unwrap()
    }

    #[test]
    fn test_untyped_and_unknown_records_are_skipped() {
        let doc = parse(json!([
            "s72-v2",
            {"name": "no type"},
            {"type": "LIGHT", "name": "sun"},
            {"type": 7},
            {"type": "NODE", "name": "a"}
        ]));
        assert_eq!(doc.nodes.len(), 1);
        assert!(doc.meshes.is_empty());
    }

    #[test]
    fn test_non_array_document_is_an_error() {
        let result = SceneDocument::from_value(&json!({"type": "SCENE"}));
        assert!(matches!(result, Err(SceneError::NotARecordList)));
    }

    #[test]
    fn test_scene_roots_mix_names_and_indices() {
        let doc = parse(json!([
            {"type": "SCENE", "name": "s", "roots": ["a", 2, true, -3]}
        ]));
        assert_eq!(doc.scene.name, "s");
        assert_eq!(
            doc.scene.roots,
            vec![NodeRef::Name("a".into()), NodeRef::Index(2), NodeRef::Index(-3)]
        );
    }

    #[test]
    fn test_fractional_references_are_skipped() {
        let doc = parse(json!([
            {"type": "SCENE", "roots": [1.9, -0.5, 2.0, 1]},
            {"type": "NODE", "name": "p", "children": [0.5, "q"]}
        ]));
        assert_eq!(doc.scene.roots, vec![NodeRef::Index(1)]);
        let p = doc.nodes.id_at(0).unwrap();
        assert_eq!(doc.nodes[p].children, vec![NodeRef::Name("q".into())]);
    }

    #[test]
    fn test_node_fields_and_defaults() {
        let doc = parse(json!([
            {"type": "NODE", "name": "full",
             "translation": [1, 2, 3], "rotation": [0, 0, 0, 1], "scale": [2, 2, 2],
             "children": ["x", 0], "mesh": "m", "camera": "c", "light": "l"},
            {"type": "NODE", "name": "bad", "translation": [1, 2], "scale": "big", "mesh": 4}
        ]));
        let full = &doc.nodes[doc.nodes.id_at(0).unwrap()];
        assert_eq!(full.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(full.rotation, Quat::identity());
        assert_eq!(full.scale, Vec3::new(2.0, 2.0, 2.0));
        assert_eq!(full.children.len(), 2);
        assert_eq!(full.mesh_name.as_deref(), Some("m"));
        assert_eq!(full.camera_name.as_deref(), Some("c"));
        assert_eq!(full.light_name.as_deref(), Some("l"));

        let bad = &doc.nodes[doc.nodes.id_at(1).unwrap()];
        assert_eq!(bad.position, Vec3::zeros());
        assert_eq!(bad.scale, Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(bad.mesh_name, None);
    }

    #[test]
    fn test_mesh_attributes_and_indices() {
        let doc = parse(json!([
            {"type": "MESH", "name": "cube", "topology": "TRIANGLE_LIST", "count": 36,
             "indices": {"src": "cube.idx", "offset": 0, "format": "UINT32"},
             "attributes": {
                "POSITION": {"src": "cube.b72", "offset": 0, "stride": 52, "format": "R32G32B32_SFLOAT"},
                "NORMAL": {"src": "cube.b72", "offset": 12, "stride": 52, "format": "R32G32B32_SFLOAT"}
             },
             "material": "red"}
        ]));
        let mesh = &doc.meshes[0];
        assert_eq!(mesh.count, 36);
        assert_eq!(mesh.indices.as_ref().unwrap().format, "UINT32");
        assert_eq!(mesh.attributes["NORMAL"].offset, 12);
        assert_eq!(mesh.attributes["POSITION"].stride, 52);
        assert_eq!(mesh.material.as_deref(), Some("red"));
    }

    #[test]
    fn test_camera_perspective() {
        let doc = parse(json!([
            {"type": "CAMERA", "name": "cam",
             "perspective": {"aspect": 1.5, "vfov": 1.0, "near": 0.1, "far": 10}}
        ]));
        let camera = &doc.cameras[0];
        assert!(camera.is_valid());
        assert_relative_eq!(camera.perspective.far, 10.0);
    }

    #[test]
    fn test_driver_keyframes_and_duration() {
        let doc = parse(json!([
            {"type": "DRIVER", "name": "move", "node": "a", "channel": "translation",
             "times": [0, 1, 2], "values": [0,0,0, 1,0,0, 2,0,0], "interpolation": "STEP"}
        ]));
        let driver = &doc.drivers[0];
        assert_eq!(driver.channel, Some(Channel::Translation));
        assert_eq!(driver.interpolation, Interpolation::Step);
        assert_eq!(driver.frames.len(), 3);
        assert_eq!(driver.frames[2].value, vec![2.0, 0.0, 0.0]);
        // latest time 2 plus the final delta 1
        assert_relative_eq!(doc.animation_duration, 3.0);
    }

    #[test]
    fn test_driver_length_mismatch_drops_keyframes() {
        let doc = parse(json!([
            {"type": "DRIVER", "name": "broken", "node": "a", "channel": "rotation",
             "times": [0, 1], "values": [0, 0, 0, 1, 0, 0, 0]}
        ]));
        assert!(doc.drivers[0].frames.is_empty());
        assert_eq!(doc.animation_duration, 0.0);
    }

    #[test]
    fn test_driver_decreasing_times_drop_keyframes() {
        let doc = parse(json!([
            {"type": "DRIVER", "node": "a", "channel": "scale",
             "times": [1, 0], "values": [1,1,1, 2,2,2]}
        ]));
        assert!(doc.drivers[0].frames.is_empty());
    }

    #[test]
    fn test_driver_without_channel_is_inert() {
        let doc = parse(json!([
            {"type": "DRIVER", "node": "a", "channel": "color", "times": [0], "values": [1, 1, 1]}
        ]));
        assert_eq!(doc.drivers[0].channel, None);
        assert!(doc.drivers[0].frames.is_empty());
    }

    #[test]
    fn test_materials() {
        let doc = parse(json!([
            {"type": "MATERIAL", "name": "p",
             "pbr": {"albedo": {"src": "a.png"}, "roughness": 0.25, "metalness": {"src": "m.png"}},
             "normalMap": {"src": "n.png"}},
            {"type": "MATERIAL", "name": "l", "lambertian": {"albedo": [0.1, 0.2, 0.3]}},
            {"type": "MATERIAL", "name": "m", "mirror": {}},
            {"type": "MATERIAL", "name": "e", "environment": {}},
            {"type": "MATERIAL", "name": "none"}
        ]));
        match &doc.materials[0].kind {
            MaterialKind::Pbr { albedo, roughness, metalness } => {
                assert_eq!(albedo, &ColorSource::Texture(Texture { src: "a.png".into() }));
                assert_eq!(roughness, &ScalarSource::Value(0.25));
                assert_eq!(metalness, &ScalarSource::Texture(Texture { src: "m.png".into() }));
            }
            other => panic!("expected pbr, got {other:?}"),
        }
        assert_eq!(doc.materials[0].normal_map.as_ref().unwrap().src, "n.png");
        assert_eq!(
            doc.materials[1].kind,
            MaterialKind::Lambertian { albedo: ColorSource::Value(Vec3::new(0.1, 0.2, 0.3)) }
        );
        assert_eq!(doc.materials[2].kind, MaterialKind::Mirror);
        assert_eq!(doc.materials[3].kind, MaterialKind::Environment);
        assert_eq!(doc.materials[4].kind, MaterialKind::default());
    }

    #[test]
    fn test_environment_radiance() {
        let doc = parse(json!([
            {"type": "ENVIRONMENT", "name": "sky",
             "radiance": {"src": "sky.png", "type": "cube", "format": "rgbe"}}
        ]));
        let radiance = doc.environments[0].radiance.as_ref().unwrap();
        assert_eq!(radiance.src, "sky.png");
        assert_eq!(radiance.kind, "cube");
        assert_eq!(radiance.format, "rgbe");
    }
}
