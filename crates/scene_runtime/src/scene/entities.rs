//! Scene entity records
//!
//! Plain data parsed from a scene description. Nodes carry their local TRS and
//! the references that the graph builder later resolves into handles; the
//! transform math lives in [`crate::scene::transform`].

use std::collections::BTreeMap;

use crate::foundation::collections::NodeId;
use crate::foundation::math::{Quat, Vec3};

/// Reference to a node, either by name or by zero-based declaration index
#[derive(Debug, Clone, PartialEq)]
pub enum NodeRef {
    /// Match the first node with this name
    Name(String),
    /// Index into the node list; negative values never resolve
    Index(i64),
}

/// Entities that can be looked up by name
pub trait Named {
    /// The entity's declared name
    fn name(&self) -> &str;
}

/// The SCENE record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    /// Scene name
    pub name: String,
    /// Root references, resolved once during graph build
    pub roots: Vec<NodeRef>,
}

/// A scene-graph element with a local transform and optional bindings
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Node name
    pub name: String,
    /// Local translation
    pub position: Vec3,
    /// Local rotation
    pub rotation: Quat,
    /// Local scale
    pub scale: Vec3,
    /// Declared child references
    pub children: Vec<NodeRef>,
    /// Mesh name, if any
    pub mesh_name: Option<String>,
    /// Camera name, if any
    pub camera_name: Option<String>,
    /// Environment name, if any
    pub environment_name: Option<String>,
    /// Light name, if any
    pub light_name: Option<String>,

    /// Resolved children (set by the graph builder)
    pub child_ids: Vec<NodeId>,
    /// Non-owning back link to the parent (set by the graph builder)
    pub parent: Option<NodeId>,
    /// Resolved mesh index
    pub mesh: Option<usize>,
    /// Resolved camera index
    pub camera: Option<usize>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            name: String::new(),
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            children: Vec::new(),
            mesh_name: None,
            camera_name: None,
            environment_name: None,
            light_name: None,
            child_ids: Vec::new(),
            parent: None,
            mesh: None,
            camera: None,
        }
    }
}

impl Named for Node {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Local translation, rotation and scale of a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trs {
    /// Translation
    pub position: Vec3,
    /// Rotation
    pub rotation: Quat,
    /// Scale
    pub scale: Vec3,
}

impl Node {
    /// Snapshot of the node's local TRS
    pub fn trs(&self) -> Trs {
        Trs {
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
        }
    }

    /// Overwrite the node's local TRS
    pub fn set_trs(&mut self, trs: Trs) {
        self.position = trs.position;
        self.rotation = trs.rotation;
        self.scale = trs.scale;
    }
}

/// Index buffer descriptor of a mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexBuffer {
    /// Data file
    pub src: String,
    /// Byte offset into the file
    pub offset: u32,
    /// Index format (e.g. `UINT32`)
    pub format: String,
}

/// One named vertex attribute stream
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attribute {
    /// Data file
    pub src: String,
    /// Byte offset of the first element
    pub offset: u32,
    /// Byte distance between consecutive elements
    pub stride: u32,
    /// Element format (e.g. `R32G32B32_SFLOAT`)
    pub format: String,
}

/// The MESH record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Mesh name
    pub name: String,
    /// Primitive topology tag
    pub topology: String,
    /// Vertex count
    pub count: u32,
    /// Optional index buffer
    pub indices: Option<IndexBuffer>,
    /// Attribute streams keyed by semantic (POSITION, NORMAL, ...)
    pub attributes: BTreeMap<String, Attribute>,
    /// Material name, if any
    pub material: Option<String>,
}

impl Named for Mesh {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Perspective projection parameters
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Perspective {
    /// Width / height
    pub aspect: f32,
    /// Vertical field of view in radians
    pub vfov: f32,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
}

/// The CAMERA record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Camera {
    /// Camera name
    pub name: String,
    /// Projection parameters
    pub perspective: Perspective,
}

impl Camera {
    /// Whether the projection is usable: `far > near > 0`, positive aspect and fov
    pub fn is_valid(&self) -> bool {
        let p = &self.perspective;
        p.near > 0.0 && p.far > p.near && p.aspect > 0.0 && p.vfov > 0.0
    }
}

impl Named for Camera {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Which TRS component a driver animates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Node position, 3 values per frame
    Translation,
    /// Node scale, 3 values per frame
    Scale,
    /// Node rotation as `[x, y, z, w]`, 4 values per frame
    Rotation,
}

impl Channel {
    /// Number of values per keyframe
    pub fn dimension(self) -> usize {
        match self {
            Self::Translation | Self::Scale => 3,
            Self::Rotation => 4,
        }
    }
}

/// Keyframe interpolation mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Interpolation {
    /// Hold the value of the current frame
    Step,
    /// Componentwise blend
    #[default]
    Linear,
    /// Spherical blend (rotation channels)
    Slerp,
}

/// One keyframe; `value` has exactly `channel.dimension()` entries
#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
    /// Time in seconds
    pub time: f32,
    /// Channel value
    pub value: Vec<f32>,
}

/// The DRIVER record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Driver {
    /// Driver name
    pub name: String,
    /// Target node name
    pub node: String,
    /// Animated channel; a driver without one has no keyframes
    pub channel: Option<Channel>,
    /// Keyframes in non-decreasing time order
    pub frames: Vec<Keyframe>,
    /// Interpolation mode
    pub interpolation: Interpolation,
}

impl Named for Driver {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Reference to an image file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Texture {
    /// Image path relative to the scene file
    pub src: String,
}

/// Either a constant color or a texture
#[derive(Debug, Clone, PartialEq)]
pub enum ColorSource {
    /// Constant RGB
    Value(Vec3),
    /// Sampled from an image
    Texture(Texture),
}

/// Either a constant scalar or a texture
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarSource {
    /// Constant value
    Value(f32),
    /// Sampled from an image
    Texture(Texture),
}

/// Default albedo for materials that declare none
pub const DEFAULT_ALBEDO: [f32; 3] = [0.8, 0.8, 0.8];

/// Shading model of a material
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialKind {
    /// Metallic-roughness PBR
    Pbr {
        /// Base color
        albedo: ColorSource,
        /// Roughness
        roughness: ScalarSource,
        /// Metalness
        metalness: ScalarSource,
    },
    /// Diffuse only
    Lambertian {
        /// Base color
        albedo: ColorSource,
    },
    /// Perfect mirror
    Mirror,
    /// Environment lookup along the normal
    Environment,
}

impl Default for MaterialKind {
    fn default() -> Self {
        Self::Lambertian {
            albedo: ColorSource::Value(Vec3::from(DEFAULT_ALBEDO)),
        }
    }
}

/// The MATERIAL record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Material {
    /// Material name
    pub name: String,
    /// Shading model
    pub kind: MaterialKind,
    /// Tangent-space normal map
    pub normal_map: Option<Texture>,
    /// Displacement map
    pub displacement_map: Option<Texture>,
}

impl Named for Material {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Radiance map of an environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Radiance {
    /// Image path
    pub src: String,
    /// Map layout (e.g. `cube`)
    pub kind: String,
    /// Pixel encoding (e.g. `rgbe`)
    pub format: String,
}

/// The ENVIRONMENT record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    /// Environment name
    pub name: String,
    /// Radiance map, if declared
    pub radiance: Option<Radiance>,
}

impl Named for Environment {
    fn name(&self) -> &str {
        &self.name
    }
}
