//! Scene loading and per-frame scene state
//!
//! ## Architecture
//!
//! ```text
//! scene file (JSON records)
//!      ↓ document     typed entities, tolerant of bad fields
//!      ↓ graph        parent links, bindings, camera paths
//!      ↓ context      per frame: animation → transforms → camera → culling
//! render instances (consumed by an external renderer)
//! ```

pub mod animation;
pub mod context;
pub mod culling;
pub mod document;
pub mod entities;
pub mod error;
pub mod graph;
pub mod render_queue;
pub mod resolve;
pub mod transform;

#[cfg(test)]
mod tests;

pub use animation::{Animator, ChannelValue, DriverBinding};
pub use context::{FrameOutput, SceneContext};
pub use culling::{BBox, Frustum, Plane};
pub use document::SceneDocument;
pub use entities::{
    Attribute, Camera, Channel, ColorSource, Driver, Environment, IndexBuffer, Interpolation,
    Keyframe, Material, MaterialKind, Mesh, Named, Node, NodeRef, Perspective, Radiance,
    ScalarSource, Scene, Texture, Trs,
};
pub use error::{SceneError, SceneResult};
pub use graph::{SceneGraph, USER_CAMERA_NAME};
pub use render_queue::{InstanceData, RenderInstance, VertexRange};
pub use transform::{local_to_world, world_to_local};
