//! Per-frame render instances
//!
//! What the external renderer consumes: one instance per reachable node with a
//! mesh, after culling, plus a plain-old-data upload record.

use bytemuck::{Pod, Zeroable};

use crate::foundation::collections::NodeId;
use crate::foundation::math::Mat4;
use crate::scene::entities::Mesh;

/// Span of a mesh inside the shared vertex stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VertexRange {
    /// Index of the first vertex
    pub first: u32,
    /// Number of vertices
    pub count: u32,
}

/// Lay meshes out back to back in declaration order
pub fn vertex_ranges(meshes: &[Mesh]) -> Vec<VertexRange> {
    let mut first = 0u32;
    meshes
        .iter()
        .map(|mesh| {
            let range = VertexRange { first, count: mesh.count };
            first = first.saturating_add(mesh.count);
            range
        })
        .collect()
}

/// A mesh drawn at a node's world transform
#[derive(Debug, Clone, PartialEq)]
pub struct RenderInstance {
    /// Node carrying the mesh
    pub node: NodeId,
    /// Index into the document's meshes
    pub mesh: usize,
    /// Vertex span of the mesh
    pub vertices: VertexRange,
    /// Index into the document's materials, if the mesh names one that exists
    pub material: Option<usize>,
    /// Local-to-world
    pub world_from_local: Mat4,
    /// Inverse-transpose of `world_from_local`, for normals
    pub world_from_local_normal: Mat4,
    /// Clip-from-local for the active camera
    pub clip_from_local: Mat4,
}

impl RenderInstance {
    /// Upload record for this instance
    pub fn instance_data(&self) -> InstanceData {
        InstanceData {
            clip_from_local: self.clip_from_local.into(),
            world_from_local: self.world_from_local.into(),
            world_from_local_normal: self.world_from_local_normal.into(),
        }
    }
}

/// Column-major per-instance matrices, laid out for a GPU buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    /// Clip-from-local
    pub clip_from_local: [[f32; 4]; 4],
    /// Local-to-world
    pub world_from_local: [[f32; 4]; 4],
    /// Normal matrix
    pub world_from_local_normal: [[f32; 4]; 4],
}
