//! Vertex attribute loading
//!
//! The scene only needs vertex positions (for bounding boxes). Loaders return
//! them per mesh; how the bytes are stored is up to the loader.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::debug;

use crate::foundation::math::Vec3;
use crate::scene::entities::Mesh;
use crate::scene::error::{SceneError, SceneResult};

/// Attribute semantic holding vertex positions
pub const POSITION: &str = "POSITION";

/// The only position format understood by [`B72Loader`]
pub const POSITION_FORMAT: &str = "R32G32B32_SFLOAT";

const POSITION_SIZE: usize = 12;

/// Source of decoded vertex positions
pub trait AttributeLoader {
    /// Positions of `mesh`; an empty list when the mesh has none
    fn positions(&mut self, mesh: &Mesh) -> SceneResult<Vec<Vec3>>;
}

/// In-memory positions keyed by mesh name
#[derive(Debug, Clone, Default)]
pub struct AttributeBuffers {
    positions: HashMap<String, Vec<Vec3>>,
}

impl AttributeBuffers {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: add positions for a mesh
    pub fn with_positions(mut self, mesh: impl Into<String>, positions: Vec<Vec3>) -> Self {
        self.insert(mesh, positions);
        self
    }

    /// Set positions for a mesh
    pub fn insert(&mut self, mesh: impl Into<String>, positions: Vec<Vec3>) {
        self.positions.insert(mesh.into(), positions);
    }
}

impl AttributeLoader for AttributeBuffers {
    fn positions(&mut self, mesh: &Mesh) -> SceneResult<Vec<Vec3>> {
        Ok(self.positions.get(&mesh.name).cloned().unwrap_or_default())
    }
}

/// Reads interleaved little-endian attribute files next to the scene file
#[derive(Debug, Clone)]
pub struct B72Loader {
    root: PathBuf,
    files: HashMap<String, Vec<u8>>,
}

impl B72Loader {
    /// Loader resolving `src` paths relative to `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: HashMap::new(),
        }
    }

    /// Directory attribute paths are resolved against
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file(&mut self, src: &str) -> SceneResult<&[u8]> {
        if !self.files.contains_key(src) {
            let path = self.root.join(src);
            let bytes = std::fs::read(&path)?;
            debug!("Read {} bytes of attribute data from {}", bytes.len(), path.display());
            self.files.insert(src.to_string(), bytes);
        }
        Ok(self.files.get(src).map_or(&[][..], Vec::as_slice))
    }
}

impl AttributeLoader for B72Loader {
    fn positions(&mut self, mesh: &Mesh) -> SceneResult<Vec<Vec3>> {
        let Some(attribute) = mesh.attributes.get(POSITION) else {
            return Ok(Vec::new());
        };
        if attribute.format != POSITION_FORMAT {
            return Err(SceneError::Attribute(format!(
                "mesh '{}': unsupported POSITION format '{}'",
                mesh.name, attribute.format
            )));
        }

        let count = mesh.count as usize;
        let offset = attribute.offset as usize;
        let stride = match attribute.stride as usize {
            0 => POSITION_SIZE,
            stride => stride,
        };
        let name = mesh.name.clone();
        let bytes = self.file(&attribute.src)?;

        decode_positions(bytes, offset, stride, count).ok_or_else(|| {
            SceneError::Attribute(format!(
                "mesh '{name}': {count} positions at offset {offset} stride {stride} exceed {} bytes",
                bytes.len()
            ))
        })
    }
}

/// Decode `count` packed `[f32; 3]` little-endian positions
fn decode_positions(bytes: &[u8], offset: usize, stride: usize, count: usize) -> Option<Vec<Vec3>> {
    (0..count)
        .map(|i| {
            let start = offset.checked_add(i.checked_mul(stride)?)?;
            let chunk = bytes.get(start..start.checked_add(POSITION_SIZE)?)?;
            let raw: [u32; 3] = bytemuck::pod_read_unaligned(chunk);
            let [x, y, z] = raw.map(|bits| f32::from_bits(u32::from_le(bits)));
            Some(Vec3::new(x, y, z))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::entities::Attribute;

    fn interleaved(positions: &[[f32; 3]], padding: usize) -> Vec<u8> {
        let mut bytes = Vec::new();
        for p in positions {
            for c in p {
                bytes.extend_from_slice(&c.to_le_bytes());
            }
            bytes.extend(std::iter::repeat(0u8).take(padding));
        }
        bytes
    }

    fn mesh(src: &str, count: u32, stride: u32, format: &str) -> Mesh {
        let mut mesh = Mesh {
            name: "m".into(),
            count,
            ..Mesh::default()
        };
        mesh.attributes.insert(
            POSITION.into(),
            Attribute { src: src.into(), offset: 0, stride, format: format.into() },
        );
        mesh
    }

    #[test]
    fn test_decode_with_stride() {
        let bytes = interleaved(&[[1.0, 2.0, 3.0], [-4.0, 5.5, 6.0]], 8);
        let positions = decode_positions(&bytes, 0, 20, 2).unwrap();
        assert_eq!(positions, vec![Vec3::new(1.0, 2.0, 3.0), Vec3::new(-4.0, 5.5, 6.0)]);
    }

    #[test]
    fn test_decode_out_of_bounds() {
        let bytes = interleaved(&[[1.0, 2.0, 3.0]], 0);
        assert!(decode_positions(&bytes, 0, 12, 2).is_none());
        assert!(decode_positions(&bytes, 4, 12, 1).is_none());
    }

    #[test]
    fn test_b72_loader_reads_file() {
        let dir = std::env::temp_dir().join(format!("scene_runtime_b72_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let bytes = interleaved(&[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [2.0, -1.0, 0.5]], 4);
        std::fs::write(dir.join("m.b72"), bytes).unwrap();

        let mut loader = B72Loader::new(&dir);
        let positions = loader.positions(&mesh("m.b72", 3, 16, POSITION_FORMAT)).unwrap();
        let bad_format = loader.positions(&mesh("m.b72", 3, 16, "R8G8B8_UNORM"));
        let missing = loader.positions(&mesh("nope.b72", 3, 16, POSITION_FORMAT));
        let _ = std::fs::remove_dir_all(&dir);

        assert_eq!(positions.len(), 3);
        assert_eq!(positions[2], Vec3::new(2.0, -1.0, 0.5));
        assert!(matches!(bad_format, Err(SceneError::Attribute(_))));
        assert!(matches!(missing, Err(SceneError::Io(_))));
    }

    #[test]
    fn test_in_memory_buffers() {
        let mut buffers = AttributeBuffers::new().with_positions("m", vec![Vec3::x()]);
        assert_eq!(buffers.positions(&Mesh { name: "m".into(), ..Mesh::default() }).unwrap(), vec![Vec3::x()]);
        assert!(buffers.positions(&Mesh::default()).unwrap().is_empty());
    }
}
