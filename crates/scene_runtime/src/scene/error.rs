//! Scene loading errors
//!
//! Only structural failures are errors. Missing or malformed fields, unresolved
//! references and bad driver data are tolerated and logged instead.

use thiserror::Error;

/// Errors produced while loading or building a scene
#[derive(Debug, Error)]
pub enum SceneError {
    /// Reading the scene file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The scene file is not valid JSON
    #[error("malformed scene document: {0}")]
    Json(#[from] serde_json::Error),

    /// The document root is not an array of records
    #[error("scene document must be an array of records")]
    NotARecordList,

    /// A node's `children` lead back to one of its ancestors
    #[error("cyclic node graph: node '{node}' is its own ancestor")]
    CyclicGraph {
        /// Name of the node that closes the cycle
        node: String,
    },

    /// A camera was requested by a name that has no usable camera path
    #[error("camera '{0}' is not reachable from the scene roots")]
    UnknownCamera(String),

    /// Vertex attribute data could not be read
    #[error("attribute data error: {0}")]
    Attribute(String),
}

/// Result alias for scene operations
pub type SceneResult<T> = Result<T, SceneError>;
