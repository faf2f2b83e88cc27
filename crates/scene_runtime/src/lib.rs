//! # Scene Runtime
//!
//! Loads declarative scene descriptions and drives their per-frame state.
//!
//! ## Features
//!
//! - **Tolerant loading**: JSON scene records with missing or malformed fields
//!   fall back to defaults instead of failing the load
//! - **Scene graph**: name-or-index references, cycle detection, camera paths
//! - **Keyframe animation**: STEP / LINEAR / SLERP drivers with loop wrap and
//!   stateless seeking
//! - **Frustum culling**: planes extracted from the active camera's matrix
//!
//! Rendering is left to the host: each frame yields the visible instances and
//! the camera matrix.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_runtime::prelude::*;
//!
//! fn main() -> Result<(), SceneError> {
//!     let mut scene = SceneContext::from_file("scenes/sphereflake.s72", RuntimeConfig::default())?;
//!     for _ in 0..60 {
//!         let frame = scene.update(1.0 / 60.0);
//!         println!("{} instances through '{}'", frame.instances.len(), frame.camera);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod core;
pub mod config;
pub mod foundation;
pub mod assets;
pub mod input;
pub mod player;
pub mod scene;

/// Common imports for runtime users
pub mod prelude {
    pub use crate::{
        assets::{AttributeBuffers, AttributeLoader, B72Loader},
        core::config::{Config, RuntimeConfig},
        foundation::math::{Mat4, Quat, Transform, Vec3},
        input::{InputManager, KeyCode},
        player::{CameraMode, PlaybackClock, PlaybackMode},
        scene::{FrameOutput, SceneContext, SceneDocument, SceneError, SceneResult},
    };
}
