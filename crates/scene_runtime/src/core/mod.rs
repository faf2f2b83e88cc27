//! # Core Module
//!
//! Shared abstractions used by the other subsystems.
//!
//! ## Organization
//!
//! - **Config**: Runtime configuration (playback, camera, culling)

pub mod config;

pub use config::{
    CameraSettings,
    CullingSettings,
    PlaybackSettings,
    RuntimeConfig,
    Config,
    ConfigError,
};
