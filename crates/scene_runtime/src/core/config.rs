//! # Runtime Configuration
//!
//! Settings for the per-frame scene pipeline, loadable from TOML or RON.
//!
//! ```toml
//! [playback]
//! start_playing = true
//! time_scale = 1.0
//!
//! [camera]
//! mode = "Scene"
//! initial_camera = "Camera-Main"
//! move_speed = 30.0
//!
//! [culling]
//! enabled = true
//! ```

use serde::{Serialize, Deserialize};

pub use crate::config::{Config, ConfigError};
use crate::player::CameraMode;

/// Animation clock settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Whether the clock starts in PLAY (otherwise PAUSE)
    pub start_playing: bool,
    /// Multiplier applied to every frame's `dt`
    pub time_scale: f32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            start_playing: true,
            time_scale: 1.0,
        }
    }
}

/// Camera selection and free-fly settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Initial camera mode
    pub mode: CameraMode,
    /// Scene camera to start with; the first usable one when absent
    pub initial_camera: Option<String>,
    /// Viewport aspect used instead of each camera's declared aspect
    pub aspect_override: Option<f32>,
    /// Free-fly translation speed in units per second
    pub move_speed: f32,
    /// Mouse-look multiplier on top of the camera's vertical field of view
    pub look_sensitivity: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            mode: CameraMode::Scene,
            initial_camera: None,
            aspect_override: None,
            move_speed: 30.0,
            look_sensitivity: 1.0,
        }
    }
}

/// Visibility culling settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CullingSettings {
    /// Drop instances whose bounds are outside the active frustum
    pub enabled: bool,
}

impl Default for CullingSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Top-level runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Animation clock
    pub playback: PlaybackSettings,
    /// Camera selection
    pub camera: CameraSettings,
    /// Visibility culling
    pub culling: CullingSettings,
}

impl RuntimeConfig {
    /// Builder pattern: set the initial camera mode
    pub fn with_camera_mode(mut self, mode: CameraMode) -> Self {
        self.camera.mode = mode;
        self
    }

    /// Builder pattern: set the initial scene camera
    pub fn with_initial_camera(mut self, name: impl Into<String>) -> Self {
        self.camera.initial_camera = Some(name.into());
        self
    }

    /// Builder pattern: start paused or playing
    pub fn with_start_playing(mut self, playing: bool) -> Self {
        self.playback.start_playing = playing;
        self
    }

    /// Builder pattern: enable or disable culling
    pub fn with_culling(mut self, enabled: bool) -> Self {
        self.culling.enabled = enabled;
        self
    }

    /// Validate value ranges
    pub fn validate(&self) -> Result<(), String> {
        if !(self.playback.time_scale.is_finite() && self.playback.time_scale >= 0.0) {
            return Err(format!("time_scale must be finite and >= 0, got {}", self.playback.time_scale));
        }
        if let Some(aspect) = self.camera.aspect_override {
            if !(aspect.is_finite() && aspect > 0.0) {
                return Err(format!("aspect_override must be > 0, got {aspect}"));
            }
        }
        if !(self.camera.move_speed.is_finite() && self.camera.move_speed >= 0.0) {
            return Err(format!("move_speed must be finite and >= 0, got {}", self.camera.move_speed));
        }
        Ok(())
    }
}

impl Config for RuntimeConfig {}
