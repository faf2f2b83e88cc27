//! Playback and camera control
//!
//! The animation clock and the camera-mode selector are independent: pausing
//! freezes time but the camera still moves, and switching camera never touches
//! the clock.

pub mod camera_control;

pub use camera_control::UserCameraController;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::core::config::PlaybackSettings;

/// Which camera the frame is viewed through
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraMode {
    /// One of the scene's declared cameras
    #[default]
    Scene,
    /// The free-fly user camera
    User,
    /// The free-fly user camera with culling disabled
    Debug,
}

impl CameraMode {
    /// Whether the user rig is the viewpoint
    pub fn uses_user_rig(self) -> bool {
        matches!(self, Self::User | Self::Debug)
    }

    /// Whether instances are culled against the frustum
    pub fn culls(self) -> bool {
        self != Self::Debug
    }
}

/// Animation clock state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    /// Time frozen
    Pause,
    /// Time advancing
    Play,
}

/// Looping animation clock
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackClock {
    mode: PlaybackMode,
    time: f32,
    duration: f32,
    time_scale: f32,
}

impl PlaybackClock {
    /// Clock at time 0 for a loop of `duration` seconds
    pub fn new(duration: f32, settings: &PlaybackSettings) -> Self {
        Self {
            mode: if settings.start_playing { PlaybackMode::Play } else { PlaybackMode::Pause },
            time: 0.0,
            duration: duration.max(0.0),
            time_scale: settings.time_scale,
        }
    }

    /// Current time in `[0, duration)` (unbounded when the duration is 0)
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Loop length
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Current mode
    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    /// Whether time advances
    pub fn is_playing(&self) -> bool {
        self.mode == PlaybackMode::Play
    }

    /// Start advancing
    pub fn play(&mut self) {
        self.mode = PlaybackMode::Play;
    }

    /// Freeze time
    pub fn pause(&mut self) {
        self.mode = PlaybackMode::Pause;
    }

    /// Flip between PLAY and PAUSE
    pub fn toggle(&mut self) {
        self.mode = match self.mode {
            PlaybackMode::Play => PlaybackMode::Pause,
            PlaybackMode::Pause => PlaybackMode::Play,
        };
        debug!("Playback {:?} at {:.3}s", self.mode, self.time);
    }

    /// Jump to `time`, wrapped into the loop
    pub fn seek(&mut self, time: f32) {
        self.time = self.wrap(time);
    }

    /// Advance by `dt` scaled by the time scale when playing; returns the new time
    pub fn advance(&mut self, dt: f32) -> f32 {
        if self.is_playing() {
            self.time = self.wrap(self.time + dt * self.time_scale);
        }
        self.time
    }

    fn wrap(&self, time: f32) -> f32 {
        if self.duration > 0.0 {
            // rem_euclid rounds tiny negative inputs up to exactly `duration`
            let wrapped = time.rem_euclid(self.duration);
            if wrapped >= self.duration { 0.0 } else { wrapped }
        } else {
            time.max(0.0)
        }
    }
}
