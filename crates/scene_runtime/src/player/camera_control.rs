//! Free-fly user camera
//!
//! WASD moves along the rig's own right and forward axes; mouse motion yaws
//! about the rig's local +Y and pitches about its local +X, scaled by the
//! camera's vertical field of view so one window height of motion turns by
//! one field of view.

use crate::core::config::CameraSettings;
use crate::foundation::math::{Quat, Vec3};
use crate::input::FrameInput;
use crate::scene::entities::Node;

/// Applies frame input to the user rig node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserCameraController {
    /// Translation speed in units per second
    pub move_speed: f32,
    /// Multiplier on mouse-look angles
    pub look_sensitivity: f32,
}

impl Default for UserCameraController {
    fn default() -> Self {
        Self::from_settings(&CameraSettings::default())
    }
}

impl UserCameraController {
    /// Controller using the configured speeds
    pub fn from_settings(settings: &CameraSettings) -> Self {
        Self {
            move_speed: settings.move_speed,
            look_sensitivity: settings.look_sensitivity,
        }
    }

    /// Move and turn `rig` for one frame
    pub fn update(&self, rig: &mut Node, input: &FrameInput, vfov: f32, dt: f32) {
        self.look(rig, input.look, vfov);
        self.translate(rig, input.right, input.forward, dt);
    }

    fn look(&self, rig: &mut Node, (dx, dy): (f32, f32), vfov: f32) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        let scale = vfov * self.look_sensitivity;
        // input y points down the screen; moving the mouse up pitches up
        let yaw = Quat::from_axis_angle(&Vec3::y_axis(), -dx * scale);
        let pitch = Quat::from_axis_angle(&Vec3::x_axis(), -dy * scale);
        rig.rotation = rig.rotation * yaw * pitch;
        rig.rotation.renormalize();
    }

    fn translate(&self, rig: &mut Node, right: f32, forward: f32, dt: f32) {
        let mut step = [right, forward];
        let length = right.hypot(forward);
        if length == 0.0 {
            return;
        }
        // diagonal movement is no faster than straight movement
        for axis in &mut step {
            *axis *= self.move_speed * dt / length;
        }

        let frame = rig.local_to_parent();
        let frame_right = frame.fixed_view::<3, 1>(0, 0).into_owned();
        let frame_forward = -frame.fixed_view::<3, 1>(0, 2).into_owned();
        rig.position += frame_right * step[0] + frame_forward * step[1];
    }
}
