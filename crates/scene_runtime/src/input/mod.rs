//! Input management system
//!
//! Platform events are fed in by the host; once per frame the accumulated
//! state is drained into a [`FrameInput`] snapshot for the scene pipeline.

use std::collections::HashSet;

use log::trace;

/// Input manager
#[derive(Debug, Clone)]
pub struct InputManager {
    held: HashSet<KeyCode>,
    pressed: Vec<KeyCode>,
    last_cursor: Option<(f64, f64)>,
    mouse_delta: (f64, f64),
    window_height: f64,
}

impl InputManager {
    /// Create a new input manager
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
            pressed: Vec::new(),
            last_cursor: None,
            mouse_delta: (0.0, 0.0),
            window_height: 1.0,
        }
    }

    /// Window height in pixels; mouse motion is measured in window heights
    pub fn set_window_height(&mut self, height: f64) {
        if height > 0.0 {
            self.window_height = height;
        }
    }

    /// Handle key input
    pub fn handle_key_input(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            // key repeat arrives as repeated presses; only the first one is an edge
            if self.held.insert(key) {
                self.pressed.push(key);
            }
        } else {
            self.held.remove(&key);
        }
    }

    /// Handle an absolute cursor position in pixels
    pub fn handle_mouse_move(&mut self, x: f64, y: f64) {
        if let Some((last_x, last_y)) = self.last_cursor {
            self.handle_mouse_delta(x - last_x, y - last_y);
        }
        self.last_cursor = Some((x, y));
    }

    /// Handle relative mouse motion in pixels
    pub fn handle_mouse_delta(&mut self, dx: f64, dy: f64) {
        self.mouse_delta.0 += dx;
        self.mouse_delta.1 += dy;
    }

    /// Whether a key is currently down
    pub fn is_held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    /// Drain this frame's edges and motion into a snapshot
    pub fn take_frame(&mut self) -> FrameInput {
        let axis = |positive: KeyCode, negative: KeyCode| -> f32 {
            f32::from(u8::from(self.is_held(positive))) - f32::from(u8::from(self.is_held(negative)))
        };
        let frame = FrameInput {
            forward: axis(KeyCode::W, KeyCode::S),
            right: axis(KeyCode::D, KeyCode::A),
            look: (
                (self.mouse_delta.0 / self.window_height) as f32,
                (self.mouse_delta.1 / self.window_height) as f32,
            ),
            pressed: std::mem::take(&mut self.pressed),
        };
        self.mouse_delta = (0.0, 0.0);
        if !frame.pressed.is_empty() {
            trace!("Keys pressed this frame: {:?}", frame.pressed);
        }
        frame
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Input gathered over one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    /// +1 forward, -1 backward
    pub forward: f32,
    /// +1 right, -1 left
    pub right: f32,
    /// Mouse motion in window heights, `(dx, dy)` with y pointing down
    pub look: (f32, f32),
    /// Keys that went down this frame, in order
    pub pressed: Vec<KeyCode>,
}

impl FrameInput {
    /// Whether `key` went down this frame
    pub fn was_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }
}

/// Key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// Move forward
    W,
    /// Strafe left
    A,
    /// Move backward
    S,
    /// Strafe right
    D,
    /// Scene camera mode
    Num1,
    /// User camera mode
    Num2,
    /// Debug camera mode
    Num3,
    /// Toggle playback
    Space,
    /// Next scene camera
    Tab,
}
