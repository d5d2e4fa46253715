//! Keyboard sampling for local movement

use macroquad::prelude::*;

/// Turns held movement keys into a per-frame displacement.
pub struct InputSampler {
    speed: f32,
}

impl InputSampler {
    pub fn new(speed: f32) -> Self {
        Self { speed }
    }

    /// Displacement for this frame, `dt` seconds long. Supports both WASD
    /// and the arrow keys.
    pub fn movement_delta(&self, dt: f32) -> (f32, f32) {
        let left = is_key_down(KeyCode::A) || is_key_down(KeyCode::Left);
        let right = is_key_down(KeyCode::D) || is_key_down(KeyCode::Right);
        let up = is_key_down(KeyCode::W) || is_key_down(KeyCode::Up);
        let down = is_key_down(KeyCode::S) || is_key_down(KeyCode::Down);

        scale(axis_from_keys(left, right, up, down), self.speed * dt)
    }

    pub fn quit_requested(&self) -> bool {
        is_key_pressed(KeyCode::Escape)
    }
}

/// Raw axis values in {-1, 0, 1}. Opposing keys cancel.
pub fn axis_from_keys(left: bool, right: bool, up: bool, down: bool) -> (f32, f32) {
    let axis = |negative: bool, positive: bool| match (negative, positive) {
        (true, false) => -1.0,
        (false, true) => 1.0,
        _ => 0.0,
    };
    (axis(left, right), axis(down, up))
}

fn scale(axis: (f32, f32), factor: f32) -> (f32, f32) {
    (axis.0 * factor, axis.1 * factor)
}
