use crate::game::VisualSink;
use crate::network::ConnectionState;
use macroquad::prelude::*;
use shared::{PlayerId, Rgb, Vec3};
use std::collections::HashMap;

/// Screen pixels per world unit.
const PIXELS_PER_UNIT: f32 = 40.0;
const CUBE_SIZE: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cube {
    pub color: Rgb,
    pub position: Vec3,
}

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub local_id: Option<PlayerId>,
    pub state: ConnectionState,
    pub player_count: usize,
}

/// Every cube the client currently shows, keyed by player id.
#[derive(Debug, Default)]
pub struct Scene {
    cubes: HashMap<PlayerId, Cube>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cube(&self, id: &str) -> Option<&Cube> {
        self.cubes.get(id)
    }

    pub fn len(&self) -> usize {
        self.cubes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cubes.is_empty()
    }

    pub fn render(&self, config: &UiConfig) {
        clear_background(Color::from_rgba(26, 26, 26, 255));

        let (width, height) = (screen_width(), screen_height());
        self.draw_axes(width, height);

        let mut ids: Vec<&PlayerId> = self.cubes.keys().collect();
        ids.sort();
        // Local cube last so it stays on top.
        ids.sort_by_key(|id| Some(*id) == config.local_id.as_ref());

        for id in ids {
            let cube = &self.cubes[id];
            let is_local_player = Some(id) == config.local_id.as_ref();
            self.draw_cube(id, cube, is_local_player, width, height);
        }

        self.draw_ui(config);
    }

    fn draw_axes(&self, width: f32, height: f32) {
        let grid = Color::from_rgba(51, 51, 51, 255);
        draw_line(0.0, height / 2.0, width, height / 2.0, 1.0, grid);
        draw_line(width / 2.0, 0.0, width / 2.0, height, 1.0, grid);
    }

    fn draw_cube(&self, id: &str, cube: &Cube, is_local_player: bool, width: f32, height: f32) {
        let (x, y) = project(cube.position, width, height);
        let left = x - CUBE_SIZE / 2.0;
        let top = y - CUBE_SIZE / 2.0;

        draw_rectangle(left, top, CUBE_SIZE, CUBE_SIZE, to_color(cube.color));

        let outline = if is_local_player { GREEN } else { WHITE };
        let thickness = if is_local_player { 3.0 } else { 1.0 };
        draw_rectangle_lines(left, top, CUBE_SIZE, CUBE_SIZE, thickness, outline);

        draw_text(id, left, top - 4.0, 14.0, WHITE);
    }

    fn draw_ui(&self, config: &UiConfig) {
        let y_start = 10.0;

        let (connection_color, label) = match config.state {
            ConnectionState::Connecting => (YELLOW, "CONNECTING"),
            ConnectionState::Connected => (GREEN, "CON"),
            ConnectionState::Disconnected => (RED, "DISCONNECTED"),
        };
        draw_rectangle(10.0, y_start, 8.0, 8.0, connection_color);
        draw_text(label, 22.0, y_start + 8.0, 12.0, WHITE);

        let identity = match &config.local_id {
            Some(id) => format!("player {}", id),
            None => "waiting for handshake".to_string(),
        };
        draw_text(&identity, 10.0, y_start + 25.0, 12.0, WHITE);

        let player_y = y_start + 35.0;
        for i in 0..(config.player_count.min(8)) {
            draw_rectangle(
                10.0 + (i as f32) * 4.0,
                player_y,
                3.0,
                3.0,
                Color::from_rgba(0, 170, 255, 255),
            );
        }
        let player_text = format!("{} players", config.player_count);
        draw_text(&player_text, 45.0, player_y + 3.0, 12.0, WHITE);
    }
}

impl VisualSink for Scene {
    fn create(&mut self, id: &str, color: Rgb, position: Vec3) {
        self.cubes.insert(id.to_string(), Cube { color, position });
    }

    fn update(&mut self, id: &str, position: Vec3) {
        if let Some(cube) = self.cubes.get_mut(id) {
            cube.position = position;
        }
    }

    fn destroy(&mut self, id: &str) {
        self.cubes.remove(id);
    }
}

/// Maps a world position to screen coordinates. The XY plane is viewed
/// head-on with the origin at the window centre and +Y pointing up; Z is
/// ignored.
pub fn project(position: Vec3, width: f32, height: f32) -> (f32, f32) {
    (
        width / 2.0 + position.x * PIXELS_PER_UNIT,
        height / 2.0 - position.y * PIXELS_PER_UNIT,
    )
}

fn to_color(rgb: Rgb) -> Color {
    Color::new(rgb.r, rgb.g, rgb.b, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_project_origin_is_centre() {
        let (x, y) = project(Vec3::splat(0.0), 800.0, 600.0);
        assert_approx_eq!(x, 400.0);
        assert_approx_eq!(y, 300.0);
    }

    #[test]
    fn test_project_y_points_up() {
        let (x, y) = project(Vec3::new(1.0, 1.0, 7.0), 800.0, 600.0);
        assert_approx_eq!(x, 400.0 + PIXELS_PER_UNIT);
        assert_approx_eq!(y, 300.0 - PIXELS_PER_UNIT);
    }

    #[test]
    fn test_scene_tracks_cubes() {
        let mut scene = Scene::new();
        assert!(scene.is_empty());

        scene.create("0", Rgb::new(1.0, 0.0, 0.0), Vec3::splat(0.0));
        scene.update("0", Vec3::splat(2.0));
        scene.update("missing", Vec3::splat(2.0));

        assert_eq!(scene.len(), 1);
        assert_eq!(scene.cube("0").unwrap().position, Vec3::splat(2.0));

        scene.destroy("0");
        assert!(scene.cube("0").is_none());
    }
}
