// Fixed-resolution display: logical GBA-sized canvas, palette and camera.
use bevy::prelude::*;
use bevy::window::WindowResolution;

pub struct DisplayPlugin;

impl Plugin for DisplayPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(color(BLACK)))
            .add_systems(Startup, spawn_camera);
    }
}

/// Logical canvas size in pixels. Game code positions everything on it with
/// the origin at the top-left and y pointing down.
pub const GBA_WIDTH: f32 = 240.0;
pub const GBA_HEIGHT: f32 = 160.0;
/// Window pixels per logical pixel.
pub const SCALE: u32 = 3;

pub type Rgb = [u8; 3];

pub const BLACK: Rgb = [0, 0, 0];
pub const DARK_GRAY: Rgb = [40, 40, 40];
pub const GRAY: Rgb = [100, 100, 100];
pub const LIGHT_GRAY: Rgb = [180, 180, 180];
pub const WHITE: Rgb = [255, 255, 255];

// Party
pub const BLUE: Rgb = [30, 80, 200];
pub const PURPLE: Rgb = [160, 50, 200];
pub const YELLOW: Rgb = [220, 200, 30];
pub const GREEN: Rgb = [40, 180, 60];
pub const RED: Rgb = [220, 60, 60];
pub const CYAN: Rgb = [40, 200, 200];

// Enemies
pub const ENEMY_RED: Rgb = [220, 40, 40];
pub const ENEMY_GREEN: Rgb = [50, 160, 50];
pub const ENEMY_BROWN: Rgb = [140, 90, 40];
pub const ENEMY_GOLD: Rgb = [200, 160, 30];

pub fn color(rgb: Rgb) -> Color {
    Color::srgb_u8(rgb[0], rgb[1], rgb[2])
}

/// Logical canvas coordinates to world coordinates for the 2D camera.
pub fn to_world(logical: Vec2) -> Vec2 {
    Vec2::new(logical.x - GBA_WIDTH / 2.0, GBA_HEIGHT / 2.0 - logical.y)
}

pub fn window_plugin() -> WindowPlugin {
    WindowPlugin {
        primary_window: Some(Window {
            title: "Twilight Gate".into(),
            resolution: WindowResolution::new(
                GBA_WIDTH as u32 * SCALE,
                GBA_HEIGHT as u32 * SCALE,
            ),
            resizable: false,
            ..default()
        }),
        ..default()
    }
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Camera2d,
        Projection::from(OrthographicProjection {
            scale: 1.0 / SCALE as f32,
            ..OrthographicProjection::default_2d()
        }),
    ));
}
