// Pixel-art sprites drawn in code and uploaded as images at startup.
use std::collections::HashMap;

use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use strum::IntoEnumIterator;

use crate::battle::Encounter;
use crate::display::{
    DARK_GRAY, ENEMY_BROWN, ENEMY_GOLD, ENEMY_GREEN, ENEMY_RED, LIGHT_GRAY, PURPLE, Rgb, WHITE,
};
use crate::story::PartyMember;

pub struct SpritesPlugin;

impl Plugin for SpritesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SpriteSheet>()
            .add_systems(Startup, build_sprites);
    }
}

pub const SMALL: u32 = 16;
pub const LARGE: u32 = 24;

/// Square grid of pixels; `None` is transparent.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGrid {
    size: u32,
    pixels: Vec<Option<Rgb>>,
}

impl PixelGrid {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            pixels: vec![None; (size * size) as usize],
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.size || y >= self.size {
            return None;
        }
        self.pixels[(y * self.size + x) as usize]
    }

    fn fill(&mut self, paint: impl Fn(u32, u32) -> Option<Rgb>) {
        for y in 0..self.size {
            for x in 0..self.size {
                self.pixels[(y * self.size + x) as usize] = paint(x, y);
            }
        }
    }

    /// Student silhouette: pale head, body and arms in `outfit`, dark legs.
    pub fn student(outfit: Rgb) -> Self {
        let mut grid = Self::new(SMALL);
        grid.fill(|x, y| match (x, y) {
            (6..=9, 2..=4) => Some(LIGHT_GRAY),
            (5..=10, 5..=12) => Some(outfit),
            (4 | 11, 6..=12) => Some(outfit),
            (6..=9, 13..=15) => Some(DARK_GRAY),
            _ => None,
        });
        grid
    }

    /// Mushroom cap: a disc in `cap` with a one pixel white rim.
    pub fn shroom(size: u32, cap: Rgb) -> Self {
        let center = Vec2::new(size as f32 / 2.0, size as f32 * 3.0 / 8.0);
        let radius = size as f32 * 5.0 / 16.0;
        let mut grid = Self::new(size);
        grid.fill(|x, y| {
            let dist = Vec2::new(x as f32, y as f32).distance(center);
            if dist <= radius {
                Some(cap)
            } else if dist <= radius + 1.0 {
                Some(WHITE)
            } else {
                None
            }
        });
        grid
    }

    pub fn to_rgba(&self) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(self.pixels.len() * 4);
        for y in 0..self.size {
            for x in 0..self.size {
                rgba.extend(match self.get(x, y) {
                    Some([r, g, b]) => [r, g, b, 255],
                    None => [0, 0, 0, 0],
                });
            }
        }
        rgba
    }

    pub fn to_image(&self) -> Image {
        Image::new(
            Extent3d {
                width: self.size,
                height: self.size,
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            self.to_rgba(),
            TextureFormat::Rgba8UnormSrgb,
            RenderAssetUsages::default(),
        )
    }
}

/// Battle sprite for each encounter's lead enemy.
pub fn enemy_grid(encounter: Encounter) -> PixelGrid {
    match encounter {
        Encounter::ShroomScout => PixelGrid::shroom(SMALL, ENEMY_RED),
        Encounter::GoombaSentinel => PixelGrid::shroom(LARGE, ENEMY_BROWN),
        Encounter::RoyalKoopas => PixelGrid::shroom(SMALL, ENEMY_GREEN),
        Encounter::ShadowLuigi => PixelGrid::student(PURPLE),
        Encounter::Bowser => PixelGrid::shroom(LARGE, ENEMY_GOLD),
    }
}

#[derive(Resource, Default)]
pub struct SpriteSheet {
    members: HashMap<PartyMember, Handle<Image>>,
    enemies: HashMap<Encounter, Handle<Image>>,
}

impl SpriteSheet {
    pub fn member(&self, member: PartyMember) -> Handle<Image> {
        self.members.get(&member).cloned().unwrap_or_default()
    }

    pub fn enemy(&self, encounter: Encounter) -> Handle<Image> {
        self.enemies.get(&encounter).cloned().unwrap_or_default()
    }
}

fn build_sprites(mut sheet: ResMut<SpriteSheet>, mut images: ResMut<Assets<Image>>) {
    for member in PartyMember::iter() {
        let handle = images.add(PixelGrid::student(member.color()).to_image());
        sheet.members.insert(member, handle);
    }
    for encounter in Encounter::iter() {
        let handle = images.add(enemy_grid(encounter).to_image());
        sheet.enemies.insert(encounter, handle);
    }
    debug!(
        "built {} party and {} enemy sprites",
        sheet.members.len(),
        sheet.enemies.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::BLUE;

    #[test]
    fn student_layout() {
        let grid = PixelGrid::student(BLUE);
        assert_eq!(grid.get(7, 3), Some(LIGHT_GRAY));
        assert_eq!(grid.get(7, 8), Some(BLUE));
        assert_eq!(grid.get(4, 9), Some(BLUE));
        assert_eq!(grid.get(8, 14), Some(DARK_GRAY));
        assert_eq!(grid.get(0, 0), None);
        assert_eq!(grid.get(16, 3), None);
    }

    #[test]
    fn shroom_has_a_rim() {
        let grid = PixelGrid::shroom(SMALL, ENEMY_RED);
        assert_eq!(grid.get(8, 6), Some(ENEMY_RED));
        assert_eq!(grid.get(8, 0), Some(WHITE));
        assert_eq!(grid.get(0, 15), None);

        let large = PixelGrid::shroom(LARGE, ENEMY_BROWN);
        assert_eq!(large.size(), 24);
        assert_eq!(large.get(12, 9), Some(ENEMY_BROWN));
    }

    #[test]
    fn transparent_pixels_have_zero_alpha() {
        let grid = PixelGrid::student(BLUE);
        let rgba = grid.to_rgba();
        assert_eq!(rgba.len(), 16 * 16 * 4);
        assert_eq!(&rgba[..4], &[0, 0, 0, 0]);
        let head = ((3 * 16 + 7) * 4) as usize;
        assert_eq!(&rgba[head..head + 4], &[180, 180, 180, 255]);
    }
}
