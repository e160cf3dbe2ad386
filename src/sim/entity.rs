//! Entity record shared by every sprite kind
//!
//! One flat struct with a `kind` tag. Kind-specific behaviour lives in the
//! profile table below and in `motion`, selected by kind.

use glam::{Vec2, Vec3};

use super::pool::Poolable;
use crate::assets::AssetKey;
use crate::consts::*;
use crate::renderer::{Renderable, TextureHandle};

/// What an entity is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Falling asteroid
    Obstacle,
    /// Shrinking piece of a smashed asteroid
    BrokenObstacle,
    /// Wandering chicken the player protects
    Target,
    /// Tilt-steered ship
    Player,
    /// HUD asteroid icon
    Icon,
    /// HUD text
    Label,
}

/// Sprite art the simulation knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteAsset {
    Asteroid,
    Chicken,
    Ship,
}

impl SpriteAsset {
    pub const ALL: [SpriteAsset; 3] = [SpriteAsset::Asteroid, SpriteAsset::Chicken, SpriteAsset::Ship];

    pub fn key(self) -> AssetKey {
        AssetKey::Sprite(match self {
            SpriteAsset::Asteroid => "asteroid",
            SpriteAsset::Chicken => "chicken",
            SpriteAsset::Ship => "ship",
        })
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Static per-kind configuration
#[derive(Debug, Clone, Copy)]
pub struct KindProfile {
    /// Texture drawn for this kind (`None` = supplied per instance)
    pub asset: Option<SpriteAsset>,
    /// Art width / height; `None` = measured from the loaded texture
    pub image_ratio: Option<f32>,
    /// Layer depth
    pub depth: f32,
    /// Whether the update loop tests this kind for overlaps
    pub collidable: bool,
}

const OBSTACLE_PROFILE: KindProfile = KindProfile {
    asset: Some(SpriteAsset::Asteroid),
    image_ratio: Some(OBSTACLE_IMAGE_RATIO),
    depth: DEPTH_PLAYFIELD,
    collidable: true,
};

const DEBRIS_PROFILE: KindProfile = KindProfile {
    asset: Some(SpriteAsset::Asteroid),
    image_ratio: Some(OBSTACLE_IMAGE_RATIO),
    depth: 0.0,
    collidable: false,
};

const TARGET_PROFILE: KindProfile = KindProfile {
    asset: Some(SpriteAsset::Chicken),
    image_ratio: Some(TARGET_IMAGE_RATIO),
    depth: DEPTH_OVERLAY,
    collidable: true,
};

const PLAYER_PROFILE: KindProfile = KindProfile {
    asset: Some(SpriteAsset::Ship),
    image_ratio: None,
    depth: DEPTH_PLAYFIELD,
    collidable: true,
};

const ICON_PROFILE: KindProfile = KindProfile {
    asset: Some(SpriteAsset::Asteroid),
    image_ratio: None,
    depth: DEPTH_OVERLAY,
    collidable: false,
};

const LABEL_PROFILE: KindProfile = KindProfile {
    asset: None,
    image_ratio: None,
    depth: DEPTH_PLAYFIELD,
    collidable: false,
};

impl EntityKind {
    pub fn profile(self) -> &'static KindProfile {
        match self {
            EntityKind::Obstacle => &OBSTACLE_PROFILE,
            EntityKind::BrokenObstacle => &DEBRIS_PROFILE,
            EntityKind::Target => &TARGET_PROFILE,
            EntityKind::Player => &PLAYER_PROFILE,
            EntityKind::Icon => &ICON_PROFILE,
            EntityKind::Label => &LABEL_PROFILE,
        }
    }
}

/// A moving or static sprite
#[derive(Debug, Clone)]
pub struct Entity {
    pub kind: EntityKind,
    /// x, y in sprite space; z is layer depth
    pub position: Vec3,
    /// Per-frame delta
    pub velocity: Vec3,
    pub scale: Vec2,
    /// Degrees about z
    pub rotation: f32,
    /// Degrees per frame
    pub rotation_delta: f32,
    /// Collision circle offset within the unit sprite
    pub collision_center: Vec2,
    /// Collision radius within the unit sprite (scaled by `scale.x`)
    pub collision_radius: f32,
    /// Still in play; false = cull this frame
    pub alive: bool,
    /// Pool slot is taken
    pub in_use: bool,
    pub texture: TextureHandle,
    /// Screen height / width seen by this entity (bottom edge is `-ratio`)
    pub ratio: f32,
    /// Player only: eased tilt in degrees
    pub tilt: f32,
}

impl Entity {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            position: Vec3::new(0.0, 0.0, kind.profile().depth),
            velocity: Vec3::ZERO,
            scale: Vec2::ONE,
            rotation: 0.0,
            rotation_delta: 0.0,
            collision_center: Vec2::ZERO,
            collision_radius: 1.0,
            alive: true,
            in_use: false,
            texture: TextureHandle::INVALID,
            ratio: 0.0,
            tilt: 0.0,
        }
    }

    /// Restore the full-coverage unit collision circle
    pub fn reset_collision_shape(&mut self) {
        self.collision_center = Vec2::ZERO;
        self.collision_radius = 1.0;
    }

    pub fn profile(&self) -> &'static KindProfile {
        self.kind.profile()
    }
}

impl Poolable for Entity {
    fn in_use(&self) -> bool {
        self.in_use
    }

    fn set_in_use(&mut self, in_use: bool) {
        self.in_use = in_use;
    }
}

impl Renderable for Entity {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn rotation_degrees(&self) -> f32 {
        self.rotation
    }

    fn scale(&self) -> Vec2 {
        self.scale
    }

    fn texture(&self) -> TextureHandle {
        self.texture
    }
}

/// Uploaded texture plus the pixel size it came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadedTexture {
    pub handle: TextureHandle,
    pub width: u32,
    pub height: u32,
}

impl LoadedTexture {
    pub const MISSING: LoadedTexture = LoadedTexture {
        handle: TextureHandle::INVALID,
        width: 1,
        height: 1,
    };

    /// Width over height
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Resolved textures for each sprite asset
#[derive(Debug, Clone)]
pub struct SpriteTextures {
    loaded: [LoadedTexture; 3],
}

impl Default for SpriteTextures {
    fn default() -> Self {
        Self {
            loaded: [LoadedTexture::MISSING; 3],
        }
    }
}

impl SpriteTextures {
    pub fn get(&self, asset: SpriteAsset) -> LoadedTexture {
        self.loaded[asset.index()]
    }

    pub fn set(&mut self, asset: SpriteAsset, texture: LoadedTexture) {
        self.loaded[asset.index()] = texture;
    }

    /// Texture handle for a kind's own art
    pub fn handle_for(&self, kind: EntityKind) -> TextureHandle {
        kind.profile()
            .asset
            .map(|a| self.get(a).handle)
            .unwrap_or(TextureHandle::INVALID)
    }

    /// Forget every handle (graphics context lost)
    pub fn invalidate(&mut self) {
        self.loaded = [LoadedTexture::MISSING; 3];
    }
}
