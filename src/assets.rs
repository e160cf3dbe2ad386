//! Image assets handed in by the host
//!
//! Decoding (PNG files, font rasterisation) lives outside the core. The core
//! only asks for decoded RGBA pixels by key and uploads them once.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::AssetError;

/// Identifies an image the core wants drawn
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetKey {
    /// Static sprite art, by resource name
    Sprite(&'static str),
    /// A line of HUD text, rasterised by the host
    Text(String),
}

impl std::fmt::Display for AssetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetKey::Sprite(name) => write!(f, "sprite:{name}"),
            AssetKey::Text(text) => write!(f, "text:{text:?}"),
        }
    }
}

/// Content identity of decoded pixels
///
/// Two keys that decode to the same pixels share one GPU texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageId(pub u64);

/// Decoded RGBA8 image
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<[u8]>,
    id: ImageId,
}

impl DecodedImage {
    pub fn new(width: u32, height: u32, pixels: impl Into<Arc<[u8]>>) -> Self {
        let pixels = pixels.into();
        let mut hasher = DefaultHasher::new();
        width.hash(&mut hasher);
        height.hash(&mut hasher);
        pixels.hash(&mut hasher);
        Self {
            width,
            height,
            pixels,
            id: ImageId(hasher.finish()),
        }
    }

    /// Single-colour image (placeholder art)
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels: Vec<u8> = rgba
            .iter()
            .copied()
            .cycle()
            .take((width as usize) * (height as usize) * 4)
            .collect();
        Self::new(width, height, pixels)
    }

    pub fn id(&self) -> ImageId {
        self.id
    }

    /// Width over height
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Host-side decoder for sprite art and HUD text
pub trait ImageSource {
    fn decode(&mut self, key: &AssetKey) -> Result<DecodedImage, AssetError>;
}

/// In-memory image source
///
/// Sprites are looked up by key; text is rendered as a blank box sized from
/// the glyph count, which is enough for layout and for headless runs.
#[derive(Debug)]
pub struct MemoryImages {
    images: HashMap<AssetKey, DecodedImage>,
    glyph_size: (u32, u32),
    decode_count: usize,
}

impl MemoryImages {
    pub fn new() -> Self {
        Self {
            images: HashMap::new(),
            glyph_size: (12, 24),
            decode_count: 0,
        }
    }

    pub fn insert(&mut self, key: AssetKey, image: DecodedImage) {
        self.images.insert(key, image);
    }

    pub fn with(mut self, key: AssetKey, image: DecodedImage) -> Self {
        self.insert(key, image);
        self
    }

    /// How many times `decode` has been called
    pub fn decode_count(&self) -> usize {
        self.decode_count
    }
}

impl Default for MemoryImages {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageSource for MemoryImages {
    fn decode(&mut self, key: &AssetKey) -> Result<DecodedImage, AssetError> {
        self.decode_count += 1;
        if let Some(image) = self.images.get(key) {
            return Ok(image.clone());
        }
        match key {
            AssetKey::Text(text) => {
                let glyphs = text.chars().count().max(1) as u32;
                let (gw, gh) = self.glyph_size;
                Ok(DecodedImage::solid(gw * glyphs, gh, [255, 255, 255, 255]))
            }
            AssetKey::Sprite(_) => Err(AssetError::NotFound(key.to_string())),
        }
    }
}
