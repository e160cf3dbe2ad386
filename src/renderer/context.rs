//! Shared render state: the sprite program, the unit quad and texture caches
//!
//! One `RenderContext` lives as long as the engine. It is filled lazily on
//! surface creation and emptied when the graphics context is lost, after
//! which every handle it handed out must be considered dead.

use std::collections::HashMap;

use super::backend::{GeometryHandle, GraphicsBackend, ProgramHandle};
use super::vertex::{QUAD_INDICES, QUAD_VERTICES};
use crate::assets::{AssetKey, DecodedImage, ImageId, ImageSource};
use crate::error::RenderError;
use crate::sim::entity::LoadedTexture;

pub const SPRITE_SHADER: &str = include_str!("sprite.wgsl");

#[derive(Debug, Default)]
pub struct RenderContext {
    program: Option<ProgramHandle>,
    quad: Option<GeometryHandle>,
    /// Asset key -> uploaded texture
    by_key: HashMap<AssetKey, LoadedTexture>,
    /// Pixel identity -> uploaded texture, shared across keys
    by_image: HashMap<ImageId, LoadedTexture>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the program and quad if they are not there yet
    pub fn init<G: GraphicsBackend + ?Sized>(&mut self, gfx: &mut G) -> Result<(), RenderError> {
        if self.is_ready() {
            return Ok(());
        }
        let program = gfx.create_program(SPRITE_SHADER)?;
        let quad = gfx.create_quad_geometry(&QUAD_VERTICES, &QUAD_INDICES)?;
        self.program = Some(program);
        self.quad = Some(quad);
        log::info!("Render context initialised");
        Ok(())
    }

    /// Free every backend object and forget every handle (graphics context lost)
    pub fn invalidate<G: GraphicsBackend + ?Sized>(&mut self, gfx: &mut G) {
        if self.is_ready() || !self.by_key.is_empty() {
            log::info!(
                "Render context invalidated, dropping {} cached textures",
                self.by_image.len()
            );
        }
        gfx.reset();
        self.program = None;
        self.quad = None;
        self.by_key.clear();
        self.by_image.clear();
    }

    pub fn is_ready(&self) -> bool {
        self.program.is_some() && self.quad.is_some()
    }

    pub fn program(&self) -> Result<ProgramHandle, RenderError> {
        self.program.ok_or(RenderError::ContextNotReady)
    }

    pub fn quad(&self) -> Result<GeometryHandle, RenderError> {
        self.quad.ok_or(RenderError::ContextNotReady)
    }

    /// Texture for `key`, decoding and uploading it on first use
    pub fn load_texture<G: GraphicsBackend + ?Sized>(
        &mut self,
        gfx: &mut G,
        images: &mut dyn ImageSource,
        key: &AssetKey,
    ) -> Result<LoadedTexture, RenderError> {
        if let Some(&texture) = self.by_key.get(key) {
            return Ok(texture);
        }
        let image = images.decode(key)?;
        let texture = self.upload_image(gfx, &image)?;
        self.by_key.insert(key.clone(), texture);
        Ok(texture)
    }

    /// Upload decoded pixels unless identical pixels are already on the GPU
    pub fn upload_image<G: GraphicsBackend + ?Sized>(
        &mut self,
        gfx: &mut G,
        image: &DecodedImage,
    ) -> Result<LoadedTexture, RenderError> {
        if let Some(&texture) = self.by_image.get(&image.id()) {
            return Ok(texture);
        }
        let handle = gfx.upload_texture(image)?;
        let texture = LoadedTexture {
            handle,
            width: image.width,
            height: image.height,
        };
        self.by_image.insert(image.id(), texture);
        Ok(texture)
    }

    /// Upload pixels the caller owns outright
    ///
    /// The texture is never shared through the caches, so the caller frees
    /// it with [`RenderContext::release`] once it is replaced.
    pub fn upload_uncached<G: GraphicsBackend + ?Sized>(
        &mut self,
        gfx: &mut G,
        image: &DecodedImage,
    ) -> Result<LoadedTexture, RenderError> {
        let handle = gfx.upload_texture(image)?;
        Ok(LoadedTexture {
            handle,
            width: image.width,
            height: image.height,
        })
    }

    /// Free a texture from `upload_uncached`; cached textures are left alone
    pub fn release<G: GraphicsBackend + ?Sized>(&mut self, gfx: &mut G, texture: LoadedTexture) {
        if !texture.handle.is_valid() || self.by_image.values().any(|t| t.handle == texture.handle) {
            return;
        }
        gfx.release_texture(texture.handle);
    }

    /// Distinct cached textures on the GPU
    pub fn texture_count(&self) -> usize {
        self.by_image.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryImages;
    use crate::error::AssetError;
    use crate::renderer::backend::RecordingBackend;

    fn images() -> MemoryImages {
        MemoryImages::new()
            .with(AssetKey::Sprite("asteroid"), DecodedImage::solid(8, 8, [200, 120, 40, 255]))
            .with(AssetKey::Sprite("asteroid_icon"), DecodedImage::solid(8, 8, [200, 120, 40, 255]))
            .with(AssetKey::Sprite("ship"), DecodedImage::solid(16, 8, [90, 90, 255, 255]))
    }

    #[test]
    fn test_init_is_idempotent() {
        let mut gfx = RecordingBackend::new();
        let mut ctx = RenderContext::new();
        assert!(matches!(ctx.program(), Err(RenderError::ContextNotReady)));
        ctx.init(&mut gfx).unwrap();
        ctx.init(&mut gfx).unwrap();
        assert!(ctx.is_ready());
        assert_eq!(gfx.programs_created, 1);
    }

    #[test]
    fn test_key_cache_skips_decode() {
        let mut gfx = RecordingBackend::new();
        let mut images = images();
        let mut ctx = RenderContext::new();
        let a = ctx.load_texture(&mut gfx, &mut images, &AssetKey::Sprite("ship")).unwrap();
        let b = ctx.load_texture(&mut gfx, &mut images, &AssetKey::Sprite("ship")).unwrap();
        assert_eq!(a, b);
        assert_eq!((a.width, a.height), (16, 8));
        assert_eq!(images.decode_count(), 1);
        assert_eq!(gfx.textures_uploaded, 1);
    }

    #[test]
    fn test_identical_pixels_uploaded_once() {
        let mut gfx = RecordingBackend::new();
        let mut images = images();
        let mut ctx = RenderContext::new();
        let sprite = ctx
            .load_texture(&mut gfx, &mut images, &AssetKey::Sprite("asteroid"))
            .unwrap();
        let icon = ctx
            .load_texture(&mut gfx, &mut images, &AssetKey::Sprite("asteroid_icon"))
            .unwrap();
        assert_eq!(sprite.handle, icon.handle);
        assert_eq!(images.decode_count(), 2);
        assert_eq!(gfx.textures_uploaded, 1);
        assert_eq!(ctx.texture_count(), 1);
    }

    #[test]
    fn test_invalidate_forces_reupload() {
        let mut gfx = RecordingBackend::new();
        let mut images = images();
        let mut ctx = RenderContext::new();
        ctx.init(&mut gfx).unwrap();
        let before = ctx
            .load_texture(&mut gfx, &mut images, &AssetKey::Sprite("ship"))
            .unwrap();
        ctx.invalidate(&mut gfx);
        assert!(!ctx.is_ready());
        assert_eq!(gfx.resets, 1);
        assert_eq!(gfx.live_textures(), 0);
        ctx.init(&mut gfx).unwrap();
        let after = ctx
            .load_texture(&mut gfx, &mut images, &AssetKey::Sprite("ship"))
            .unwrap();
        assert_ne!(before.handle, after.handle);
        assert_eq!(gfx.textures_uploaded, 2);
    }

    #[test]
    fn test_uncached_texture_released_without_touching_cache() {
        let mut gfx = RecordingBackend::new();
        let mut images = images();
        let mut ctx = RenderContext::new();
        let ship = ctx
            .load_texture(&mut gfx, &mut images, &AssetKey::Sprite("ship"))
            .unwrap();

        let label = ctx
            .upload_uncached(&mut gfx, &DecodedImage::solid(16, 8, [90, 90, 255, 255]))
            .unwrap();
        assert_ne!(label.handle, ship.handle);
        assert_eq!(ctx.texture_count(), 1);
        assert_eq!(gfx.live_textures(), 2);

        ctx.release(&mut gfx, label);
        ctx.release(&mut gfx, ship);
        ctx.release(&mut gfx, LoadedTexture::MISSING);
        assert_eq!(gfx.textures_released, 1);
        assert_eq!(gfx.live_textures(), 1);
    }

    #[test]
    fn test_missing_asset_surfaces_as_error() {
        let mut gfx = RecordingBackend::new();
        let mut images = images();
        let mut ctx = RenderContext::new();
        let err = ctx
            .load_texture(&mut gfx, &mut images, &AssetKey::Sprite("chicken"))
            .unwrap_err();
        assert!(matches!(err, RenderError::Asset(AssetError::NotFound(_))));
    }
}
