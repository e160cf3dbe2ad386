//! Batched sprite submission
//!
//! Everything drawn is a unit quad. A batch binds the shared program and
//! quad once and then issues one draw per sprite, re-binding the texture
//! only when it changes.

use glam::{Mat4, Vec2, Vec3};

use super::backend::{GraphicsBackend, TextureHandle};
use super::context::RenderContext;
use super::vertex::QUAD_INDICES;

/// What the batch renderer needs to know about a sprite
pub trait Renderable {
    fn position(&self) -> Vec3;
    /// Rotation about z, in degrees
    fn rotation_degrees(&self) -> f32;
    fn scale(&self) -> Vec2;
    fn texture(&self) -> TextureHandle;
}

/// View-projection for a screen of the given height / width ratio
///
/// x spans [-1, 1] and y spans [-ratio, ratio]; the camera sits at z = 1.
pub fn projection(ratio: f32) -> Mat4 {
    let proj = Mat4::orthographic_rh(-1.0, 1.0, -ratio, ratio, 0.0, 2.0);
    let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 1.0), Vec3::ZERO, Vec3::Y);
    proj * view
}

/// MVP for one sprite: translate, rotate about z, then scale the unit quad
pub fn sprite_transform<R: Renderable + ?Sized>(mvp: &Mat4, item: &R) -> Mat4 {
    let scale = item.scale();
    *mvp * Mat4::from_translation(item.position())
        * Mat4::from_rotation_z(item.rotation_degrees().to_radians())
        * Mat4::from_scale(Vec3::new(scale.x, scale.y, 1.0))
}

/// Draw a run of sprites sharing the sprite program; returns draws issued
///
/// Sprites without a valid texture are skipped. Nothing is bound when the
/// context has not been initialised or there is nothing to draw.
pub fn batch_draw<'a, R, G, I>(ctx: &RenderContext, gfx: &mut G, mvp: &Mat4, items: I) -> usize
where
    R: Renderable + 'a,
    G: GraphicsBackend + ?Sized,
    I: IntoIterator<Item = &'a R>,
{
    let (Ok(program), Ok(quad)) = (ctx.program(), ctx.quad()) else {
        log::debug!("Batch skipped, render context not ready");
        return 0;
    };

    let mut items = items
        .into_iter()
        .filter(|item| item.texture().is_valid())
        .peekable();
    if items.peek().is_none() {
        return 0;
    }

    gfx.use_program(program);
    gfx.bind_geometry(quad);

    let mut bound: Option<TextureHandle> = None;
    let mut draws = 0;
    for item in items {
        let texture = item.texture();
        if bound != Some(texture) {
            gfx.bind_texture(texture);
            bound = Some(texture);
        }
        gfx.set_mvp(&sprite_transform(mvp, item));
        gfx.draw_indexed(QUAD_INDICES.len() as u32);
        draws += 1;
    }

    gfx.unbind_geometry();
    draws
}

/// Batch of one
pub fn draw_single<R, G>(ctx: &RenderContext, gfx: &mut G, mvp: &Mat4, item: &R) -> usize
where
    R: Renderable,
    G: GraphicsBackend + ?Sized,
{
    batch_draw(ctx, gfx, mvp, std::iter::once(item))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::backend::{DrawCommand, RecordingBackend};

    struct Quad {
        position: Vec3,
        rotation: f32,
        scale: Vec2,
        texture: TextureHandle,
    }

    impl Renderable for Quad {
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

    fn quad(x: f32, texture: u32) -> Quad {
        Quad {
            position: Vec3::new(x, 0.0, 0.1),
            rotation: 0.0,
            scale: Vec2::splat(0.1),
            texture: TextureHandle(texture),
        }
    }

    fn ready() -> (RenderContext, RecordingBackend) {
        let mut gfx = RecordingBackend::new();
        let mut ctx = RenderContext::new();
        ctx.init(&mut gfx).unwrap();
        (ctx, gfx)
    }

    #[test]
    fn test_one_bind_many_draws() {
        let (ctx, mut gfx) = ready();
        let items = [quad(-0.5, 7), quad(0.0, 7), quad(0.5, 7)];
        let draws = batch_draw(&ctx, &mut gfx, &Mat4::IDENTITY, items.iter());
        assert_eq!(draws, 3);

        let commands = gfx.commands();
        let count = |f: fn(&DrawCommand) -> bool| commands.iter().filter(|c| f(c)).count();
        assert_eq!(count(|c| matches!(c, DrawCommand::UseProgram(_))), 1);
        assert_eq!(count(|c| matches!(c, DrawCommand::BindGeometry(_))), 1);
        assert_eq!(count(|c| matches!(c, DrawCommand::BindTexture(_))), 1);
        assert_eq!(count(|c| matches!(c, DrawCommand::DrawIndexed(6))), 3);
        assert_eq!(commands.last(), Some(&DrawCommand::UnbindGeometry));
    }

    #[test]
    fn test_texture_rebound_only_on_change() {
        let (ctx, mut gfx) = ready();
        let items = [quad(0.0, 1), quad(0.0, 2), quad(0.0, 2), quad(0.0, 1)];
        batch_draw(&ctx, &mut gfx, &Mat4::IDENTITY, items.iter());
        let binds: Vec<_> = gfx
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::BindTexture(t) => Some(t.0),
                _ => None,
            })
            .collect();
        assert_eq!(binds, vec![1, 2, 1]);
    }

    #[test]
    fn test_invalid_textures_skipped() {
        let (ctx, mut gfx) = ready();
        let items = [quad(0.0, 0), quad(0.0, 3)];
        assert_eq!(batch_draw(&ctx, &mut gfx, &Mat4::IDENTITY, items.iter()), 1);
    }

    #[test]
    fn test_empty_batch_binds_nothing() {
        let (ctx, mut gfx) = ready();
        let items: [Quad; 0] = [];
        assert_eq!(batch_draw(&ctx, &mut gfx, &Mat4::IDENTITY, items.iter()), 0);
        assert!(gfx.commands().is_empty());
    }

    #[test]
    fn test_not_ready_draws_nothing() {
        let ctx = RenderContext::new();
        let mut gfx = RecordingBackend::new();
        assert_eq!(draw_single(&ctx, &mut gfx, &Mat4::IDENTITY, &quad(0.0, 1)), 0);
        assert!(gfx.commands().is_empty());
    }

    #[test]
    fn test_sprite_transform_composition() {
        let item = Quad {
            position: Vec3::new(0.5, 0.25, 0.1),
            rotation: 90.0,
            scale: Vec2::new(0.2, 0.1),
            texture: TextureHandle(1),
        };
        let m = sprite_transform(&Mat4::IDENTITY, &item);
        // Quad corner (1, 0) is scaled to 0.2, rotated onto +y, then translated
        let p = m.transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert!((p.x - 0.5).abs() < 1e-5);
        assert!((p.y - 0.45).abs() < 1e-5);
    }

    #[test]
    fn test_projection_maps_screen_bounds() {
        let proj = projection(1.5);
        let top_right = proj.project_point3(Vec3::new(1.0, 1.5, 0.0));
        assert!((top_right.x - 1.0).abs() < 1e-5);
        assert!((top_right.y - 1.0).abs() < 1e-5);
        let bottom_left = proj.project_point3(Vec3::new(-1.0, -1.5, 0.2));
        assert!((bottom_left.x + 1.0).abs() < 1e-5);
        assert!((bottom_left.y + 1.0).abs() < 1e-5);
        assert!((0.0..=1.0).contains(&bottom_left.z));
    }
}
