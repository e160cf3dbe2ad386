//! Sprite rendering
//!
//! Every visible object is a textured unit quad drawn through a
//! [`GraphicsBackend`]. The simulation never sees the backend; it only hands
//! [`Renderable`] items to [`batch_draw`].

pub mod backend;
pub mod batch;
pub mod context;
pub mod vertex;
pub mod wgpu_backend;

pub use backend::{
    DrawCommand, GeometryHandle, GraphicsBackend, ProgramHandle, RecordingBackend, TextureHandle,
};
pub use batch::{Renderable, batch_draw, draw_single, projection, sprite_transform};
pub use context::RenderContext;
pub use wgpu_backend::WgpuBackend;
