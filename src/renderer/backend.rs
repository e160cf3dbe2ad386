//! Graphics backend boundary
//!
//! The batch renderer speaks a tiny immediate-mode protocol: bind a program
//! and the quad once, then per sprite bind a texture, set the MVP and draw.
//! `WgpuBackend` executes it on the GPU; `RecordingBackend` just keeps the
//! calls so frames can be inspected without a device.

use glam::Mat4;

use super::vertex::SpriteVertex;
use crate::assets::DecodedImage;
use crate::error::RenderError;

/// Compiled shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// Vertex + index buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryHandle(pub u32);

/// Uploaded texture; 0 is never handed out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

impl TextureHandle {
    pub const INVALID: TextureHandle = TextureHandle(0);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

pub trait GraphicsBackend {
    fn create_program(&mut self, wgsl: &str) -> Result<ProgramHandle, RenderError>;

    fn create_quad_geometry(
        &mut self,
        vertices: &[SpriteVertex],
        indices: &[u16],
    ) -> Result<GeometryHandle, RenderError>;

    fn upload_texture(&mut self, image: &DecodedImage) -> Result<TextureHandle, RenderError>;

    /// Free one texture; its handle must not be bound again
    fn release_texture(&mut self, texture: TextureHandle);

    /// Free every program, geometry and texture created so far
    fn reset(&mut self);

    fn use_program(&mut self, program: ProgramHandle);

    fn bind_geometry(&mut self, geometry: GeometryHandle);

    fn bind_texture(&mut self, texture: TextureHandle);

    fn set_mvp(&mut self, mvp: &Mat4);

    /// Draw `index_count` indices of the bound geometry with the bound state
    fn draw_indexed(&mut self, index_count: u32);

    /// End of a batch; attribute state goes back to its idle configuration
    fn unbind_geometry(&mut self);
}

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    UseProgram(ProgramHandle),
    BindGeometry(GeometryHandle),
    BindTexture(TextureHandle),
    SetMvp(Mat4),
    DrawIndexed(u32),
    UnbindGeometry,
}

/// Backend that records calls instead of drawing
#[derive(Debug, Default)]
pub struct RecordingBackend {
    commands: Vec<DrawCommand>,
    next_id: u32,
    pub programs_created: usize,
    pub textures_uploaded: usize,
    pub textures_released: usize,
    pub resets: usize,
    live_textures: usize,
    /// Make every texture upload fail
    pub fail_uploads: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Hand back everything recorded so far and start a fresh frame
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Textures uploaded and not yet released or reset away
    pub fn live_textures(&self) -> usize {
        self.live_textures
    }

    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::DrawIndexed(_)))
            .count()
    }
}

impl GraphicsBackend for RecordingBackend {
    fn create_program(&mut self, wgsl: &str) -> Result<ProgramHandle, RenderError> {
        if wgsl.trim().is_empty() {
            return Err(RenderError::ProgramCreation("empty shader source".into()));
        }
        self.programs_created += 1;
        Ok(ProgramHandle(self.next_id()))
    }

    fn create_quad_geometry(
        &mut self,
        vertices: &[SpriteVertex],
        indices: &[u16],
    ) -> Result<GeometryHandle, RenderError> {
        if indices.iter().any(|&i| i as usize >= vertices.len()) {
            return Err(RenderError::ProgramCreation("index out of range".into()));
        }
        Ok(GeometryHandle(self.next_id()))
    }

    fn upload_texture(&mut self, image: &DecodedImage) -> Result<TextureHandle, RenderError> {
        let expected = image.width as usize * image.height as usize * 4;
        if self.fail_uploads || image.width == 0 || image.height == 0 {
            return Err(RenderError::TextureUpload(format!(
                "{}x{} image rejected",
                image.width, image.height
            )));
        }
        if image.pixels.len() != expected {
            return Err(RenderError::TextureUpload(format!(
                "expected {expected} bytes, got {}",
                image.pixels.len()
            )));
        }
        self.textures_uploaded += 1;
        self.live_textures += 1;
        Ok(TextureHandle(self.next_id()))
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        if texture.is_valid() {
            self.textures_released += 1;
            self.live_textures = self.live_textures.saturating_sub(1);
        }
    }

    fn reset(&mut self) {
        self.resets += 1;
        self.live_textures = 0;
        self.commands.clear();
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.commands.push(DrawCommand::UseProgram(program));
    }

    fn bind_geometry(&mut self, geometry: GeometryHandle) {
        self.commands.push(DrawCommand::BindGeometry(geometry));
    }

    fn bind_texture(&mut self, texture: TextureHandle) {
        self.commands.push(DrawCommand::BindTexture(texture));
    }

    fn set_mvp(&mut self, mvp: &Mat4) {
        self.commands.push(DrawCommand::SetMvp(*mvp));
    }

    fn draw_indexed(&mut self, index_count: u32) {
        self.commands.push(DrawCommand::DrawIndexed(index_count));
    }

    fn unbind_geometry(&mut self) {
        self.commands.push(DrawCommand::UnbindGeometry);
    }
}
