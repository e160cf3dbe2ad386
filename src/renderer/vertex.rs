//! Vertex layout for textured sprites

use bytemuck::{Pod, Zeroable};

/// Quad corner: position in the unit square plus texture coordinate
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SpriteVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl SpriteVertex {
    pub const fn new(x: f32, y: f32, u: f32, v: f32) -> Self {
        Self {
            position: [x, y, 0.0],
            tex_coords: [u, v],
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Unit quad spanning [-1, 1] on both axes; v runs top to bottom
pub const QUAD_VERTICES: [SpriteVertex; 4] = [
    SpriteVertex::new(-1.0, -1.0, 0.0, 1.0),
    SpriteVertex::new(1.0, -1.0, 1.0, 1.0),
    SpriteVertex::new(1.0, 1.0, 1.0, 0.0),
    SpriteVertex::new(-1.0, 1.0, 0.0, 0.0),
];

/// Two counter-clockwise triangles
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];
