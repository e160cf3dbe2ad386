//! wgpu implementation of the sprite backend
//!
//! The batch renderer issues immediate-mode calls; wgpu wants a recorded
//! render pass. Calls are captured into a frame list (one MVP uniform slot
//! per draw, addressed with a dynamic offset) and replayed by `render`.
//!
//! There is no depth attachment. Layering comes from submission order,
//! which the engine sorts back to front by sprite z.

use glam::Mat4;
use wgpu::util::DeviceExt;

use super::backend::{GeometryHandle, GraphicsBackend, ProgramHandle, TextureHandle};
use super::vertex::SpriteVertex;
use crate::assets::DecodedImage;
use crate::error::RenderError;

const MVP_SIZE: u64 = std::mem::size_of::<Mat4>() as u64;
const INITIAL_MVP_SLOTS: u64 = 256;

struct QuadBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
}

/// One draw captured during the frame
#[derive(Debug, Clone, Copy)]
struct DrawOp {
    program: usize,
    geometry: usize,
    texture: usize,
    mvp_slot: u32,
    index_count: u32,
}

pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    format: wgpu::TextureFormat,

    transform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,

    transform_buffer: wgpu::Buffer,
    transform_bind_group: wgpu::BindGroup,
    /// Bytes between MVP slots (device uniform offset alignment)
    mvp_stride: u64,
    mvp_slots: u64,

    programs: Vec<wgpu::RenderPipeline>,
    geometries: Vec<QuadBuffers>,
    /// Released slots are `None` and reused by the next upload
    textures: Vec<Option<wgpu::BindGroup>>,
    free_textures: Vec<usize>,

    current_program: Option<usize>,
    current_geometry: Option<usize>,
    current_texture: Option<usize>,
    current_mvp: Mat4,
    mvps: Vec<Mat4>,
    ops: Vec<DrawOp>,
}

impl WgpuBackend {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, format: wgpu::TextureFormat) -> Self {
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let mvp_stride = MVP_SIZE.div_ceil(alignment) * alignment;

        let transform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sprite_transform_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(MVP_SIZE),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sprite_texture_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sprite_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let (transform_buffer, transform_bind_group) =
            create_transform_slots(&device, &transform_layout, mvp_stride, INITIAL_MVP_SLOTS);

        Self {
            device,
            queue,
            format,
            transform_layout,
            texture_layout,
            sampler,
            transform_buffer,
            transform_bind_group,
            mvp_stride,
            mvp_slots: INITIAL_MVP_SLOTS,
            programs: Vec::new(),
            geometries: Vec::new(),
            textures: Vec::new(),
            free_textures: Vec::new(),
            current_program: None,
            current_geometry: None,
            current_texture: None,
            current_mvp: Mat4::IDENTITY,
            mvps: Vec::new(),
            ops: Vec::new(),
        }
    }

    /// Draws recorded since the last `render`
    pub fn pending_draws(&self) -> usize {
        self.ops.len()
    }

    /// Replay the recorded frame into `view`, clearing it first
    ///
    /// Hosts normally pass `GameEngine::clear_color` as `clear`.
    pub fn render(&mut self, view: &wgpu::TextureView, clear: [f32; 4]) {
        self.ensure_mvp_capacity(self.mvps.len() as u64);

        let mut bytes = vec![0u8; (self.mvps.len() as u64 * self.mvp_stride) as usize];
        for (i, mvp) in self.mvps.iter().enumerate() {
            let start = i * self.mvp_stride as usize;
            bytes[start..start + MVP_SIZE as usize].copy_from_slice(bytemuck::bytes_of(mvp));
        }
        if !bytes.is_empty() {
            self.queue.write_buffer(&self.transform_buffer, 0, &bytes);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sprite_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sprite_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear[0] as f64,
                            g: clear[1] as f64,
                            b: clear[2] as f64,
                            a: clear[3] as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            for op in &self.ops {
                let Some(texture) = self.textures.get(op.texture).and_then(Option::as_ref) else {
                    continue;
                };
                let quad = &self.geometries[op.geometry];
                render_pass.set_pipeline(&self.programs[op.program]);
                render_pass.set_bind_group(
                    0,
                    &self.transform_bind_group,
                    &[(op.mvp_slot as u64 * self.mvp_stride) as u32],
                );
                render_pass.set_bind_group(1, texture, &[]);
                render_pass.set_vertex_buffer(0, quad.vertex.slice(..));
                render_pass.set_index_buffer(quad.index.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(0..op.index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        self.mvps.clear();
        self.ops.clear();
    }

    fn ensure_mvp_capacity(&mut self, needed: u64) {
        if needed <= self.mvp_slots {
            return;
        }
        let slots = needed.next_power_of_two();
        log::debug!("Growing MVP uniform buffer to {slots} slots");
        let (buffer, bind_group) =
            create_transform_slots(&self.device, &self.transform_layout, self.mvp_stride, slots);
        self.transform_buffer = buffer;
        self.transform_bind_group = bind_group;
        self.mvp_slots = slots;
    }
}

fn create_transform_slots(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    stride: u64,
    slots: u64,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("sprite_transforms"),
        size: stride * slots,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("sprite_transform_bind_group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: wgpu::BufferSize::new(MVP_SIZE),
            }),
        }],
    });
    (buffer, bind_group)
}

/// Handles are 1-based indices; 0 stays invalid
fn to_index(id: u32) -> Option<usize> {
    (id as usize).checked_sub(1)
}

impl GraphicsBackend for WgpuBackend {
    fn create_program(&mut self, wgsl: &str) -> Result<ProgramHandle, RenderError> {
        if wgsl.trim().is_empty() {
            return Err(RenderError::ProgramCreation("empty shader source".into()));
        }
        let shader = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("sprite_shader"),
                source: wgpu::ShaderSource::Wgsl(wgsl.into()),
            });

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("sprite_pipeline_layout"),
                bind_group_layouts: &[&self.transform_layout, &self.texture_layout],
                immediate_size: 0,
            });

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("sprite_pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[SpriteVertex::desc()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        self.programs.push(pipeline);
        Ok(ProgramHandle(self.programs.len() as u32))
    }

    fn create_quad_geometry(
        &mut self,
        vertices: &[SpriteVertex],
        indices: &[u16],
    ) -> Result<GeometryHandle, RenderError> {
        if indices.iter().any(|&i| i as usize >= vertices.len()) {
            return Err(RenderError::ProgramCreation("index out of range".into()));
        }
        let vertex = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("sprite_quad_vertices"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        // Index buffer sizes must be 4-byte aligned
        let mut padded = indices.to_vec();
        if padded.len() % 2 == 1 {
            padded.push(0);
        }
        let index = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("sprite_quad_indices"),
                contents: bytemuck::cast_slice(&padded),
                usage: wgpu::BufferUsages::INDEX,
            });
        self.geometries.push(QuadBuffers { vertex, index });
        Ok(GeometryHandle(self.geometries.len() as u32))
    }

    fn upload_texture(&mut self, image: &DecodedImage) -> Result<TextureHandle, RenderError> {
        let expected = image.width as usize * image.height as usize * 4;
        if image.width == 0 || image.height == 0 || image.pixels.len() != expected {
            return Err(RenderError::TextureUpload(format!(
                "{}x{} image with {} bytes",
                image.width,
                image.height,
                image.pixels.len()
            )));
        }

        let size = wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("sprite_texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width),
                rows_per_image: Some(image.height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sprite_texture_bind_group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });
        let index = match self.free_textures.pop() {
            Some(index) => {
                self.textures[index] = Some(bind_group);
                index
            }
            None => {
                self.textures.push(Some(bind_group));
                self.textures.len() - 1
            }
        };
        Ok(TextureHandle(index as u32 + 1))
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        let Some(index) = to_index(texture.0) else {
            return;
        };
        if self.textures.get_mut(index).and_then(Option::take).is_some() {
            self.free_textures.push(index);
            if self.current_texture == Some(index) {
                self.current_texture = None;
            }
        }
    }

    fn reset(&mut self) {
        self.programs.clear();
        self.geometries.clear();
        self.textures.clear();
        self.free_textures.clear();
        self.current_program = None;
        self.current_geometry = None;
        self.current_texture = None;
        self.mvps.clear();
        self.ops.clear();
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.current_program = to_index(program.0).filter(|&i| i < self.programs.len());
    }

    fn bind_geometry(&mut self, geometry: GeometryHandle) {
        self.current_geometry = to_index(geometry.0).filter(|&i| i < self.geometries.len());
    }

    fn bind_texture(&mut self, texture: TextureHandle) {
        self.current_texture = to_index(texture.0)
            .filter(|&i| self.textures.get(i).is_some_and(Option::is_some));
    }

    fn set_mvp(&mut self, mvp: &Mat4) {
        self.current_mvp = *mvp;
    }

    fn draw_indexed(&mut self, index_count: u32) {
        let (Some(program), Some(geometry), Some(texture)) =
            (self.current_program, self.current_geometry, self.current_texture)
        else {
            log::debug!("Draw dropped, incomplete bind state");
            return;
        };
        self.mvps.push(self.current_mvp);
        self.ops.push(DrawOp {
            program,
            geometry,
            texture,
            mvp_slot: (self.mvps.len() - 1) as u32,
            index_count,
        });
    }

    fn unbind_geometry(&mut self) {
        self.current_geometry = None;
    }
}
