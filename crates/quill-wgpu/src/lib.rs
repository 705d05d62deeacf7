//! # quill-wgpu
//!
//! WGPU rendering backend for the quill painter.
//!
//! The painter drives [`WgpuBackend`] through [`RenderBackend`] while a frame
//! is recorded; [`WgpuBackend::encode`] then replays the recorded draws into
//! one render pass on the caller's encoder.

mod frame;
mod vertex;

pub use frame::*;
pub use vertex::*;

pub use quill_render;

use quill_render::{BufferUpload, RenderBackend, ScissorRect, TextureId, Vertex};

const INITIAL_VERTEX_CAPACITY: usize = 1024;
const INITIAL_INDEX_CAPACITY: usize = 2048;

struct GpuTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    size: [u32; 2],
}

/// WGPU implementation of [`RenderBackend`].
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,

    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    textures: Vec<GpuTexture>,

    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    vertex_capacity: usize,
    index_capacity: usize,

    frame: FrameRecorder,
}

impl WgpuBackend {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Quill Painter Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/painter.wgsl").into()),
        });

        // Canvas size in pixels
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Quill Uniform Buffer"),
            size: std::mem::size_of::<[f32; 2]>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let globals_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Quill Globals Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Quill Globals Bind Group"),
            layout: &globals_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Quill Texture Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
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

        // Glyphs are placed on whole pixels, sample them unfiltered
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Quill Texture Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Quill Pipeline Layout"),
            bind_group_layouts: &[&globals_bind_group_layout, &texture_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Quill Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[GpuVertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
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
            multiview: None,
            cache: None,
        });

        let vertex_buffer = create_vertex_buffer(device, INITIAL_VERTEX_CAPACITY);
        let index_buffer = create_index_buffer(device, INITIAL_INDEX_CAPACITY);

        Self {
            device: device.clone(),
            queue: queue.clone(),
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            texture_bind_group_layout,
            sampler,
            textures: Vec::new(),
            vertex_buffer,
            index_buffer,
            vertex_capacity: INITIAL_VERTEX_CAPACITY,
            index_capacity: INITIAL_INDEX_CAPACITY,
            frame: FrameRecorder::new(),
        }
    }

    /// Draws recorded since the last `begin_frame`.
    pub fn frame(&self) -> &FrameRecorder {
        &self.frame
    }

    /// Replay the recorded frame into a single render pass drawing over `target`.
    ///
    /// Texture contents are written through the queue, so every texture update
    /// of the frame is visible to all of its draws. The glyph atlas only ever
    /// gains glyphs, which keeps earlier draws correct.
    pub fn encode(&mut self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let vertices = self.frame.vertices();
        let indices = self.frame.indices();
        if self.frame.draws().is_empty() {
            return;
        }

        // Grow (never shrink) to exactly what the frame needs
        if vertices.len() > self.vertex_capacity {
            self.vertex_capacity = vertices.len();
            self.vertex_buffer = create_vertex_buffer(&self.device, self.vertex_capacity);
        }
        if indices.len() > self.index_capacity {
            self.index_capacity = indices.len();
            self.index_buffer = create_index_buffer(&self.device, self.index_capacity);
        }

        self.queue
            .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(vertices));
        self.queue
            .write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(indices));

        let canvas = self.frame.canvas();
        let uniforms = [canvas[0] as f32, canvas[1] as f32];
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&uniforms));

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Quill Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

        for draw in self.frame.draws() {
            if draw.scissor.is_empty() {
                continue;
            }

            let Some(texture) = draw.texture.and_then(|id| self.textures.get(id.0 as usize))
            else {
                log::warn!("Skipped draw without a valid texture: {:?}", draw.texture);
                continue;
            };

            let ScissorRect {
                x,
                y,
                width,
                height,
            } = draw.scissor;
            render_pass.set_scissor_rect(x, y, width, height);
            render_pass.set_bind_group(1, &texture.bind_group, &[]);
            render_pass.draw_indexed(draw.indices.clone(), draw.base_vertex, 0..1);
        }
    }

    fn write_texture(&self, texture: &GpuTexture, rgba: &[u8]) {
        let [width, height] = texture.size;
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }
}

impl RenderBackend for WgpuBackend {
    fn max_texture_size(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    fn create_texture(&mut self, size: [u32; 2], rgba: &[u8]) -> TextureId {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Quill Texture"),
            size: wgpu::Extent3d {
                width: size[0],
                height: size[1],
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Quill Texture Bind Group"),
            layout: &self.texture_bind_group_layout,
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

        let texture = GpuTexture {
            texture,
            bind_group,
            size,
        };
        self.write_texture(&texture, rgba);
        self.textures.push(texture);

        let id = TextureId(self.textures.len() as u32 - 1);
        log::debug!("Created {}x{} texture {id:?}", size[0], size[1]);
        id
    }

    fn update_texture(&mut self, texture: TextureId, rgba: &[u8]) {
        match self.textures.get(texture.0 as usize) {
            Some(gpu_texture) => self.write_texture(gpu_texture, rgba),
            None => log::warn!("Ignored update of unknown texture {texture:?}"),
        }
    }

    fn bind_texture(&mut self, texture: TextureId) {
        self.frame.bind_texture(texture);
    }

    fn begin_frame(&mut self, canvas_size: [u32; 2]) {
        self.frame.begin(canvas_size);
    }

    fn end_frame(&mut self) {
        log::trace!(
            "Recorded {} draws, {} vertices, {} indices",
            self.frame.draws().len(),
            self.frame.vertices().len(),
            self.frame.indices().len()
        );
    }

    fn set_scissor(&mut self, scissor: ScissorRect) {
        self.frame.set_scissor(scissor);
    }

    fn set_offset(&mut self, offset: [i32; 2]) {
        self.frame.set_offset(offset);
    }

    // Uploads land in the frame arenas; GPU buffers are sized once per frame in `encode`
    fn upload_vertices(&mut self, vertices: &[Vertex], _upload: BufferUpload) {
        self.frame.stage_vertices(vertices);
    }

    fn upload_indices(&mut self, indices: &[u32], _upload: BufferUpload) {
        self.frame.stage_indices(indices);
    }

    fn draw_indexed(&mut self, index_count: u32) {
        self.frame.draw(index_count);
    }
}

fn create_vertex_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Quill Vertex Buffer"),
        size: (capacity * std::mem::size_of::<GpuVertex>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Quill Index Buffer"),
        size: (capacity * std::mem::size_of::<u32>()) as u64,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
