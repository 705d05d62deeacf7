//! A backend that records instead of rendering.
//!
//! Every call is appended to a command log, and each `draw_indexed` is resolved
//! against the current texture, scissor, offset and buffer contents into a
//! [`DrawCall`]. Useful for tests and for inspecting what a frame would submit.

use crate::{BufferUpload, RenderBackend, ScissorRect, TextureId, Vertex};

const DEFAULT_MAX_TEXTURE_SIZE: u32 = 8192;

/// One recorded backend call.
#[derive(Clone, Debug, PartialEq)]
pub enum GpuCommand {
    CreateTexture { texture: TextureId, size: [u32; 2] },
    UpdateTexture { texture: TextureId },
    BindTexture(TextureId),
    BeginFrame([u32; 2]),
    EndFrame,
    SetScissor(ScissorRect),
    SetOffset([i32; 2]),
    UploadVertices { count: usize, upload: BufferUpload },
    UploadIndices { count: usize, upload: BufferUpload },
    DrawIndexed { count: u32 },
}

/// A draw with the state it was issued under.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawCall {
    pub texture: Option<TextureId>,
    pub scissor: ScissorRect,
    pub offset: [i32; 2],
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

#[derive(Clone, Debug)]
pub struct HeadlessTexture {
    pub size: [u32; 2],
    pub rgba: Vec<u8>,
    pub updates: usize,
}

#[derive(Clone, Debug)]
pub struct HeadlessBackend {
    max_texture_size: u32,
    textures: Vec<HeadlessTexture>,
    commands: Vec<GpuCommand>,
    draws: Vec<DrawCall>,

    bound: Option<TextureId>,
    scissor: ScissorRect,
    offset: [i32; 2],
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::with_max_texture_size(DEFAULT_MAX_TEXTURE_SIZE)
    }

    /// Report `max_texture_size` as the device limit.
    pub fn with_max_texture_size(max_texture_size: u32) -> Self {
        Self {
            max_texture_size,
            textures: Vec::new(),
            commands: Vec::new(),
            draws: Vec::new(),
            bound: None,
            scissor: ScissorRect::default(),
            offset: [0, 0],
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[GpuCommand] {
        &self.commands
    }

    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    pub fn texture(&self, texture: TextureId) -> Option<&HeadlessTexture> {
        self.textures.get(texture.0 as usize)
    }

    /// Forget recorded commands and draws. Textures are kept.
    pub fn clear_log(&mut self) {
        self.commands.clear();
        self.draws.clear();
    }
}

impl RenderBackend for HeadlessBackend {
    fn max_texture_size(&self) -> u32 {
        self.max_texture_size
    }

    fn create_texture(&mut self, size: [u32; 2], rgba: &[u8]) -> TextureId {
        let texture = TextureId(self.textures.len() as u32);
        self.textures.push(HeadlessTexture {
            size,
            rgba: rgba.to_vec(),
            updates: 0,
        });
        self.commands
            .push(GpuCommand::CreateTexture { texture, size });
        texture
    }

    fn update_texture(&mut self, texture: TextureId, rgba: &[u8]) {
        if let Some(t) = self.textures.get_mut(texture.0 as usize) {
            t.rgba.clear();
            t.rgba.extend_from_slice(rgba);
            t.updates += 1;
        }
        self.commands.push(GpuCommand::UpdateTexture { texture });
    }

    fn bind_texture(&mut self, texture: TextureId) {
        self.bound = Some(texture);
        self.commands.push(GpuCommand::BindTexture(texture));
    }

    fn begin_frame(&mut self, canvas: [u32; 2]) {
        self.scissor = ScissorRect {
            x: 0,
            y: 0,
            width: canvas[0],
            height: canvas[1],
        };
        self.offset = [0, 0];
        self.commands.push(GpuCommand::BeginFrame(canvas));
    }

    fn end_frame(&mut self) {
        self.commands.push(GpuCommand::EndFrame);
    }

    fn set_scissor(&mut self, scissor: ScissorRect) {
        self.scissor = scissor;
        self.commands.push(GpuCommand::SetScissor(scissor));
    }

    fn set_offset(&mut self, offset: [i32; 2]) {
        self.offset = offset;
        self.commands.push(GpuCommand::SetOffset(offset));
    }

    fn upload_vertices(&mut self, vertices: &[Vertex], upload: BufferUpload) {
        self.vertices.clear();
        self.vertices.extend_from_slice(vertices);
        self.commands.push(GpuCommand::UploadVertices {
            count: vertices.len(),
            upload,
        });
    }

    fn upload_indices(&mut self, indices: &[u32], upload: BufferUpload) {
        self.indices.clear();
        self.indices.extend_from_slice(indices);
        self.commands.push(GpuCommand::UploadIndices {
            count: indices.len(),
            upload,
        });
    }

    fn draw_indexed(&mut self, index_count: u32) {
        let count = (index_count as usize).min(self.indices.len());
        self.draws.push(DrawCall {
            texture: self.bound,
            scissor: self.scissor,
            offset: self.offset,
            vertices: self.vertices.clone(),
            indices: self.indices[..count].to_vec(),
        });
        self.commands
            .push(GpuCommand::DrawIndexed { count: index_count });
    }
}
