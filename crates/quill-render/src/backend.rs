//! The GPU seam.
//!
//! The painter decides *when* textures are bound, buffers uploaded and draws
//! issued; a backend decides *how*. Calls arrive strictly in the order the
//! painter makes them and a backend must preserve that order on the GPU.

use quill::IRect;

use crate::Vertex;

/// Backend assigned texture handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Scissor rectangle in framebuffer pixels, top-left origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScissorRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ScissorRect {
    /// Convert an inclusive clip rectangle, clamped to the canvas.
    ///
    /// Empty clips give a zero-sized scissor; draws under it produce nothing.
    pub fn from_clip(clip: IRect, canvas: [u32; 2]) -> Self {
        let clip = clip.intersect(IRect::from_size(canvas[0], canvas[1]));
        let [width, height] = clip.size();
        if width == 0 || height == 0 {
            return Self::default();
        }

        Self {
            x: clip.min.x as u32,
            y: clip.min.y as u32,
            width,
            height,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// How a buffer upload relates to the backend's current allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferUpload {
    /// The data outgrew the allocation: reallocate to exactly this size.
    Reallocate,
    /// The data fits: overwrite from the start.
    Update,
}

pub trait RenderBackend {
    /// Largest supported square texture side.
    fn max_texture_size(&self) -> u32;

    /// Create an RGBA8 texture initialised with `rgba` (`width * height * 4` bytes).
    fn create_texture(&mut self, size: [u32; 2], rgba: &[u8]) -> TextureId;

    /// Replace the full contents of `texture`.
    fn update_texture(&mut self, texture: TextureId, rgba: &[u8]);

    /// Texture sampled by subsequent draws.
    fn bind_texture(&mut self, texture: TextureId);

    fn begin_frame(&mut self, canvas: [u32; 2]);

    fn end_frame(&mut self);

    fn set_scissor(&mut self, scissor: ScissorRect);

    /// Translation in pixels added to every vertex of subsequent draws.
    fn set_offset(&mut self, offset: [i32; 2]);

    fn upload_vertices(&mut self, vertices: &[Vertex], upload: BufferUpload);

    fn upload_indices(&mut self, indices: &[u32], upload: BufferUpload);

    /// Draw `index_count` indices of the uploaded buffers as a triangle list.
    fn draw_indexed(&mut self, index_count: u32);
}

impl<B: RenderBackend + ?Sized> RenderBackend for &mut B {
    fn max_texture_size(&self) -> u32 {
        (**self).max_texture_size()
    }

    fn create_texture(&mut self, size: [u32; 2], rgba: &[u8]) -> TextureId {
        (**self).create_texture(size, rgba)
    }

    fn update_texture(&mut self, texture: TextureId, rgba: &[u8]) {
        (**self).update_texture(texture, rgba)
    }

    fn bind_texture(&mut self, texture: TextureId) {
        (**self).bind_texture(texture)
    }

    fn begin_frame(&mut self, canvas: [u32; 2]) {
        (**self).begin_frame(canvas)
    }

    fn end_frame(&mut self) {
        (**self).end_frame()
    }

    fn set_scissor(&mut self, scissor: ScissorRect) {
        (**self).set_scissor(scissor)
    }

    fn set_offset(&mut self, offset: [i32; 2]) {
        (**self).set_offset(offset)
    }

    fn upload_vertices(&mut self, vertices: &[Vertex], upload: BufferUpload) {
        (**self).upload_vertices(vertices, upload)
    }

    fn upload_indices(&mut self, indices: &[u32], upload: BufferUpload) {
        (**self).upload_indices(indices, upload)
    }

    fn draw_indexed(&mut self, index_count: u32) {
        (**self).draw_indexed(index_count)
    }
}
