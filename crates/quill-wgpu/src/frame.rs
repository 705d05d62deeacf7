use std::ops::Range;

use quill_render::{ScissorRect, TextureId, Vertex};

use crate::GpuVertex;

/// One indexed draw with the state it was recorded under.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawCommand {
    pub texture: Option<TextureId>,
    pub scissor: ScissorRect,
    pub indices: Range<u32>,
    pub base_vertex: i32,
}

/// Collects a frame's batches into shared vertex/index arenas.
///
/// The painter uploads a batch and draws it right away, but a wgpu render pass
/// only runs once the frame is encoded. Each flush is therefore appended to the
/// arenas and remembered as a [`DrawCommand`], and the commands are replayed in
/// order when the frame is encoded.
#[derive(Debug, Default)]
pub struct FrameRecorder {
    canvas: [u32; 2],
    texture: Option<TextureId>,
    scissor: ScissorRect,
    offset: [i32; 2],

    staged_vertices: Vec<GpuVertex>,
    staged_indices: Vec<u32>,

    vertices: Vec<GpuVertex>,
    indices: Vec<u32>,
    draws: Vec<DrawCommand>,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything recorded for the previous frame.
    pub fn begin(&mut self, canvas: [u32; 2]) {
        self.canvas = canvas;
        self.texture = None;
        self.scissor = ScissorRect {
            x: 0,
            y: 0,
            width: canvas[0],
            height: canvas[1],
        };
        self.offset = [0, 0];
        self.staged_vertices.clear();
        self.staged_indices.clear();
        self.vertices.clear();
        self.indices.clear();
        self.draws.clear();
    }

    pub fn bind_texture(&mut self, texture: TextureId) {
        self.texture = Some(texture);
    }

    pub fn set_scissor(&mut self, scissor: ScissorRect) {
        self.scissor = scissor;
    }

    pub fn set_offset(&mut self, offset: [i32; 2]) {
        self.offset = offset;
    }

    pub fn stage_vertices(&mut self, vertices: &[Vertex]) {
        let offset = self.offset;
        self.staged_vertices.clear();
        self.staged_vertices
            .extend(vertices.iter().map(|&v| GpuVertex::translated(v, offset)));
    }

    pub fn stage_indices(&mut self, indices: &[u32]) {
        self.staged_indices.clear();
        self.staged_indices.extend_from_slice(indices);
    }

    /// Move the staged batch into the frame arenas as one draw of `count` indices.
    pub fn draw(&mut self, count: u32) {
        let count = (count as usize).min(self.staged_indices.len());
        if count == 0 {
            return;
        }

        let base_vertex = self.vertices.len() as i32;
        let start = self.indices.len() as u32;
        self.vertices.extend_from_slice(&self.staged_vertices);
        self.indices
            .extend_from_slice(&self.staged_indices[..count]);

        self.draws.push(DrawCommand {
            texture: self.texture,
            scissor: self.scissor,
            indices: start..start + count as u32,
            base_vertex,
        });
    }

    pub fn canvas(&self) -> [u32; 2] {
        self.canvas
    }

    pub fn vertices(&self) -> &[GpuVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn draws(&self) -> &[DrawCommand] {
        &self.draws
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(x: f32) -> [Vertex; 4] {
        let c = [1.0; 4];
        [
            Vertex::new([x, 0.0], [0.0; 2], c),
            Vertex::new([x + 1.0, 0.0], [0.0; 2], c),
            Vertex::new([x, 1.0], [0.0; 2], c),
            Vertex::new([x + 1.0, 1.0], [0.0; 2], c),
        ]
    }

    const QUAD_INDICES: [u32; 6] = [0, 1, 2, 1, 2, 3];

    #[test]
    fn test_batches_share_arenas_in_order() {
        let mut frame = FrameRecorder::new();
        frame.begin([64, 32]);

        frame.bind_texture(TextureId(0));
        frame.stage_vertices(&quad(0.0));
        frame.stage_indices(&QUAD_INDICES);
        frame.draw(6);

        let clip = ScissorRect {
            x: 4,
            y: 4,
            width: 8,
            height: 8,
        };
        frame.bind_texture(TextureId(1));
        frame.set_scissor(clip);
        frame.set_offset([10, 20]);
        frame.stage_vertices(&quad(5.0));
        frame.stage_indices(&QUAD_INDICES);
        frame.draw(6);

        let draws = frame.draws();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].texture, Some(TextureId(0)));
        assert_eq!(draws[0].indices, 0..6);
        assert_eq!(draws[0].base_vertex, 0);
        assert_eq!(draws[0].scissor.width, 64);

        assert_eq!(draws[1].texture, Some(TextureId(1)));
        assert_eq!(draws[1].indices, 6..12);
        assert_eq!(draws[1].base_vertex, 4);
        assert_eq!(draws[1].scissor, clip);

        // Offset applied to the second batch only
        assert_eq!(frame.vertices()[0].pos, [0.0, 0.0]);
        assert_eq!(frame.vertices()[4].pos, [15.0, 20.0]);
        assert_eq!(frame.indices().len(), 12);
    }

    #[test]
    fn test_empty_draw_is_skipped() {
        let mut frame = FrameRecorder::new();
        frame.begin([8, 8]);
        frame.draw(6);
        frame.stage_vertices(&quad(0.0));
        frame.stage_indices(&QUAD_INDICES);
        frame.draw(0);
        assert!(frame.draws().is_empty());
    }

    #[test]
    fn test_begin_forgets_previous_frame() {
        let mut frame = FrameRecorder::new();
        frame.begin([8, 8]);
        frame.set_offset([3, 3]);
        frame.stage_vertices(&quad(0.0));
        frame.stage_indices(&QUAD_INDICES);
        frame.draw(6);

        frame.begin([16, 16]);
        assert!(frame.draws().is_empty());
        assert!(frame.vertices().is_empty());
        assert_eq!(frame.canvas(), [16, 16]);

        frame.stage_vertices(&quad(0.0));
        assert_eq!(frame.staged_vertices[0].pos, [0.0, 0.0]);
    }
}
