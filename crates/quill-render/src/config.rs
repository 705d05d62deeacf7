/// Painter tuning knobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PainterConfig {
    /// Upper bound for the glyph atlas side, further capped by the backend.
    pub atlas_max_size: u32,
    /// Segments per corner of rounded rectangles.
    pub corner_segments: u32,
}

impl Default for PainterConfig {
    fn default() -> Self {
        Self {
            atlas_max_size: 512,
            corner_segments: 8,
        }
    }
}

impl PainterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_atlas_max_size(mut self, size: u32) -> Self {
        self.atlas_max_size = size;
        self
    }

    pub fn with_corner_segments(mut self, segments: u32) -> Self {
        self.corner_segments = segments.max(1);
        self
    }
}
