use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use quill::Color;

/// Vertex format shared by shapes and glyph quads.
///
/// Positions are canvas pixels with integer values on pixel centres. UVs are
/// normalized texture coordinates; shapes sample the 1x1 white texture so
/// their UVs are irrelevant. Color is linear RGBA in `[0, 1]`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(pos: [f32; 2], uv: [f32; 2], color: [f32; 4]) -> Self {
        Self { pos, uv, color }
    }

    #[inline]
    pub fn at(pos: Vec2, uv: Vec2, color: Color) -> Self {
        Self::new(pos.to_array(), uv.to_array(), color.to_array())
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        Vec2::from_array(self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 8 * std::mem::size_of::<f32>());
        let v = Vertex::new([1.0, 2.0], [0.5, 0.25], [1.0, 0.0, 0.0, 1.0]);
        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&v));
        assert_eq!(floats, &[1.0, 2.0, 0.5, 0.25, 1.0, 0.0, 0.0, 1.0]);
    }
}
