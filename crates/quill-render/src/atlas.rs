//! Glyph atlas: one square RGBA texture shared by every cached glyph.
//!
//! Placement uses a skyline shelf packer:
//! - glyphs are placed left to right on the current shelf
//! - when a glyph does not fit the remaining width, a new shelf starts at the
//!   skyline, the lowest row not yet touched by any glyph
//! - nothing is ever removed, so a full atlas stays full
//!
//! Coverage is written into the alpha channel of an otherwise white bitmap.
//! The bitmap is kept on the CPU and pushed to the GPU in one piece by
//! [`GlyphAtlas::upload`] when it has changed.

use glam::{UVec2, Vec2};

use crate::{RenderBackend, TextureId};

/// Rectangle in atlas pixel coordinates (top-left origin).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AtlasRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl AtlasRect {
    #[inline]
    pub const fn max_x(self) -> u32 {
        self.x + self.width
    }

    #[inline]
    pub const fn max_y(self) -> u32 {
        self.y + self.height
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn intersects(self, other: Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.max_x()
            && other.x < self.max_x()
            && self.y < other.max_y()
            && other.y < self.max_y()
    }
}

/// Normalized texture coordinates of a glyph's four corners.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct GlyphCoords {
    pub tl: Vec2,
    pub tr: Vec2,
    pub bl: Vec2,
    pub br: Vec2,
}

/// A glyph bitmap stored in the atlas.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PlacedGlyph {
    pub rect: AtlasRect,
    pub coords: GlyphCoords,
}

pub struct GlyphAtlas {
    size: u32,
    pixels: Vec<u8>,
    texture: TextureId,
    cursor: UVec2,
    skyline: u32,
    dirty: bool,
}

impl GlyphAtlas {
    /// Create the atlas and its texture.
    ///
    /// The side is `max_size` or the backend's texture limit, whichever is smaller.
    pub fn new<B: RenderBackend + ?Sized>(backend: &mut B, max_size: u32) -> Self {
        let size = max_size.min(backend.max_texture_size()).max(1);

        // White, fully transparent
        let pixels = [0xFF, 0xFF, 0xFF, 0x00].repeat(size as usize * size as usize);
        let texture = backend.create_texture([size, size], &pixels);

        log::debug!("Created {size}x{size} glyph atlas");

        Self {
            size,
            pixels,
            texture,
            cursor: UVec2::ZERO,
            skyline: 0,
            dirty: false,
        }
    }

    /// Side length in pixels.
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    pub fn texture(&self) -> TextureId {
        self.texture
    }

    /// Next free position on the current shelf.
    #[inline]
    pub fn cursor(&self) -> UVec2 {
        self.cursor
    }

    /// Lowest row not yet used by any shelf.
    #[inline]
    pub fn skyline(&self) -> u32 {
        self.skyline
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// RGBA bitmap, row-major, `size * size * 4` bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Reserve `size` pixels and copy `coverage` (row-major, one byte per
    /// pixel) into them. Returns `None` when the atlas has no room left.
    ///
    /// Zero-area bitmaps always succeed without consuming space.
    pub fn place(&mut self, size: [u32; 2], coverage: &[u8]) -> Option<PlacedGlyph> {
        let [width, height] = size;

        if width == 0 || height == 0 {
            let rect = AtlasRect {
                x: self.cursor.x,
                y: self.cursor.y,
                width: 0,
                height: 0,
            };
            return Some(self.placed(rect));
        }

        if width > self.size || height > self.size {
            return None;
        }

        if self.size - self.cursor.x < width {
            if self.size - self.cursor.y < height || self.size - self.skyline < height {
                return None;
            }
            self.cursor = UVec2::new(0, self.skyline);
        } else if self.size - self.cursor.y < height {
            // A new shelf would start even lower
            return None;
        }

        let rect = AtlasRect {
            x: self.cursor.x,
            y: self.cursor.y,
            width,
            height,
        };
        self.blit(rect, coverage);

        self.skyline = self.skyline.max(rect.max_y());
        self.cursor.x += width;
        self.dirty = true;

        Some(self.placed(rect))
    }

    /// Push the bitmap to the GPU if it changed since the last upload.
    ///
    /// Returns whether an upload happened.
    pub fn upload<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> bool {
        if !self.dirty {
            return false;
        }

        backend.update_texture(self.texture, &self.pixels);
        self.dirty = false;
        true
    }

    fn blit(&mut self, rect: AtlasRect, coverage: &[u8]) {
        let stride = self.size as usize * 4;
        let width = rect.width as usize;

        for (row, src) in coverage
            .chunks(width)
            .take(rect.height as usize)
            .enumerate()
        {
            let start = (rect.y as usize + row) * stride + rect.x as usize * 4;
            let dst = &mut self.pixels[start..start + width * 4];
            for (pixel, &alpha) in dst.chunks_exact_mut(4).zip(src) {
                pixel[3] = alpha;
            }
        }
    }

    fn placed(&self, rect: AtlasRect) -> PlacedGlyph {
        let ratio = 1.0 / self.size as f32;
        let a = Vec2::new(rect.x as f32, rect.y as f32) * ratio;
        let b = Vec2::new(rect.max_x() as f32, rect.max_y() as f32) * ratio;

        PlacedGlyph {
            rect,
            coords: GlyphCoords {
                tl: a,
                tr: Vec2::new(b.x, a.y),
                bl: Vec2::new(a.x, b.y),
                br: b,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GpuCommand, HeadlessBackend};

    fn atlas(size: u32) -> (HeadlessBackend, GlyphAtlas) {
        let mut backend = HeadlessBackend::new();
        let atlas = GlyphAtlas::new(&mut backend, size);
        (backend, atlas)
    }

    fn solid(size: [u32; 2], value: u8) -> Vec<u8> {
        vec![value; (size[0] * size[1]) as usize]
    }

    fn place_sequence(atlas: &mut GlyphAtlas, sizes: &[[u32; 2]]) -> Vec<Option<AtlasRect>> {
        sizes
            .iter()
            .map(|&s| atlas.place(s, &solid(s, 0xFF)).map(|p| p.rect))
            .collect()
    }

    /// Deterministic pseudo-random glyph sizes.
    fn glyph_sizes(count: usize) -> Vec<[u32; 2]> {
        let mut state: u32 = 0x2545_f491;
        (0..count)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                [1 + state % 23, 1 + (state >> 8) % 29]
            })
            .collect()
    }

    #[test]
    fn test_size_is_capped_by_backend() {
        let mut backend = HeadlessBackend::with_max_texture_size(128);
        let atlas = GlyphAtlas::new(&mut backend, 512);
        assert_eq!(atlas.size(), 128);
        assert_eq!(
            backend.commands()[0],
            GpuCommand::CreateTexture {
                texture: atlas.texture(),
                size: [128, 128]
            }
        );
    }

    #[test]
    fn test_starts_white_and_transparent() {
        let (backend, atlas) = atlas(16);
        assert!(atlas.pixels().chunks(4).all(|p| p == [0xFF, 0xFF, 0xFF, 0x00]));
        let texture = backend.texture(atlas.texture()).unwrap();
        assert_eq!(texture.rgba, atlas.pixels());
        assert!(!atlas.is_dirty());
    }

    #[test]
    fn test_placements_never_overlap_and_stay_in_bounds() {
        let (_backend, mut atlas) = atlas(128);
        let placed: Vec<AtlasRect> = place_sequence(&mut atlas, &glyph_sizes(200))
            .into_iter()
            .flatten()
            .collect();

        assert!(placed.len() > 10);
        for (i, a) in placed.iter().enumerate() {
            assert!(a.max_x() <= atlas.size() && a.max_y() <= atlas.size());
            for b in &placed[i + 1..] {
                assert!(!a.intersects(*b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn test_packing_is_deterministic() {
        let sizes = glyph_sizes(120);
        let (_b1, mut first) = atlas(128);
        let (_b2, mut second) = atlas(128);
        assert_eq!(
            place_sequence(&mut first, &sizes),
            place_sequence(&mut second, &sizes)
        );
    }

    #[test]
    fn test_larger_than_atlas_fails() {
        let (_backend, mut atlas) = atlas(32);
        assert!(atlas.place([33, 1], &solid([33, 1], 1)).is_none());
        assert!(atlas.place([1, 33], &solid([1, 33], 1)).is_none());
        assert!(!atlas.is_dirty());
    }

    #[test]
    fn test_exactly_full_shelf_then_new_shelf() {
        let (_backend, mut atlas) = atlas(32);
        for _ in 0..4 {
            assert!(atlas.place([8, 5], &solid([8, 5], 9)).is_some());
        }
        assert_eq!(atlas.cursor(), UVec2::new(32, 0));
        assert_eq!(atlas.skyline(), 5);

        let next = atlas.place([3, 2], &solid([3, 2], 9)).unwrap();
        assert_eq!((next.rect.x, next.rect.y), (0, 5));
        assert_eq!(atlas.cursor(), UVec2::new(3, 5));
    }

    #[test]
    fn test_skyline_follows_tallest_glyph_on_shelf() {
        let (_backend, mut atlas) = atlas(32);
        atlas.place([10, 4], &solid([10, 4], 1)).unwrap();
        atlas.place([10, 12], &solid([10, 12], 1)).unwrap();
        atlas.place([10, 2], &solid([10, 2], 1)).unwrap();
        assert_eq!(atlas.skyline(), 12);

        let next = atlas.place([5, 5], &solid([5, 5], 1)).unwrap();
        assert_eq!((next.rect.x, next.rect.y), (0, 12));
    }

    #[test]
    fn test_full_atlas_rejects_until_something_fits() {
        let (_backend, mut atlas) = atlas(16);
        atlas.place([16, 10], &solid([16, 10], 1)).unwrap();
        // Needs a new shelf, only 6 rows remain
        assert!(atlas.place([4, 7], &solid([4, 7], 1)).is_none());
        assert_eq!(atlas.cursor(), UVec2::new(16, 0));
        // Still fits on a new shelf
        let p = atlas.place([4, 6], &solid([4, 6], 1)).unwrap();
        assert_eq!((p.rect.x, p.rect.y), (0, 10));
    }

    #[test]
    fn test_tall_glyph_on_low_shelf_fails() {
        let (_backend, mut atlas) = atlas(16);
        atlas.place([16, 10], &solid([16, 10], 1)).unwrap();
        atlas.place([4, 4], &solid([4, 4], 1)).unwrap();
        // Fits horizontally on the shelf at y=10 but would run past the bottom
        assert!(atlas.place([4, 8], &solid([4, 8], 1)).is_none());
    }

    #[test]
    fn test_zero_area_consumes_nothing() {
        let (_backend, mut atlas) = atlas(16);
        atlas.place([3, 3], &solid([3, 3], 1)).unwrap();
        let empty = atlas.place([0, 12], &[]).unwrap();
        assert!(empty.rect.is_empty());
        assert_eq!(atlas.cursor(), UVec2::new(3, 0));
        assert_eq!(atlas.skyline(), 3);
    }

    #[test]
    fn test_coverage_goes_to_alpha_and_uvs_match() {
        let (_backend, mut atlas) = atlas(8);
        atlas.place([2, 1], &[1, 2]).unwrap();
        let p = atlas.place([2, 2], &[10, 20, 30, 40]).unwrap();

        assert_eq!(p.rect, AtlasRect { x: 2, y: 0, width: 2, height: 2 });
        assert_eq!(p.coords.tl, Vec2::new(0.25, 0.0));
        assert_eq!(p.coords.tr, Vec2::new(0.5, 0.0));
        assert_eq!(p.coords.bl, Vec2::new(0.25, 0.25));
        assert_eq!(p.coords.br, Vec2::new(0.5, 0.25));

        let px = |x: usize, y: usize| &atlas.pixels()[(y * 8 + x) * 4..(y * 8 + x) * 4 + 4];
        assert_eq!(px(0, 0), [0xFF, 0xFF, 0xFF, 1]);
        assert_eq!(px(2, 0), [0xFF, 0xFF, 0xFF, 10]);
        assert_eq!(px(3, 0), [0xFF, 0xFF, 0xFF, 20]);
        assert_eq!(px(2, 1), [0xFF, 0xFF, 0xFF, 30]);
        assert_eq!(px(3, 1), [0xFF, 0xFF, 0xFF, 40]);
        assert_eq!(px(4, 0), [0xFF, 0xFF, 0xFF, 0]);
    }

    #[test]
    fn test_upload_only_when_dirty() {
        let (mut backend, mut atlas) = atlas(8);
        assert!(!atlas.upload(&mut backend));

        atlas.place([1, 1], &[7]).unwrap();
        assert!(atlas.is_dirty());
        assert!(atlas.upload(&mut backend));
        assert!(!atlas.is_dirty());
        assert!(!atlas.upload(&mut backend));

        let texture = backend.texture(atlas.texture()).unwrap();
        assert_eq!(texture.updates, 1);
        assert_eq!(texture.rgba[3], 7);
    }
}
