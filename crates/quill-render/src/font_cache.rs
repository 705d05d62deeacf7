//! Font files, sized font records and their glyph caches.
//!
//! - Font files are registered by their "<family> <style>" name.
//! - A record is created the first time a (name, size) pair is used and lives
//!   as long as the cache. It owns a sized face and its glyph table.
//! - Glyphs are keyed by codepoint and one of four horizontal sub-pixel phases.
//!   A miss renders the glyph and places it in the shared atlas.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use glam::Vec2;
use quill::{Font, FontSlot};
use quill_text::{F26Dot6, FontFace, Rasterizer};

use crate::{GlyphAtlas, GlyphCoords, RenderBackend, RenderError, Result, TextureId};

/// Number of horizontal sub-pixel positions glyphs are rendered at.
pub const SUBPIXEL_PHASES: u8 = 4;

static NEXT_CACHE_ID: AtomicU32 = AtomicU32::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlyphKey {
    pub codepoint: u32,
    /// Horizontal shift in quarter pixels, `0..4`.
    pub phase: u8,
}

impl GlyphKey {
    pub fn new(codepoint: u32, phase: u8) -> Self {
        Self {
            codepoint,
            phase: phase % SUBPIXEL_PHASES,
        }
    }
}

/// Everything needed to draw a cached glyph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphEntry {
    /// Bitmap size in pixels.
    pub size: Vec2,
    /// Bearing: `x` from pen to left edge, `y` from baseline up to top edge.
    pub offset: Vec2,
    pub coords: GlyphCoords,
    pub texture: TextureId,
    /// Pen advance in fractional pixels.
    pub advance: f32,
    /// Reserved for eviction; not maintained.
    pub ref_count: u32,
}

/// Vertical metrics in pixels. `descender` is negative.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FontMetrics {
    pub ascender: f32,
    pub descender: f32,
}

struct FontRecord {
    face: Box<dyn FontFace>,
    metrics: FontMetrics,
    glyphs: HashMap<GlyphKey, GlyphEntry>,
    /// Glyphs that did not fit in the atlas. Never rendered again.
    dropped: HashSet<GlyphKey>,
}

pub struct FontCache {
    id: u32,
    rasterizer: Box<dyn Rasterizer>,
    files: HashMap<String, Arc<[u8]>>,
    records: Vec<FontRecord>,
    lookup: HashMap<(String, u32), u32>,
    atlas: GlyphAtlas,
}

impl FontCache {
    pub fn new<B, R>(backend: &mut B, rasterizer: R, atlas_max_size: u32) -> Self
    where
        B: RenderBackend + ?Sized,
        R: Rasterizer + 'static,
    {
        Self {
            id: NEXT_CACHE_ID.fetch_add(1, Ordering::Relaxed),
            rasterizer: Box::new(rasterizer),
            files: HashMap::new(),
            records: Vec::new(),
            lookup: HashMap::new(),
            atlas: GlyphAtlas::new(backend, atlas_max_size),
        }
    }

    /// Register a font file and return its "<family> <style>" name.
    ///
    /// Loading a second file with an already known name does nothing.
    pub fn load_font(&mut self, data: impl Into<Arc<[u8]>>) -> Result<String> {
        let data = data.into();
        let face = self.rasterizer.open_face(data.clone())?;
        let name = format!("{} {}", face.family_name(), face.style_name());

        if self.files.contains_key(&name) {
            return Ok(name);
        }

        log::debug!("Loaded font: '{name}'");
        self.files.insert(name.clone(), data);
        Ok(name)
    }

    /// Read a font file from disk and register it like [`FontCache::load_font`].
    pub fn load_font_file(&mut self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_font(data)
    }

    /// Names of every registered font file.
    pub fn loaded_fonts(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Resolve `font` to its record, creating the record on first use.
    ///
    /// The resolved slot is stored in `font`, making later lookups direct.
    pub fn prepare_font(&mut self, font: &mut Font) -> Result<FontSlot> {
        if let Some(slot) = font.slot() {
            if slot.cache == self.id && (slot.index as usize) < self.records.len() {
                return Ok(slot);
            }
        }

        let key = (font.name().to_string(), font.size());
        let index = match self.lookup.get(&key) {
            Some(&index) => index,
            None => self.admit_font(font)?,
        };

        let slot = FontSlot {
            cache: self.id,
            index,
        };
        font.set_slot(slot);
        Ok(slot)
    }

    pub fn font_metrics(&mut self, font: &mut Font) -> Result<FontMetrics> {
        let slot = self.prepare_font(font)?;
        Ok(self.records[slot.index as usize].metrics)
    }

    /// Fetch a glyph of `font` at sub-pixel `phase`, rendering it on a miss.
    ///
    /// Fails with [`RenderError::AtlasFull`] when the glyph cannot be placed.
    /// The failure is remembered: later requests for the same glyph fail the
    /// same way without rendering it or logging again.
    pub fn get_glyph(&mut self, font: &mut Font, codepoint: u32, phase: u8) -> Result<GlyphEntry> {
        let slot = self.prepare_font(font)?;
        let key = GlyphKey::new(codepoint, phase);

        let record = &mut self.records[slot.index as usize];
        if let Some(entry) = record.glyphs.get(&key) {
            return Ok(*entry);
        }
        if record.dropped.contains(&key) {
            return Err(self.atlas_full());
        }

        let x_offset = F26Dot6(key.phase as i32 * (64 / SUBPIXEL_PHASES as i32));
        let glyph = record.face.render_char(codepoint, x_offset);

        let Some(placed) = self.atlas.place([glyph.width, glyph.rows], &glyph.coverage) else {
            log::warn!(
                "Glyph atlas full, dropping U+{codepoint:04X} of '{}' at {}px",
                font.name(),
                font.size()
            );
            record.dropped.insert(key);
            return Err(self.atlas_full());
        };

        let entry = GlyphEntry {
            size: Vec2::new(glyph.width as f32, glyph.rows as f32),
            offset: Vec2::new(glyph.left as f32, glyph.top as f32),
            coords: placed.coords,
            texture: self.atlas.texture(),
            advance: glyph.linear_advance.to_f32(),
            ref_count: 0,
        };
        record.glyphs.insert(key, entry);
        Ok(entry)
    }

    /// Pair kerning in pixels, `[0, 0]` for faces without kerning data.
    pub fn kerning(&mut self, font: &mut Font, left: u32, right: u32) -> Result<[f32; 2]> {
        let slot = self.prepare_font(font)?;
        let [x, y] = self.records[slot.index as usize].face.kerning(left, right);
        Ok([x.to_f32(), y.to_f32()])
    }

    /// Number of cached glyphs across all records.
    pub fn glyph_count(&self) -> usize {
        self.records.iter().map(|r| r.glyphs.len()).sum()
    }

    pub fn atlas(&self) -> &GlyphAtlas {
        &self.atlas
    }

    pub fn atlas_mut(&mut self) -> &mut GlyphAtlas {
        &mut self.atlas
    }

    fn atlas_full(&self) -> RenderError {
        RenderError::AtlasFull {
            width: self.atlas.size(),
            height: self.atlas.size(),
        }
    }

    fn admit_font(&mut self, font: &Font) -> Result<u32> {
        let data = self
            .files
            .get(font.name())
            .cloned()
            .ok_or_else(|| RenderError::FontNotLoaded {
                name: font.name().to_string(),
                size: font.size(),
            })?;

        let mut face = self.rasterizer.open_face(data)?;
        face.set_pixel_size(font.size());

        let m = face.size_metrics();
        let metrics = FontMetrics {
            ascender: m.ascender.to_f32(),
            descender: m.descender.to_f32(),
        };

        let index = self.records.len() as u32;
        self.records.push(FontRecord {
            face,
            metrics,
            glyphs: HashMap::new(),
            dropped: HashSet::new(),
        });
        self.lookup
            .insert((font.name().to_string(), font.size()), index);

        log::debug!("Created font record '{}' at {}px", font.name(), font.size());
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, CountingRasterizer, FakeRasterizer, TEST_FAMILY};
    use crate::HeadlessBackend;

    fn cache_with(max_texture_size: u32) -> (HeadlessBackend, FontCache) {
        testing::init_logger();
        let mut backend = HeadlessBackend::with_max_texture_size(max_texture_size);
        let mut cache = FontCache::new(&mut backend, FakeRasterizer, 512);
        cache
            .load_font(testing::font_bytes(TEST_FAMILY, "Regular"))
            .unwrap();
        (backend, cache)
    }

    fn test_font(size: u32) -> Font {
        Font::new("Test Sans Regular", size)
    }

    #[test]
    fn test_load_font_reports_name_and_is_idempotent() {
        let (_backend, mut cache) = cache_with(512);
        let name = cache
            .load_font(testing::font_bytes(TEST_FAMILY, "Regular"))
            .unwrap();
        assert_eq!(name, "Test Sans Regular");
        assert_eq!(cache.loaded_fonts().count(), 1);

        cache
            .load_font(testing::font_bytes(TEST_FAMILY, "Bold"))
            .unwrap();
        let mut names: Vec<&str> = cache.loaded_fonts().collect();
        names.sort_unstable();
        assert_eq!(names, ["Test Sans Bold", "Test Sans Regular"]);
    }

    #[test]
    fn test_invalid_font_data_is_rejected() {
        let (_backend, mut cache) = cache_with(512);
        let err = cache.load_font(&b"garbage"[..]).unwrap_err();
        assert!(matches!(err, RenderError::Text(_)));
    }

    #[test]
    fn test_missing_font_file_is_io_error() {
        let (_backend, mut cache) = cache_with(512);
        let err = cache
            .load_font_file("/nonexistent/quill/font.ttf")
            .unwrap_err();
        assert!(matches!(err, RenderError::Io { .. }));
    }

    #[test]
    fn test_unknown_font_fails_at_first_use() {
        let (_backend, mut cache) = cache_with(512);
        let mut font = Font::new("Missing Serif Italic", 12);
        let err = cache.prepare_font(&mut font).unwrap_err();
        assert!(matches!(
            err,
            RenderError::FontNotLoaded { ref name, size: 12 } if name == "Missing Serif Italic"
        ));
        assert!(font.slot().is_none());
    }

    #[test]
    fn test_records_are_per_name_and_size() {
        let (_backend, mut cache) = cache_with(512);
        let mut a = test_font(14);
        let mut b = test_font(14);
        let mut c = test_font(20);

        let sa = cache.prepare_font(&mut a).unwrap();
        let sb = cache.prepare_font(&mut b).unwrap();
        let sc = cache.prepare_font(&mut c).unwrap();
        assert_eq!(sa, sb);
        assert_ne!(sa, sc);
        assert_eq!(a.slot(), Some(sa));
    }

    #[test]
    fn test_resizing_handle_re_resolves() {
        let (_backend, mut cache) = cache_with(512);
        let mut font = test_font(14);
        let small = cache.prepare_font(&mut font).unwrap();

        font.set_size(28);
        assert!(font.slot().is_none());
        let large = cache.prepare_font(&mut font).unwrap();
        assert_ne!(small, large);

        let m = cache.font_metrics(&mut font).unwrap();
        assert_eq!(m.ascender, 21.0);
        assert_eq!(m.descender, -7.0);
    }

    #[test]
    fn test_slot_from_another_cache_is_not_trusted() {
        let (_b1, mut first) = cache_with(512);
        let (_b2, mut second) = cache_with(512);

        let mut font = test_font(14);
        let mut other = test_font(30);
        first.prepare_font(&mut other).unwrap();
        let in_first = first.prepare_font(&mut font).unwrap();
        let in_second = second.prepare_font(&mut font).unwrap();

        assert_ne!(in_first.cache, in_second.cache);
        assert_eq!(in_second.index, 0);
        assert_eq!(second.font_metrics(&mut font).unwrap().ascender, 10.0);
    }

    #[test]
    fn test_glyph_cache_hit_is_identical() {
        let (_backend, mut cache) = cache_with(512);
        let mut font = test_font(14);

        let first = cache.get_glyph(&mut font, 'A' as u32, 2).unwrap();
        let cursor = cache.atlas().cursor();
        let second = cache.get_glyph(&mut font, 'A' as u32, 2).unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.atlas().cursor(), cursor);
        assert_eq!(cache.glyph_count(), 1);
    }

    #[test]
    fn test_phases_are_separate_entries() {
        let (_backend, mut cache) = cache_with(512);
        let mut font = test_font(14);

        let entries: Vec<GlyphEntry> = (0..SUBPIXEL_PHASES)
            .map(|phase| cache.get_glyph(&mut font, 'g' as u32, phase).unwrap())
            .collect();

        assert_eq!(cache.glyph_count(), 4);
        for (i, a) in entries.iter().enumerate() {
            for b in &entries[i + 1..] {
                assert_ne!(a.coords, b.coords);
            }
        }

        // Each phase's bitmap landed in the atlas with its own coverage
        let atlas = cache.atlas();
        let size = atlas.size() as f32;
        for (phase, entry) in entries.iter().enumerate() {
            let x = (entry.coords.tl.x * size) as usize;
            let y = (entry.coords.tl.y * size) as usize;
            let alpha = atlas.pixels()[(y * atlas.size() as usize + x) * 4 + 3];
            assert_eq!(alpha, testing::coverage_value('g' as u32, phase as u8));
        }
    }

    #[test]
    fn test_glyph_entry_metrics() {
        let (_backend, mut cache) = cache_with(512);
        let mut font = test_font(14);
        let entry = cache.get_glyph(&mut font, 'B' as u32, 0).unwrap();

        assert_eq!(entry.size, Vec2::new(5.0, 7.0));
        assert_eq!(entry.offset, Vec2::new(1.0, 7.0));
        assert_eq!(entry.advance, testing::advance('B' as u32, 14));
        assert_eq!(entry.texture, cache.atlas().texture());
    }

    #[test]
    fn test_blank_glyph_takes_no_space() {
        let (_backend, mut cache) = cache_with(512);
        let mut font = test_font(14);
        let space = cache.get_glyph(&mut font, ' ' as u32, 1).unwrap();
        assert_eq!(space.size, Vec2::ZERO);
        assert!(space.advance > 0.0);
        assert!(!cache.atlas().is_dirty());
    }

    #[test]
    fn test_full_atlas_is_reported_once() {
        testing::init_logger();
        let mut backend = HeadlessBackend::with_max_texture_size(16);
        let rasterizer = CountingRasterizer::default();
        let mut cache = FontCache::new(&mut backend, rasterizer.clone(), 512);
        cache
            .load_font(testing::font_bytes(TEST_FAMILY, "Regular"))
            .unwrap();
        let mut font = test_font(14);

        let mut failed = None;
        for codepoint in 'A' as u32..'Z' as u32 {
            if let Err(err) = cache.get_glyph(&mut font, codepoint, 0) {
                failed = Some((codepoint, err));
                break;
            }
        }

        let (codepoint, err) = failed.expect("a 16px atlas must run out of room");
        assert!(matches!(err, RenderError::AtlasFull { width: 16, height: 16 }));
        let cached = cache.glyph_count();
        let renders = rasterizer.renders();
        let again = cache.get_glyph(&mut font, codepoint, 0).unwrap_err();
        assert!(matches!(again, RenderError::AtlasFull { width: 16, height: 16 }));
        assert_eq!(cache.glyph_count(), cached);
        assert_eq!(rasterizer.renders(), renders);

        // Other phases of the same codepoint are separate attempts
        let _ = cache.get_glyph(&mut font, codepoint, 1);
        assert_eq!(rasterizer.renders(), renders + 1);
    }

    #[test]
    fn test_kerning_in_pixels() {
        let (_backend, mut cache) = cache_with(512);
        let mut font = test_font(14);
        assert_eq!(
            cache.kerning(&mut font, 'A' as u32, 'V' as u32).unwrap(),
            [-1.0, 0.0]
        );
        assert_eq!(
            cache.kerning(&mut font, 'V' as u32, 'A' as u32).unwrap(),
            [0.0, 0.0]
        );
    }
}
