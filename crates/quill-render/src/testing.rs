//! Deterministic stand-in for a real font rasterizer.
//!
//! Font "files" are plain text: a magic line, a family line and a style line.
//! Rendered bitmaps are solid blocks whose byte value encodes the codepoint and
//! sub-pixel phase, so tests can tell cache entries apart by atlas content.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use quill_text::{F16Dot16, F26Dot6, FontFace, Rasterizer, RenderedGlyph, SizeMetrics, TextError};

const MAGIC: &str = "quill-test-font";

pub const TEST_FAMILY: &str = "Test Sans";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn font_bytes(family: &str, style: &str) -> Arc<[u8]> {
    Arc::from(format!("{MAGIC}\n{family}\n{style}").into_bytes())
}

/// Expected coverage value for `codepoint` rendered at `phase`.
pub fn coverage_value(codepoint: u32, phase: u8) -> u8 {
    ((codepoint * 4 + phase as u32) % 251) as u8 + 1
}

/// Expected advance of `codepoint` at `pixels`.
pub fn advance(codepoint: u32, pixels: u32) -> f32 {
    F16Dot16::from_f32(pixels as f32 * 0.5 + (codepoint % 4) as f32 * 0.3).to_f32()
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FakeRasterizer;

impl Rasterizer for FakeRasterizer {
    fn open_face(&self, data: Arc<[u8]>) -> Result<Box<dyn FontFace>, TextError> {
        open_fake_face(&data, None)
    }
}

/// [`FakeRasterizer`] that counts `render_char` calls across all its faces.
#[derive(Clone, Debug, Default)]
pub struct CountingRasterizer {
    renders: Arc<AtomicUsize>,
}

impl CountingRasterizer {
    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::Relaxed)
    }
}

impl Rasterizer for CountingRasterizer {
    fn open_face(&self, data: Arc<[u8]>) -> Result<Box<dyn FontFace>, TextError> {
        open_fake_face(&data, Some(self.renders.clone()))
    }
}

fn open_fake_face(
    data: &[u8],
    renders: Option<Arc<AtomicUsize>>,
) -> Result<Box<dyn FontFace>, TextError> {
    let text = std::str::from_utf8(data).map_err(|_| TextError::InvalidFont)?;
    let mut lines = text.lines();
    if lines.next() != Some(MAGIC) {
        return Err(TextError::InvalidFont);
    }
    let family = lines
        .next()
        .filter(|f| !f.is_empty())
        .ok_or(TextError::MissingName("family"))?;
    let style = lines.next().unwrap_or("Regular");

    Ok(Box::new(FakeFace {
        family: family.to_string(),
        style: style.to_string(),
        pixels: 0,
        renders,
    }))
}

struct FakeFace {
    family: String,
    style: String,
    pixels: u32,
    renders: Option<Arc<AtomicUsize>>,
}

impl FontFace for FakeFace {
    fn family_name(&self) -> &str {
        &self.family
    }

    fn style_name(&self) -> &str {
        &self.style
    }

    fn set_pixel_size(&mut self, pixels: u32) {
        self.pixels = pixels;
    }

    fn size_metrics(&self) -> SizeMetrics {
        SizeMetrics {
            ascender: F26Dot6::from_int((self.pixels * 3 / 4) as i32),
            descender: F26Dot6::from_int(-((self.pixels / 4) as i32)),
        }
    }

    fn render_char(&mut self, codepoint: u32, x_offset: F26Dot6) -> RenderedGlyph {
        if let Some(renders) = &self.renders {
            renders.fetch_add(1, Ordering::Relaxed);
        }
        let phase = (x_offset.0 / 16) as u8;
        let linear_advance = F16Dot16::from_f32(
            self.pixels as f32 * 0.5 + (codepoint % 4) as f32 * 0.3,
        );

        if codepoint == ' ' as u32 {
            return RenderedGlyph {
                linear_advance,
                ..Default::default()
            };
        }

        let width = 3 + codepoint % 4 + u32::from(phase > 0);
        let rows = self.pixels / 2 + codepoint % 3;
        RenderedGlyph {
            width,
            rows,
            left: 1,
            top: rows as i32,
            coverage: vec![coverage_value(codepoint, phase); (width * rows) as usize],
            linear_advance,
        }
    }

    fn kerning(&self, left: u32, right: u32) -> [F26Dot6; 2] {
        if (left, right) == ('A' as u32, 'V' as u32) {
            [F26Dot6::from_int(-1), F26Dot6::ZERO]
        } else {
            [F26Dot6::ZERO; 2]
        }
    }
}
