//! `swash` implementation of the rasterizer seam.
//!
//! Outlines are scaled and rendered by `swash`. Names, vertical metrics,
//! advances and the legacy `kern` table are read with `ttf-parser`, which also
//! maps codepoints to glyph ids so both libraries agree on them.

use std::sync::Arc;

use swash::scale::{Render, ScaleContext, Source};
use swash::zeno::{Format, Vector};
use swash::{CacheKey, FontRef};
use ttf_parser::{name_id, Face, GlyphId};

use crate::{F16Dot16, F26Dot6, FontFace, Rasterizer, RenderedGlyph, SizeMetrics, TextError};

/// Opens [`SwashFace`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct SwashRasterizer;

impl SwashRasterizer {
    pub fn new() -> Self {
        Self
    }
}

impl Rasterizer for SwashRasterizer {
    fn open_face(&self, data: Arc<[u8]>) -> Result<Box<dyn FontFace>, TextError> {
        Ok(Box::new(SwashFace::new(data)?))
    }
}

/// A face over shared font bytes. Only the first face of a collection is used.
pub struct SwashFace {
    data: Arc<[u8]>,
    offset: u32,
    key: CacheKey,
    family: String,
    style: String,
    units_per_em: f32,
    ascender: f32,
    descender: f32,
    pixel_size: u32,
    context: ScaleContext,
}

impl SwashFace {
    pub fn new(data: Arc<[u8]>) -> Result<Self, TextError> {
        let font = FontRef::from_index(&data, 0).ok_or(TextError::InvalidFont)?;
        let (offset, key) = (font.offset, font.key);

        let face = Face::parse(&data, 0).map_err(|_| TextError::InvalidFont)?;
        let family = find_name(&face, name_id::TYPOGRAPHIC_FAMILY)
            .or_else(|| find_name(&face, name_id::FAMILY))
            .ok_or(TextError::MissingName("family"))?;
        let style = find_name(&face, name_id::TYPOGRAPHIC_SUBFAMILY)
            .or_else(|| find_name(&face, name_id::SUBFAMILY))
            .unwrap_or_else(|| "Regular".to_string());

        let units_per_em = face.units_per_em().max(1) as f32;
        let ascender = face.ascender() as f32;
        let descender = face.descender() as f32;

        Ok(Self {
            data,
            offset,
            key,
            family,
            style,
            units_per_em,
            ascender,
            descender,
            pixel_size: 0,
            context: ScaleContext::new(),
        })
    }

    fn scale(&self) -> f32 {
        self.pixel_size as f32 / self.units_per_em
    }

    /// Re-borrow the parsed tables. Parsing succeeded once in `new`.
    fn face(&self) -> Option<Face<'_>> {
        Face::parse(&self.data, 0).ok()
    }
}

fn find_name(face: &Face<'_>, id: u16) -> Option<String> {
    face.names()
        .into_iter()
        .filter(|name| name.name_id == id)
        .find_map(|name| name.to_string())
        .filter(|name| !name.is_empty())
}

fn glyph_index(face: &Face<'_>, codepoint: u32) -> GlyphId {
    char::from_u32(codepoint)
        .and_then(|c| face.glyph_index(c))
        .unwrap_or(GlyphId(0))
}

impl FontFace for SwashFace {
    fn family_name(&self) -> &str {
        &self.family
    }

    fn style_name(&self) -> &str {
        &self.style
    }

    fn set_pixel_size(&mut self, pixels: u32) {
        self.pixel_size = pixels;
    }

    fn size_metrics(&self) -> SizeMetrics {
        let scale = self.scale();
        SizeMetrics {
            ascender: F26Dot6::from_f32((self.ascender * scale).ceil()),
            descender: F26Dot6::from_f32((self.descender * scale).floor()),
        }
    }

    fn render_char(&mut self, codepoint: u32, x_offset: F26Dot6) -> RenderedGlyph {
        let scale = self.scale();
        let (glyph, advance) = match self.face() {
            Some(face) => {
                let glyph = glyph_index(&face, codepoint);
                let advance = face.glyph_hor_advance(glyph).unwrap_or(0) as f32 * scale;
                (glyph, advance)
            }
            None => (GlyphId(0), 0.0),
        };

        let font = FontRef {
            data: &self.data,
            offset: self.offset,
            key: self.key,
        };
        let mut scaler = self
            .context
            .builder(font)
            .size(self.pixel_size as f32)
            .hint(true)
            .build();

        let image = Render::new(&[Source::Outline])
            .format(Format::Alpha)
            .offset(Vector::new(x_offset.to_f32(), 0.0))
            .render(&mut scaler, glyph.0);

        let mut rendered = RenderedGlyph {
            linear_advance: F16Dot16::from_f32(advance),
            ..Default::default()
        };

        match image {
            Some(image) => {
                let expected = (image.placement.width * image.placement.height) as usize;
                if image.data.len() == expected {
                    rendered.width = image.placement.width;
                    rendered.rows = image.placement.height;
                    rendered.left = image.placement.left;
                    rendered.top = image.placement.top;
                    rendered.coverage = image.data;
                } else {
                    log::warn!(
                        "Unexpected bitmap layout for U+{codepoint:04X} in '{} {}'",
                        self.family,
                        self.style
                    );
                }
            }
            None => {
                log::debug!(
                    "No outline for U+{codepoint:04X} in '{} {}'",
                    self.family,
                    self.style
                );
            }
        }

        rendered
    }

    fn kerning(&self, left: u32, right: u32) -> [F26Dot6; 2] {
        let Some(face) = self.face() else {
            return [F26Dot6::ZERO; 2];
        };
        let Some(kern) = face.tables().kern else {
            return [F26Dot6::ZERO; 2];
        };

        let (l, r) = (glyph_index(&face, left), glyph_index(&face, right));
        let units: i32 = kern
            .subtables
            .into_iter()
            .filter(|subtable| subtable.horizontal && !subtable.variable)
            .filter_map(|subtable| subtable.glyphs_kerning(l, r))
            .map(i32::from)
            .sum();

        [F26Dot6::from_f32(units as f32 * self.scale()), F26Dot6::ZERO]
    }
}
