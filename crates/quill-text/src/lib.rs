//! Font rasterizer seam for the `quill` painter.
//!
//! # Design goals
//! - **Backend-agnostic**: no GPU types, no atlas. Only bytes in, coverage out.
//! - **Narrow**: the font cache needs a face name, per-size metrics, a
//!   coverage bitmap per codepoint at a horizontal sub-pixel offset, a linear
//!   advance and pair kerning. Nothing else is exposed.
//!
//! # Current implementation
//! The `swash` feature provides [`scale::SwashRasterizer`], which rasterizes
//! outlines with `swash` and reads names, metrics and kerning with `ttf-parser`.
//!
//! Values follow the FreeType conventions the cache was written against:
//! metrics in 26.6 fixed point with a negative descender, advances in 16.16.

#![deny(warnings)]

use std::sync::Arc;

mod fixed;
#[cfg(feature = "swash")]
pub mod scale;

pub use fixed::{F16Dot16, F26Dot6};

#[derive(Debug, thiserror::Error)]
pub enum TextError {
    #[error("font data could not be parsed")]
    InvalidFont,
    #[error("font has no readable {0} name")]
    MissingName(&'static str),
}

/// Vertical metrics of a face at its current pixel size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SizeMetrics {
    /// Distance from baseline to the top of the tallest glyphs. Positive.
    pub ascender: F26Dot6,
    /// Distance from baseline to the bottom of the lowest glyphs. Negative.
    pub descender: F26Dot6,
}

/// An 8-bit coverage bitmap for one glyph plus its placement.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderedGlyph {
    pub width: u32,
    pub rows: u32,
    /// Horizontal bearing: pen x to the bitmap's left edge.
    pub left: i32,
    /// Vertical bearing: baseline to the bitmap's top edge, positive upwards.
    pub top: i32,
    /// Row-major coverage, `width * rows` bytes.
    pub coverage: Vec<u8>,
    /// Unhinted advance.
    pub linear_advance: F16Dot16,
}

/// A parsed font face, sized and ready to render.
pub trait FontFace {
    fn family_name(&self) -> &str;

    fn style_name(&self) -> &str;

    fn set_pixel_size(&mut self, pixels: u32);

    fn size_metrics(&self) -> SizeMetrics;

    /// Render `codepoint` with the outline shifted right by `x_offset`.
    ///
    /// Codepoints missing from the face render the face's fallback glyph.
    fn render_char(&mut self, codepoint: u32, x_offset: F26Dot6) -> RenderedGlyph;

    /// Pair kerning `[x, y]` at the current size; zero without kerning data.
    fn kerning(&self, left: u32, right: u32) -> [F26Dot6; 2];
}

/// Opens faces from raw font file bytes.
///
/// Faces keep a handle on `data`; it must stay alive for their whole lifetime,
/// which the shared ownership guarantees.
pub trait Rasterizer {
    fn open_face(&self, data: Arc<[u8]>) -> Result<Box<dyn FontFace>, TextError>;
}

impl<R: Rasterizer + ?Sized> Rasterizer for Box<R> {
    fn open_face(&self, data: Arc<[u8]>) -> Result<Box<dyn FontFace>, TextError> {
        (**self).open_face(data)
    }
}

/// A convenient concrete rasterizer selection.
///
/// Currently only swash is supported.
pub enum Engine {
    #[cfg(feature = "swash")]
    Swash(scale::SwashRasterizer),
}

impl Engine {
    #[cfg(feature = "swash")]
    pub fn new_default() -> Self {
        Self::Swash(scale::SwashRasterizer::new())
    }
}

impl Rasterizer for Engine {
    #[allow(unused_variables)]
    fn open_face(&self, data: Arc<[u8]>) -> Result<Box<dyn FontFace>, TextError> {
        match *self {
            #[cfg(feature = "swash")]
            Self::Swash(ref engine) => engine.open_face(data),
        }
    }
}
