//! # quill
//!
//! Backend agnostic primitives for the immediate-mode 2D painter.
//!
//! This crate has no dependency on a graphics API or a font rasterizer. The
//! glyph atlas, font cache and batched painter live in `quill-render`; GPU
//! backends such as `quill-wgpu` live in their own crates.

mod align;
mod color;
mod font;
mod geometry;
mod polygon;
mod utf8;

pub use align::*;
pub use color::*;
pub use font::*;
pub use geometry::*;
pub use polygon::*;
pub use utf8::*;
