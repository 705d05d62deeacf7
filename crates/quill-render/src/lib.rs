//! # quill-render
//!
//! Glyph atlas, font cache and the batched immediate-mode [`Painter`].
//!
//! Everything here talks to the GPU through the [`RenderBackend`] trait. The
//! [`HeadlessBackend`] records calls instead of rendering; `quill-wgpu`
//! provides the real thing.

mod atlas;
mod backend;
mod config;
mod error;
mod font_cache;
mod headless;
mod painter;
mod vertex;

#[cfg(test)]
pub(crate) mod testing;

pub use atlas::*;
pub use backend::*;
pub use config::*;
pub use error::*;
pub use font_cache::*;
pub use headless::*;
pub use painter::*;
pub use vertex::*;

pub use quill;
pub use quill_text;
