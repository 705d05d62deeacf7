use std::path::PathBuf;

use quill_text::TextError;

pub type Result<T, E = RenderError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("font '{name}' at {size}px is not loaded")]
    FontNotLoaded { name: String, size: u32 },

    #[error("cannot pop stencil, no stencil was pushed")]
    StencilStackUnderflow,

    #[error("cannot pop offset, no offset was pushed")]
    OffsetStackUnderflow,

    #[error("glyph atlas ({width}x{height}) is full")]
    AtlasFull { width: u32, height: u32 },

    #[error(transparent)]
    Text(#[from] TextError),

    #[error("could not read font file {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
