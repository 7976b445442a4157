//! Bodymap Render Library
//!
//! Drawing-surface implementations and figure image loading for bodymap.
//! The raster surface draws into an in-memory RGBA buffer that can be
//! exported as PNG.

mod loader;
mod raster;

pub use loader::{FIGURE_EXTENSIONS, FileImageSource, decode_figure};
pub use raster::RasterSurface;

use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Encoding failed: {0}")]
    Encode(String),
    #[error("IO error: {0}")]
    Io(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;
