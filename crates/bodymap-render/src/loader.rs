//! Figure images loaded from a directory of assets.

use bodymap_core::image_cache::{ImageLoadError, ImageLoadResult, ImageSource};
use bodymap_core::point::Figure;
use bodymap_core::storage::BoxFuture;
use bodymap_core::surface::FigureImage;
use std::fs;
use std::path::PathBuf;

/// Extensions tried, in order, for `<figure>.<ext>`.
pub const FIGURE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Loads `front.png`, `back.png`, ... from a directory.
pub struct FileImageSource {
    base_path: PathBuf,
}

impl FileImageSource {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    /// First existing asset file for `figure`.
    fn find(&self, figure: Figure) -> Option<PathBuf> {
        FIGURE_EXTENSIONS
            .iter()
            .map(|ext| self.base_path.join(format!("{}.{}", figure.as_str(), ext)))
            .find(|path| path.is_file())
    }
}

/// Decode encoded image bytes into a figure image.
pub fn decode_figure(figure: Figure, bytes: &[u8]) -> ImageLoadResult {
    let decoded = image::load_from_memory(bytes).map_err(|e| ImageLoadError::Decode {
        figure,
        message: e.to_string(),
    })?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    FigureImage::from_rgba(width, height, rgba.into_raw()).ok_or_else(|| ImageLoadError::Decode {
        figure,
        message: "decoded buffer size mismatch".to_string(),
    })
}

impl ImageSource for FileImageSource {
    fn load(&self, figure: Figure) -> BoxFuture<'_, ImageLoadResult> {
        let path = self.find(figure);
        Box::pin(async move {
            let path = path.ok_or(ImageLoadError::NotFound(figure))?;
            let bytes = fs::read(&path).map_err(|e| {
                ImageLoadError::Io(format!("Failed to read {}: {}", path.display(), e))
            })?;
            decode_figure(figure, &bytes)
        })
    }
}
