//! Per-figure background image cache.
//!
//! Each figure's image is loaded at most once. While a load is in flight
//! the figure is `Pending`; it then settles to `Ready` or `Failed`. A failed
//! figure may be requested again (retry); a ready one never is.

use crate::point::Figure;
use crate::storage::BoxFuture;
use crate::surface::FigureImage;
use std::collections::BTreeMap;
use thiserror::Error;

/// Why a figure image could not be loaded. Always retryable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImageLoadError {
    #[error("Image for {0} not found")]
    NotFound(Figure),
    #[error("Failed to decode image for {figure}: {message}")]
    Decode { figure: Figure, message: String },
    #[error("IO error: {0}")]
    Io(String),
}

/// Result of loading a figure image.
pub type ImageLoadResult = Result<FigureImage, ImageLoadError>;

/// Where figure images come from.
pub trait ImageSource {
    fn load(&self, figure: Figure) -> BoxFuture<'_, ImageLoadResult>;
}

/// Load status of one figure.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSlot {
    Pending,
    Ready(FigureImage),
    Failed(ImageLoadError),
}

/// Figure image cache owned by one engine.
#[derive(Debug, Default)]
pub struct ImageCache {
    slots: BTreeMap<Figure, ImageSlot>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a figure as loading. Returns false if it is already loading or loaded.
    pub fn mark_pending(&mut self, figure: Figure) -> bool {
        match self.slots.get(&figure) {
            Some(ImageSlot::Pending) | Some(ImageSlot::Ready(_)) => false,
            Some(ImageSlot::Failed(_)) | None => {
                self.slots.insert(figure, ImageSlot::Pending);
                true
            }
        }
    }

    /// Record the outcome of a load.
    pub fn settle(&mut self, figure: Figure, result: ImageLoadResult) {
        let slot = match result {
            Ok(image) => {
                log::debug!("Loaded {} image ({}x{})", figure, image.width(), image.height());
                ImageSlot::Ready(image)
            }
            Err(e) => {
                log::warn!("Failed to load {} image: {}", figure, e);
                ImageSlot::Failed(e)
            }
        };
        self.slots.insert(figure, slot);
    }

    /// Load status, or `None` if the figure was never requested.
    pub fn slot(&self, figure: Figure) -> Option<&ImageSlot> {
        self.slots.get(&figure)
    }

    pub fn get(&self, figure: Figure) -> Option<&FigureImage> {
        match self.slots.get(&figure) {
            Some(ImageSlot::Ready(image)) => Some(image),
            _ => None,
        }
    }

    pub fn is_pending(&self, figure: Figure) -> bool {
        matches!(self.slots.get(&figure), Some(ImageSlot::Pending))
    }

    /// Figures whose last load failed, with the reason.
    pub fn failed_figures(&self) -> Vec<(Figure, ImageLoadError)> {
        self.slots
            .iter()
            .filter_map(|(figure, slot)| match slot {
                ImageSlot::Failed(e) => Some((*figure, e.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> FigureImage {
        FigureImage::from_rgba(1, 1, vec![255; 4]).unwrap()
    }

    #[test]
    fn test_loads_once() {
        let mut cache = ImageCache::new();
        assert!(cache.mark_pending(Figure::Front));
        assert!(!cache.mark_pending(Figure::Front));
        cache.settle(Figure::Front, Ok(image()));
        assert!(!cache.mark_pending(Figure::Front));
        assert!(cache.get(Figure::Front).is_some());
    }

    #[test]
    fn test_failure_can_be_retried() {
        let mut cache = ImageCache::new();
        cache.mark_pending(Figure::Back);
        cache.settle(Figure::Back, Err(ImageLoadError::NotFound(Figure::Back)));
        assert_eq!(cache.failed_figures(), vec![(Figure::Back, ImageLoadError::NotFound(Figure::Back))]);
        assert!(cache.mark_pending(Figure::Back));
        assert!(cache.is_pending(Figure::Back));
        assert!(cache.failed_figures().is_empty());
    }

    #[test]
    fn test_failures_are_independent() {
        let mut cache = ImageCache::new();
        cache.mark_pending(Figure::Left);
        cache.mark_pending(Figure::Right);
        cache.settle(Figure::Left, Err(ImageLoadError::Io("reset".into())));
        cache.settle(Figure::Right, Ok(image()));
        assert!(cache.get(Figure::Right).is_some());
        assert!(cache.get(Figure::Left).is_none());
        assert!(cache.slot(Figure::Front).is_none());
    }
}
