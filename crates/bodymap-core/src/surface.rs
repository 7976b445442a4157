//! Drawing-surface abstraction for figure canvases.
//!
//! A surface has an intrinsic pixel size (what it draws into) and a display
//! size (what it occupies on screen). Pointer input arrives in display
//! coordinates; points are stored normalized against the intrinsic size.

use kurbo::{Point, Size};
use peniko::Color;
use std::sync::Arc;

/// A decoded figure background, RGBA8, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct FigureImage {
    width: u32,
    height: u32,
    rgba: Arc<[u8]>,
}

impl FigureImage {
    /// Wrap decoded pixels. Returns `None` if the buffer does not match the dimensions.
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        (rgba.len() == expected).then(|| Self {
            width,
            height,
            rgba: rgba.into(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }
}

/// Something a figure can be drawn onto.
pub trait FigureSurface {
    /// Intrinsic drawable size in surface pixels.
    fn size(&self) -> Size;

    /// Size on screen. Defaults to the intrinsic size (no scaling).
    fn display_size(&self) -> Size {
        self.size()
    }

    /// Erase everything.
    fn clear(&mut self);

    /// Draw the background stretched over the whole surface.
    fn draw_image(&mut self, image: &FigureImage);

    /// Fill a circle given in surface pixels.
    fn fill_circle(&mut self, center: Point, radius: f64, color: Color);
}

/// Ratio of intrinsic to on-screen width, or 1.0 if either is degenerate.
pub fn surface_scale(surface: &impl FigureSurface) -> (f64, f64) {
    let size = surface.size();
    let display = surface.display_size();
    let ratio = |intrinsic: f64, shown: f64| {
        if intrinsic > 0.0 && shown > 0.0 { intrinsic / shown } else { 1.0 }
    };
    (ratio(size.width, display.width), ratio(size.height, display.height))
}

/// Map a position in display coordinates to surface pixels.
pub fn display_to_surface(surface: &impl FigureSurface, position: Point) -> Point {
    let (sx, sy) = surface_scale(surface);
    Point::new(position.x * sx, position.y * sy)
}

/// Normalize a surface-pixel position to `[0, 1]` on both axes.
///
/// Returns `None` for a zero-sized surface or a non-finite position.
pub fn normalize(size: Size, position: Point) -> Option<(f64, f64)> {
    if size.width <= 0.0 || size.height <= 0.0 || !position.is_finite() {
        return None;
    }
    let x = (position.x / size.width).clamp(0.0, 1.0);
    let y = (position.y / size.height).clamp(0.0, 1.0);
    Some((x, y))
}

/// Map normalized coordinates back to surface pixels.
pub fn denormalize(size: Size, x_norm: f64, y_norm: f64) -> Point {
    Point::new(x_norm * size.width, y_norm * size.height)
}

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear,
    Image { width: u32, height: u32 },
    Circle { center: Point, radius: f64, rgba: [u8; 4] },
}

/// A surface that records draw calls instead of rasterizing.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    size: Size,
    display_size: Size,
    ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new(width: f64, height: f64) -> Self {
        let size = Size::new(width, height);
        Self {
            size,
            display_size: size,
            ops: Vec::new(),
        }
    }

    /// Pretend the surface is shown at a different on-screen size.
    pub fn with_display_size(mut self, width: f64, height: f64) -> Self {
        self.display_size = Size::new(width, height);
        self
    }

    pub fn set_display_size(&mut self, width: f64, height: f64) {
        self.display_size = Size::new(width, height);
    }

    /// Draw calls since the last clear, including the clear itself.
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Number of markers currently drawn.
    pub fn marker_count(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, DrawOp::Circle { .. })).count()
    }

    pub fn has_background(&self) -> bool {
        self.ops.iter().any(|op| matches!(op, DrawOp::Image { .. }))
    }
}

impl FigureSurface for RecordingSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn display_size(&self) -> Size {
        self.display_size
    }

    fn clear(&mut self) {
        self.ops.clear();
        self.ops.push(DrawOp::Clear);
    }

    fn draw_image(&mut self, image: &FigureImage) {
        self.ops.push(DrawOp::Image { width: image.width(), height: image.height() });
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Color) {
        let c = color.to_rgba8();
        self.ops.push(DrawOp::Circle { center, radius, rgba: [c.r, c.g, c.b, c.a] });
    }
}
