//! CPU raster surface backed by `image::RgbaImage`.

use crate::{RenderError, RenderResult};
use bodymap_core::surface::{FigureImage, FigureSurface};
use image::{Rgba, RgbaImage, imageops};
use kurbo::{Point, Size};
use peniko::Color;
use std::path::Path;

/// A figure canvas that rasterizes into memory.
pub struct RasterSurface {
    pixels: RgbaImage,
    display_size: Size,
    background: Rgba<u8>,
}

impl RasterSurface {
    /// Create a surface of `width` x `height` pixels, shown at the same size.
    pub fn new(width: u32, height: u32) -> Self {
        let background = Rgba([255, 255, 255, 255]);
        Self {
            pixels: RgbaImage::from_pixel(width, height, background),
            display_size: Size::new(width as f64, height as f64),
            background,
        }
    }

    /// Set the color used by `clear`.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = to_rgba(color);
        self
    }

    /// Set the on-screen size the surface is shown at.
    pub fn set_display_size(&mut self, width: f64, height: f64) {
        self.display_size = Size::new(width, height);
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        (x < self.pixels.width() && y < self.pixels.height()).then(|| self.pixels.get_pixel(x, y).0)
    }

    /// Write the current contents as a PNG file.
    pub fn save_png(&self, path: &Path) -> RenderResult<()> {
        self.pixels.save_with_format(path, image::ImageFormat::Png).map_err(|e| match e {
            image::ImageError::IoError(io) => RenderError::Io(format!("{}: {}", path.display(), io)),
            other => RenderError::Encode(other.to_string()),
        })
    }
}

fn to_rgba(color: Color) -> Rgba<u8> {
    let c = color.to_rgba8();
    Rgba([c.r, c.g, c.b, c.a])
}

/// Source-over blend of `src` onto `dst`.
fn blend(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let alpha = src.0[3] as f32 / 255.0;
    for i in 0..3 {
        let blended = src.0[i] as f32 * alpha + dst.0[i] as f32 * (1.0 - alpha);
        dst.0[i] = blended.round() as u8;
    }
    dst.0[3] = dst.0[3].max(src.0[3]);
}

impl FigureSurface for RasterSurface {
    fn size(&self) -> Size {
        Size::new(self.pixels.width() as f64, self.pixels.height() as f64)
    }

    fn display_size(&self) -> Size {
        self.display_size
    }

    fn clear(&mut self) {
        let background = self.background;
        for pixel in self.pixels.pixels_mut() {
            *pixel = background;
        }
    }

    fn draw_image(&mut self, image: &FigureImage) {
        let Some(source) = RgbaImage::from_raw(image.width(), image.height(), image.rgba().to_vec()) else {
            log::warn!("Figure image buffer does not match its dimensions");
            return;
        };
        let (width, height) = self.pixels.dimensions();
        let scaled = if source.dimensions() == (width, height) {
            source
        } else {
            imageops::resize(&source, width, height, imageops::FilterType::Triangle)
        };
        for (dst, src) in self.pixels.pixels_mut().zip(scaled.pixels()) {
            blend(dst, *src);
        }
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Color) {
        if radius <= 0.0 {
            return;
        }
        let color = to_rgba(color);
        let (width, height) = self.pixels.dimensions();
        let min_x = (center.x - radius).floor().max(0.0) as u32;
        let min_y = (center.y - radius).floor().max(0.0) as u32;
        let max_x = ((center.x + radius).ceil().max(0.0) as u32).min(width);
        let max_y = ((center.y + radius).ceil().max(0.0) as u32).min(height);
        let r2 = radius * radius;

        for y in min_y..max_y {
            for x in min_x..max_x {
                // Sample at pixel centers.
                let dx = x as f64 + 0.5 - center.x;
                let dy = y as f64 + 0.5 - center.y;
                if dx * dx + dy * dy <= r2 {
                    blend(self.pixels.get_pixel_mut(x, y), color);
                }
            }
        }
    }
}
