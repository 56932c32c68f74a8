//! Pixel surface backed by an RGBA buffer, with PNG output

use std::io::Cursor;
use std::sync::Arc;

use image::{ImageFormat, Pixel, RgbaImage};

use crate::rendering::paint::{Canvas2d, CanvasRect, Color, DisplayList, Point};
use crate::rendering::Screenshot;
use crate::Result;

/// Software canvas.
///
/// Rects cover the pixels whose centers fall inside them; strokes are
/// centered on the rect edges like a canvas 2D context. No anti-aliasing.
#[derive(Debug, Clone)]
pub struct RasterCanvas {
    pixels: RgbaImage,
}

impl RasterCanvas {
    pub fn new(width: u32, height: u32, background: Option<Color>) -> Self {
        let fill = background.unwrap_or(Color::TRANSPARENT);
        Self {
            pixels: RgbaImage::from_pixel(width, height, fill.to_pixel()),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let p = self.pixels.get_pixel(x, y);
        Some(Color::rgba(p[0], p[1], p[2], p[3]))
    }

    /// Encode the current pixels as PNG
    pub fn to_screenshot(&self) -> Result<Screenshot> {
        let mut png_data = Vec::new();
        self.pixels
            .write_to(&mut Cursor::new(&mut png_data), ImageFormat::Png)?;
        Ok(Screenshot {
            width: self.width(),
            height: self.height(),
            png_data,
        })
    }

    /// Pixel span `[start, end)` covered by the interval `[a, b)`
    fn span(a: f64, b: f64, limit: u32) -> Option<(u32, u32)> {
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        let start = (a - 0.5).ceil().max(0.0);
        let end = (b - 0.5).ceil().min(limit as f64);
        if !(start < end) {
            return None;
        }
        Some((start as u32, end as u32))
    }

    fn blend(&mut self, x: u32, y: u32, color: Color) {
        if color.a == 255 {
            self.pixels.put_pixel(x, y, color.to_pixel());
        } else if color.a > 0 {
            self.pixels.get_pixel_mut(x, y).blend(&color.to_pixel());
        }
    }

    fn fill_area(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: Color) {
        let Some((xs, xe)) = Self::span(x0, x1, self.width()) else {
            return;
        };
        let Some((ys, ye)) = Self::span(y0, y1, self.height()) else {
            return;
        };
        for y in ys..ye {
            for x in xs..xe {
                self.blend(x, y, color);
            }
        }
    }

    fn plot(&mut self, x: f64, y: f64, size: f64, color: Color) {
        if size <= 1.0 {
            let (px, py) = (x.floor(), y.floor());
            if px >= 0.0 && py >= 0.0 && px < self.width() as f64 && py < self.height() as f64 {
                self.blend(px as u32, py as u32, color);
            }
        } else {
            let half = size / 2.0;
            self.fill_area(x - half, y - half, x + half, y + half, color);
        }
    }
}

impl Canvas2d for RasterCanvas {
    fn fill_rect(&mut self, rect: CanvasRect, color: Color) {
        self.fill_area(rect.x, rect.y, rect.x + rect.width, rect.y + rect.height, color);
    }

    fn stroke_rect(&mut self, rect: CanvasRect, color: Color, line_width: f64) {
        if rect.width == 0.0 && rect.height == 0.0 {
            return;
        }
        let h = line_width / 2.0;
        let (x0, y0) = (rect.x, rect.y);
        let (x1, y1) = (rect.x + rect.width, rect.y + rect.height);
        // Edges overlap at the corners; colors here are opaque in practice.
        self.fill_area(x0 - h, y0 - h, x1 + h, y0 + h, color);
        self.fill_area(x0 - h, y1 - h, x1 + h, y1 + h, color);
        self.fill_area(x0 - h, y0 + h, x0 + h, y1 - h, color);
        self.fill_area(x1 - h, y0 + h, x1 + h, y1 - h, color);
    }

    fn line(&mut self, from: Point, to: Point, color: Color, line_width: f64) {
        let (dx, dy) = (to.x - from.x, to.y - from.y);
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            self.plot(from.x + dx * t, from.y + dy * t, line_width, color);
        }
    }

    fn draw_image(&mut self, image: &Arc<RgbaImage>, rect: CanvasRect) {
        let (iw, ih) = image.dimensions();
        if rect.is_empty() || iw == 0 || ih == 0 {
            return;
        }
        // Only the visible window is sampled; the destination may be far
        // larger than the canvas.
        let Some((xs, xe)) = Self::span(rect.x, rect.x + rect.width, self.width()) else {
            return;
        };
        let Some((ys, ye)) = Self::span(rect.y, rect.y + rect.height, self.height()) else {
            return;
        };
        let sample = |p: u32, origin: f64, extent: f64, size: u32| {
            let t = (p as f64 + 0.5 - origin) / extent;
            ((t * size as f64).floor().max(0.0) as u32).min(size - 1)
        };
        for y in ys..ye {
            let sy = sample(y, rect.y, rect.height, ih);
            for x in xs..xe {
                let sx = sample(x, rect.x, rect.width, iw);
                let p = image.get_pixel(sx, sy);
                self.blend(x, y, Color::rgba(p[0], p[1], p[2], p[3]));
            }
        }
    }
}

/// Replay a display list onto a fresh raster canvas and encode it
pub fn rasterize(list: &DisplayList, width: u32, height: u32, background: Option<Color>) -> Result<Screenshot> {
    let mut canvas = RasterCanvas::new(width, height, background);
    list.replay(&mut canvas);
    canvas.to_screenshot()
}
