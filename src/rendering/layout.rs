//! Wall-space to canvas-space layout: scale-to-fit, draw order and floor line

use crate::rendering::paint::CanvasRect;
use crate::wall::{PicturePlacement, Placements};
use crate::CanvasSize;

/// Uniform integer scale plus centering offsets for one render
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasTransform {
    pub scale: u32,
    pub x_offset: f64,
    pub y_offset: f64,
}

impl CanvasTransform {
    /// Largest integer scale at which the wall fits the canvas, centered.
    ///
    /// A wall wider or taller than the canvas yields scale 0; see
    /// [`CanvasTransform::at_least_one`].
    pub fn fit(wall_width: f64, wall_height: f64, canvas: CanvasSize) -> Self {
        let width_ratio = canvas.width as f64 / wall_width;
        let height_ratio = canvas.height as f64 / wall_height;
        let scale = width_ratio.min(height_ratio).floor() as u32;
        Self::with_scale(scale, wall_width, wall_height, canvas)
    }

    fn with_scale(scale: u32, wall_width: f64, wall_height: f64, canvas: CanvasSize) -> Self {
        let s = scale as f64;
        Self {
            scale,
            x_offset: (canvas.width as f64 - wall_width * s) / 2.0,
            y_offset: (canvas.height as f64 - wall_height * s) / 2.0,
        }
    }

    /// Clamp scale 0 up to 1, re-centering (offsets may go negative).
    pub fn at_least_one(self, wall_width: f64, wall_height: f64, canvas: CanvasSize) -> Self {
        if self.scale > 0 {
            return self;
        }
        Self::with_scale(1, wall_width, wall_height, canvas)
    }

    /// Map a picture's wall-space rect to canvas pixels
    pub fn apply(&self, picture: &PicturePlacement) -> CanvasRect {
        let s = self.scale as f64;
        CanvasRect {
            x: picture.x * s + self.x_offset,
            y: picture.y * s + self.y_offset,
            width: picture.width * s,
            height: picture.height * s,
        }
    }

    /// Height of the gallery floor: just above the bottom edge of `picture`
    pub fn floor_y(&self, picture: &PicturePlacement) -> f64 {
        let s = self.scale as f64;
        picture.y * s + self.y_offset + picture.height * s * 0.9
    }
}

/// Tallest-first draw order.
///
/// The sort is stable, so pictures of equal height keep their key order.
pub fn hang_order(placements: &Placements) -> Vec<(&str, &PicturePlacement)> {
    let mut ordered: Vec<_> = placements.iter().collect();
    ordered.sort_by(|a, b| b.1.height.total_cmp(&a.1.height));
    ordered
}
