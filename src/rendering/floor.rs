//! Decorative gallery floor drawn beneath the tallest picture

use rand::Rng;

use crate::rendering::paint::{Canvas2d, Color, Point};

/// Geometry and colors of the floor decoration
#[derive(Debug, Clone, PartialEq)]
pub struct FloorStyle {
    /// Width of the baseline in canvas pixels
    pub width: f64,
    /// Depth of the receding floor lines
    pub depth: f64,
    /// Horizontal distance between floor lines
    pub step: f64,
    pub shadow_color: Color,
    pub grain_color: Color,
    pub baseline_color: Color,
    pub line_width: f64,
}

impl Default for FloorStyle {
    fn default() -> Self {
        Self {
            width: 900.0,
            depth: 60.0,
            step: 15.0,
            shadow_color: Color::rgb(0x99, 0x99, 0x99),
            grain_color: Color::rgb(0xEC, 0xEC, 0xEC),
            baseline_color: Color::rgb(0x4B, 0x4B, 0x4B),
            line_width: 1.0,
        }
    }
}

impl FloorStyle {
    /// Lines per family: stepping starts at 0 and stops once past `width + depth`.
    pub fn lines_per_family(&self) -> usize {
        if !(self.step > 0.0) {
            return 0;
        }
        let mut x = 0.0;
        let mut n = 0;
        while x < self.width + self.depth {
            x += self.step;
            n += 1;
        }
        n
    }
}

/// Paint the floor at height `floor_y`.
///
/// Two families of lines are stepped across the width: receding diagonal
/// shadow lines and short upright grain lines, each with a small random
/// length jitter, followed by one solid baseline.
pub fn paint_floor<C, R>(canvas: &mut C, floor_y: f64, style: &FloorStyle, rng: &mut R)
where
    C: Canvas2d + ?Sized,
    R: Rng + ?Sized,
{
    if !(style.step > 0.0) {
        log::warn!("floor step {} is not positive; skipping floor", style.step);
        return;
    }
    let end = style.width + style.depth;
    let jitter = style.depth * 0.1;

    let mut x = 0.0;
    while x < end {
        x += style.step;
        let v = jitter * rng.gen::<f64>();
        canvas.line(
            Point::new(x, floor_y),
            Point::new(x - style.depth - v, floor_y + style.depth + v),
            style.shadow_color,
            style.line_width,
        );
    }

    let mut x = 0.0;
    while x < end {
        x += style.step;
        let v = jitter * rng.gen::<f64>();
        canvas.line(
            Point::new(x, floor_y),
            Point::new(x, floor_y - style.depth * 0.5 + v),
            style.grain_color,
            style.line_width,
        );
    }

    canvas.line(
        Point::new(0.0, floor_y),
        Point::new(style.width, floor_y),
        style.baseline_color,
        style.line_width,
    );
}
