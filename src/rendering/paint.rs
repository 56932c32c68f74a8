//! Paint primitives, the drawing surface contract and a recording surface

use std::sync::Arc;

use image::RgbaImage;

/// Non-premultiplied RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    /// Fill of an empty picture frame (`#A9A9A9`)
    pub const PLACEHOLDER: Color = Color::rgb(0xA9, 0xA9, 0xA9);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a CSS color as emitted by the backend: `#rrggbb`, `#rgb`,
    /// `rgb(r, g, b)` or `rgba(r, g, b, a)` with `a` in `0..=1`.
    pub fn parse(s: &str) -> Option<Color> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return Self::parse_hex(hex);
        }
        let (args, has_alpha) = if let Some(rest) = s.strip_prefix("rgba(") {
            (rest.strip_suffix(')')?, true)
        } else if let Some(rest) = s.strip_prefix("rgb(") {
            (rest.strip_suffix(')')?, false)
        } else {
            return None;
        };

        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        let expected = if has_alpha { 4 } else { 3 };
        if parts.len() != expected {
            return None;
        }
        let channel = |p: &str| p.parse::<f64>().ok().map(|v| v.clamp(0.0, 255.0).round() as u8);
        let a = if has_alpha {
            let alpha = parts[3].parse::<f64>().ok()?;
            (alpha.clamp(0.0, 1.0) * 255.0).round() as u8
        } else {
            255
        };
        Some(Color::rgba(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?, a))
    }

    fn parse_hex(hex: &str) -> Option<Color> {
        let digit = |i: usize, len: usize| u8::from_str_radix(hex.get(i..i + len)?, 16).ok();
        match hex.len() {
            6 => Some(Color::rgb(digit(0, 2)?, digit(2, 2)?, digit(4, 2)?)),
            3 => Some(Color::rgb(digit(0, 1)? * 17, digit(1, 1)? * 17, digit(2, 1)? * 17)),
            _ => None,
        }
    }

    pub fn to_pixel(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, self.a])
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CanvasRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// 2D drawing surface consumed by the renderers.
///
/// Mirrors the subset of a canvas 2D context the wall and chart painters use.
pub trait Canvas2d {
    fn fill_rect(&mut self, rect: CanvasRect, color: Color);
    fn stroke_rect(&mut self, rect: CanvasRect, color: Color, line_width: f64);
    fn line(&mut self, from: Point, to: Point, color: Color, line_width: f64);
    /// Draw `image` scaled into `rect`
    fn draw_image(&mut self, image: &Arc<RgbaImage>, rect: CanvasRect);
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    FillRect {
        rect: CanvasRect,
        color: Color,
    },
    StrokeRect {
        rect: CanvasRect,
        color: Color,
        line_width: f64,
    },
    Line {
        from: Point,
        to: Point,
        color: Color,
        line_width: f64,
    },
    Image {
        rect: CanvasRect,
        image: Arc<RgbaImage>,
    },
}

/// A surface that records paint commands in order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayList {
    pub commands: Vec<PaintCommand>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Paint the recorded commands onto another surface
    pub fn replay<C: Canvas2d + ?Sized>(&self, canvas: &mut C) {
        for cmd in &self.commands {
            match cmd {
                PaintCommand::FillRect { rect, color } => canvas.fill_rect(*rect, *color),
                PaintCommand::StrokeRect {
                    rect,
                    color,
                    line_width,
                } => canvas.stroke_rect(*rect, *color, *line_width),
                PaintCommand::Line {
                    from,
                    to,
                    color,
                    line_width,
                } => canvas.line(*from, *to, *color, *line_width),
                PaintCommand::Image { rect, image } => canvas.draw_image(image, *rect),
            }
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &PaintCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, PaintCommand::Line { .. }))
    }

    pub fn images(&self) -> impl Iterator<Item = &PaintCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, PaintCommand::Image { .. }))
    }
}

impl Canvas2d for DisplayList {
    fn fill_rect(&mut self, rect: CanvasRect, color: Color) {
        self.commands.push(PaintCommand::FillRect { rect, color });
    }

    fn stroke_rect(&mut self, rect: CanvasRect, color: Color, line_width: f64) {
        self.commands.push(PaintCommand::StrokeRect {
            rect,
            color,
            line_width,
        });
    }

    fn line(&mut self, from: Point, to: Point, color: Color, line_width: f64) {
        self.commands.push(PaintCommand::Line {
            from,
            to,
            color,
            line_width,
        });
    }

    fn draw_image(&mut self, image: &Arc<RgbaImage>, rect: CanvasRect) {
        self.commands.push(PaintCommand::Image {
            rect,
            image: Arc::clone(image),
        });
    }
}

/// Stroke width of the empty picture frame
pub const PLACEHOLDER_LINE_WIDTH: f64 = 2.0;

/// Paint an empty picture frame: gray fill with a black 2px outline.
pub fn paint_placeholder<C: Canvas2d + ?Sized>(canvas: &mut C, rect: CanvasRect) {
    canvas.fill_rect(rect, Color::PLACEHOLDER);
    canvas.stroke_rect(rect, Color::BLACK, PLACEHOLDER_LINE_WIDTH);
}
