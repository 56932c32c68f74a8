//! Gallery Wall renderer
//!
//! Renders a "wall" of hung pictures (or a curated gallery laid out in rows)
//! onto a 2D drawing surface and produces PNG output, plus the small bar
//! charts used to summarise tracked time.
//!
//! # Features
//!
//! - **Wall rendering**: scale-to-fit transform, tallest-first draw order,
//!   image or placeholder per picture and a decorative floor for galleries
//! - **Pluggable surfaces**: anything implementing [`rendering::paint::Canvas2d`],
//!   with a recording [`DisplayList`] and a pixel [`RasterCanvas`] built in
//! - **HTTP backend** (default `http` feature): fetch walls, request
//!   arrangements, save walls, discover render targets in HTML pages
//!
//! # Example
//!
//! ```
//! use gallerywall::{PicturePlacement, RenderConfig, WallDescriptor, WallRenderer};
//! use gallerywall::rendering::images::NoImages;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let wall = WallDescriptor::new(1, 900.0, 300.0)
//!     .with_picture("a", PicturePlacement::new(0.0, 0.0, 100.0, 100.0));
//!
//! let renderer = WallRenderer::new(RenderConfig::default(), NoImages);
//! let shot = renderer.render_png(&wall)?;
//! assert_eq!(shot.width, 900);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

pub mod error;
pub use error::{Error, Result};

pub mod arrangement;
pub mod backend;
pub mod chart;
pub mod rendering;
pub mod wall;

// HTTP backend client (reqwest)
#[cfg(feature = "http")]
pub mod client;

// Render target discovery from data attributes in HTML pages
#[cfg(feature = "http")]
pub mod page;

// Async-friendly service (worker-thread-backed)
#[cfg(feature = "http")]
pub mod async_api;

pub use arrangement::{AlgorithmType, ArrangementSession};
pub use backend::WallBackend;
pub use rendering::floor::FloorStyle;
pub use rendering::layout::CanvasTransform;
pub use rendering::paint::{Canvas2d, CanvasRect, Color, DisplayList, PaintCommand, Point};
pub use rendering::raster::RasterCanvas;
pub use rendering::{RenderReport, Screenshot, WallRenderer};
pub use wall::{GalleryId, PicturePlacement, Placements, WallDescriptor, WallId};

#[cfg(feature = "http")]
pub use async_api::WallService;
#[cfg(feature = "http")]
pub use client::HttpBackend;

/// Maximum canvas dimensions a wall is scaled to fit into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 900,
            height: 300,
        }
    }
}

/// Configuration for rendering walls
///
/// The defaults match the wall listing pages: a 900x300 canvas, images
/// enabled, the zero-scale case preserved and one image loader thread per
/// CPU.
///
/// # Examples
///
/// ```
/// let cfg = gallerywall::RenderConfig::default();
/// assert_eq!(cfg.canvas.width, 900);
/// assert!(!cfg.min_scale_one);
/// ```
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Maximum canvas size; the wall is centered inside it
    pub canvas: CanvasSize,
    /// Floor decoration drawn beneath galleries
    pub floor: FloorStyle,
    /// Clamp a zero scale (wall larger than the canvas) up to 1
    pub min_scale_one: bool,
    /// Whether to load picture images at all (placeholders otherwise)
    pub enable_images: bool,
    /// Number of concurrent image loads
    pub image_workers: usize,
    /// Background for raster output (`None` leaves the canvas transparent)
    pub background: Option<Color>,
    /// Seed for the gallery floor jitter; `None` draws from entropy
    pub floor_seed: Option<u64>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasSize::default(),
            floor: FloorStyle::default(),
            min_scale_one: false,
            enable_images: true,
            image_workers: num_cpus::get().max(1),
            background: None,
            floor_seed: None,
        }
    }
}

impl RenderConfig {
    /// Reject configurations the renderer cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(Error::ConfigError(format!(
                "canvas must be non-empty, got {}x{}",
                self.canvas.width, self.canvas.height
            )));
        }
        if !(self.floor.step > 0.0) {
            return Err(Error::ConfigError(format!(
                "floor step must be positive, got {}",
                self.floor.step
            )));
        }
        Ok(())
    }
}

/// Configuration for the HTTP backend client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL the JSON endpoints are resolved against
    pub base_url: String,
    /// User agent string to send with requests
    pub user_agent: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Custom HTTP headers
    pub headers: HashMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/".to_string(),
            user_agent: format!("gallerywall/{}", env!("CARGO_PKG_VERSION")),
            timeout_ms: 30000,
            headers: HashMap::new(),
        }
    }
}
