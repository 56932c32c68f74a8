//! Wall rendering pipeline
//!
//! [`WallRenderer`] takes a [`WallDescriptor`] through four steps:
//! scale-to-fit ([`layout::CanvasTransform`]), tallest-first draw order
//! ([`layout::hang_order`]), the optional gallery floor ([`floor`]) and one
//! image or placeholder per picture ([`paint`]).
//!
//! Image loads run concurrently but painting waits for all of them and then
//! proceeds strictly in draw order, so the final stacking never depends on
//! which image arrived first.

pub mod floor;
pub mod images;
pub mod layout;
pub mod paint;
pub mod raster;

use std::sync::Arc;

use image::RgbaImage;
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

use crate::wall::WallDescriptor;
use crate::{CanvasSize, Error, RenderConfig, Result};

use self::images::ImageLoader;
use self::layout::{hang_order, CanvasTransform};
use self::paint::{paint_placeholder, Canvas2d};
use self::raster::RasterCanvas;

/// An encoded PNG render
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
}

impl Screenshot {
    /// Hex SHA-256 of the PNG bytes, used for golden comparisons
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(&self.png_data))
    }
}

/// What a render did, for logging and tests
#[derive(Debug, Clone, PartialEq)]
pub struct RenderReport {
    pub transform: CanvasTransform,
    /// Picture keys in the order they were painted
    pub order: Vec<String>,
    /// Height of the floor baseline, when a floor was drawn
    pub floor_y: Option<f64>,
    pub images_drawn: usize,
    pub placeholders_drawn: usize,
}

/// Paints walls onto a [`Canvas2d`]
pub struct WallRenderer<L: ImageLoader> {
    config: RenderConfig,
    loader: L,
}

impl<L: ImageLoader> WallRenderer<L> {
    pub fn new(config: RenderConfig, loader: L) -> Self {
        Self { config, loader }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Paint `wall` onto `canvas` using the configured canvas size.
    ///
    /// The canvas is not cleared first.
    pub fn paint<C: Canvas2d + ?Sized>(&self, wall: &WallDescriptor, canvas: &mut C) -> Result<RenderReport> {
        self.paint_with(wall, self.config.canvas, canvas, &mut self.floor_rng())
    }

    /// Floor randomness: seeded from `floor_seed` when set
    pub fn floor_rng(&self) -> StdRng {
        match self.config.floor_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Paint with an explicit canvas size and floor randomness
    pub fn paint_with<C, R>(&self, wall: &WallDescriptor, size: CanvasSize, canvas: &mut C, rng: &mut R) -> Result<RenderReport>
    where
        C: Canvas2d + ?Sized,
        R: Rng + ?Sized,
    {
        self.config.validate()?;
        wall.validate()?;

        let mut transform = CanvasTransform::fit(wall.width, wall.height, size);
        if self.config.min_scale_one {
            transform = transform.at_least_one(wall.width, wall.height, size);
        }
        if transform.scale == 0 {
            warn!(
                "wall {} ({}x{}) does not fit a {}x{} canvas; pictures render empty",
                wall.id, wall.width, wall.height, size.width, size.height
            );
        }

        let order = hang_order(&wall.pictures_to_hang);
        debug!(
            "hanging wall {}: scale {} offset ({}, {}), {} pictures",
            wall.id,
            transform.scale,
            transform.x_offset,
            transform.y_offset,
            order.len()
        );

        let resolved = self.resolve_images(order.iter().map(|(_, p)| p.image.as_deref()));

        let mut floor_y = None;
        if wall.is_gallery {
            if let Some((_, first)) = order.first() {
                let y = transform.floor_y(first);
                floor::paint_floor(canvas, y, &self.config.floor, rng);
                floor_y = Some(y);
            }
        }

        let mut images_drawn = 0;
        let mut placeholders_drawn = 0;
        for ((_, picture), image) in order.iter().zip(&resolved) {
            let rect = transform.apply(picture);
            match image {
                Some(img) => {
                    canvas.draw_image(img, rect);
                    images_drawn += 1;
                }
                None => {
                    paint_placeholder(canvas, rect);
                    placeholders_drawn += 1;
                }
            }
        }

        Ok(RenderReport {
            transform,
            order: order.iter().map(|(k, _)| k.to_string()).collect(),
            floor_y,
            images_drawn,
            placeholders_drawn,
        })
    }

    /// One slot per picture: the loaded image, or `None` for a placeholder.
    fn resolve_images<'a>(&self, sources: impl Iterator<Item = Option<&'a str>>) -> Vec<Option<Arc<RgbaImage>>> {
        let sources: Vec<Option<&str>> = sources.collect();
        let mut resolved: Vec<Option<Arc<RgbaImage>>> = vec![None; sources.len()];
        if !self.config.enable_images {
            return resolved;
        }

        let pending: Vec<(usize, &str)> = sources
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|s| (i, s)))
            .collect();
        let urls: Vec<&str> = pending.iter().map(|(_, s)| *s).collect();
        let loaded = images::load_all(&self.loader, &urls, self.config.image_workers);

        for ((slot, source), res) in pending.into_iter().zip(loaded) {
            match res {
                Ok(img) => resolved[slot] = Some(Arc::new(img)),
                Err(e) => warn!("image {} failed to load, drawing placeholder: {}", source, e),
            }
        }
        resolved
    }

    /// Render `wall` to PNG at the configured canvas size
    pub fn render_png(&self, wall: &WallDescriptor) -> Result<Screenshot> {
        self.render_png_sized(wall, self.config.canvas)
    }

    /// Render `wall` to PNG on a canvas of `size`
    pub fn render_png_sized(&self, wall: &WallDescriptor, size: CanvasSize) -> Result<Screenshot> {
        if size.width == 0 || size.height == 0 {
            return Err(Error::RenderError(format!(
                "cannot render wall {} on an empty {}x{} canvas",
                wall.id, size.width, size.height
            )));
        }
        let mut canvas = RasterCanvas::new(size.width, size.height, self.config.background);
        self.paint_with(wall, size, &mut canvas, &mut self.floor_rng())?;
        canvas.to_screenshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::images::NoImages;
    use crate::rendering::paint::{CanvasRect, Color, DisplayList, PaintCommand};
    use crate::wall::PicturePlacement;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Loader that records requests and succeeds for sources starting with "ok"
    #[derive(Default)]
    struct RecordingLoader {
        requested: Mutex<Vec<String>>,
    }

    impl ImageLoader for RecordingLoader {
        fn load(&self, source: &str) -> Result<RgbaImage> {
            self.requested.lock().unwrap().push(source.to_string());
            if source.starts_with("ok") {
                Ok(RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 255, 255])))
            } else {
                Err(Error::LoadError(source.to_string()))
            }
        }
    }

    fn paint(renderer: &WallRenderer<impl ImageLoader>, wall: &WallDescriptor) -> (DisplayList, RenderReport) {
        let mut list = DisplayList::new();
        let report = renderer
            .paint_with(wall, CanvasSize::default(), &mut list, &mut StdRng::seed_from_u64(3))
            .unwrap();
        (list, report)
    }

    #[test]
    fn single_placeholder_end_to_end() {
        let wall = WallDescriptor::new(1, 900.0, 300.0)
            .with_picture("a", PicturePlacement::new(0.0, 0.0, 100.0, 100.0));
        let loader = RecordingLoader::default();
        let renderer = WallRenderer::new(RenderConfig::default(), &loader);
        let (list, report) = paint(&renderer, &wall);

        let rect = CanvasRect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(
            list.commands,
            vec![
                PaintCommand::FillRect { rect, color: Color::PLACEHOLDER },
                PaintCommand::StrokeRect { rect, color: Color::BLACK, line_width: 2.0 },
            ]
        );
        assert_eq!(list.lines().count(), 0);
        assert!(report.floor_y.is_none());
        assert!(loader.requested.lock().unwrap().is_empty());
    }

    #[test]
    fn floor_only_for_galleries() {
        let wall = WallDescriptor::new(1, 450.0, 150.0)
            .with_picture("a", PicturePlacement::new(10.0, 10.0, 50.0, 100.0));
        let renderer = WallRenderer::new(RenderConfig::default(), NoImages);

        let (list, report) = paint(&renderer, &wall);
        assert_eq!(list.lines().count(), 0);
        assert!(report.floor_y.is_none());

        let (list, report) = paint(&renderer, &wall.clone().as_gallery());
        assert_eq!(list.lines().count(), 129);
        assert_eq!(report.floor_y, Some(10.0 * 2.0 + 100.0 * 2.0 * 0.9));
        // Floor first, pictures painted over it
        assert!(matches!(list.commands[0], PaintCommand::Line { .. }));
        assert!(matches!(list.commands.last(), Some(PaintCommand::StrokeRect { .. })));
    }

    #[test]
    fn empty_gallery_has_no_floor() {
        let renderer = WallRenderer::new(RenderConfig::default(), NoImages);
        let (list, report) = paint(&renderer, &WallDescriptor::new(1, 10.0, 10.0).as_gallery());
        assert!(list.is_empty());
        assert!(report.floor_y.is_none());
    }

    #[test]
    fn failed_images_fall_back_in_draw_order() {
        let wall = WallDescriptor::new(2, 900.0, 300.0)
            .with_picture("short", PicturePlacement::new(0.0, 0.0, 10.0, 10.0).with_image("ok-short"))
            .with_picture("broken", PicturePlacement::new(20.0, 0.0, 10.0, 30.0).with_image("gone"))
            .with_picture("tall", PicturePlacement::new(40.0, 0.0, 10.0, 50.0).with_image("ok-tall"));
        let loader = RecordingLoader::default();
        let config = RenderConfig {
            image_workers: 3,
            ..Default::default()
        };
        let renderer = WallRenderer::new(config, &loader);
        let (list, report) = paint(&renderer, &wall);

        assert_eq!(report.order, vec!["tall", "broken", "short"]);
        assert_eq!(report.images_drawn, 2);
        assert_eq!(report.placeholders_drawn, 1);

        let kinds: Vec<&str> = list
            .commands
            .iter()
            .map(|c| match c {
                PaintCommand::Image { .. } => "image",
                PaintCommand::FillRect { .. } => "fill",
                PaintCommand::StrokeRect { .. } => "stroke",
                PaintCommand::Line { .. } => "line",
            })
            .collect();
        assert_eq!(kinds, vec!["image", "fill", "stroke", "image"]);
        assert_eq!(loader.requested.lock().unwrap().len(), 3);
    }

    /// Loader whose `slow-<ms>` sources take that long; records finish order
    #[derive(Default)]
    struct StaggeredLoader {
        finished: Mutex<Vec<String>>,
    }

    impl ImageLoader for StaggeredLoader {
        fn load(&self, source: &str) -> Result<RgbaImage> {
            let delay: u64 = source.trim_start_matches("slow-").parse().unwrap_or(0);
            std::thread::sleep(Duration::from_millis(delay));
            self.finished.lock().unwrap().push(source.to_string());
            Ok(RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 255, 255])))
        }
    }

    #[test]
    fn paint_order_ignores_load_completion_order() {
        let tall = PicturePlacement::new(0.0, 0.0, 10.0, 50.0).with_image("slow-150");
        let mid = PicturePlacement::new(20.0, 0.0, 10.0, 30.0).with_image("slow-75");
        let short = PicturePlacement::new(40.0, 0.0, 10.0, 10.0).with_image("slow-0");
        let wall = WallDescriptor::new(4, 900.0, 300.0)
            .with_picture("short", short.clone())
            .with_picture("tall", tall.clone())
            .with_picture("mid", mid.clone());
        let loader = StaggeredLoader::default();
        let config = RenderConfig {
            image_workers: 3,
            ..Default::default()
        };
        let renderer = WallRenderer::new(config, &loader);
        let (list, report) = paint(&renderer, &wall);

        // The tallest picture's image arrives last...
        assert_eq!(
            *loader.finished.lock().unwrap(),
            vec!["slow-0", "slow-75", "slow-150"]
        );
        // ...but is still painted first.
        let transform = report.transform;
        let rects: Vec<CanvasRect> = list
            .images()
            .map(|c| match c {
                PaintCommand::Image { rect, .. } => *rect,
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(
            rects,
            vec![transform.apply(&tall), transform.apply(&mid), transform.apply(&short)]
        );
        assert_eq!(report.order, vec!["tall", "mid", "short"]);
    }

    #[test]
    fn oversized_picture_image_is_clipped() {
        let wall = WallDescriptor::new(1, 900.0, 300.0)
            .with_picture("big", PicturePlacement::new(0.0, 0.0, 200_000.0, 200_000.0).with_image("ok-big"));
        let renderer = WallRenderer::new(RenderConfig::default(), RecordingLoader::default());
        let mut canvas = RasterCanvas::new(900, 300, None);
        let report = renderer
            .paint_with(&wall, CanvasSize::default(), &mut canvas, &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(report.images_drawn, 1);
        assert_eq!(canvas.pixel(0, 0), Some(Color::rgb(0, 0, 255)));
        assert_eq!(canvas.pixel(899, 299), Some(Color::rgb(0, 0, 255)));
        assert!(renderer.render_png(&wall).is_ok());
    }

    #[test]
    fn floor_seed_makes_galleries_reproducible() {
        let wall = WallDescriptor::new(1, 450.0, 150.0)
            .as_gallery()
            .with_picture("a", PicturePlacement::new(10.0, 10.0, 50.0, 100.0));
        let seeded = || {
            WallRenderer::new(
                RenderConfig {
                    floor_seed: Some(42),
                    ..Default::default()
                },
                NoImages,
            )
        };
        let a = seeded().render_png(&wall).unwrap();
        let b = seeded().render_png(&wall).unwrap();
        assert_eq!(a.digest(), b.digest());

        let mut first = DisplayList::new();
        let mut second = DisplayList::new();
        seeded().paint(&wall, &mut first).unwrap();
        seeded().paint(&wall, &mut second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn disabled_images_never_load() {
        let wall = WallDescriptor::new(2, 900.0, 300.0)
            .with_picture("a", PicturePlacement::new(0.0, 0.0, 10.0, 10.0).with_image("ok"));
        let loader = RecordingLoader::default();
        let config = RenderConfig {
            enable_images: false,
            ..Default::default()
        };
        let renderer = WallRenderer::new(config, &loader);
        let (_, report) = paint(&renderer, &wall);
        assert_eq!(report.placeholders_drawn, 1);
        assert!(loader.requested.lock().unwrap().is_empty());
    }

    #[test]
    fn zero_scale_is_preserved_by_default() {
        let wall = WallDescriptor::new(3, 1000.0, 300.0)
            .with_picture("a", PicturePlacement::new(0.0, 0.0, 100.0, 100.0));
        let renderer = WallRenderer::new(RenderConfig::default(), NoImages);
        let (list, report) = paint(&renderer, &wall);
        assert_eq!(report.transform.scale, 0);
        match &list.commands[0] {
            PaintCommand::FillRect { rect, .. } => assert!(rect.is_empty()),
            other => panic!("unexpected {:?}", other),
        }

        let clamped = WallRenderer::new(
            RenderConfig {
                min_scale_one: true,
                ..Default::default()
            },
            NoImages,
        );
        let (_, report) = paint(&clamped, &wall);
        assert_eq!(report.transform.scale, 1);
    }

    #[test]
    fn invalid_wall_is_rejected() {
        let renderer = WallRenderer::new(RenderConfig::default(), NoImages);
        let mut list = DisplayList::new();
        let err = renderer.paint(&WallDescriptor::new(1, 0.0, 10.0), &mut list).unwrap_err();
        assert!(matches!(err, Error::InvalidWall(_)));
        assert!(list.is_empty());
    }

    #[test]
    fn png_render_has_expected_size() {
        let wall = WallDescriptor::new(1, 900.0, 300.0)
            .with_picture("a", PicturePlacement::new(0.0, 0.0, 100.0, 100.0));
        let renderer = WallRenderer::new(RenderConfig::default(), NoImages);
        let shot = renderer.render_png(&wall).unwrap();
        assert_eq!((shot.width, shot.height), (900, 300));
        assert_eq!(shot.digest().len(), 64);
        let again = renderer.render_png(&wall).unwrap();
        assert_eq!(shot.digest(), again.digest());

        let empty = renderer.render_png_sized(&wall, CanvasSize { width: 0, height: 10 });
        assert!(matches!(empty, Err(Error::RenderError(_))));
    }
}
