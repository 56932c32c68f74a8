//! The wall backend contract and the fetch-then-hang helpers built on it

use log::{info, warn};

use crate::arrangement::AlgorithmType;
use crate::rendering::images::ImageLoader;
use crate::rendering::{Screenshot, WallRenderer};
use crate::wall::{GalleryId, WallDescriptor, WallId};
use crate::{CanvasSize, Result};

/// Core trait for wall backends
///
/// The HTTP implementation lives in [`crate::client`]; tests and offline
/// tools can provide in-memory backends.
pub trait WallBackend {
    /// Fetch a wall; `Ok(None)` when the backend does not know it
    fn get_wall(&self, wall_id: WallId) -> Result<Option<WallDescriptor>>;

    /// Fetch a gallery laid out for display; `Ok(None)` when unknown
    fn get_gallery(&self, gallery_id: GalleryId) -> Result<Option<WallDescriptor>>;

    /// Ask the backend to arrange a gallery, returning the new wall's id
    fn arrange(&self, gallery_id: GalleryId, algorithm: AlgorithmType) -> Result<WallId>;

    /// Mark a wall as saved, returning the saved wall's id
    fn save_wall(&self, wall_id: WallId) -> Result<WallId>;
}

impl<B: WallBackend + ?Sized> WallBackend for &B {
    fn get_wall(&self, wall_id: WallId) -> Result<Option<WallDescriptor>> {
        (**self).get_wall(wall_id)
    }

    fn get_gallery(&self, gallery_id: GalleryId) -> Result<Option<WallDescriptor>> {
        (**self).get_gallery(gallery_id)
    }

    fn arrange(&self, gallery_id: GalleryId, algorithm: AlgorithmType) -> Result<WallId> {
        (**self).arrange(gallery_id, algorithm)
    }

    fn save_wall(&self, wall_id: WallId) -> Result<WallId> {
        (**self).save_wall(wall_id)
    }
}

/// Fetch a wall and render it; `Ok(None)` (logged) when the wall is missing.
pub fn hang_wall<B, L>(
    backend: &B,
    renderer: &WallRenderer<L>,
    wall_id: WallId,
    size: Option<CanvasSize>,
) -> Result<Option<Screenshot>>
where
    B: WallBackend + ?Sized,
    L: ImageLoader,
{
    match backend.get_wall(wall_id)? {
        Some(wall) => render(renderer, &wall, size).map(Some),
        None => {
            warn!("wall {} not found; nothing to hang", wall_id);
            Ok(None)
        }
    }
}

/// Fetch a gallery and render it with its floor; `Ok(None)` when missing.
pub fn hang_gallery<B, L>(
    backend: &B,
    renderer: &WallRenderer<L>,
    gallery_id: GalleryId,
    size: Option<CanvasSize>,
) -> Result<Option<Screenshot>>
where
    B: WallBackend + ?Sized,
    L: ImageLoader,
{
    match backend.get_gallery(gallery_id)? {
        Some(gallery) => render(renderer, &gallery, size).map(Some),
        None => {
            warn!("gallery {} not found; nothing to hang", gallery_id);
            Ok(None)
        }
    }
}

fn render<L: ImageLoader>(renderer: &WallRenderer<L>, wall: &WallDescriptor, size: Option<CanvasSize>) -> Result<Screenshot> {
    let size = size.unwrap_or(renderer.config().canvas);
    let shot = renderer.render_png_sized(wall, size)?;
    info!(
        "hung wall {} ({} pictures) on a {}x{} canvas",
        wall.id,
        wall.pictures_to_hang.len(),
        size.width,
        size.height
    );
    Ok(shot)
}
