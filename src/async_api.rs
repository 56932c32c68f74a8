use crate::arrangement::AlgorithmType;
use crate::backend::{hang_gallery, hang_wall, WallBackend};
use crate::client::HttpBackend;
use crate::rendering::images::SourceLoader;
use crate::rendering::{Screenshot, WallRenderer};
use crate::wall::{GalleryId, WallId};
use crate::{CanvasSize, ClientConfig, Error, RenderConfig, Result};
use std::sync::mpsc::{self, Sender};
use std::thread;
use tokio::sync::oneshot;

type Reply<T> = oneshot::Sender<Result<T>>;

enum Command {
    RenderWall(WallId, Option<CanvasSize>, Reply<Option<Screenshot>>),
    RenderGallery(GalleryId, Option<CanvasSize>, Reply<Option<Screenshot>>),
    Arrange(GalleryId, AlgorithmType, Reply<WallId>),
    Save(WallId, Reply<WallId>),
    Close(Reply<()>),
}

/// An async-friendly wall service backed by a dedicated worker thread.
///
/// The worker thread owns the blocking [`HttpBackend`] and the renderer, and
/// executes commands sent from async tasks one at a time.
#[derive(Clone)]
pub struct WallService {
    cmd_tx: Sender<Command>,
}

impl WallService {
    /// Create a new service (spawns the background thread that owns the backend).
    pub async fn new(client: Option<ClientConfig>, render: Option<RenderConfig>) -> Result<Self> {
        let client = client.unwrap_or_default();
        let render = render.unwrap_or_default();

        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx) = oneshot::channel::<Result<()>>();

        thread::spawn(move || {
            let setup = render.validate().and_then(|_| HttpBackend::new(client));
            let backend = match setup {
                Ok(b) => b,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };
            let renderer: WallRenderer<SourceLoader> = WallRenderer::new(render, backend.image_loader());

            let _ = init_tx.send(Ok(()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::RenderWall(id, size, resp) => {
                        let _ = resp.send(hang_wall(&backend, &renderer, id, size));
                    }
                    Command::RenderGallery(id, size, resp) => {
                        let _ = resp.send(hang_gallery(&backend, &renderer, id, size));
                    }
                    Command::Arrange(gallery_id, algorithm, resp) => {
                        let _ = resp.send(backend.arrange(gallery_id, algorithm));
                    }
                    Command::Save(wall_id, resp) => {
                        let _ = resp.send(backend.save_wall(wall_id));
                    }
                    Command::Close(resp) => {
                        let _ = resp.send(Ok(()));
                        break;
                    }
                }
            }
            log::debug!("wall service worker stopped");
        });

        init_rx
            .await
            .map_err(|e| Error::Other(format!("Worker init canceled: {}", e)))??;

        Ok(Self { cmd_tx })
    }

    async fn call<T>(&self, what: &str, make: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .map_err(|_| Error::Other(format!("{} failed: service is closed", what)))?;
        rx.await
            .map_err(|e| Error::Other(format!("{} canceled: {}", what, e)))?
    }

    /// Fetch and render a wall; `None` when the backend does not know it
    pub async fn render_wall(&self, wall_id: WallId, size: Option<CanvasSize>) -> Result<Option<Screenshot>> {
        self.call("Render wall", |tx| Command::RenderWall(wall_id, size, tx)).await
    }

    /// Fetch and render a gallery with its floor
    pub async fn render_gallery(&self, gallery_id: GalleryId, size: Option<CanvasSize>) -> Result<Option<Screenshot>> {
        self.call("Render gallery", |tx| Command::RenderGallery(gallery_id, size, tx)).await
    }

    /// Render several walls; results keep the order of `wall_ids`
    pub async fn render_walls(&self, wall_ids: &[WallId], size: Option<CanvasSize>) -> Vec<Result<Option<Screenshot>>> {
        futures::future::join_all(wall_ids.iter().map(|&id| self.render_wall(id, size))).await
    }

    pub async fn arrange(&self, gallery_id: GalleryId, algorithm: AlgorithmType) -> Result<WallId> {
        self.call("Arrange", |tx| Command::Arrange(gallery_id, algorithm, tx)).await
    }

    pub async fn save_wall(&self, wall_id: WallId) -> Result<WallId> {
        self.call("Save", |tx| Command::Save(wall_id, tx)).await
    }

    /// Shut down the background worker.
    pub async fn close(self) -> Result<()> {
        self.call("Close", Command::Close).await
    }
}
