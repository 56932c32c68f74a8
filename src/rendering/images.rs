//! Picture image loading.
//!
//! A picture's `image` field is resolved to pixels by an [`ImageLoader`].
//! [`SourceLoader`] understands `data:` URLs, `file://` URLs and plain paths,
//! and (with the `http` feature) absolute or backend-relative HTTP URLs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use base64::Engine as _;
use image::RgbaImage;

use crate::{Error, Result};

/// Resolves an image source to decoded RGBA pixels
pub trait ImageLoader: Send + Sync {
    fn load(&self, source: &str) -> Result<RgbaImage>;
}

impl<L: ImageLoader + ?Sized> ImageLoader for &L {
    fn load(&self, source: &str) -> Result<RgbaImage> {
        (**self).load(source)
    }
}

impl<L: ImageLoader + ?Sized> ImageLoader for Box<L> {
    fn load(&self, source: &str) -> Result<RgbaImage> {
        (**self).load(source)
    }
}

/// Loader that never produces an image; every picture becomes a placeholder
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImages;

impl ImageLoader for NoImages {
    fn load(&self, source: &str) -> Result<RgbaImage> {
        Err(Error::LoadError(format!("image loading disabled: {}", source)))
    }
}

/// Default loader for picture sources.
///
/// Resolution order: `data:` URL, `file://` URL, absolute `http(s)://` URL,
/// then either a URL relative to the backend (when built with
/// [`SourceLoader::with_http`]) or a filesystem path.
#[derive(Debug, Clone, Default)]
pub struct SourceLoader {
    #[cfg(feature = "http")]
    http: Option<(reqwest::blocking::Client, url::Url)>,
}

impl SourceLoader {
    /// Loader for local sources only
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader that fetches remote sources with `client`, resolving relative
    /// sources against `base`.
    #[cfg(feature = "http")]
    pub fn with_http(client: reqwest::blocking::Client, base: url::Url) -> Self {
        Self {
            http: Some((client, base)),
        }
    }

    fn is_http_url(source: &str) -> bool {
        source.starts_with("http://") || source.starts_with("https://")
    }

    #[cfg(feature = "http")]
    fn fetch(&self, source: &str) -> Result<Option<Vec<u8>>> {
        let Some((client, base)) = &self.http else {
            return Ok(None);
        };
        let url = base
            .join(source)
            .map_err(|e| Error::LoadError(format!("Bad image URL {}: {}", source, e)))?;
        let resp = client
            .get(url.clone())
            .send()
            .map_err(|e| Error::NetworkError(format!("Failed to fetch {}: {}", url, e)))?;
        if !resp.status().is_success() {
            return Err(Error::NetworkError(format!("{} returned {}", url, resp.status())));
        }
        let bytes = resp
            .bytes()
            .map_err(|e| Error::NetworkError(format!("Failed to read {}: {}", url, e)))?;
        Ok(Some(bytes.to_vec()))
    }

    #[cfg(not(feature = "http"))]
    fn fetch(&self, _source: &str) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }

    fn read_bytes(&self, source: &str) -> Result<Vec<u8>> {
        if let Some(rest) = source.strip_prefix("data:") {
            return decode_data_url(rest);
        }
        if let Some(path) = source.strip_prefix("file://") {
            return read_file(path);
        }
        if let Some(bytes) = self.fetch(source)? {
            return Ok(bytes);
        }
        if Self::is_http_url(source) {
            return Err(Error::LoadError(format!(
                "no HTTP client available for {}",
                source
            )));
        }
        read_file(source)
    }
}

impl ImageLoader for SourceLoader {
    fn load(&self, source: &str) -> Result<RgbaImage> {
        let bytes = self.read_bytes(source)?;
        decode(&bytes)
    }
}

/// Decode encoded image bytes (PNG, JPEG, BMP) into RGBA
pub fn decode(bytes: &[u8]) -> Result<RgbaImage> {
    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgba8())
}

fn read_file(path: &str) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| Error::LoadError(format!("Failed to read {}: {}", path, e)))
}

/// Payload of a `data:[<mime>];base64,<data>` URL (prefix already stripped)
fn decode_data_url(rest: &str) -> Result<Vec<u8>> {
    let (meta, data) = rest
        .split_once(',')
        .ok_or_else(|| Error::LoadError("data URL without payload".into()))?;
    if !meta.ends_with(";base64") {
        return Err(Error::LoadError(format!(
            "unsupported data URL encoding: {}",
            meta
        )));
    }
    base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .map_err(|e| Error::LoadError(format!("Invalid base64 in data URL: {}", e)))
}

/// Load every source with up to `workers` concurrent loads.
///
/// Results come back in the order of `sources`, whatever order the loads
/// finish in.
pub fn load_all<L: ImageLoader + ?Sized>(loader: &L, sources: &[&str], workers: usize) -> Vec<Result<RgbaImage>> {
    let workers = workers.max(1).min(sources.len());
    if workers <= 1 {
        return sources.iter().map(|s| loader.load(s)).collect();
    }

    let next = AtomicUsize::new(0);
    let slots: Vec<Mutex<Option<Result<RgbaImage>>>> = sources.iter().map(|_| Mutex::new(None)).collect();

    std::thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                let i = next.fetch_add(1, Ordering::SeqCst);
                let Some(source) = sources.get(i) else {
                    break;
                };
                let res = loader.load(source);
                if let Ok(mut slot) = slots[i].lock() {
                    *slot = Some(res);
                }
            });
        }
    });

    slots
        .into_iter()
        .zip(sources)
        .map(|(slot, source)| {
            slot.into_inner()
                .ok()
                .flatten()
                .unwrap_or_else(|| Err(Error::LoadError(format!("load of {} did not complete", source))))
        })
        .collect()
}
