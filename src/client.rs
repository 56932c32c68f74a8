//! Blocking HTTP client for the wall backend's JSON endpoints

use std::time::Duration;

use log::{debug, info};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use url::Url;

use crate::arrangement::AlgorithmType;
use crate::backend::WallBackend;
use crate::chart::{BarChartData, TimePlots};
use crate::rendering::images::SourceLoader;
use crate::wall::{GalleryId, WallDescriptor, WallId};
use crate::{ClientConfig, Error, Result};

#[derive(Deserialize)]
struct ArrangeReply {
    id: Option<WallId>,
}

#[derive(Deserialize)]
struct SaveReply {
    wall_id: WallId,
}

/// [`WallBackend`] talking to the web application over HTTP
pub struct HttpBackend {
    client: Client,
    base: Url,
    config: ClientConfig,
}

impl HttpBackend {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut base_url = config.base_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let base = Url::parse(&base_url)
            .map_err(|e| Error::ConfigError(format!("Invalid base URL {}: {}", config.base_url, e)))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::ConfigError(format!("Invalid header name {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::ConfigError(format!("Invalid value for header {}: {}", name, e)))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolve an endpoint path against the base URL
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| Error::ConfigError(format!("Invalid endpoint {}: {}", path, e)))
    }

    /// Image loader that fetches relative sources from this backend
    pub fn image_loader(&self) -> SourceLoader {
        SourceLoader::with_http(self.client.clone(), self.base.clone())
    }

    fn checked(url: &Url, resp: reqwest::Result<Response>) -> Result<String> {
        let resp = resp.map_err(|e| Error::NetworkError(format!("Failed to fetch {}: {}", url, e)))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::NetworkError(format!("{} returned {}", url, status)));
        }
        resp.text()
            .map_err(|e| Error::NetworkError(format!("Failed to read response body from {}: {}", url, e)))
    }

    /// GET `path` with query parameters and return the body
    pub fn get_text(&self, path: &str, query: &[(&str, String)]) -> Result<String> {
        let url = self.endpoint(path)?;
        debug!("GET {} {:?}", url, query);
        Self::checked(&url, self.client.get(url.clone()).query(query).send())
    }

    /// POST a urlencoded form to `path` and return the body
    pub fn post_form(&self, path: &str, form: &[(&str, String)]) -> Result<String> {
        let url = self.endpoint(path)?;
        debug!("POST {} {:?}", url, form);
        Self::checked(&url, self.client.post(url.clone()).form(form).send())
    }

    /// Fetch an HTML page (absolute URL or relative to the base)
    pub fn fetch_page(&self, path: &str) -> Result<String> {
        let url = self.endpoint(path)?;
        Self::checked(&url, self.client.get(url.clone()).send())
    }

    /// Daily time totals for the overview chart
    pub fn get_time_chart(&self) -> Result<BarChartData> {
        let body = self.get_text("gettime.json", &[])?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Per-type spark charts
    pub fn get_time_plots(&self) -> Result<TimePlots> {
        let body = self.get_text("gettimespark.json", &[])?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl WallBackend for HttpBackend {
    fn get_wall(&self, wall_id: WallId) -> Result<Option<WallDescriptor>> {
        let body = self.get_text("getwall.json", &[("wallid", wall_id.to_string())])?;
        WallDescriptor::from_payload(&body)
    }

    fn get_gallery(&self, gallery_id: GalleryId) -> Result<Option<WallDescriptor>> {
        let body = self.get_text("getgallery.json", &[("galleryid", gallery_id.to_string())])?;
        // Galleries always render with their floor, whatever the payload says.
        Ok(WallDescriptor::from_payload(&body)?.map(WallDescriptor::as_gallery))
    }

    fn arrange(&self, gallery_id: GalleryId, algorithm: AlgorithmType) -> Result<WallId> {
        let body = self.post_form(
            "arrange.json",
            &[
                ("gallery_id", gallery_id.to_string()),
                ("algorithm_type", algorithm.to_string()),
            ],
        )?;
        let reply: ArrangeReply = serde_json::from_str(&body)?;
        let wall_id = reply
            .id
            .ok_or_else(|| Error::DecodeError(format!("arrange.json returned no wall for gallery {}", gallery_id)))?;
        info!("backend arranged gallery {} ({}) into wall {}", gallery_id, algorithm, wall_id);
        Ok(wall_id)
    }

    fn save_wall(&self, wall_id: WallId) -> Result<WallId> {
        let body = self.post_form("save-wall.json", &[("wall_id", wall_id.to_string())])?;
        let reply: SaveReply = serde_json::from_str(&body)?;
        Ok(reply.wall_id)
    }
}
