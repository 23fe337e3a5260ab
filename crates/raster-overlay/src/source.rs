//! Raster byte sources.
//!
//! A source is addressed by a URL-like string:
//! - `http://` / `https://` fetched with reqwest
//! - `file://` or a bare path read from the local filesystem

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::error::{OverlayError, Result};

/// Something that can produce the full bytes of one GeoTIFF.
#[async_trait]
pub trait RasterSource: Send + Sync {
    /// Fetch the complete resource.
    async fn fetch(&self) -> Result<Bytes>;

    /// Human-readable location for logs and errors.
    fn location(&self) -> String;
}

/// GeoTIFF served over HTTP(S).
pub struct HttpRasterSource {
    client: reqwest::Client,
    url: String,
}

impl HttpRasterSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl RasterSource for HttpRasterSource {
    async fn fetch(&self) -> Result<Bytes> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| OverlayError::fetch(&self.url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OverlayError::fetch(&self.url, format!("HTTP {}", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| OverlayError::fetch(&self.url, e))?;

        debug!(url = %self.url, bytes = bytes.len(), "Fetched raster over HTTP");
        Ok(bytes)
    }

    fn location(&self) -> String {
        self.url.clone()
    }
}

/// GeoTIFF on the local filesystem.
pub struct FileRasterSource {
    path: PathBuf,
}

impl FileRasterSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RasterSource for FileRasterSource {
    async fn fetch(&self) -> Result<Bytes> {
        let data = tokio::fs::read(&self.path)
            .await
            .map_err(|e| OverlayError::fetch(self.path.display().to_string(), e))?;
        debug!(path = %self.path.display(), bytes = data.len(), "Read raster from disk");
        Ok(Bytes::from(data))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Already-loaded bytes, mostly for tests and pre-fetched data.
pub struct MemoryRasterSource {
    name: String,
    data: Bytes,
}

impl MemoryRasterSource {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

#[async_trait]
impl RasterSource for MemoryRasterSource {
    async fn fetch(&self) -> Result<Bytes> {
        Ok(self.data.clone())
    }

    fn location(&self) -> String {
        format!("memory:{}", self.name)
    }
}

/// Pick a source implementation for a URL-like string.
pub fn open_source(url: &str, client: &reqwest::Client) -> Box<dyn RasterSource> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Box::new(HttpRasterSource::new(client.clone(), url))
    } else if let Some(path) = url.strip_prefix("file://") {
        Box::new(FileRasterSource::new(path))
    } else {
        Box::new(FileRasterSource::new(url))
    }
}
