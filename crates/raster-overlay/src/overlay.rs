//! GeoTIFF to map overlay pipeline.
//!
//! Stages, each logged at debug level:
//! `Idle → MetadataLoaded → Decoded → ColorMapped → BoundsComputed → Rendered`.
//! Decode and PNG encoding run on the [`DecodePool`]; color mapping runs
//! on the async side in chunks, yielding between them.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::bounds::{compute_bounds, GeoBounds};
use crate::chunked::{colorize_cooperative, ChunkedColorizer};
use crate::colormap::{CategoryPalette, HueRotationPalette, PixelMapper};
use crate::error::{OverlayError, Result};
use crate::png::{encode_png, PngMode};
use crate::pool::DecodePool;
use crate::raster::{decode_tiff, DecodedRaster};
use crate::resample::MAX_OVERLAY_DIMENSION;
use crate::scale::{CalibratedScale, HeuristicScale, ScaleParams, ScaleStrategy};
use crate::source::{open_source, RasterSource};

/// What to do with an overlay once it is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadOptions {
    /// Put the overlay on the map surface as soon as it is ready.
    pub attach: bool,
    /// Report a loading indicator while the load is in flight.
    pub show_spinner: bool,
}

impl LoadOptions {
    /// User initiated: attach and show the spinner.
    pub fn interactive() -> Self {
        Self {
            attach: true,
            show_spinner: true,
        }
    }

    /// Background pre-warm: keep detached, no spinner.
    pub fn prewarm() -> Self {
        Self::default()
    }
}

/// Pipeline stage, used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStage {
    Idle,
    MetadataLoaded,
    Decoded,
    ColorMapped,
    BoundsComputed,
    Rendered,
}

impl fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DecodeStage::Idle => "idle",
            DecodeStage::MetadataLoaded => "metadata_loaded",
            DecodeStage::Decoded => "decoded",
            DecodeStage::ColorMapped => "color_mapped",
            DecodeStage::BoundsComputed => "bounds_computed",
            DecodeStage::Rendered => "rendered",
        };
        f.write_str(name)
    }
}

/// Color-mapped RGBA pixels with their geographic extent.
#[derive(Debug, Clone)]
pub struct DecodedOverlay {
    /// RGBA, 4 bytes per pixel, row major.
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub source_width: u32,
    pub source_height: u32,
    pub bounds: GeoBounds,
}

impl DecodedOverlay {
    /// RGBA of the pixel at (`x`, `y`).
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([self.rgba[i], self.rgba[i + 1], self.rgba[i + 2], self.rgba[i + 3]])
    }
}

/// A PNG overlay ready for a map surface.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedOverlay {
    #[serde(skip)]
    pub png: Bytes,
    #[serde(skip)]
    pub png_mode: Option<PngMode>,
    pub width: u32,
    pub height: u32,
    pub bounds: GeoBounds,
    pub loaded_at: DateTime<Utc>,
}

/// Decodes GeoTIFFs into overlays.
///
/// Cheap to share behind an `Arc`; the decode pool is reused across
/// every decode.
pub struct OverlayDecoder {
    pool: Arc<DecodePool>,
    client: reqwest::Client,
    max_dimension: u32,
    palette: Arc<dyn CategoryPalette>,
    scale: Arc<dyn ScaleStrategy>,
}

impl OverlayDecoder {
    pub fn new(pool: Arc<DecodePool>) -> Self {
        Self {
            pool,
            client: reqwest::Client::new(),
            max_dimension: MAX_OVERLAY_DIMENSION,
            palette: Arc::new(HueRotationPalette::default()),
            scale: Arc::new(HeuristicScale::default()),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension.max(1);
        self
    }

    pub fn with_palette(mut self, palette: Arc<dyn CategoryPalette>) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_scale_strategy(mut self, scale: Arc<dyn ScaleStrategy>) -> Self {
        self.scale = scale;
        self
    }

    pub fn pool(&self) -> &DecodePool {
        &self.pool
    }

    /// Fetch and decode the raster at `url`.
    pub async fn decode(&self, url: &str) -> Result<DecodedOverlay> {
        let source = open_source(url, &self.client);
        self.decode_source(source.as_ref()).await
    }

    pub async fn decode_source(&self, source: &dyn RasterSource) -> Result<DecodedOverlay> {
        debug!(source = %source.location(), stage = %DecodeStage::Idle, "Fetching raster");
        let bytes = source.fetch().await?;
        debug!(
            source = %source.location(),
            bytes = bytes.len(),
            "Raster fetched"
        );
        self.decode_bytes(bytes).await
    }

    /// Decode an in-memory GeoTIFF.
    pub async fn decode_bytes(&self, bytes: Bytes) -> Result<DecodedOverlay> {
        let max_dim = self.max_dimension;
        let raster = self.pool.run(move || decode_tiff(&bytes, max_dim)).await?;
        debug!(
            stage = %DecodeStage::MetadataLoaded,
            width = raster.metadata.width,
            height = raster.metadata.height,
            "Metadata loaded"
        );
        debug!(
            stage = %DecodeStage::Decoded,
            width = raster.width,
            height = raster.height,
            channels = raster.channels,
            sample_type = ?raster.sample_type,
            downsampled = raster.was_downsampled(),
            "Samples decoded"
        );

        let mapper = self.mapper_for(&raster)?;
        let rgba =
            colorize_cooperative(ChunkedColorizer::new(&raster.samples, raster.channels, &mapper))
                .await;
        debug!(stage = %DecodeStage::ColorMapped, mapper = ?mapper, "Pixels color mapped");

        let bounds = compute_bounds(&raster.metadata)?;
        debug!(stage = %DecodeStage::BoundsComputed, bounds = ?bounds, "Bounds computed");

        Ok(DecodedOverlay {
            rgba,
            width: raster.width,
            height: raster.height,
            source_width: raster.metadata.width,
            source_height: raster.metadata.height,
            bounds,
        })
    }

    /// Decode and encode to PNG.
    pub async fn render(&self, url: &str) -> Result<RenderedOverlay> {
        let started = Instant::now();
        let result = match self.decode(url).await {
            Ok(decoded) => self.encode(decoded).await,
            Err(e) => Err(e),
        };

        let elapsed = started.elapsed();
        metrics::histogram!("overlay_decode_duration_seconds").record(elapsed.as_secs_f64());
        match &result {
            Ok(overlay) => {
                metrics::counter!("overlay_decodes_total").increment(1);
                info!(
                    source = %url,
                    width = overlay.width,
                    height = overlay.height,
                    png_bytes = overlay.png.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Overlay rendered"
                );
            }
            Err(e) => {
                metrics::counter!("overlay_decode_failures_total").increment(1);
                warn!(source = %url, error = %e, "Overlay render failed");
            }
        }
        result
    }

    /// Encode a decoded overlay as PNG on the pool.
    pub async fn encode(&self, decoded: DecodedOverlay) -> Result<RenderedOverlay> {
        let DecodedOverlay {
            rgba,
            width,
            height,
            bounds,
            ..
        } = decoded;

        let (png, mode) = self
            .pool
            .run(move || encode_png(&rgba, width as usize, height as usize))
            .await?;
        debug!(stage = %DecodeStage::Rendered, mode = ?mode, bytes = png.len(), "PNG encoded");

        Ok(RenderedOverlay {
            png: Bytes::from(png),
            png_mode: Some(mode),
            width,
            height,
            bounds,
            loaded_at: Utc::now(),
        })
    }

    fn mapper_for(&self, raster: &DecodedRaster) -> Result<PixelMapper> {
        match raster.channels {
            1 | 2 => Ok(PixelMapper::Categorical {
                nodata: raster.metadata.nodata,
                palette: Arc::clone(&self.palette),
            }),
            n if n >= 3 => Ok(PixelMapper::Passthrough {
                scale: self.scale_for(raster),
                has_alpha: n >= 4,
            }),
            n => Err(OverlayError::unsupported(format!("{} channels", n))),
        }
    }

    fn scale_for(&self, raster: &DecodedRaster) -> ScaleParams {
        match raster.metadata.statistics {
            Some((min, max)) if !raster.sample_type.is_8bit() => {
                CalibratedScale { min, max }.infer_scale(&raster.samples, raster.sample_type)
            }
            _ => self.scale.infer_scale(&raster.samples, raster.sample_type),
        }
    }
}

impl fmt::Debug for OverlayDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayDecoder")
            .field("pool", &self.pool)
            .field("max_dimension", &self.max_dimension)
            .finish_non_exhaustive()
    }
}
