//! Error types for overlay decoding.

use thiserror::Error;

/// Errors that can occur while turning a GeoTIFF into an overlay.
#[derive(Error, Debug)]
pub enum OverlayError {
    /// The raster resource could not be fetched.
    #[error("failed to fetch raster {url}: {message}")]
    Fetch { url: String, message: String },

    /// The TIFF decoder rejected the data.
    #[error("TIFF decode error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// Channel layout or sample format we cannot color map.
    #[error("unsupported raster layout: {0}")]
    UnsupportedLayout(String),

    /// Neither a model transformation nor tiepoint + pixel scale tags.
    #[error("raster has no georeferencing (no ModelTransformation or ModelTiepoint/ModelPixelScale tags)")]
    MissingGeoreference,

    /// Decoded buffers did not match the declared dimensions.
    #[error("invalid raster data: {0}")]
    InvalidData(String),

    /// PNG export failed.
    #[error("image encode error: {0}")]
    Encode(String),

    /// The decode worker pool failed or dropped the job.
    #[error("decode pool error: {0}")]
    Pool(String),
}

impl OverlayError {
    /// Create a Fetch error.
    pub fn fetch(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create an UnsupportedLayout error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedLayout(msg.into())
    }

    /// Create an InvalidData error.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }
}

/// Result type for overlay operations.
pub type Result<T> = std::result::Result<T, OverlayError>;
