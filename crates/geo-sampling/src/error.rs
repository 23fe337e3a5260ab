//! Payload validation errors.

use thiserror::Error;

/// Errors raised while turning a request body into a [`crate::ShapeSpec`].
///
/// The samplers themselves never validate; these are produced by the
/// parsing layer in [`crate::shape`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Invalid rectangle payload: expected {{ ne:[lat,lng], sw:[lat,lng] }}")]
    InvalidRectangle,

    #[error("Invalid circle payload: expected {{ center:[lat,lng], radius:number }}")]
    InvalidCircle,

    #[error("Invalid polygon payload: expected {{ points:[[lat,lng], ...] }} with >= 3 vertices")]
    InvalidPolygon,

    #[error("Unsupported shape: {0}")]
    UnsupportedShape(String),
}

impl PayloadError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            PayloadError::UnsupportedShape(_) => 404,
            _ => 400,
        }
    }
}
