//! Geographic extent of a georeferenced raster.

use serde::Serialize;

use crate::error::{OverlayError, Result};
use crate::metadata::RasterMetadata;

/// Lat/lng bounding box of an overlay, in the raster's model CRS
/// (degrees for the EPSG:4326 rasters this crate serves).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
}

impl GeoBounds {
    /// `[[south, west], [north, east]]`, the corner-pair form map clients
    /// take for image overlays.
    pub fn corners(&self) -> [[f64; 2]; 2] {
        [[self.min_lat, self.min_lng], [self.max_lat, self.max_lng]]
    }

    pub fn width_degrees(&self) -> f64 {
        self.max_lng - self.min_lng
    }

    pub fn height_degrees(&self) -> f64 {
        self.max_lat - self.min_lat
    }
}

/// Compute bounds from the source raster's georeferencing tags.
///
/// ModelTransformation wins when present. Otherwise the first tiepoint
/// anchors the image and ModelPixelScale spans it. Source dimensions are
/// used, so downsampling never changes the extent.
pub fn compute_bounds(metadata: &RasterMetadata) -> Result<GeoBounds> {
    let width = metadata.width as f64;
    let height = metadata.height as f64;

    if let Some(m) = metadata.transformation {
        // x = m0*i + m1*j + m3, y = m4*i + m5*j + m7
        let corners = [(0.0, 0.0), (width, 0.0), (0.0, height), (width, height)]
            .map(|(i, j)| (m[0] * i + m[1] * j + m[3], m[4] * i + m[5] * j + m[7]));
        return Ok(enclose(&corners));
    }

    let (Some(tie), Some(scale)) = (metadata.tiepoint, metadata.pixel_scale) else {
        return Err(OverlayError::MissingGeoreference);
    };

    let [i, j, _, x, y, _] = tie;
    let [sx, sy, _] = scale;
    let min_lng = x - i * sx;
    let max_lat = y + j * sy;

    Ok(GeoBounds {
        min_lat: max_lat - height * sy,
        min_lng,
        max_lat,
        max_lng: min_lng + width * sx,
    })
}

fn enclose(points: &[(f64, f64)]) -> GeoBounds {
    let mut bounds = GeoBounds {
        min_lat: f64::INFINITY,
        min_lng: f64::INFINITY,
        max_lat: f64::NEG_INFINITY,
        max_lng: f64::NEG_INFINITY,
    };
    for &(lng, lat) in points {
        bounds.min_lat = bounds.min_lat.min(lat);
        bounds.max_lat = bounds.max_lat.max(lat);
        bounds.min_lng = bounds.min_lng.min(lng);
        bounds.max_lng = bounds.max_lng.max(lng);
    }
    bounds
}
