//! Pixel value to RGBA color mapping.
//!
//! Two modes:
//! - **Passthrough** for RGB/RGBA imagery: channels are scaled to bytes
//!   and copied, alpha defaults to [`DEFAULT_ALPHA`].
//! - **Categorical** for single-band rasters: each integer category id
//!   gets a stable color from a [`CategoryPalette`]; NoData, non-finite
//!   and non-positive values render as opaque white (water mask).

use std::sync::Arc;

use crate::scale::ScaleParams;

/// Alpha applied to colored pixels, slightly translucent so the base map
/// shows through.
pub const DEFAULT_ALPHA: u8 = 230;

/// Color of masked (NoData / water) pixels.
pub const WATER: [u8; 4] = [255, 255, 255, 255];

/// Stable mapping from category id to a visually distinct color.
pub trait CategoryPalette: Send + Sync {
    fn color(&self, category: i64) -> [u8; 4];
}

/// Hue rotation palette: `hue = (id * step) mod 360` at fixed saturation
/// and lightness. Adjacent ids land far apart on the color wheel.
#[derive(Debug, Clone, Copy)]
pub struct HueRotationPalette {
    pub hue_step: i64,
    pub saturation: f64,
    pub lightness: f64,
    pub alpha: u8,
}

impl Default for HueRotationPalette {
    fn default() -> Self {
        Self {
            hue_step: 47,
            saturation: 0.80,
            lightness: 0.55,
            alpha: DEFAULT_ALPHA,
        }
    }
}

impl CategoryPalette for HueRotationPalette {
    fn color(&self, category: i64) -> [u8; 4] {
        let hue = category.wrapping_mul(self.hue_step).rem_euclid(360) as f64;
        let (r, g, b) = hsl_to_rgb(hue, self.saturation, self.lightness);
        [r, g, b, self.alpha]
    }
}

/// Convert HSL (hue in degrees, s and l in `[0, 1]`) to 8-bit RGB.
pub fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> (u8, u8, u8) {
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let h = hue.rem_euclid(360.0) / 60.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let m = lightness - c / 2.0;

    let (r1, g1, b1) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let to_byte = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_byte(r1), to_byte(g1), to_byte(b1))
}

/// Per-pixel mapping rule chosen from the raster's channel count.
#[derive(Clone)]
pub enum PixelMapper {
    Passthrough {
        scale: ScaleParams,
        has_alpha: bool,
    },
    Categorical {
        nodata: Option<f64>,
        palette: Arc<dyn CategoryPalette>,
    },
}

impl std::fmt::Debug for PixelMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PixelMapper::Passthrough { scale, has_alpha } => f
                .debug_struct("Passthrough")
                .field("scale", scale)
                .field("has_alpha", has_alpha)
                .finish(),
            PixelMapper::Categorical { nodata, .. } => f
                .debug_struct("Categorical")
                .field("nodata", nodata)
                .finish_non_exhaustive(),
        }
    }
}

impl PixelMapper {
    /// Map one pixel's samples to RGBA.
    #[inline]
    pub fn map_pixel(&self, samples: &[f64]) -> [u8; 4] {
        match self {
            PixelMapper::Passthrough { scale, has_alpha } => {
                let alpha = if *has_alpha {
                    samples.get(3).map(|&a| scale.apply(a)).unwrap_or(DEFAULT_ALPHA)
                } else {
                    DEFAULT_ALPHA
                };
                [
                    scale.apply(samples[0]),
                    scale.apply(samples[1]),
                    scale.apply(samples[2]),
                    alpha,
                ]
            }
            PixelMapper::Categorical { nodata, palette } => {
                let value = samples[0];
                if is_masked(value, *nodata) {
                    WATER
                } else {
                    palette.color(value.round() as i64)
                }
            }
        }
    }
}

/// NoData, non-finite and non-positive values are masked.
#[inline]
pub fn is_masked(value: f64, nodata: Option<f64>) -> bool {
    if !value.is_finite() || value <= 0.0 {
        return true;
    }
    match nodata {
        Some(nd) if nd.is_nan() => false,
        Some(nd) => value == nd,
        None => false,
    }
}
