//! Value-to-byte scaling for multi-band imagery.
//!
//! Scaling is a pluggable [`ScaleStrategy`]: the default
//! [`HeuristicScale`] guesses a range from the sample type and a strided
//! sample of the data, while [`CalibratedScale`] uses a known min/max
//! (e.g. GDAL band statistics).

use crate::raster::SampleType;

/// Number of values inspected by the float range heuristic.
pub const FLOAT_SAMPLE_TARGET: usize = 20_000;

/// Linear map `byte = clamp(round((v - offset) * factor), 0, 255)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleParams {
    pub offset: f64,
    pub factor: f64,
}

impl ScaleParams {
    pub const IDENTITY: ScaleParams = ScaleParams {
        offset: 0.0,
        factor: 1.0,
    };

    /// Map `[0, max]` onto `[0, 255]`.
    pub fn from_max(max: f64) -> Self {
        if max > 0.0 && max.is_finite() {
            Self {
                offset: 0.0,
                factor: 255.0 / max,
            }
        } else {
            Self::IDENTITY
        }
    }

    #[inline]
    pub fn apply(&self, value: f64) -> u8 {
        if !value.is_finite() {
            return 0;
        }
        ((value - self.offset) * self.factor).round().clamp(0.0, 255.0) as u8
    }
}

/// Chooses how raw samples are scaled to bytes.
pub trait ScaleStrategy: Send + Sync {
    fn infer_scale(&self, samples: &[f64], sample_type: SampleType) -> ScaleParams;
}

/// Range guess from the sample type, falling back to a strided data scan
/// for floats.
///
/// - 8-bit types pass through.
/// - Wider integers scale from the type's maximum value.
/// - Floats: observed max ≤ 1 means `[0, 1]` data (×255), ≤ 255 passes
///   through, anything larger scales from the observed max.
#[derive(Debug, Clone, Copy)]
pub struct HeuristicScale {
    pub sample_target: usize,
}

impl Default for HeuristicScale {
    fn default() -> Self {
        Self {
            sample_target: FLOAT_SAMPLE_TARGET,
        }
    }
}

impl ScaleStrategy for HeuristicScale {
    fn infer_scale(&self, samples: &[f64], sample_type: SampleType) -> ScaleParams {
        if sample_type.is_8bit() {
            return ScaleParams::IDENTITY;
        }
        if let Some(max) = sample_type.max_value() {
            return ScaleParams::from_max(max);
        }

        let stride = (samples.len() / self.sample_target.max(1)).max(1);
        let observed_max = samples
            .iter()
            .step_by(stride)
            .copied()
            .filter(|v| v.is_finite())
            .fold(f64::NEG_INFINITY, f64::max);

        if !observed_max.is_finite() {
            ScaleParams::IDENTITY
        } else if observed_max <= 1.0 {
            ScaleParams {
                offset: 0.0,
                factor: 255.0,
            }
        } else if observed_max <= 255.0 {
            ScaleParams::IDENTITY
        } else {
            ScaleParams::from_max(observed_max)
        }
    }
}

/// Exact calibration from known band statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibratedScale {
    pub min: f64,
    pub max: f64,
}

impl ScaleStrategy for CalibratedScale {
    fn infer_scale(&self, _samples: &[f64], _sample_type: SampleType) -> ScaleParams {
        let range = self.max - self.min;
        if range > 0.0 && range.is_finite() {
            ScaleParams {
                offset: self.min,
                factor: 255.0 / range,
            }
        } else {
            ScaleParams::IDENTITY
        }
    }
}
