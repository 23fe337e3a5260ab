//! TIFF sample decoding into a flat `f64` buffer.
//!
//! Decoding reads the primary image, downsamples it to the overlay size
//! limit while the samples are still in their native type, then widens
//! to `f64` for scaling and color mapping.

use std::io::Cursor;

use num_traits::ToPrimitive;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tracing::debug;

use crate::error::{OverlayError, Result};
use crate::metadata::{ChannelLayout, RasterMetadata};
use crate::resample::{resample_nearest, target_dimensions};

/// Sample data type of the decoded raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl SampleType {
    pub fn is_8bit(&self) -> bool {
        matches!(self, SampleType::U8 | SampleType::I8)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, SampleType::F32 | SampleType::F64)
    }

    /// Largest representable value for integer types.
    pub fn max_value(&self) -> Option<f64> {
        match self {
            SampleType::U8 => Some(u8::MAX as f64),
            SampleType::U16 => Some(u16::MAX as f64),
            SampleType::U32 => Some(u32::MAX as f64),
            SampleType::U64 => Some(u64::MAX as f64),
            SampleType::I8 => Some(i8::MAX as f64),
            SampleType::I16 => Some(i16::MAX as f64),
            SampleType::I32 => Some(i32::MAX as f64),
            SampleType::I64 => Some(i64::MAX as f64),
            SampleType::F32 | SampleType::F64 => None,
        }
    }
}

/// Samples of one raster, ready for color mapping.
#[derive(Debug, Clone)]
pub struct DecodedRaster {
    pub metadata: RasterMetadata,
    pub sample_type: SampleType,
    /// Output width (after downsampling).
    pub width: u32,
    /// Output height (after downsampling).
    pub height: u32,
    /// Samples per pixel in `samples` (palette images are expanded to 3).
    pub channels: usize,
    /// Pixel-interleaved samples, row major.
    pub samples: Vec<f64>,
}

impl DecodedRaster {
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// True when the source had to be shrunk to fit the overlay limit.
    pub fn was_downsampled(&self) -> bool {
        self.width != self.metadata.width || self.height != self.metadata.height
    }
}

/// Decode a GeoTIFF held in memory, downsampling so neither side exceeds
/// `max_dim`.
pub fn decode_tiff(bytes: &[u8], max_dim: u32) -> Result<DecodedRaster> {
    let mut decoder = Decoder::new(Cursor::new(bytes))?.with_limits(Limits::unlimited());
    let metadata = RasterMetadata::read(&mut decoder)?;

    debug!(
        width = metadata.width,
        height = metadata.height,
        layout = ?metadata.layout,
        bits = metadata.bits_per_sample,
        nodata = ?metadata.nodata,
        "Raster metadata loaded"
    );

    let (dst_w, dst_h) = target_dimensions(metadata.width, metadata.height, max_dim);
    let dims = Dims {
        src_w: metadata.width as usize,
        src_h: metadata.height as usize,
        channels: metadata.layout.stored_channels(),
        dst_w: dst_w as usize,
        dst_h: dst_h as usize,
    };

    let image = decoder.read_image()?;
    let (sample_type, samples) = match image {
        DecodingResult::U8(v) => (SampleType::U8, widen(&v, &dims)?),
        DecodingResult::U16(v) => (SampleType::U16, widen(&v, &dims)?),
        DecodingResult::U32(v) => (SampleType::U32, widen(&v, &dims)?),
        DecodingResult::U64(v) => (SampleType::U64, widen(&v, &dims)?),
        DecodingResult::I8(v) => (SampleType::I8, widen(&v, &dims)?),
        DecodingResult::I16(v) => (SampleType::I16, widen(&v, &dims)?),
        DecodingResult::I32(v) => (SampleType::I32, widen(&v, &dims)?),
        DecodingResult::I64(v) => (SampleType::I64, widen(&v, &dims)?),
        DecodingResult::F32(v) => (SampleType::F32, widen(&v, &dims)?),
        DecodingResult::F64(v) => (SampleType::F64, widen(&v, &dims)?),
    };

    if dst_w != metadata.width || dst_h != metadata.height {
        debug!(
            from = %format!("{}x{}", metadata.width, metadata.height),
            to = %format!("{}x{}", dst_w, dst_h),
            "Downsampled raster"
        );
    }

    let mut raster = DecodedRaster {
        metadata,
        sample_type,
        width: dst_w,
        height: dst_h,
        channels: dims.channels,
        samples,
    };

    if raster.metadata.layout == ChannelLayout::Palette {
        expand_palette(&mut raster);
    }

    Ok(raster)
}

struct Dims {
    src_w: usize,
    src_h: usize,
    channels: usize,
    dst_w: usize,
    dst_h: usize,
}

/// Resample in the native type, then widen to f64.
fn widen<T: Copy + ToPrimitive>(data: &[T], dims: &Dims) -> Result<Vec<f64>> {
    let expected = dims.src_w * dims.src_h * dims.channels;
    if data.len() < expected {
        return Err(OverlayError::invalid_data(format!(
            "expected {} samples for {}x{}x{}, got {}",
            expected,
            dims.src_w,
            dims.src_h,
            dims.channels,
            data.len()
        )));
    }

    let resampled = resample_nearest(
        &data[..expected],
        dims.src_w,
        dims.src_h,
        dims.channels,
        dims.dst_w,
        dims.dst_h,
    );
    Ok(resampled
        .into_iter()
        .map(|v| v.to_f64().unwrap_or(f64::NAN))
        .collect())
}

/// Replace palette indices with 8-bit RGB triples from the ColorMap.
///
/// Without a usable ColorMap the indices are left alone and the raster is
/// treated as single-band categorical data.
fn expand_palette(raster: &mut DecodedRaster) {
    let Some(color_map) = raster.metadata.color_map.as_ref() else {
        return;
    };
    let entries = color_map.len() / 3;
    if entries == 0 {
        return;
    }

    let (reds, rest) = color_map.split_at(entries);
    let (greens, blues) = rest.split_at(entries);

    let mut rgb = Vec::with_capacity(raster.samples.len() * 3);
    for &index in &raster.samples {
        let i = if index.is_finite() && index >= 0.0 {
            (index as usize).min(entries - 1)
        } else {
            0
        };
        rgb.push((reds[i] >> 8) as f64);
        rgb.push((greens[i] >> 8) as f64);
        rgb.push((blues[i] >> 8) as f64);
    }

    raster.samples = rgb;
    raster.channels = 3;
    raster.sample_type = SampleType::U8;
}
