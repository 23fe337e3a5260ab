//! GeoTIFF image metadata read from the primary IFD.

use std::io::{Read, Seek};

use quick_xml::events::Event;
use quick_xml::Reader;
use tiff::decoder::Decoder;
use tiff::tags::Tag;
use tiff::ColorType;

use tracing::debug;

use crate::error::{OverlayError, Result};

pub const TAG_COLOR_MAP: u16 = 320;
pub const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
pub const TAG_MODEL_TIEPOINT: u16 = 33922;
pub const TAG_MODEL_TRANSFORMATION: u16 = 34264;
pub const TAG_GDAL_METADATA: u16 = 42112;
pub const TAG_GDAL_NODATA: u16 = 42113;

/// How pixel samples are laid out before color mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChannelLayout {
    /// One sample per pixel (categorical data).
    #[default]
    Gray,
    /// Gray plus alpha; only the first band is color mapped.
    GrayAlpha,
    /// Palette indices expanded through the ColorMap to RGB.
    Palette,
    Rgb,
    Rgba,
}

impl ChannelLayout {
    /// Samples per pixel as stored in the file.
    pub fn stored_channels(&self) -> usize {
        match self {
            ChannelLayout::Gray | ChannelLayout::Palette => 1,
            ChannelLayout::GrayAlpha => 2,
            ChannelLayout::Rgb => 3,
            ChannelLayout::Rgba => 4,
        }
    }

    fn from_color_type(color: ColorType) -> Result<(Self, u8)> {
        match color {
            ColorType::Gray(bits) => Ok((ChannelLayout::Gray, bits)),
            ColorType::GrayA(bits) => Ok((ChannelLayout::GrayAlpha, bits)),
            ColorType::Palette(bits) => Ok((ChannelLayout::Palette, bits)),
            ColorType::RGB(bits) => Ok((ChannelLayout::Rgb, bits)),
            ColorType::RGBA(bits) => Ok((ChannelLayout::Rgba, bits)),
            other => Err(OverlayError::unsupported(format!("color type {:?}", other))),
        }
    }
}

/// Metadata of the primary image directory.
#[derive(Debug, Clone, Default)]
pub struct RasterMetadata {
    pub width: u32,
    pub height: u32,
    pub layout: ChannelLayout,
    pub bits_per_sample: u8,
    /// Declared NoData value (GDAL_NODATA).
    pub nodata: Option<f64>,
    /// ModelPixelScale (sx, sy, sz).
    pub pixel_scale: Option<[f64; 3]>,
    /// ModelTiepoint (i, j, k, x, y, z).
    pub tiepoint: Option<[f64; 6]>,
    /// ModelTransformation 4x4 row-major affine matrix.
    pub transformation: Option<[f64; 16]>,
    /// STATISTICS_MINIMUM / STATISTICS_MAXIMUM from GDAL_METADATA.
    pub statistics: Option<(f64, f64)>,
    /// TIFF ColorMap: all reds, then all greens, then all blues (16-bit).
    pub color_map: Option<Vec<u16>>,
}

impl RasterMetadata {
    /// Read metadata from an opened decoder positioned on the first image.
    pub fn read<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Self> {
        let (width, height) = decoder.dimensions()?;
        let (layout, bits_per_sample) = ChannelLayout::from_color_type(decoder.colortype()?)?;

        let pixel_scale = decoder
            .get_tag_f64_vec(Tag::from_u16_exhaustive(TAG_MODEL_PIXEL_SCALE))
            .ok()
            .and_then(|v| (v.len() >= 3).then(|| [v[0], v[1], v[2]]));

        let tiepoint = decoder
            .get_tag_f64_vec(Tag::from_u16_exhaustive(TAG_MODEL_TIEPOINT))
            .ok()
            .and_then(|v| (v.len() >= 6).then(|| [v[0], v[1], v[2], v[3], v[4], v[5]]));

        let transformation = decoder
            .get_tag_f64_vec(Tag::from_u16_exhaustive(TAG_MODEL_TRANSFORMATION))
            .ok()
            .and_then(|v| <[f64; 16]>::try_from(v.get(..16)?).ok());

        let nodata = decoder
            .get_tag_ascii_string(Tag::from_u16_exhaustive(TAG_GDAL_NODATA))
            .ok()
            .and_then(|s| parse_gdal_nodata(&s));

        let statistics = decoder
            .get_tag_ascii_string(Tag::from_u16_exhaustive(TAG_GDAL_METADATA))
            .ok()
            .and_then(|s| parse_gdal_metadata_stats(&s));

        let color_map = if layout == ChannelLayout::Palette {
            decoder
                .get_tag_u32_vec(Tag::from_u16_exhaustive(TAG_COLOR_MAP))
                .ok()
                .map(|v| v.into_iter().map(|c| c.min(u16::MAX as u32) as u16).collect())
        } else {
            None
        };

        Ok(Self {
            width,
            height,
            layout,
            bits_per_sample,
            nodata,
            pixel_scale,
            tiepoint,
            transformation,
            statistics,
            color_map,
        })
    }
}

/// Parse a GDAL_NODATA string. GDAL stores it as ASCII, sometimes with a
/// trailing NUL. `nan` is accepted.
pub fn parse_gdal_nodata(raw: &str) -> Option<f64> {
    let trimmed = raw.trim_end_matches('\0').trim();
    trimmed.parse::<f64>().ok()
}

/// Band 0 `STATISTICS_MINIMUM` / `STATISTICS_MAXIMUM` from a
/// GDAL_METADATA XML blob. Items without a `sample` attribute count as
/// band 0.
pub fn parse_gdal_metadata_stats(metadata: &str) -> Option<(f64, f64)> {
    let mut reader = Reader::from_str(metadata.trim_end_matches('\0'));
    reader.trim_text(true);

    let mut item: Option<(String, u32)> = None;
    let mut min = None;
    let mut max = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"Item" => {
                let mut name = None;
                let mut sample = 0;
                for attr in e.attributes().flatten() {
                    let value = match attr.unescape_value() {
                        Ok(value) => value,
                        Err(_) => continue,
                    };
                    match attr.key.as_ref() {
                        b"name" => name = Some(value.into_owned()),
                        b"sample" => sample = value.trim().parse().unwrap_or(u32::MAX),
                        _ => {}
                    }
                }
                item = name.map(|n| (n, sample));
            }
            Ok(Event::Text(t)) => {
                if let Some((name, 0)) = &item {
                    let value = t.unescape().ok().and_then(|v| v.trim().parse::<f64>().ok());
                    match name.as_str() {
                        "STATISTICS_MINIMUM" => min = value.or(min),
                        "STATISTICS_MAXIMUM" => max = value.or(max),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"Item" => item = None,
            Ok(Event::Eof) => break,
            Err(e) => {
                debug!(
                    position = reader.buffer_position(),
                    error = %e,
                    "Ignoring malformed GDAL_METADATA"
                );
                return None;
            }
            _ => {}
        }
    }

    let (min, max) = (min?, max?);
    (max > min).then_some((min, max))
}
