//! Synthetic GeoTIFF generators.
//!
//! These build small in-memory GeoTIFFs with predictable pixel patterns and
//! GeoTIFF georeferencing tags, so decoder tests can verify pixel values
//! and bounds without shipping binary fixtures.

use std::io::{Cursor, Write};

use tiff::encoder::{colortype, TiffEncoder, TiffValue};
use tiff::tags::Tag;

use crate::fixtures::grid::GridSpec;

/// GeoTIFF tag numbers not needed elsewhere in test code.
pub const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
pub const TAG_MODEL_TIEPOINT: u16 = 33922;
pub const TAG_MODEL_TRANSFORMATION: u16 = 34264;
pub const TAG_GDAL_METADATA: u16 = 42112;
pub const TAG_GDAL_NODATA: u16 = 42113;

/// NoData sentinel used by the categorical fixtures.
pub const KOPPEN_NODATA: i16 = -9999;

/// How the generated file is georeferenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Georef {
    /// ModelTiepoint + ModelPixelScale tags.
    TiePoint,
    /// ModelTransformation affine matrix.
    Transformation,
    /// No georeferencing tags at all.
    None,
}

/// Options for a generated GeoTIFF.
#[derive(Debug, Clone)]
pub struct GeoTiffSpec {
    pub grid: GridSpec,
    pub georef: Georef,
    /// Written to the GDAL_NODATA tag as ASCII.
    pub nodata: Option<String>,
    /// Written to the GDAL_METADATA tag verbatim.
    pub gdal_metadata: Option<String>,
}

impl GeoTiffSpec {
    pub fn new(grid: GridSpec) -> Self {
        Self {
            grid,
            georef: Georef::TiePoint,
            nodata: None,
            gdal_metadata: None,
        }
    }

    pub fn with_georef(mut self, georef: Georef) -> Self {
        self.georef = georef;
        self
    }

    pub fn with_nodata(mut self, nodata: impl Into<String>) -> Self {
        self.nodata = Some(nodata.into());
        self
    }

    pub fn with_gdal_metadata(mut self, xml: impl Into<String>) -> Self {
        self.gdal_metadata = Some(xml.into());
        self
    }
}

/// Encode pixel data of color type `C` into an in-memory GeoTIFF.
///
/// # Panics
///
/// Panics if the encoder rejects the data (wrong length for the grid).
pub fn encode_geotiff<C>(spec: &GeoTiffSpec, data: &[C::Inner]) -> Vec<u8>
where
    C: colortype::ColorType,
    [C::Inner]: TiffValue,
{
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut cursor).expect("create TIFF encoder");
        let mut image = encoder
            .new_image::<C>(spec.grid.width, spec.grid.height)
            .expect("create TIFF image");

        let (sx, sy) = spec.grid.pixel_scale;
        let dir = image.encoder();
        match spec.georef {
            Georef::TiePoint => {
                dir.write_tag(Tag::from_u16_exhaustive(TAG_MODEL_PIXEL_SCALE), &[sx, sy, 0.0][..])
                    .expect("write pixel scale");
                dir.write_tag(
                    Tag::from_u16_exhaustive(TAG_MODEL_TIEPOINT),
                    &[0.0, 0.0, 0.0, spec.grid.min_lon, spec.grid.max_lat, 0.0][..],
                )
                .expect("write tiepoint");
            }
            Georef::Transformation => {
                let matrix = [
                    sx, 0.0, 0.0, spec.grid.min_lon, //
                    0.0, -sy, 0.0, spec.grid.max_lat, //
                    0.0, 0.0, 0.0, 0.0, //
                    0.0, 0.0, 0.0, 1.0,
                ];
                dir.write_tag(Tag::from_u16_exhaustive(TAG_MODEL_TRANSFORMATION), &matrix[..])
                    .expect("write transformation");
            }
            Georef::None => {}
        }
        if let Some(nodata) = &spec.nodata {
            dir.write_tag(Tag::from_u16_exhaustive(TAG_GDAL_NODATA), nodata.as_str())
                .expect("write nodata");
        }
        if let Some(xml) = &spec.gdal_metadata {
            dir.write_tag(Tag::from_u16_exhaustive(TAG_GDAL_METADATA), xml.as_str())
                .expect("write gdal metadata");
        }

        image.write_data(data).expect("write TIFF data");
    }
    cursor.into_inner()
}

/// Creates a Köppen-like categorical grid.
///
/// The western quarter is ocean (`KOPPEN_NODATA`); the rest is split into
/// vertical bands of category ids `1..=30`, 16 columns wide.
pub fn create_koppen_grid(width: usize, height: usize) -> Vec<i16> {
    let ocean_cols = width / 4;
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            if col < ocean_cols {
                data.push(KOPPEN_NODATA);
            } else {
                data.push(((col - ocean_cols) / 16 % 30 + 1) as i16);
            }
        }
    }
    data
}

/// Creates interleaved RGB bytes where `r = x % 256`, `g = y % 256`,
/// `b = (x + y) % 256`.
pub fn create_rgb_pixels(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            data.push((x % 256) as u8);
            data.push((y % 256) as u8);
            data.push(((x + y) % 256) as u8);
        }
    }
    data
}

/// Creates a float grid ramping from 0.0 to `max` across columns.
pub fn create_float_ramp(width: usize, height: usize, max: f32) -> Vec<f32> {
    let denom = (width.max(2) - 1) as f32;
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            data.push(col as f32 / denom * max);
        }
    }
    data
}

/// Categorical Köppen-like GeoTIFF (i16, tiepoint georef, NoData -9999).
pub fn koppen_geotiff(grid: GridSpec) -> Vec<u8> {
    let data = create_koppen_grid(grid.width as usize, grid.height as usize);
    let spec = GeoTiffSpec::new(grid).with_nodata(KOPPEN_NODATA.to_string());
    encode_geotiff::<colortype::GrayI16>(&spec, &data)
}

/// 8-bit RGB GeoTIFF with no NoData.
pub fn rgb_geotiff(grid: GridSpec) -> Vec<u8> {
    let data = create_rgb_pixels(grid.width as usize, grid.height as usize);
    encode_geotiff::<colortype::RGB8>(&GeoTiffSpec::new(grid), &data)
}

/// Write bytes to a named temporary file with a `.tif` suffix.
pub fn write_temp_tiff(bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".tif")
        .tempfile()
        .expect("create temp file");
    file.write_all(bytes).expect("write temp tiff");
    file.flush().expect("flush temp tiff");
    file
}
