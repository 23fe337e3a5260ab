//! End-to-end decode tests against synthetic GeoTIFFs.
//!
//! Covers:
//! - Large categorical rasters (downsampling, NoData masking, bounds)
//! - RGB imagery preserved at full resolution
//! - ModelTransformation georeferencing
//! - Float and wide-integer scaling
//! - Failure when georeferencing is missing

use std::sync::Arc;

use bytes::Bytes;
use raster_overlay::{
    CategoryPalette, DecodePool, HueRotationPalette, OverlayDecoder, OverlayError, PngMode,
    DEFAULT_ALPHA, MAX_OVERLAY_DIMENSION, WATER,
};
use test_utils::{
    assert_approx_eq, assert_coords_approx_eq, create_float_ramp, encode_geotiff, grid,
    koppen_geotiff, rgb_geotiff, write_temp_tiff, GeoTiffSpec, Georef,
};
use tiff::encoder::colortype;

// ============================================================================
// Helpers
// ============================================================================

fn decoder() -> OverlayDecoder {
    OverlayDecoder::new(Arc::new(DecodePool::new(2).expect("decode pool")))
}

// ============================================================================
// Categorical rasters
// ============================================================================

#[tokio::test]
async fn test_large_categorical_raster_is_downsampled() {
    let spec = grid::GLOBAL_LARGE;
    let bytes = koppen_geotiff(spec);

    let overlay = decoder().decode_bytes(Bytes::from(bytes)).await.unwrap();

    assert!(overlay.width <= MAX_OVERLAY_DIMENSION);
    assert!(overlay.height <= MAX_OVERLAY_DIMENSION);
    assert_eq!((overlay.width, overlay.height), (2048, 2048));
    assert_eq!((overlay.source_width, overlay.source_height), (4096, 4096));
    assert_eq!(overlay.rgba.len(), 2048 * 2048 * 4);

    // Western quarter is NoData
    assert_eq!(overlay.pixel(0, 0), Some(WATER));
    assert_eq!(overlay.pixel(511, 2047), Some(WATER));

    // First land column holds category 1
    let palette = HueRotationPalette::default();
    assert_eq!(overlay.pixel(512, 0), Some(palette.color(1)));
    assert_eq!(overlay.pixel(512, 0).unwrap()[3], DEFAULT_ALPHA);
}

#[tokio::test]
async fn test_large_categorical_bounds_use_source_dimensions() {
    let spec = grid::GLOBAL_LARGE;
    let overlay = decoder()
        .decode_bytes(Bytes::from(koppen_geotiff(spec)))
        .await
        .unwrap();

    let (sx, sy) = spec.pixel_scale;
    let (min_lat, min_lng, max_lat, max_lng) = spec.bounds();
    assert_approx_eq!(overlay.bounds.min_lng, min_lng, sx);
    assert_approx_eq!(overlay.bounds.max_lng, max_lng, sx);
    assert_approx_eq!(overlay.bounds.min_lat, min_lat, sy);
    assert_approx_eq!(overlay.bounds.max_lat, max_lat, sy);
}

#[tokio::test]
async fn test_categories_get_distinct_colors() {
    let overlay = decoder()
        .decode_bytes(Bytes::from(koppen_geotiff(grid::RGB_512)))
        .await
        .unwrap();

    // 512 wide: 128 ocean columns, then 16-column bands
    let first = overlay.pixel(128, 10).unwrap();
    let second = overlay.pixel(144, 10).unwrap();
    assert_ne!(first, WATER);
    assert_ne!(first, second);
    // Same band, same color
    assert_eq!(overlay.pixel(128, 10), overlay.pixel(143, 500));
}

// ============================================================================
// RGB imagery
// ============================================================================

#[tokio::test]
async fn test_rgb_raster_preserved_exactly() {
    let spec = grid::RGB_512;
    let overlay = decoder()
        .decode_bytes(Bytes::from(rgb_geotiff(spec)))
        .await
        .unwrap();

    assert_eq!((overlay.width, overlay.height), (512, 512));
    for &(x, y) in &[(0u32, 0u32), (1, 0), (255, 3), (300, 400), (511, 511)] {
        let expected = [
            (x % 256) as u8,
            (y % 256) as u8,
            ((x + y) % 256) as u8,
            DEFAULT_ALPHA,
        ];
        assert_eq!(overlay.pixel(x, y), Some(expected), "pixel ({}, {})", x, y);
    }
}

#[tokio::test]
async fn test_rgb_render_falls_back_to_rgba_png() {
    let file = write_temp_tiff(&rgb_geotiff(grid::RGB_512));
    let path = file.path().to_str().unwrap().to_string();

    let rendered = decoder().render(&path).await.unwrap();
    assert_eq!(rendered.png_mode, Some(PngMode::Rgba));
    assert_eq!(&rendered.png[1..4], b"PNG");
    assert_eq!((rendered.width, rendered.height), (512, 512));
    assert_coords_approx_eq!(
        (rendered.bounds.max_lat, rendered.bounds.min_lng),
        (52.0, 5.0),
        1e-9
    );
}

#[tokio::test]
async fn test_categorical_render_uses_indexed_png() {
    let file = write_temp_tiff(&koppen_geotiff(grid::SIMPLE_8X4));
    let url = format!("file://{}", file.path().display());

    let rendered = decoder().render(&url).await.unwrap();
    assert_eq!(rendered.png_mode, Some(PngMode::Indexed));
}

// ============================================================================
// Georeferencing
// ============================================================================

#[tokio::test]
async fn test_transformation_bounds() {
    let spec = GeoTiffSpec::new(grid::SIMPLE_8X4).with_georef(Georef::Transformation);
    let data = vec![1i16; grid::SIMPLE_8X4.size()];
    let bytes = encode_geotiff::<colortype::GrayI16>(&spec, &data);

    let overlay = decoder().decode_bytes(Bytes::from(bytes)).await.unwrap();
    let [south_west, north_east] = overlay.bounds.corners();
    assert_coords_approx_eq!((south_west[0], south_west[1]), (-10.0, -10.0), 1e-9);
    assert_coords_approx_eq!((north_east[0], north_east[1]), (10.0, 10.0), 1e-9);
}

#[tokio::test]
async fn test_missing_georeference_fails() {
    let spec = GeoTiffSpec::new(grid::SIMPLE_8X4).with_georef(Georef::None);
    let data = vec![1i16; grid::SIMPLE_8X4.size()];
    let bytes = encode_geotiff::<colortype::GrayI16>(&spec, &data);

    let err = decoder()
        .decode_bytes(Bytes::from(bytes))
        .await
        .unwrap_err();
    assert!(matches!(err, OverlayError::MissingGeoreference));
}

#[tokio::test]
async fn test_missing_file_is_fetch_error() {
    let err = decoder()
        .render("/no/such/raster.tif")
        .await
        .unwrap_err();
    assert!(matches!(err, OverlayError::Fetch { .. }));
}

// ============================================================================
// Scaling
// ============================================================================

#[tokio::test]
async fn test_unit_float_rgb_scaled_to_bytes() {
    let g = grid::SIMPLE_8X4;
    let ramp = create_float_ramp(g.width as usize, g.height as usize, 1.0);
    let data: Vec<f32> = ramp.iter().flat_map(|&v| [v, v, v]).collect();
    let bytes = encode_geotiff::<colortype::RGB32Float>(&GeoTiffSpec::new(g), &data);

    let overlay = decoder().decode_bytes(Bytes::from(bytes)).await.unwrap();
    assert_eq!(overlay.pixel(0, 0), Some([0, 0, 0, DEFAULT_ALPHA]));
    assert_eq!(overlay.pixel(7, 0), Some([255, 255, 255, DEFAULT_ALPHA]));
}

#[tokio::test]
async fn test_gdal_statistics_calibrate_u16() {
    let g = grid::SIMPLE_8X4;
    let data: Vec<u16> = (0..g.size()).flat_map(|_| [1000u16, 1500, 2000]).collect();
    let xml = r#"<GDALMetadata>
  <Item name="STATISTICS_MINIMUM" sample="0">1000</Item>
  <Item name="STATISTICS_MAXIMUM" sample="0">2000</Item>
</GDALMetadata>"#;
    let spec = GeoTiffSpec::new(g).with_gdal_metadata(xml);
    let bytes = encode_geotiff::<colortype::RGB16>(&spec, &data);

    let overlay = decoder().decode_bytes(Bytes::from(bytes)).await.unwrap();
    assert_eq!(overlay.pixel(3, 2), Some([0, 128, 255, DEFAULT_ALPHA]));
}

#[tokio::test]
async fn test_u16_without_statistics_scales_from_type_max() {
    let g = grid::SIMPLE_8X4;
    let data: Vec<u16> = (0..g.size()).flat_map(|_| [0u16, 65535, 32768]).collect();
    let bytes = encode_geotiff::<colortype::RGB16>(&GeoTiffSpec::new(g), &data);

    let overlay = decoder().decode_bytes(Bytes::from(bytes)).await.unwrap();
    assert_eq!(overlay.pixel(0, 0), Some([0, 255, 128, DEFAULT_ALPHA]));
}

#[tokio::test]
async fn test_rgba_alpha_channel_kept() {
    let g = grid::SIMPLE_8X4;
    let data: Vec<u8> = (0..g.size()).flat_map(|_| [10u8, 20, 30, 40]).collect();
    let bytes = encode_geotiff::<colortype::RGBA8>(&GeoTiffSpec::new(g), &data);

    let overlay = decoder().decode_bytes(Bytes::from(bytes)).await.unwrap();
    assert_eq!(overlay.pixel(5, 3), Some([10, 20, 30, 40]));
}

#[tokio::test]
async fn test_custom_max_dimension() {
    let overlay = decoder()
        .with_max_dimension(256)
        .decode_bytes(Bytes::from(rgb_geotiff(grid::RGB_512)))
        .await
        .unwrap();
    assert_eq!((overlay.width, overlay.height), (256, 256));
    assert_eq!((overlay.source_width, overlay.source_height), (512, 512));
}
