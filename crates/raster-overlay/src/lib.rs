//! GeoTIFF decoding into color-mapped map overlays.
//!
//! The pipeline:
//! - fetch bytes from a [`RasterSource`] (HTTP or local file)
//! - read metadata and samples with the `tiff` crate, downsampling
//!   rasters larger than [`MAX_OVERLAY_DIMENSION`]
//! - color map: RGB imagery passes through, single-band rasters are
//!   treated as categorical with NoData rendered as white
//! - compute geographic bounds from GeoTIFF tags
//! - encode a PNG and hand it to a [`MapSurface`]
//!
//! [`OverlaySlot`] wraps the pipeline with single-flight loading and
//! visibility toggling.

pub mod bounds;
pub mod chunked;
pub mod colormap;
pub mod error;
pub mod metadata;
pub mod overlay;
pub mod png;
pub mod pool;
pub mod raster;
pub mod resample;
pub mod scale;
pub mod slot;
pub mod source;

pub use bounds::{compute_bounds, GeoBounds};
pub use chunked::{chunk_size_for, colorize_cooperative, ChunkProgress, ChunkedColorizer};
pub use colormap::{
    hsl_to_rgb, CategoryPalette, HueRotationPalette, PixelMapper, DEFAULT_ALPHA, WATER,
};
pub use error::{OverlayError, Result};
pub use metadata::{ChannelLayout, RasterMetadata};
pub use overlay::{DecodeStage, DecodedOverlay, LoadOptions, OverlayDecoder, RenderedOverlay};
pub use png::{encode_png, PngMode};
pub use pool::DecodePool;
pub use raster::{decode_tiff, DecodedRaster, SampleType};
pub use resample::{target_dimensions, MAX_OVERLAY_DIMENSION};
pub use scale::{CalibratedScale, HeuristicScale, ScaleParams, ScaleStrategy};
pub use slot::{LoadOutcome, MapSurface, OverlayRegistry, OverlaySlot, SlotState, SlotStatus};
pub use source::{open_source, FileRasterSource, HttpRasterSource, MemoryRasterSource, RasterSource};
