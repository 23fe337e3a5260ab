//! Downsampling of oversized rasters.
//!
//! Overlays are capped at [`MAX_OVERLAY_DIMENSION`] on their longest side.
//! Resampling is nearest neighbour so categorical ids survive unchanged.

/// Longest side of a decoded overlay, in pixels.
pub const MAX_OVERLAY_DIMENSION: u32 = 2048;

/// Output dimensions for a raster of `width` x `height`.
///
/// Rasters within the limit keep their size. Larger ones are scaled by
/// `max_dim / max(width, height)` with each side rounded and kept ≥ 1.
pub fn target_dimensions(width: u32, height: u32, max_dim: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_dim || longest == 0 {
        return (width, height);
    }

    let scale = max_dim as f64 / longest as f64;
    let w = ((width as f64 * scale).round() as u32).clamp(1, max_dim);
    let h = ((height as f64 * scale).round() as u32).clamp(1, max_dim);
    (w, h)
}

/// Nearest-neighbour resample of pixel-interleaved data.
///
/// Each destination pixel takes the source pixel whose area contains the
/// destination pixel's center.
pub fn resample_nearest<T: Copy>(
    data: &[T],
    src_width: usize,
    src_height: usize,
    channels: usize,
    dst_width: usize,
    dst_height: usize,
) -> Vec<T> {
    if src_width == dst_width && src_height == dst_height {
        return data.to_vec();
    }

    let x_map: Vec<usize> = (0..dst_width)
        .map(|x| source_index(x, src_width, dst_width))
        .collect();

    let mut output = Vec::with_capacity(dst_width * dst_height * channels);
    for y in 0..dst_height {
        let src_y = source_index(y, src_height, dst_height);
        let row = &data[src_y * src_width * channels..(src_y + 1) * src_width * channels];
        for &src_x in &x_map {
            output.extend_from_slice(&row[src_x * channels..(src_x + 1) * channels]);
        }
    }
    output
}

#[inline]
fn source_index(dst: usize, src_len: usize, dst_len: usize) -> usize {
    let pos = ((dst as f64 + 0.5) * src_len as f64 / dst_len as f64).floor() as usize;
    pos.min(src_len - 1)
}
