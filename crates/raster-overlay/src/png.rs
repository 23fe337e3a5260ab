//! PNG export of RGBA overlay pixels.
//!
//! Categorical overlays rarely use more than a few dozen colors, so the
//! encoder first tries an indexed image (color type 3, with tRNS for the
//! translucent entries) and falls back to RGBA (color type 6).

use std::collections::HashMap;
use std::io::Write;

use rayon::prelude::*;

use crate::error::{OverlayError, Result};

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Maximum colors for an indexed PNG.
const MAX_PALETTE_SIZE: usize = 256;

/// Pixel count above which palette extraction runs on rayon.
const PARALLEL_THRESHOLD: usize = 4096;

/// Encoding chosen by [`encode_png`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PngMode {
    Indexed,
    Rgba,
}

/// Encode RGBA pixels, picking indexed mode when the image has at most
/// 256 distinct colors.
pub fn encode_png(rgba: &[u8], width: usize, height: usize) -> Result<(Vec<u8>, PngMode)> {
    check_len(rgba.len(), width, height, 4)?;

    let palette = if width * height >= PARALLEL_THRESHOLD {
        Palette::extract_parallel(rgba)
    } else {
        Palette::extract(rgba)
    };

    match palette {
        Some(palette) => Ok((encode_indexed(&palette, width, height)?, PngMode::Indexed)),
        None => Ok((encode_rgba(rgba, width, height)?, PngMode::Rgba)),
    }
}

/// Palette plus one index byte per pixel.
struct Palette {
    colors: Vec<[u8; 4]>,
    indices: Vec<u8>,
}

impl Palette {
    fn extract(rgba: &[u8]) -> Option<Self> {
        let mut lookup: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
        let mut colors = Vec::with_capacity(MAX_PALETTE_SIZE);
        let mut indices = Vec::with_capacity(rgba.len() / 4);

        for px in rgba.chunks_exact(4) {
            let key = pack(px);
            let index = match lookup.get(&key) {
                Some(&i) => i,
                None => {
                    if colors.len() >= MAX_PALETTE_SIZE {
                        return None;
                    }
                    let i = colors.len() as u8;
                    colors.push([px[0], px[1], px[2], px[3]]);
                    lookup.insert(key, i);
                    i
                }
            };
            indices.push(index);
        }

        Some(Self { colors, indices })
    }

    /// Two parallel passes: distinct colors per chunk, then index mapping.
    fn extract_parallel(rgba: &[u8]) -> Option<Self> {
        let pixels_per_chunk = (rgba.len() / 4 / rayon::current_num_threads()).max(256);

        let distinct: Vec<u32> = rgba
            .par_chunks(pixels_per_chunk * 4)
            .flat_map_iter(|chunk| {
                let mut seen: HashMap<u32, ()> = HashMap::with_capacity(MAX_PALETTE_SIZE);
                for px in chunk.chunks_exact(4) {
                    seen.insert(pack(px), ());
                    if seen.len() > MAX_PALETTE_SIZE {
                        break;
                    }
                }
                seen.into_keys()
            })
            .collect();

        let mut lookup: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
        let mut colors = Vec::with_capacity(MAX_PALETTE_SIZE);
        for key in distinct {
            if lookup.contains_key(&key) {
                continue;
            }
            if colors.len() >= MAX_PALETTE_SIZE {
                return None;
            }
            lookup.insert(key, colors.len() as u8);
            colors.push(key.to_le_bytes());
        }

        let indices = rgba
            .par_chunks_exact(4)
            .map(|px| lookup.get(&pack(px)).copied().unwrap_or(0))
            .collect();

        Some(Self { colors, indices })
    }
}

#[inline(always)]
fn pack(px: &[u8]) -> u32 {
    u32::from_le_bytes([px[0], px[1], px[2], px[3]])
}

fn encode_indexed(palette: &Palette, width: usize, height: usize) -> Result<Vec<u8>> {
    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 3));

    let plte: Vec<u8> = palette.colors.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
    write_chunk(&mut png, b"PLTE", &plte);

    if palette.colors.iter().any(|c| c[3] < 255) {
        let trns: Vec<u8> = palette.colors.iter().map(|c| c[3]).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    write_chunk(&mut png, b"IDAT", &deflate_scanlines(&palette.indices, width, height, 1)?);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

/// Encode a truecolor RGBA PNG.
pub fn encode_rgba(rgba: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    check_len(rgba.len(), width, height, 4)?;

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 6));
    write_chunk(&mut png, b"IDAT", &deflate_scanlines(rgba, width, height, 4)?);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

fn check_len(len: usize, width: usize, height: usize, bytes_per_pixel: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(OverlayError::Encode(format!(
            "empty image {}x{}",
            width, height
        )));
    }
    if len != width * height * bytes_per_pixel {
        return Err(OverlayError::Encode(format!(
            "buffer of {} bytes does not match {}x{} image",
            len, width, height
        )));
    }
    Ok(())
}

fn ihdr(width: usize, height: usize, color_type: u8) -> [u8; 13] {
    let mut data = [0u8; 13];
    data[0..4].copy_from_slice(&(width as u32).to_be_bytes());
    data[4..8].copy_from_slice(&(height as u32).to_be_bytes());
    data[8] = 8; // bit depth
    data[9] = color_type;
    // compression, filter, interlace all 0
    data
}

fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Prefix each row with filter type 0 and zlib-compress.
fn deflate_scanlines(data: &[u8], width: usize, height: usize, bpp: usize) -> Result<Vec<u8>> {
    let row_len = width * bpp;
    let mut raw = Vec::with_capacity(height * (row_len + 1));
    for row in data.chunks_exact(row_len).take(height) {
        raw.push(0);
        raw.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder
        .write_all(&raw)
        .map_err(|e| OverlayError::Encode(format!("IDAT compression failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| OverlayError::Encode(format!("IDAT compression failed: {}", e)))
}
