//! Chunked color mapping.
//!
//! [`ChunkedColorizer`] is an iterator: each `next()` color maps one chunk
//! of pixels and reports progress. Async callers yield to the runtime
//! between chunks (see [`colorize_cooperative`]) so a large raster never
//! holds a worker for more than one chunk; sync callers simply drain it.

use crate::colormap::PixelMapper;

/// Smallest chunk, in pixels.
pub const MIN_CHUNK_PIXELS: usize = 50_000;

/// Target number of chunks for a raster.
pub const TARGET_CHUNKS: usize = 12;

/// Chunk size for a raster of `total_pixels`.
pub fn chunk_size_for(total_pixels: usize) -> usize {
    (total_pixels / TARGET_CHUNKS).max(MIN_CHUNK_PIXELS)
}

/// Progress after one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkProgress {
    pub chunk_index: usize,
    pub pixels_done: usize,
    pub total_pixels: usize,
}

impl ChunkProgress {
    pub fn is_complete(&self) -> bool {
        self.pixels_done >= self.total_pixels
    }
}

/// Iterator stage that fills an RGBA buffer one chunk at a time.
pub struct ChunkedColorizer<'a> {
    samples: &'a [f64],
    channels: usize,
    mapper: &'a PixelMapper,
    rgba: Vec<u8>,
    total_pixels: usize,
    cursor: usize,
    chunk_pixels: usize,
    chunk_index: usize,
}

impl<'a> ChunkedColorizer<'a> {
    pub fn new(samples: &'a [f64], channels: usize, mapper: &'a PixelMapper) -> Self {
        let channels = channels.max(1);
        let total_pixels = samples.len() / channels;
        Self::with_chunk_size(samples, channels, mapper, chunk_size_for(total_pixels))
    }

    pub fn with_chunk_size(
        samples: &'a [f64],
        channels: usize,
        mapper: &'a PixelMapper,
        chunk_pixels: usize,
    ) -> Self {
        let channels = channels.max(1);
        let total_pixels = samples.len() / channels;
        Self {
            samples,
            channels,
            mapper,
            rgba: vec![0u8; total_pixels * 4],
            total_pixels,
            cursor: 0,
            chunk_pixels: chunk_pixels.max(1),
            chunk_index: 0,
        }
    }

    pub fn chunk_pixels(&self) -> usize {
        self.chunk_pixels
    }

    /// Process every remaining chunk and return the RGBA buffer.
    pub fn finish(mut self) -> Vec<u8> {
        while self.next().is_some() {}
        self.rgba
    }

    /// The RGBA buffer as filled so far.
    pub fn into_rgba(self) -> Vec<u8> {
        self.rgba
    }
}

impl Iterator for ChunkedColorizer<'_> {
    type Item = ChunkProgress;

    fn next(&mut self) -> Option<ChunkProgress> {
        if self.cursor >= self.total_pixels {
            return None;
        }

        let end = (self.cursor + self.chunk_pixels).min(self.total_pixels);
        let src = &self.samples[self.cursor * self.channels..end * self.channels];
        let dst = &mut self.rgba[self.cursor * 4..end * 4];

        for (pixel, out) in src.chunks_exact(self.channels).zip(dst.chunks_exact_mut(4)) {
            out.copy_from_slice(&self.mapper.map_pixel(pixel));
        }

        self.cursor = end;
        let progress = ChunkProgress {
            chunk_index: self.chunk_index,
            pixels_done: end,
            total_pixels: self.total_pixels,
        };
        self.chunk_index += 1;
        Some(progress)
    }
}

/// Drive a colorizer to completion, yielding to the tokio scheduler
/// between chunks.
pub async fn colorize_cooperative(mut colorizer: ChunkedColorizer<'_>) -> Vec<u8> {
    while let Some(progress) = colorizer.next() {
        if !progress.is_complete() {
            tokio::task::yield_now().await;
        }
    }
    colorizer.into_rgba()
}
