//! Dedicated CPU pool for TIFF decoding.
//!
//! Decoding a multi-megapixel raster takes hundreds of milliseconds of pure
//! CPU. Jobs run on a small rayon pool and report back over a oneshot
//! channel so the async caller only awaits.

use std::num::NonZeroUsize;
use std::panic::{catch_unwind, AssertUnwindSafe};

use rayon::{ThreadPool, ThreadPoolBuilder};
use tokio::sync::oneshot;
use tracing::{error, info};

use crate::error::{OverlayError, Result};

/// Upper bound on decode workers.
pub const MAX_DECODE_WORKERS: usize = 4;

pub struct DecodePool {
    pool: ThreadPool,
    size: usize,
}

impl DecodePool {
    /// `clamp(available_parallelism, 1, MAX_DECODE_WORKERS)`.
    pub fn default_size() -> usize {
        std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
            .clamp(1, MAX_DECODE_WORKERS)
    }

    pub fn new(size: usize) -> Result<Self> {
        let size = size.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(size)
            .thread_name(|i| format!("overlay-decode-{}", i))
            .build()
            .map_err(|e| OverlayError::Pool(e.to_string()))?;

        info!(workers = size, "Decode pool started");
        Ok(Self { pool, size })
    }

    pub fn with_default_size() -> Result<Self> {
        Self::new(Self::default_size())
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Run `job` on the pool and await its result.
    ///
    /// A panicking job surfaces as [`OverlayError::Pool`] instead of
    /// taking the worker down.
    pub async fn run<T, F>(&self, job: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();

        self.pool.spawn(move || {
            let outcome = catch_unwind(AssertUnwindSafe(job)).unwrap_or_else(|panic| {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(panic = %message, "Decode job panicked");
                Err(OverlayError::Pool(format!("decode job panicked: {}", message)))
            });
            // Receiver gone means the caller stopped waiting
            let _ = tx.send(outcome);
        });

        rx.await
            .map_err(|_| OverlayError::Pool("decode job dropped".to_string()))?
    }
}

impl std::fmt::Debug for DecodePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodePool").field("size", &self.size).finish()
    }
}
