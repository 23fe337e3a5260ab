//! Application state for the bloom API.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use raster_overlay::{
    DecodePool, LoadOptions, LoadOutcome, OverlayDecoder, OverlayRegistry, OverlaySlot,
};

use crate::config::OverlayConfig;

/// A configured overlay and its slot.
pub struct OverlayEntry {
    pub slot: Arc<OverlaySlot>,
    pub prewarm: bool,
    pub show_spinner: bool,
}

/// Shared application state.
pub struct AppState {
    /// Shared decoder (one decode pool for all overlays).
    pub decoder: Arc<OverlayDecoder>,

    /// Overlays currently attached to the map.
    pub registry: Arc<OverlayRegistry>,

    /// Overlays in config order.
    pub overlays: Vec<OverlayEntry>,
}

impl AppState {
    /// Build state from overlay config. `decode_workers` defaults to the
    /// pool's own sizing.
    pub fn new(config: OverlayConfig, decode_workers: Option<usize>) -> Result<Self> {
        let pool = match decode_workers {
            Some(n) => DecodePool::new(n)?,
            None => DecodePool::with_default_size()?,
        };
        let decoder = Arc::new(OverlayDecoder::new(Arc::new(pool)));
        let registry = Arc::new(OverlayRegistry::new());

        let overlays = config
            .overlays
            .into_iter()
            .map(|def| OverlayEntry {
                slot: Arc::new(OverlaySlot::new(
                    def.name,
                    def.source,
                    Arc::clone(&decoder),
                    registry.clone(),
                )),
                prewarm: def.prewarm,
                show_spinner: def.show_spinner,
            })
            .collect();

        Ok(Self {
            decoder,
            registry,
            overlays,
        })
    }

    pub fn overlay(&self, name: &str) -> Option<&OverlayEntry> {
        self.overlays.iter().find(|e| e.slot.name() == name)
    }

    /// Start detached background loads for pre-warm overlays.
    pub fn spawn_prewarm(&self) -> Vec<tokio::task::JoinHandle<()>> {
        self.overlays
            .iter()
            .filter(|e| e.prewarm)
            .map(|entry| {
                let slot = Arc::clone(&entry.slot);
                info!(overlay = %slot.name(), "Pre-warming overlay");
                tokio::spawn(async move {
                    match slot.ensure_loaded(LoadOptions::prewarm()).await {
                        LoadOutcome::Loaded(overlay) => info!(
                            overlay = %slot.name(),
                            width = overlay.width,
                            height = overlay.height,
                            "Overlay pre-warmed"
                        ),
                        LoadOutcome::AlreadyLoading => {}
                        LoadOutcome::Failed(error) => {
                            warn!(overlay = %slot.name(), error = %error, "Overlay pre-warm failed")
                        }
                    }
                })
            })
            .collect()
    }
}
