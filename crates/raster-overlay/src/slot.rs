//! Per-overlay load state and visibility.
//!
//! An [`OverlaySlot`] owns one configured overlay. Loads are single-flight:
//! while a decode is in flight further requests return
//! [`LoadOutcome::AlreadyLoading`] instead of starting another.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::bounds::GeoBounds;
use crate::overlay::{LoadOptions, OverlayDecoder, RenderedOverlay};

/// Where rendered overlays are displayed.
pub trait MapSurface: Send + Sync {
    fn attach(&self, name: &str, overlay: &Arc<RenderedOverlay>);
    fn detach(&self, name: &str);
}

/// In-memory surface that tracks which overlays are attached.
#[derive(Default)]
pub struct OverlayRegistry {
    attached: RwLock<BTreeMap<String, Arc<RenderedOverlay>>>,
}

impl OverlayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Arc<RenderedOverlay>> {
        self.attached.read().ok()?.get(name).cloned()
    }

    pub fn is_attached(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn attached_names(&self) -> Vec<String> {
        self.attached
            .read()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl MapSurface for OverlayRegistry {
    fn attach(&self, name: &str, overlay: &Arc<RenderedOverlay>) {
        if let Ok(mut attached) = self.attached.write() {
            attached.insert(name.to_string(), Arc::clone(overlay));
        }
    }

    fn detach(&self, name: &str) {
        if let Ok(mut attached) = self.attached.write() {
            attached.remove(name);
        }
    }
}

/// Load state of one overlay.
#[derive(Debug, Clone)]
pub enum SlotState {
    Idle,
    Loading { attach: bool, show_spinner: bool },
    Loaded(Arc<RenderedOverlay>),
    Failed(String),
}

impl SlotState {
    pub fn name(&self) -> &'static str {
        match self {
            SlotState::Idle => "idle",
            SlotState::Loading { .. } => "loading",
            SlotState::Loaded(_) => "loaded",
            SlotState::Failed(_) => "failed",
        }
    }
}

/// Result of [`OverlaySlot::ensure_loaded`].
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Loaded(Arc<RenderedOverlay>),
    AlreadyLoading,
    /// The load failed; the message is also kept in the slot.
    Failed(String),
}

/// Serializable snapshot of a slot.
#[derive(Debug, Clone, Serialize)]
pub struct SlotStatus {
    pub name: String,
    pub source: String,
    pub state: &'static str,
    pub visible: bool,
    pub show_spinner: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<GeoBounds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

struct SlotInner {
    state: SlotState,
    visible: bool,
}

pub struct OverlaySlot {
    name: String,
    source: String,
    decoder: Arc<OverlayDecoder>,
    surface: Arc<dyn MapSurface>,
    inner: Arc<Mutex<SlotInner>>,
}

impl OverlaySlot {
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        decoder: Arc<OverlayDecoder>,
        surface: Arc<dyn MapSurface>,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            decoder,
            surface,
            inner: Arc::new(Mutex::new(SlotInner {
                state: SlotState::Idle,
                visible: false,
            })),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub async fn state(&self) -> SlotState {
        self.inner.lock().await.state.clone()
    }

    pub async fn is_visible(&self) -> bool {
        self.inner.lock().await.visible
    }

    /// Loaded overlay, if any.
    pub async fn overlay(&self) -> Option<Arc<RenderedOverlay>> {
        match &self.inner.lock().await.state {
            SlotState::Loaded(overlay) => Some(Arc::clone(overlay)),
            _ => None,
        }
    }

    /// Load the overlay unless it is already loaded or loading.
    ///
    /// Idle and Failed slots start a decode; a Failed slot is retried. The
    /// decode runs on its own task, so dropping the returned future does not
    /// abandon the load.
    pub async fn ensure_loaded(&self, options: LoadOptions) -> LoadOutcome {
        let task = {
            let mut inner = self.inner.lock().await;
            match inner.state.clone() {
                SlotState::Loading { .. } => return LoadOutcome::AlreadyLoading,
                SlotState::Loaded(overlay) => {
                    if options.attach && !inner.visible {
                        self.surface.attach(&self.name, &overlay);
                        inner.visible = true;
                    }
                    return LoadOutcome::Loaded(overlay);
                }
                SlotState::Idle | SlotState::Failed(_) => {
                    inner.state = SlotState::Loading {
                        attach: options.attach,
                        show_spinner: options.show_spinner,
                    };
                    self.spawn_load(options.attach)
                }
            }
        };

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(overlay = %self.name, error = %e, "Overlay load task aborted");
                let message = format!("load task aborted: {}", e);
                let mut inner = self.inner.lock().await;
                if matches!(inner.state, SlotState::Loading { .. }) {
                    inner.state = SlotState::Failed(message.clone());
                    inner.visible = false;
                }
                LoadOutcome::Failed(message)
            }
        }
    }

    fn spawn_load(&self, requested_attach: bool) -> JoinHandle<LoadOutcome> {
        let name = self.name.clone();
        let source = self.source.clone();
        let decoder = Arc::clone(&self.decoder);
        let surface = Arc::clone(&self.surface);
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            info!(overlay = %name, source = %source, attach = requested_attach, "Loading overlay");
            let result = decoder.render(&source).await;

            let mut inner = inner.lock().await;
            // A toggle during the load may have changed the attach intent
            let attach = match inner.state {
                SlotState::Loading { attach, .. } => attach,
                _ => requested_attach,
            };

            match result {
                Ok(overlay) => {
                    let overlay = Arc::new(overlay);
                    inner.state = SlotState::Loaded(Arc::clone(&overlay));
                    if attach {
                        surface.attach(&name, &overlay);
                        inner.visible = true;
                    }
                    LoadOutcome::Loaded(overlay)
                }
                Err(e) => {
                    error!(overlay = %name, source = %source, error = %e, "Overlay load failed");
                    let message = e.to_string();
                    inner.state = SlotState::Failed(message.clone());
                    inner.visible = false;
                    LoadOutcome::Failed(message)
                }
            }
        })
    }

    /// Flip visibility, loading first when needed.
    ///
    /// Toggling while a load is in flight flips whether that load attaches
    /// when it finishes.
    pub async fn toggle(&self, show_spinner: bool) -> SlotStatus {
        {
            let mut inner = self.inner.lock().await;
            if inner.visible {
                self.surface.detach(&self.name);
                inner.visible = false;
                return self.snapshot(&inner);
            }
            if let SlotState::Loading { attach, .. } = &mut inner.state {
                *attach = !*attach;
                return self.snapshot(&inner);
            }
        }

        self.ensure_loaded(LoadOptions {
            attach: true,
            show_spinner,
        })
        .await;
        self.status().await
    }

    pub async fn status(&self) -> SlotStatus {
        let inner = self.inner.lock().await;
        self.snapshot(&inner)
    }

    fn snapshot(&self, inner: &SlotInner) -> SlotStatus {
        let (show_spinner, overlay, error) = match &inner.state {
            SlotState::Loading { show_spinner, .. } => (*show_spinner, None, None),
            SlotState::Loaded(overlay) => (false, Some(overlay), None),
            SlotState::Failed(message) => (false, None, Some(message.clone())),
            SlotState::Idle => (false, None, None),
        };

        SlotStatus {
            name: self.name.clone(),
            source: self.source.clone(),
            state: inner.state.name(),
            visible: inner.visible,
            show_spinner,
            bounds: overlay.map(|o| o.bounds),
            width: overlay.map(|o| o.width),
            height: overlay.map(|o| o.height),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DecodePool;

    fn slot(source: &str) -> (OverlaySlot, Arc<OverlayRegistry>) {
        let decoder = Arc::new(OverlayDecoder::new(Arc::new(DecodePool::new(1).unwrap())));
        let registry = Arc::new(OverlayRegistry::new());
        let slot = OverlaySlot::new("test", source, decoder, registry.clone());
        (slot, registry)
    }

    #[tokio::test]
    async fn test_initial_status() {
        let (slot, _) = slot("/nonexistent.tif");
        let status = slot.status().await;
        assert_eq!(status.state, "idle");
        assert!(!status.visible);
        assert!(!status.show_spinner);
        assert!(status.bounds.is_none());
    }

    #[tokio::test]
    async fn test_failed_load_recorded_and_retryable() {
        let (slot, registry) = slot("/nonexistent/overlay.tif");

        let outcome = slot.ensure_loaded(LoadOptions::interactive()).await;
        assert!(matches!(outcome, LoadOutcome::Failed(_)));

        let status = slot.status().await;
        assert_eq!(status.state, "failed");
        assert!(!status.visible);
        assert!(status.error.is_some());
        assert!(!registry.is_attached("test"));

        // Failed slots retry on the next request
        let status = slot.toggle(true).await;
        assert_eq!(status.state, "failed");
    }

    #[tokio::test]
    async fn test_status_serialization_skips_empty_fields() {
        let (slot, _) = slot("/nonexistent.tif");
        let json = serde_json::to_value(slot.status().await).unwrap();
        assert_eq!(json["name"], "test");
        assert_eq!(json["state"], "idle");
        assert!(json.get("bounds").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_registry_attach_detach() {
        let registry = OverlayRegistry::new();
        let overlay = Arc::new(RenderedOverlay {
            png: bytes::Bytes::new(),
            png_mode: None,
            width: 1,
            height: 1,
            bounds: GeoBounds {
                min_lat: 0.0,
                min_lng: 0.0,
                max_lat: 1.0,
                max_lng: 1.0,
            },
            loaded_at: chrono::Utc::now(),
        });
        registry.attach("a", &overlay);
        assert!(registry.is_attached("a"));
        assert_eq!(registry.attached_names(), vec!["a".to_string()]);
        registry.detach("a");
        assert!(!registry.is_attached("a"));
    }
}
