//! Overlay endpoints.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use raster_overlay::SlotStatus;
use serde::Serialize;
use tracing::info;

use crate::error::ApiError;
use crate::state::{AppState, OverlayEntry};

#[derive(Debug, Serialize)]
pub struct OverlayListResponse {
    pub overlays: Vec<SlotStatus>,
}

fn find<'a>(state: &'a AppState, name: &str) -> Result<&'a OverlayEntry, ApiError> {
    state
        .overlay(name)
        .ok_or_else(|| ApiError::OverlayNotFound(name.to_string()))
}

/// GET /api/overlays
pub async fn list_overlays_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<OverlayListResponse> {
    let mut overlays = Vec::with_capacity(state.overlays.len());
    for entry in &state.overlays {
        overlays.push(entry.slot.status().await);
    }
    Json(OverlayListResponse { overlays })
}

/// GET /api/overlays/:name
pub async fn get_overlay_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<SlotStatus>, ApiError> {
    let entry = find(&state, &name)?;
    Ok(Json(entry.slot.status().await))
}

/// POST /api/overlays/:name/toggle
///
/// Loads on demand. A failed load still answers 200 with `state: "failed"`.
pub async fn toggle_overlay_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<SlotStatus>, ApiError> {
    let entry = find(&state, &name)?;
    let status = entry.slot.toggle(entry.show_spinner).await;
    info!(
        overlay = %name,
        state = status.state,
        visible = status.visible,
        "Overlay toggled"
    );
    Ok(Json(status))
}

/// GET /api/overlays/:name/image.png
pub async fn overlay_image_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let entry = find(&state, &name)?;
    let overlay = entry
        .slot
        .overlay()
        .await
        .ok_or_else(|| ApiError::OverlayNotLoaded(name.clone()))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "max-age=3600"),
        ],
        overlay.png.clone(),
    )
        .into_response())
}
