//! Bloom API Service Library
//!
//! HTTP surface for the flower-phenology map: random points inside
//! user-drawn shapes and GeoTIFF climate overlays.

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Build the application router.
pub fn build_router(state: Arc<AppState>, prometheus: PrometheusHandle) -> Router {
    Router::new()
        // Sampling
        .route(
            "/api/random-points/:shape",
            post(handlers::random_points::random_points_handler),
        )
        // Overlays
        .route(
            "/api/overlays",
            get(handlers::overlays::list_overlays_handler),
        )
        .route(
            "/api/overlays/:name",
            get(handlers::overlays::get_overlay_handler),
        )
        .route(
            "/api/overlays/:name/toggle",
            post(handlers::overlays::toggle_overlay_handler),
        )
        .route(
            "/api/overlays/:name/image.png",
            get(handlers::overlays::overlay_image_handler),
        )
        // Health and metrics
        .route("/health", get(handlers::health::health_handler))
        .route("/metrics", get(handlers::health::metrics_handler))
        // Middleware
        .layer(Extension(state))
        .layer(Extension(prometheus))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
