//! HTTP request handlers for the bloom API.
//!
//! - `random_points`: uniform point sampling in user-drawn shapes
//! - `overlays`: GeoTIFF overlay state, toggling and PNG export
//! - `health`: health check and Prometheus metrics

pub mod health;
pub mod overlays;
pub mod random_points;
