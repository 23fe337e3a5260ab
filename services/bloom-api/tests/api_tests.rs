//! Router-level tests: status codes and JSON bodies as a client sees them.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use bloom_api::build_router;
use bloom_api::config::OverlayConfig;
use bloom_api::state::AppState;
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::Value;
use test_utils::{grid, rgb_geotiff, write_temp_tiff};
use tower::ServiceExt;

fn app(config: OverlayConfig) -> Router {
    let state = Arc::new(AppState::new(config, Some(1)).unwrap());
    let handle = PrometheusBuilder::new().build_recorder().handle();
    build_router(state, handle)
}

async fn send(app: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_random_points_circle() {
    let app = app(OverlayConfig::default());
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/random-points/circle?count=25",
        r#"{"center":[35.0,135.0],"radius":1000}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let points = body["points"].as_array().unwrap();
    assert_eq!(points.len(), 25);
    for p in points {
        let pair = p.as_array().unwrap();
        assert_eq!(pair.len(), 2);
        assert!((pair[0].as_f64().unwrap() - 35.0).abs() < 0.01);
        assert!((pair[1].as_f64().unwrap() - 135.0).abs() < 0.02);
    }
}

#[tokio::test]
async fn test_random_points_errors() {
    let app = app(OverlayConfig::default());

    let (status, body) = send_json(&app, "POST", "/api/random-points/rectangle", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Invalid rectangle payload: expected { ne:[lat,lng], sw:[lat,lng] }"
    );

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/random-points/polygon",
        r#"{"points":[[0,0]]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Invalid polygon payload: expected { points:[[lat,lng], ...] } with >= 3 vertices"
    );

    let (status, body) = send_json(&app, "POST", "/api/random-points/triangle", "{}").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Unsupported shape: triangle");
}

#[tokio::test]
async fn test_overlay_lifecycle() {
    let file = write_temp_tiff(&rgb_geotiff(grid::SIMPLE_8X4));
    let config = OverlayConfig::from_yaml(&format!(
        "overlays:\n  - name: scene\n    source: {}\n    show_spinner: false\n",
        file.path().display()
    ))
    .unwrap();
    let app = app(config);

    let (status, body) = send_json(&app, "GET", "/api/overlays", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overlays"][0]["name"], "scene");
    assert_eq!(body["overlays"][0]["state"], "idle");

    let (status, _) = send(&app, "GET", "/api/overlays/scene/image.png", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send_json(&app, "POST", "/api/overlays/scene/toggle", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "loaded");
    assert_eq!(body["visible"], true);
    assert_eq!(body["bounds"]["min_lng"], -10.0);
    assert_eq!(body["bounds"]["max_lat"], 10.0);

    let (status, png) = send(&app, "GET", "/api/overlays/scene/image.png", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&png[1..4], b"PNG");

    let (status, body) = send_json(&app, "GET", "/api/overlays/scene", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["show_spinner"], false);

    let (status, _) = send(&app, "GET", "/api/overlays/other", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_and_metrics() {
    let app = app(OverlayConfig::default());

    let (status, body) = send_json(&app, "GET", "/health", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, _) = send(&app, "GET", "/metrics", "").await;
    assert_eq!(status, StatusCode::OK);
}
