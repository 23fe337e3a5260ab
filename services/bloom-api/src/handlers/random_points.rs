//! POST /api/random-points/:shape

use axum::{
    extract::{Path, Query},
    Json,
};
use bytes::Bytes;
use geo_sampling::{Point, SampleCount, SampleRequest, ShapeKind, ShapeSpec};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct RandomPointsQuery {
    /// Raw so that non-numeric input falls back to the default count.
    pub count: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RandomPointsResponse {
    pub points: Vec<Point>,
}

/// Parse a request body, treating empty or malformed JSON as `{}`.
fn parse_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap_or_else(|_| Value::Object(Default::default()))
}

/// POST /api/random-points/:shape?count=N
#[instrument(skip_all, fields(shape = %shape, count = ?params.count))]
pub async fn random_points_handler(
    Path(shape): Path<String>,
    Query(params): Query<RandomPointsQuery>,
    body: Bytes,
) -> Result<Json<RandomPointsResponse>, ApiError> {
    let kind: ShapeKind = shape.parse()?;
    metrics::counter!("random_points_requests_total", "shape" => kind.as_str()).increment(1);

    let spec = ShapeSpec::from_json(kind, &parse_body(&body))?;
    let request = SampleRequest::new(spec, SampleCount::from_query(params.count.as_deref()));
    let requested = request.count.get();

    // Polygon rejection sampling can take a while on thin shapes
    let points = tokio::task::spawn_blocking(move || request.run())
        .await
        .map_err(|e| ApiError::Internal(format!("sampling task failed: {}", e)))?;

    metrics::counter!("random_points_generated_total", "shape" => kind.as_str())
        .increment(points.len() as u64);
    debug!(
        shape = kind.as_str(),
        requested = requested,
        returned = points.len(),
        "Sampled random points"
    );

    Ok(Json(RandomPointsResponse { points }))
}
