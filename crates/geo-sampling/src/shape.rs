//! Shape specifications and request payload parsing.
//!
//! Request bodies use the front end's wire format:
//! - rectangle: `{ "ne": [lat, lng], "sw": [lat, lng] }`
//! - circle: `{ "center": [lat, lng], "radius": meters }`
//! - polygon: `{ "points": [[lat, lng], ...] }`

use std::str::FromStr;

use serde_json::Value;

use crate::error::PayloadError;
use crate::point::Point;

/// A shape to sample within.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeSpec {
    Rectangle { north_east: Point, south_west: Point },
    Circle { center: Point, radius_meters: f64 },
    Polygon { vertices: Vec<Point> },
}

/// Shape discriminator taken from the request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Polygon,
}

impl ShapeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Circle => "circle",
            ShapeKind::Polygon => "polygon",
        }
    }
}

impl FromStr for ShapeKind {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rectangle" => Ok(ShapeKind::Rectangle),
            "circle" => Ok(ShapeKind::Circle),
            "polygon" => Ok(ShapeKind::Polygon),
            other => Err(PayloadError::UnsupportedShape(other.to_string())),
        }
    }
}

impl ShapeSpec {
    /// Build a shape of the given kind from a JSON body.
    ///
    /// A missing or non-object body behaves like `{}` and fails the
    /// per-shape field checks.
    pub fn from_json(kind: ShapeKind, body: &Value) -> Result<Self, PayloadError> {
        match kind {
            ShapeKind::Rectangle => {
                let ne = body.get("ne").and_then(parse_point);
                let sw = body.get("sw").and_then(parse_point);
                match (ne, sw) {
                    (Some(north_east), Some(south_west)) => Ok(ShapeSpec::Rectangle {
                        north_east,
                        south_west,
                    }),
                    _ => Err(PayloadError::InvalidRectangle),
                }
            }
            ShapeKind::Circle => {
                let center = body
                    .get("center")
                    .and_then(parse_point)
                    .ok_or(PayloadError::InvalidCircle)?;
                let radius = body.get("radius").and_then(parse_number).unwrap_or(0.0);
                if !radius.is_finite() || radius <= 0.0 {
                    return Err(PayloadError::InvalidCircle);
                }
                Ok(ShapeSpec::Circle {
                    center,
                    radius_meters: radius,
                })
            }
            ShapeKind::Polygon => {
                let raw = body
                    .get("points")
                    .and_then(Value::as_array)
                    .ok_or(PayloadError::InvalidPolygon)?;
                let vertices = raw
                    .iter()
                    .map(parse_point)
                    .collect::<Option<Vec<_>>>()
                    .ok_or(PayloadError::InvalidPolygon)?;
                if vertices.len() < 3 {
                    return Err(PayloadError::InvalidPolygon);
                }
                Ok(ShapeSpec::Polygon { vertices })
            }
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            ShapeSpec::Rectangle { .. } => ShapeKind::Rectangle,
            ShapeSpec::Circle { .. } => ShapeKind::Circle,
            ShapeSpec::Polygon { .. } => ShapeKind::Polygon,
        }
    }
}

/// `[lat, lng]` with two finite numbers. Extra elements are ignored.
fn parse_point(value: &Value) -> Option<Point> {
    let arr = value.as_array()?;
    if arr.len() < 2 {
        return None;
    }
    let p = Point::new(parse_number(&arr[0])?, parse_number(&arr[1])?);
    p.is_finite().then_some(p)
}

/// Numbers, or strings holding numbers.
fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Number of points to draw, always within `[MIN, MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleCount(usize);

impl SampleCount {
    pub const MIN: usize = 1;
    pub const MAX: usize = 5000;
    pub const DEFAULT: usize = 100;

    pub fn new(n: usize) -> Self {
        Self(n.clamp(Self::MIN, Self::MAX))
    }

    /// Parse the `count` query parameter.
    ///
    /// Missing, empty or non-numeric input falls back to the default;
    /// fractional values round up.
    pub fn from_query(raw: Option<&str>) -> Self {
        let parsed = raw
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|v| v.is_finite());

        match parsed {
            Some(v) => Self::new(v.max(0.0).min(Self::MAX as f64).ceil() as usize),
            None => Self(Self::DEFAULT),
        }
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for SampleCount {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// One sampling request: a validated shape plus a clamped count.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRequest {
    pub shape: ShapeSpec,
    pub count: SampleCount,
}

impl SampleRequest {
    pub fn new(shape: ShapeSpec, count: SampleCount) -> Self {
        Self { shape, count }
    }

    /// Run the sampler for this request.
    pub fn run(&self) -> Vec<Point> {
        crate::sampler::sample(&self.shape, self.count.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shape_kind_parse() {
        assert_eq!("circle".parse::<ShapeKind>().unwrap(), ShapeKind::Circle);
        assert!(matches!(
            "hexagon".parse::<ShapeKind>(),
            Err(PayloadError::UnsupportedShape(s)) if s == "hexagon"
        ));
    }

    #[test]
    fn test_rectangle_payload() {
        let body = json!({ "ne": [10.0, 20.0], "sw": [0.0, 5.0] });
        let shape = ShapeSpec::from_json(ShapeKind::Rectangle, &body).unwrap();
        assert_eq!(
            shape,
            ShapeSpec::Rectangle {
                north_east: Point::new(10.0, 20.0),
                south_west: Point::new(0.0, 5.0),
            }
        );

        let missing = json!({ "ne": [10.0, 20.0] });
        assert_eq!(
            ShapeSpec::from_json(ShapeKind::Rectangle, &missing),
            Err(PayloadError::InvalidRectangle)
        );
    }

    #[test]
    fn test_circle_payload_rejects_bad_radius() {
        for radius in [json!(0), json!(-5), json!("abc"), json!(null)] {
            let body = json!({ "center": [1.0, 2.0], "radius": radius });
            assert_eq!(
                ShapeSpec::from_json(ShapeKind::Circle, &body),
                Err(PayloadError::InvalidCircle)
            );
        }

        let ok = json!({ "center": [1.0, 2.0], "radius": "1500" });
        assert!(matches!(
            ShapeSpec::from_json(ShapeKind::Circle, &ok),
            Ok(ShapeSpec::Circle { radius_meters, .. }) if radius_meters == 1500.0
        ));
    }

    #[test]
    fn test_polygon_payload_needs_three_vertices() {
        let two = json!({ "points": [[0, 0], [1, 1]] });
        assert_eq!(
            ShapeSpec::from_json(ShapeKind::Polygon, &two),
            Err(PayloadError::InvalidPolygon)
        );

        let three = json!({ "points": [[0, 0], [1, 1], [0, 1]] });
        assert_eq!(
            ShapeSpec::from_json(ShapeKind::Polygon, &three).unwrap().kind(),
            ShapeKind::Polygon
        );
    }

    #[test]
    fn test_empty_body_is_invalid_for_every_shape() {
        let body = Value::Null;
        assert!(ShapeSpec::from_json(ShapeKind::Rectangle, &body).is_err());
        assert!(ShapeSpec::from_json(ShapeKind::Circle, &body).is_err());
        assert!(ShapeSpec::from_json(ShapeKind::Polygon, &body).is_err());
    }

    #[test]
    fn test_sample_count_clamping() {
        assert_eq!(SampleCount::from_query(None).get(), 100);
        assert_eq!(SampleCount::from_query(Some("")).get(), 100);
        assert_eq!(SampleCount::from_query(Some("abc")).get(), 100);
        assert_eq!(SampleCount::from_query(Some("0")).get(), 1);
        assert_eq!(SampleCount::from_query(Some("-20")).get(), 1);
        assert_eq!(SampleCount::from_query(Some("250")).get(), 250);
        assert_eq!(SampleCount::from_query(Some("12.2")).get(), 13);
        assert_eq!(SampleCount::from_query(Some("999999")).get(), 5000);
    }
}
