//! Uniform random point sampling over geographic shapes.
//!
//! Provides the samplers used to seed map markers:
//! - Rectangle (independent uniform lat/lng)
//! - Geodesic circle (uniform disk projected with spherical trigonometry)
//! - Polygon (rejection sampling inside the bounding box)
//!
//! All coordinates are `(lat, lng)` degrees on an equirectangular plane.
//! Nothing is wrapped or normalized across the antimeridian.

pub mod error;
pub mod point;
pub mod polygon;
pub mod sampler;
pub mod shape;

pub use error::PayloadError;
pub use point::{haversine_distance, BoundingBox, Point, EARTH_RADIUS_M};
pub use polygon::point_in_polygon;
pub use sampler::{
    sample, sample_circle, sample_circle_with_rng, sample_polygon, sample_polygon_with_rng,
    sample_rectangle, sample_rectangle_with_rng, sample_with_rng, MAX_ATTEMPTS_PER_POINT,
};
pub use shape::{SampleCount, SampleRequest, ShapeKind, ShapeSpec};
