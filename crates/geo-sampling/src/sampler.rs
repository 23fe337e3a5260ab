//! Random point samplers.
//!
//! Each sampler has a `_with_rng` form taking the random source explicitly;
//! the plain form draws from the thread-local RNG and is non-deterministic.

use std::f64::consts::PI;

use rand::Rng;
use tracing::debug;

use crate::point::{BoundingBox, Point, EARTH_RADIUS_M};
use crate::polygon::point_in_polygon;
use crate::shape::ShapeSpec;

/// Rejection sampling gives up after `count * MAX_ATTEMPTS_PER_POINT`
/// candidate draws. Zero-area or sliver polygons return short results.
pub const MAX_ATTEMPTS_PER_POINT: usize = 1000;

/// Sample `count` points inside `shape`.
///
/// Rectangles and circles always return exactly `count` points; polygons
/// may return fewer (see [`sample_polygon`]).
pub fn sample(shape: &ShapeSpec, count: usize) -> Vec<Point> {
    sample_with_rng(shape, count, &mut rand::thread_rng())
}

pub fn sample_with_rng<R: Rng + ?Sized>(shape: &ShapeSpec, count: usize, rng: &mut R) -> Vec<Point> {
    match shape {
        ShapeSpec::Rectangle {
            north_east,
            south_west,
        } => sample_rectangle_with_rng(*north_east, *south_west, count, rng),
        ShapeSpec::Circle {
            center,
            radius_meters,
        } => sample_circle_with_rng(*center, *radius_meters, count, rng),
        ShapeSpec::Polygon { vertices } => sample_polygon_with_rng(vertices, count, rng),
    }
}

/// Uniform points in the box spanned by two corners.
pub fn sample_rectangle(ne: Point, sw: Point, count: usize) -> Vec<Point> {
    sample_rectangle_with_rng(ne, sw, count, &mut rand::thread_rng())
}

pub fn sample_rectangle_with_rng<R: Rng + ?Sized>(
    ne: Point,
    sw: Point,
    count: usize,
    rng: &mut R,
) -> Vec<Point> {
    let bbox = BoundingBox::from_corners(ne, sw);
    (0..count).map(|_| uniform_in_box(&bbox, rng)).collect()
}

/// Uniform points within a great-circle radius of `center`.
///
/// Draws a uniform disk in the local tangent plane (`w = r * sqrt(u)`) and
/// applies the spherical direct formula, so density stays uniform per unit
/// area even at high latitude. Longitude is not wrapped near the poles.
pub fn sample_circle(center: Point, radius_meters: f64, count: usize) -> Vec<Point> {
    sample_circle_with_rng(center, radius_meters, count, &mut rand::thread_rng())
}

pub fn sample_circle_with_rng<R: Rng + ?Sized>(
    center: Point,
    radius_meters: f64,
    count: usize,
    rng: &mut R,
) -> Vec<Point> {
    let lat1 = center.lat.to_radians();
    let lon1 = center.lng.to_radians();
    let (sin_lat1, cos_lat1) = lat1.sin_cos();

    let mut points = Vec::with_capacity(count);
    for _ in 0..count {
        let u: f64 = rng.gen();
        let v: f64 = rng.gen();
        let w = radius_meters * u.sqrt();
        let bearing = 2.0 * PI * v;
        let delta = w / EARTH_RADIUS_M;
        let (sin_delta, cos_delta) = delta.sin_cos();

        let lat2 = (sin_lat1 * cos_delta + cos_lat1 * sin_delta * bearing.cos()).asin();
        let lon2 = lon1
            + (bearing.sin() * sin_delta * cos_lat1).atan2(cos_delta - sin_lat1 * lat2.sin());

        points.push(Point::new(lat2.to_degrees(), lon2.to_degrees()));
    }
    points
}

/// Rejection-sample up to `count` points inside a polygon ring.
///
/// Candidates are drawn uniformly from the ring's bounding box and kept
/// when [`point_in_polygon`] accepts them. Stops after
/// `count * MAX_ATTEMPTS_PER_POINT` draws, so the result may be shorter
/// than `count` (possibly empty) for thin or degenerate polygons.
pub fn sample_polygon(vertices: &[Point], count: usize) -> Vec<Point> {
    sample_polygon_with_rng(vertices, count, &mut rand::thread_rng())
}

pub fn sample_polygon_with_rng<R: Rng + ?Sized>(
    vertices: &[Point],
    count: usize,
    rng: &mut R,
) -> Vec<Point> {
    let bbox = BoundingBox::enclosing(vertices);
    let max_attempts = count.saturating_mul(MAX_ATTEMPTS_PER_POINT);

    let mut points = Vec::with_capacity(count);
    let mut attempts = 0usize;

    while points.len() < count && attempts < max_attempts {
        attempts += 1;
        let candidate = uniform_in_box(&bbox, rng);
        if point_in_polygon(candidate, vertices) {
            points.push(candidate);
        }
    }

    if points.len() < count {
        debug!(
            requested = count,
            accepted = points.len(),
            attempts = attempts,
            "Polygon sampling hit attempt cap"
        );
    }

    points
}

#[inline]
fn uniform_in_box<R: Rng + ?Sized>(bbox: &BoundingBox, rng: &mut R) -> Point {
    let lat = bbox.min_lat + rng.gen::<f64>() * (bbox.max_lat - bbox.min_lat);
    let lng = bbox.min_lng + rng.gen::<f64>() * (bbox.max_lng - bbox.min_lng);
    Point::new(lat, lng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::haversine_distance;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_rectangle_exact_count_and_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let ne = Point::new(10.0, 20.0);
        let sw = Point::new(-5.0, 15.0);
        let pts = sample_rectangle_with_rng(ne, sw, 500, &mut rng);

        assert_eq!(pts.len(), 500);
        for p in &pts {
            assert!(p.lat >= -5.0 && p.lat <= 10.0);
            assert!(p.lng >= 15.0 && p.lng <= 20.0);
        }
    }

    #[test]
    fn test_degenerate_rectangle_repeats_point() {
        let p = Point::new(3.0, 4.0);
        let pts = sample_rectangle(p, p, 5);
        assert!(pts.iter().all(|q| *q == p));
    }

    #[test]
    fn test_circle_within_radius() {
        let mut rng = StdRng::seed_from_u64(11);
        let center = Point::new(45.0, -122.0);
        let pts = sample_circle_with_rng(center, 10_000.0, 1000, &mut rng);

        assert_eq!(pts.len(), 1000);
        for p in &pts {
            assert!(haversine_distance(center, *p) <= 10_000.0 + 1e-6);
        }
    }

    #[test]
    fn test_polygon_degenerate_returns_short() {
        // All vertices collinear, zero area
        let line = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 2.0),
        ];
        let mut rng = StdRng::seed_from_u64(3);
        let pts = sample_polygon_with_rng(&line, 4, &mut rng);
        assert!(pts.len() < 4);
    }

    #[test]
    fn test_zero_count() {
        let tri = vec![Point::new(0.0, 0.0), Point::new(0.0, 1.0), Point::new(1.0, 0.0)];
        assert!(sample_polygon(&tri, 0).is_empty());
        assert!(sample_rectangle(tri[0], tri[2], 0).is_empty());
    }
}
