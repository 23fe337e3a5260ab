//! Statistical properties of the samplers.
//!
//! Seeded RNGs keep the distribution checks stable; tolerances are several
//! standard deviations wide.

use geo_sampling::{
    haversine_distance, point_in_polygon, sample, sample_circle_with_rng,
    sample_polygon_with_rng, sample_rectangle_with_rng, Point, SampleCount, SampleRequest,
    ShapeKind, ShapeSpec, MAX_ATTEMPTS_PER_POINT,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use test_utils::{regions, shapes};

fn ring(vertices: &[(f64, f64)]) -> Vec<Point> {
    vertices.iter().map(|&(lat, lng)| Point::new(lat, lng)).collect()
}

fn corners(region: ((f64, f64), (f64, f64))) -> (Point, Point) {
    let ((ne_lat, ne_lng), (sw_lat, sw_lng)) = region;
    (Point::new(ne_lat, ne_lng), Point::new(sw_lat, sw_lng))
}

// ============================================================================
// Rectangle
// ============================================================================

#[test]
fn test_rectangle_points_inside_region() {
    let mut rng = StdRng::seed_from_u64(1);
    let (ne, sw) = corners(regions::CONUS);
    let points = sample_rectangle_with_rng(ne, sw, 5000, &mut rng);

    assert_eq!(points.len(), 5000);
    for p in &points {
        assert!(p.lat >= sw.lat && p.lat <= ne.lat, "lat {} out of range", p.lat);
        assert!(p.lng >= sw.lng && p.lng <= ne.lng, "lng {} out of range", p.lng);
    }
}

#[test]
fn test_rectangle_is_uniform_in_each_axis() {
    let mut rng = StdRng::seed_from_u64(2);
    let (ne, sw) = corners(regions::JAPAN_SAKURA);
    let points = sample_rectangle_with_rng(ne, sw, 20_000, &mut rng);

    let mid_lat = (ne.lat + sw.lat) / 2.0;
    let mid_lng = (ne.lng + sw.lng) / 2.0;
    let north = points.iter().filter(|p| p.lat > mid_lat).count() as f64 / 20_000.0;
    let east = points.iter().filter(|p| p.lng > mid_lng).count() as f64 / 20_000.0;
    assert!((north - 0.5).abs() < 0.03, "north fraction {}", north);
    assert!((east - 0.5).abs() < 0.03, "east fraction {}", east);
}

#[test]
fn test_degenerate_rectangle_returns_the_point() {
    let (ne, sw) = corners(regions::POINT);
    let points = sample_rectangle_with_rng(ne, sw, 10, &mut StdRng::seed_from_u64(3));
    assert_eq!(points.len(), 10);
    assert!(points.iter().all(|p| *p == Point::new(10.0, 10.0)));
}

// ============================================================================
// Circle
// ============================================================================

#[test]
fn test_circle_points_within_radius() {
    let mut rng = StdRng::seed_from_u64(4);
    let center = Point::new(35.68, 139.69);
    let radius = 50_000.0;
    let points = sample_circle_with_rng(center, radius, 5000, &mut rng);

    assert_eq!(points.len(), 5000);
    for p in &points {
        let d = haversine_distance(center, *p);
        assert!(d <= radius + 1e-3, "distance {} exceeds radius", d);
    }
}

#[test]
fn test_circle_radial_density_grows_with_radius() {
    let mut rng = StdRng::seed_from_u64(5);
    let center = Point::new(45.0, -122.0);
    let radius = 10_000.0;
    let n = 20_000;
    let points = sample_circle_with_rng(center, radius, n, &mut rng);

    // Uniform over area: P(d <= r/2) = 1/4, P(d <= r/sqrt 2) = 1/2
    let inner = points
        .iter()
        .filter(|p| haversine_distance(center, **p) <= radius / 2.0)
        .count() as f64
        / n as f64;
    let half_area = points
        .iter()
        .filter(|p| haversine_distance(center, **p) <= radius / 2f64.sqrt())
        .count() as f64
        / n as f64;

    assert!((inner - 0.25).abs() < 0.02, "inner fraction {}", inner);
    assert!((half_area - 0.5).abs() < 0.02, "half-area fraction {}", half_area);
}

#[test]
fn test_circle_covers_all_bearings() {
    let mut rng = StdRng::seed_from_u64(6);
    let center = Point::new(0.0, 0.0);
    let points = sample_circle_with_rng(center, 100_000.0, 4000, &mut rng);

    let quadrant = |p: &&Point| (p.lat >= 0.0, p.lng >= 0.0);
    for q in [(true, true), (true, false), (false, true), (false, false)] {
        let share = points.iter().filter(|p| quadrant(p) == q).count() as f64 / 4000.0;
        assert!((share - 0.25).abs() < 0.04, "quadrant {:?} share {}", q, share);
    }
}

// ============================================================================
// Polygon
// ============================================================================

#[test]
fn test_polygon_points_inside() {
    let mut rng = StdRng::seed_from_u64(7);
    let valley = ring(&shapes::WILLAMETTE);
    let points = sample_polygon_with_rng(&valley, 2000, &mut rng);

    assert_eq!(points.len(), 2000);
    assert!(points.iter().all(|p| point_in_polygon(*p, &valley)));
}

#[test]
fn test_acceptance_ratio_matches_area_ratio() {
    let mut rng = StdRng::seed_from_u64(8);
    let square = ring(&shapes::square(10.0, 10.0, 1.0));
    let diamond = ring(&shapes::diamond(10.0, 10.0, 1.0));

    // Both rings share the bounding box [9, 11] x [9, 11]
    let candidates =
        sample_rectangle_with_rng(Point::new(11.0, 11.0), Point::new(9.0, 9.0), 20_000, &mut rng);
    let ratio = |poly: &[Point]| {
        candidates.iter().filter(|p| point_in_polygon(**p, poly)).count() as f64 / 20_000.0
    };

    let square_ratio = ratio(&square);
    let diamond_ratio = ratio(&diamond);
    assert!(square_ratio > 0.99, "square acceptance {}", square_ratio);
    assert!((diamond_ratio - 0.5).abs() < 0.02, "diamond acceptance {}", diamond_ratio);
}

#[test]
fn test_sliver_polygon_terminates() {
    let mut rng = StdRng::seed_from_u64(9);
    let sliver = ring(&shapes::sliver(0.0, 0.0));
    let points = sample_polygon_with_rng(&sliver, 5, &mut rng);

    assert!(points.len() <= 5);
    assert!(points.iter().all(|p| point_in_polygon(*p, &sliver)));
    assert!(MAX_ATTEMPTS_PER_POINT >= 1);
}

// ============================================================================
// Request level
// ============================================================================

#[test]
fn test_unseeded_calls_differ() {
    let (ne, sw) = corners(regions::CONUS);
    let shape = ShapeSpec::Rectangle {
        north_east: ne,
        south_west: sw,
    };
    assert_ne!(sample(&shape, 20), sample(&shape, 20));
}

#[test]
fn test_request_from_json_body() {
    let body = json!({ "center": [40.0, -100.0], "radius": 2500 });
    let shape = ShapeSpec::from_json(ShapeKind::Circle, &body).unwrap();
    let request = SampleRequest::new(shape, SampleCount::from_query(Some("12.2")));

    let points = request.run();
    assert_eq!(points.len(), 13);
    for p in points {
        assert!(haversine_distance(Point::new(40.0, -100.0), p) <= 2500.0 + 1e-3);
    }
}

#[test]
fn test_count_is_clamped() {
    assert_eq!(SampleCount::from_query(Some("0")).get(), 1);
    assert_eq!(SampleCount::from_query(Some("999999")).get(), 5000);
    assert_eq!(SampleCount::from_query(Some("lots")).get(), 100);
    assert_eq!(SampleCount::from_query(None).get(), 100);
}
