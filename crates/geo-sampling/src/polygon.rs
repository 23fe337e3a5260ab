//! Point-in-polygon testing.

use crate::point::Point;

/// Even-odd ray casting test, with longitude as x and latitude as y.
///
/// The ring is closed implicitly (the last vertex connects to the first).
/// Self-intersecting rings follow the even-odd rule. Points exactly on an
/// edge or vertex may land on either side. Callers must pass at least
/// three vertices.
pub fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    let (x, y) = (point.lng, point.lat);
    let n = polygon.len();
    if n == 0 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;

    for i in 0..n {
        let (xi, yi) = (polygon[i].lng, polygon[i].lat);
        let (xj, yj) = (polygon[j].lng, polygon[j].lat);

        if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }

    inside
}
