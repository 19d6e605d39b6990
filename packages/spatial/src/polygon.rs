//! Horizontal ray-casting containment test.
//!
//! Points exactly on an edge and horizontal edges are not special-cased.
//! Boundary points fall on whichever side the half-open comparisons in
//! [`contains`] put them.

use geo::Coord;

/// Returns `true` if `point` lies inside the closed `ring`.
///
/// Each edge `(p1, p2)`, including the closing edge from the last vertex
/// back to the first, toggles the result when a horizontal ray from
/// `point` crosses it: `point.y` must be above `min(p1.y, p2.y)`, at or
/// below `max(p1.y, p2.y)`, and `point.x` at or left of `max(p1.x, p2.x)`.
/// Vertical edges always toggle; other edges toggle when `point.x` is at
/// or left of the edge's x-intercept at `point.y`.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn contains(point: Coord<f64>, ring: &[Coord<f64>]) -> bool {
    let Some(&last) = ring.last() else {
        return false;
    };

    let mut inside = false;
    let mut p1 = last;

    for &p2 in ring {
        if point.y > p1.y.min(p2.y) && point.y <= p1.y.max(p2.y) && point.x <= p1.x.max(p2.x) {
            if p1.x == p2.x {
                inside = !inside;
            } else if p1.y != p2.y {
                let x_intercept = (point.y - p1.y) * (p2.x - p1.x) / (p2.y - p1.y) + p1.x;
                if point.x <= x_intercept {
                    inside = !inside;
                }
            }
        }
        p1 = p2;
    }

    inside
}
