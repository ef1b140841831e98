//! Geometry primitives for spacing measurement
//!
//! Point/segment distance, strict segment intersection, point-in-polygon,
//! and polygon-to-polygon edge distance. All coordinates are millimetres.

use serde::Serialize;

/// A 2D point in board millimetres
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Bit-exact key for hashing/deduplication of graph nodes
    pub fn key(&self) -> (u32, u32) {
        (self.x.to_bits(), self.y.to_bits())
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

impl BoundingBox {
    /// Tight box around a point set; empty input yields a degenerate box at origin
    pub fn from_points(points: &[Point]) -> Self {
        let mut bbox = Self {
            min: [f32::MAX, f32::MAX],
            max: [f32::MIN, f32::MIN],
        };
        for p in points {
            bbox.min[0] = bbox.min[0].min(p.x);
            bbox.min[1] = bbox.min[1].min(p.y);
            bbox.max[0] = bbox.max[0].max(p.x);
            bbox.max[1] = bbox.max[1].max(p.y);
        }
        if points.is_empty() {
            bbox = Self {
                min: [0.0, 0.0],
                max: [0.0, 0.0],
            };
        }
        bbox
    }

    /// Grow the box by `margin` on every side
    pub fn inflated(&self, margin: f32) -> Self {
        Self {
            min: [self.min[0] - margin, self.min[1] - margin],
            max: [self.max[0] + margin, self.max[1] + margin],
        }
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min[0] <= other.max[0]
            && self.max[0] >= other.min[0]
            && self.min[1] <= other.max[1]
            && self.max[1] >= other.min[1]
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
        )
    }

    /// Box-to-box gap distance (lower bound for any contained geometry)
    pub fn distance_to(&self, other: &BoundingBox) -> f32 {
        let dx = (self.min[0].max(other.min[0]) - self.max[0].min(other.max[0])).max(0.0);
        let dy = (self.min[1].max(other.min[1]) - self.max[1].min(other.max[1])).max(0.0);
        (dx * dx + dy * dy).sqrt()
    }
}

/// A closed polygon outline (last vertex implicitly connects to the first).
/// Holes are not modelled; at least 3 distinct vertices are required for
/// meaningful containment/distance results.
#[derive(Debug, Clone)]
pub struct Polygon {
    pub points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points)
    }

    /// Iterate the closed edge loop
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Ray-crossing point containment test
    pub fn contains(&self, p: Point) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let pi = self.points[i];
            let pj = self.points[j];
            if (pi.y > p.y) != (pj.y > p.y)
                && p.x < (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

/// Point-to-segment minimum distance; returns the closest point on the segment.
/// A degenerate segment (a == b) falls back to point-to-point distance.
pub fn point_segment_distance(p: Point, a: Point, b: Point) -> (f32, Point) {
    let ab = [b.x - a.x, b.y - a.y];
    let ap = [p.x - a.x, p.y - a.y];
    let ab_len2 = ab[0] * ab[0] + ab[1] * ab[1];

    if ab_len2 < 1e-10 {
        return (p.distance(a), a);
    }

    let t = ((ap[0] * ab[0] + ap[1] * ab[1]) / ab_len2).clamp(0.0, 1.0);
    let closest = Point::new(a.x + t * ab[0], a.y + t * ab[1]);
    (p.distance(closest), closest)
}

/// Sign of the cross product (p2-p1) x (p3-p1)
fn orientation(p1: Point, p2: Point, p3: Point) -> f32 {
    (p2.x - p1.x) * (p3.y - p1.y) - (p2.y - p1.y) * (p3.x - p1.x)
}

/// True iff the two open segments properly cross.
///
/// Collinear overlaps and endpoint touches are reported as non-intersections.
/// This is a deliberate tolerance, kept from the reference behavior: paths
/// grazing a polygon boundary are not treated as obstructed.
pub fn segments_intersect(p1: Point, p2: Point, p3: Point, p4: Point) -> bool {
    let d1 = orientation(p3, p4, p1);
    let d2 = orientation(p3, p4, p2);
    let d3 = orientation(p1, p2, p3);
    let d4 = orientation(p1, p2, p4);

    d1 * d2 < 0.0 && d3 * d4 < 0.0
}

/// Distances below this are treated as "certainly a violation"; the edge
/// scan stops early since a smaller result cannot change the outcome.
pub const EDGE_DISTANCE_EARLY_EXIT_MM: f32 = 1e-3;

/// Minimum polygon-to-polygon distance with the closest point on each outline.
///
/// Scans every vertex of A against every edge of B and vice versa. Overlapping
/// polygons produce a near-zero result because the two-sided scan always hits
/// the crossing edge from the inside vertex.
pub fn polygon_edge_distance(a: &Polygon, b: &Polygon) -> (f32, Point, Point) {
    let mut min_dist = f32::MAX;
    let mut closest_a = Point::new(0.0, 0.0);
    let mut closest_b = Point::new(0.0, 0.0);

    for &va in &a.points {
        for (e1, e2) in b.edges() {
            let (d, cp) = point_segment_distance(va, e1, e2);
            if d < min_dist {
                min_dist = d;
                closest_a = va;
                closest_b = cp;
                if min_dist < EDGE_DISTANCE_EARLY_EXIT_MM {
                    return (min_dist, closest_a, closest_b);
                }
            }
        }
    }

    for &vb in &b.points {
        for (e1, e2) in a.edges() {
            let (d, cp) = point_segment_distance(vb, e1, e2);
            if d < min_dist {
                min_dist = d;
                closest_a = cp;
                closest_b = vb;
                if min_dist < EDGE_DISTANCE_EARLY_EXIT_MM {
                    return (min_dist, closest_a, closest_b);
                }
            }
        }
    }

    (min_dist, closest_a, closest_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(cx: f32, cy: f32, half: f32) -> Polygon {
        Polygon::new(vec![
            Point::new(cx - half, cy - half),
            Point::new(cx + half, cy - half),
            Point::new(cx + half, cy + half),
            Point::new(cx - half, cy + half),
        ])
    }

    #[test]
    fn test_point_segment_distance_perpendicular() {
        let (d, cp) = point_segment_distance(
            Point::new(1.0, 1.0),
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
        );
        assert_relative_eq!(d, 1.0, epsilon = 1e-6);
        assert_relative_eq!(cp.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(cp.y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_point_segment_distance_endpoint_swap_symmetric() {
        let p = Point::new(3.0, 2.5);
        let a = Point::new(-1.0, 0.0);
        let b = Point::new(1.5, 0.5);
        let (d1, _) = point_segment_distance(p, a, b);
        let (d2, _) = point_segment_distance(p, b, a);
        assert_relative_eq!(d1, d2, epsilon = 1e-6);
    }

    #[test]
    fn test_point_segment_distance_on_segment_is_zero() {
        let (d, _) = point_segment_distance(
            Point::new(1.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
        );
        assert_relative_eq!(d, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_point_segment_distance_degenerate() {
        let a = Point::new(1.0, 1.0);
        let (d, cp) = point_segment_distance(Point::new(4.0, 5.0), a, a);
        assert_relative_eq!(d, 5.0, epsilon = 1e-6);
        assert_eq!(cp.key(), a.key());
    }

    #[test]
    fn test_segments_cross() {
        assert!(segments_intersect(
            Point::new(0.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 2.0),
            Point::new(2.0, 0.0),
        ));
    }

    #[test]
    fn test_segments_disjoint() {
        assert!(!segments_intersect(
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 1.0),
        ));
    }

    #[test]
    fn test_segments_touching_endpoint_not_intersecting() {
        // Shared endpoint: accepted as a non-intersection by design
        assert!(!segments_intersect(
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 0.0),
        ));
    }

    #[test]
    fn test_segments_collinear_overlap_not_intersecting() {
        assert!(!segments_intersect(
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(3.0, 0.0),
        ));
    }

    #[test]
    fn test_polygon_contains_centroid() {
        let sq = square(5.0, 5.0, 1.0);
        assert!(sq.contains(Point::new(5.0, 5.0)));
    }

    #[test]
    fn test_polygon_contains_far_outside() {
        let sq = square(5.0, 5.0, 1.0);
        assert!(!sq.contains(Point::new(100.0, 100.0)));
    }

    #[test]
    fn test_polygon_edge_distance_separated_squares() {
        // Unit squares centered 3mm apart -> 2mm gap between facing edges
        let a = square(0.0, 0.0, 0.5);
        let b = square(3.0, 0.0, 0.5);
        let (d, pa, pb) = polygon_edge_distance(&a, &b);
        assert_relative_eq!(d, 2.0, epsilon = 1e-5);
        assert_relative_eq!(pa.x, 0.5, epsilon = 1e-5);
        assert_relative_eq!(pb.x, 2.5, epsilon = 1e-5);
    }

    #[test]
    fn test_polygon_edge_distance_self_is_zero() {
        let a = square(1.0, 1.0, 2.0);
        let (d, _, _) = polygon_edge_distance(&a, &a.clone());
        assert_relative_eq!(d, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_polygon_edge_distance_overlapping_near_zero() {
        let a = square(0.0, 0.0, 1.0);
        let b = square(0.5, 0.0, 1.0);
        let (d, _, _) = polygon_edge_distance(&a, &b);
        // Overlap: a vertex of B lies inside A, closest crossing edge is hit
        assert!(d < 0.51);
    }

    #[test]
    fn test_bbox_distance_lower_bound() {
        let a = square(0.0, 0.0, 0.5).bbox();
        let b = square(3.0, 4.0, 0.5).bbox();
        // Gap of (2, 3) between boxes
        assert_relative_eq!(a.distance_to(&b), (4.0f32 + 9.0).sqrt(), epsilon = 1e-5);
        assert_relative_eq!(a.distance_to(&a), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_bbox_inflate_intersects() {
        let a = square(0.0, 0.0, 1.0).bbox();
        let b = square(4.0, 0.0, 1.0).bbox();
        assert!(!a.intersects(&b));
        assert!(a.inflated(1.1).intersects(&b));
    }
}
