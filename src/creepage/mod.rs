//! Surface creepage path computation
//!
//! Finds the shortest copper-avoiding path along the board surface between
//! two points. Two strategies share the obstacle model and grid index:
//! - `visibility` - exact-within-caps visibility graph + Dijkstra
//! - `heuristic` - bounded best-first fallback for obstacle-dense layers
//!
//! # Submodules
//! - `visibility` - corner-sampled visibility graph pathfinder
//! - `heuristic` - capped best-first fallback pathfinder

pub mod heuristic;
pub mod visibility;

use crate::geom::Point;
use crate::obstacle::Obstacle;

/// Result of a surface path query.
///
/// `Unreachable` means the goal is disconnected in the searched graph (a
/// structural separation such as a closed copper ring or board cutout);
/// `Exhausted` means a search cap was hit before a conclusion. Callers treat
/// both as infinite creepage, but the distinction is surfaced for reporting.
#[derive(Debug, Clone, PartialEq)]
pub enum PathOutcome {
    Found { length_mm: f32, points: Vec<Point> },
    Unreachable,
    Exhausted,
}

impl PathOutcome {
    pub fn length_mm(&self) -> Option<f32> {
        match self {
            PathOutcome::Found { length_mm, .. } => Some(*length_mm),
            _ => None,
        }
    }
}

/// Cost caps for the pathfinders. Every search terminates within these
/// bounds regardless of board complexity.
#[derive(Debug, Clone, Copy)]
pub struct PathCaps {
    /// Corner vertices kept per obstacle, sharpest first
    pub corners_per_obstacle: usize,
    /// Hard ceiling on visibility-graph vertices (start + goal included)
    pub max_graph_vertices: usize,
    /// Iteration budget for the heuristic fallback
    pub max_iterations: usize,
    /// Per-node expansion budget for the heuristic fallback
    pub max_neighbors: usize,
    /// A node this close to the goal counts as arrived
    pub goal_tolerance_mm: f32,
}

impl Default for PathCaps {
    fn default() -> Self {
        Self {
            corners_per_obstacle: 3,
            max_graph_vertices: 256,
            max_iterations: 10_000,
            max_neighbors: 8,
            goal_tolerance_mm: 0.05,
        }
    }
}

/// Total polyline length of a path
pub(crate) fn path_length(points: &[Point]) -> f32 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Corner vertices are pushed this far off the outline so that path segments
/// hugging an obstacle edge are not swallowed by the containment test.
const CORNER_OFFSET_MM: f32 = 1e-3;

/// The sharpest `k` corner vertices of an obstacle outline, each nudged
/// just outside the polygon along the corner bisector.
///
/// Sharpness is the angular deviation from a straight continuation at the
/// vertex; a shortest path can only usefully touch corners that actually
/// turn, so near-collinear vertices are dropped first.
pub(crate) fn significant_corners(obstacle: &Obstacle, k: usize) -> Vec<Point> {
    let points = &obstacle.polygon.points;
    let n = points.len();
    if n < 3 || k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(f32, Point)> = Vec::with_capacity(n);
    for i in 0..n {
        let prev = points[(i + n - 1) % n];
        let v = points[i];
        let next = points[(i + 1) % n];

        let din = [v.x - prev.x, v.y - prev.y];
        let dout = [next.x - v.x, next.y - v.y];
        let len_in = (din[0] * din[0] + din[1] * din[1]).sqrt();
        let len_out = (dout[0] * dout[0] + dout[1] * dout[1]).sqrt();
        if len_in < 1e-9 || len_out < 1e-9 {
            continue;
        }

        let u_in = [din[0] / len_in, din[1] / len_in];
        let u_out = [dout[0] / len_out, dout[1] / len_out];
        let dot = u_in[0] * u_out[0] + u_in[1] * u_out[1];
        let deviation = dot.clamp(-1.0, 1.0).acos();
        if deviation < 1e-4 {
            continue; // straight continuation, never worth a graph node
        }

        scored.push((deviation, offset_corner(&obstacle.polygon, v, u_in, u_out)));
    }

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);
    scored.into_iter().map(|(_, p)| p).collect()
}

/// Nudge a vertex along its exterior bisector. Winding order is not assumed;
/// whichever side lands outside the polygon wins.
fn offset_corner(
    polygon: &crate::geom::Polygon,
    v: Point,
    u_in: [f32; 2],
    u_out: [f32; 2],
) -> Point {
    let mut bx = u_in[0] - u_out[0];
    let mut by = u_in[1] - u_out[1];
    let len = (bx * bx + by * by).sqrt();
    if len < 1e-9 {
        // 180-degree spike: use the normal of the incoming edge
        bx = -u_in[1];
        by = u_in[0];
    } else {
        bx /= len;
        by /= len;
    }

    let candidate = Point::new(v.x + bx * CORNER_OFFSET_MM, v.y + by * CORNER_OFFSET_MM);
    if !polygon.contains(candidate) {
        return candidate;
    }
    Point::new(v.x - bx * CORNER_OFFSET_MM, v.y - by * CORNER_OFFSET_MM)
}
