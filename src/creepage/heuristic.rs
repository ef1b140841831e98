//! Bounded best-first fallback pathfinder
//!
//! Used when the obstacle count makes an exact visibility graph too
//! expensive. Expands nodes in f = g + straight-line-to-goal order with a
//! hard iteration cap and a per-node neighbor cap, so the cost stays bounded
//! on pathologically dense layers. Not guaranteed optimal; a capped-out
//! search reports `Exhausted` rather than hanging.

use super::{significant_corners, PathCaps, PathOutcome};
use crate::geom::Point;
use crate::grid::SpatialGrid;
use crate::obstacle::Obstacle;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// Corners scanned per expansion before giving up on that node; keeps a
/// single expansion from testing line of sight against the whole pool.
const SCAN_FACTOR: usize = 4;

struct Frontier {
    f: f32,
    g: f32,
    node: usize,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f
    }
}
impl Eq for Frontier {}
impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other.f.partial_cmp(&self.f).unwrap_or(Ordering::Equal)
    }
}

/// Best-first surface path search from `start` to `goal`.
///
/// Neighbor candidates are obstacle corners ordered by proximity to the
/// goal, deduplicated by exact position. Termination is guaranteed by the
/// iteration cap; the outcome is `Exhausted` whenever the search gives up,
/// because the capped neighbor enumeration cannot prove disconnection.
pub fn shortest_path(
    start: Point,
    goal: Point,
    obstacles: &[Obstacle],
    grid: &SpatialGrid,
    caps: &PathCaps,
) -> PathOutcome {
    if !grid.segment_blocked(start, goal, obstacles) {
        return PathOutcome::Found {
            length_mm: start.distance(goal),
            points: vec![start, goal],
        };
    }

    let corners = goal_ordered_corners(goal, obstacles, caps);

    // Arena of (point, parent) so paths reconstruct without back-pointmaps
    let mut nodes: Vec<(Point, Option<usize>)> = vec![(start, None)];
    let mut best_g: HashMap<(u32, u32), f32> = HashMap::new();
    best_g.insert(start.key(), 0.0);

    let mut heap = BinaryHeap::new();
    heap.push(Frontier {
        f: start.distance(goal),
        g: 0.0,
        node: 0,
    });

    let scan_cap = caps.max_neighbors.saturating_mul(SCAN_FACTOR).max(1);
    let mut iterations = 0usize;

    while let Some(Frontier { g, node, .. }) = heap.pop() {
        iterations += 1;
        if iterations > caps.max_iterations {
            return PathOutcome::Exhausted;
        }

        let point = nodes[node].0;
        if best_g
            .get(&point.key())
            .map(|&known| g > known + 1e-6)
            .unwrap_or(false)
        {
            continue; // stale entry
        }

        // Arrived: close enough, or a clear final hop exists
        if point.distance(goal) <= caps.goal_tolerance_mm
            || !grid.segment_blocked(point, goal, obstacles)
        {
            return finish(&nodes, node, goal);
        }

        let mut accepted = 0usize;
        let mut scanned = 0usize;
        for &corner in &corners {
            if accepted >= caps.max_neighbors || scanned >= scan_cap {
                break;
            }
            if corner.key() == point.key() {
                continue;
            }
            scanned += 1;
            if grid.segment_blocked(point, corner, obstacles) {
                continue;
            }

            let g_next = g + point.distance(corner);
            if best_g
                .get(&corner.key())
                .map(|&known| g_next >= known)
                .unwrap_or(false)
            {
                continue;
            }
            best_g.insert(corner.key(), g_next);
            nodes.push((corner, Some(node)));
            heap.push(Frontier {
                f: g_next + corner.distance(goal),
                g: g_next,
                node: nodes.len() - 1,
            });
            accepted += 1;
        }
    }

    PathOutcome::Exhausted
}

/// Deduplicated obstacle corners, nearest to the goal first
fn goal_ordered_corners(goal: Point, obstacles: &[Obstacle], caps: &PathCaps) -> Vec<Point> {
    let mut seen = std::collections::HashSet::new();
    let mut corners: Vec<Point> = Vec::new();
    for obstacle in obstacles {
        for corner in significant_corners(obstacle, caps.corners_per_obstacle) {
            if seen.insert(corner.key()) {
                corners.push(corner);
            }
        }
    }
    corners.sort_by(|a, b| {
        a.distance(goal)
            .partial_cmp(&b.distance(goal))
            .unwrap_or(Ordering::Equal)
    });
    corners
}

fn finish(nodes: &[(Point, Option<usize>)], node: usize, goal: Point) -> PathOutcome {
    let mut points = vec![goal];
    let mut cursor = Some(node);
    while let Some(idx) = cursor {
        let (point, parent) = nodes[idx];
        if points.last().map(|p| p.key() != point.key()).unwrap_or(true) {
            points.push(point);
        }
        cursor = parent;
    }
    points.reverse();
    PathOutcome::Found {
        length_mm: super::path_length(&points),
        points,
    }
}
