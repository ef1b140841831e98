//! Visibility-graph shortest path
//!
//! Builds a graph over the start point, goal point, and a capped sample of
//! sharp obstacle corners; connects every pair with unobstructed line of
//! sight; runs Dijkstra. The vertex cap keeps the build O(V^2) with V fixed,
//! trading global optimality for bounded cost on dense boards.

use super::{path_length, significant_corners, PathCaps, PathOutcome};
use crate::geom::Point;
use crate::grid::SpatialGrid;
use crate::obstacle::Obstacle;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

/// Shortest copper-avoiding path from `start` to `goal`.
///
/// The straight segment is tried first; that is the common case on sparsely
/// populated layers and skips graph construction entirely.
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

    let vertices = build_vertices(start, goal, obstacles, caps);
    let adjacency = build_adjacency(&vertices, obstacles, grid);
    match dijkstra(&vertices, &adjacency) {
        Some(points) => PathOutcome::Found {
            length_mm: path_length(&points),
            points,
        },
        None => PathOutcome::Unreachable,
    }
}

/// Vertex 0 = start, vertex 1 = goal, remainder = sampled obstacle corners,
/// deduplicated and uniformly subsampled down to the cap.
fn build_vertices(
    start: Point,
    goal: Point,
    obstacles: &[Obstacle],
    caps: &PathCaps,
) -> Vec<Point> {
    let mut seen: HashSet<(u32, u32)> = HashSet::new();
    seen.insert(start.key());
    seen.insert(goal.key());

    let mut corners: Vec<Point> = Vec::new();
    for obstacle in obstacles {
        for corner in significant_corners(obstacle, caps.corners_per_obstacle) {
            if seen.insert(corner.key()) {
                corners.push(corner);
            }
        }
    }

    let budget = caps.max_graph_vertices.saturating_sub(2).max(1);
    if corners.len() > budget {
        // Uniform subsample keeps coverage spread across the window
        let stride = corners.len() as f32 / budget as f32;
        let mut sampled = Vec::with_capacity(budget);
        for i in 0..budget {
            sampled.push(corners[(i as f32 * stride) as usize]);
        }
        corners = sampled;
    }

    let mut vertices = Vec::with_capacity(corners.len() + 2);
    vertices.push(start);
    vertices.push(goal);
    vertices.extend(corners);
    vertices
}

/// Undirected line-of-sight edges with Euclidean weights
fn build_adjacency(
    vertices: &[Point],
    obstacles: &[Obstacle],
    grid: &SpatialGrid,
) -> Vec<Vec<(usize, f32)>> {
    let n = vertices.len();
    let mut adjacency = vec![Vec::new(); n];

    for i in 0..n {
        for j in (i + 1)..n {
            if grid.segment_blocked(vertices[i], vertices[j], obstacles) {
                continue;
            }
            let weight = vertices[i].distance(vertices[j]);
            adjacency[i].push((j, weight));
            adjacency[j].push((i, weight));
        }
    }

    adjacency
}

struct QueueEntry {
    cost: f32,
    vertex: usize,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost
    }
}
impl Eq for QueueEntry {}
impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
    }
}

/// Single-source shortest path from vertex 0 to vertex 1
fn dijkstra(vertices: &[Point], adjacency: &[Vec<(usize, f32)>]) -> Option<Vec<Point>> {
    let n = vertices.len();
    let mut dist = vec![f32::MAX; n];
    let mut prev: Vec<Option<usize>> = vec![None; n];
    let mut heap = BinaryHeap::new();

    dist[0] = 0.0;
    heap.push(QueueEntry {
        cost: 0.0,
        vertex: 0,
    });

    while let Some(QueueEntry { cost, vertex }) = heap.pop() {
        if vertex == 1 {
            break;
        }
        if cost > dist[vertex] {
            continue; // stale entry
        }
        for &(next, weight) in &adjacency[vertex] {
            let candidate = cost + weight;
            if candidate < dist[next] {
                dist[next] = candidate;
                prev[next] = Some(vertex);
                heap.push(QueueEntry {
                    cost: candidate,
                    vertex: next,
                });
            }
        }
    }

    if dist[1] == f32::MAX {
        return None;
    }

    let mut path = vec![vertices[1]];
    let mut cursor = 1usize;
    while let Some(p) = prev[cursor] {
        path.push(vertices[p]);
        cursor = p;
    }
    path.reverse();
    Some(path)
}
