//! Uniform spatial grid over obstacle bounding boxes
//!
//! Accelerates "which obstacles could this segment touch" queries for the
//! pathfinders. Every obstacle index is registered in every cell its bounding
//! box overlaps, so a cell walk along a segment yields a superset of all
//! obstacles that could intersect it. False positives are filtered by the
//! caller's exact test; false negatives cannot occur.

use crate::geom::{segments_intersect, Point};
use crate::obstacle::Obstacle;
use std::collections::{HashMap, HashSet};

/// Sparse uniform grid index over obstacles
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl SpatialGrid {
    /// Register each obstacle in every cell its bounding box overlaps
    pub fn build(obstacles: &[Obstacle], cell_size: f32) -> Self {
        let cell_size = cell_size.max(1e-3);
        let mut cells: HashMap<(i32, i32), Vec<usize>> = HashMap::new();

        for (idx, obstacle) in obstacles.iter().enumerate() {
            let min_cx = (obstacle.bbox.min[0] / cell_size).floor() as i32;
            let min_cy = (obstacle.bbox.min[1] / cell_size).floor() as i32;
            let max_cx = (obstacle.bbox.max[0] / cell_size).floor() as i32;
            let max_cy = (obstacle.bbox.max[1] / cell_size).floor() as i32;

            for cx in min_cx..=max_cx {
                for cy in min_cy..=max_cy {
                    cells.entry((cx, cy)).or_default().push(idx);
                }
            }
        }

        Self { cell_size, cells }
    }

    fn cell_of(&self, p: Point) -> (i32, i32) {
        (
            (p.x / self.cell_size).floor() as i32,
            (p.y / self.cell_size).floor() as i32,
        )
    }

    /// Every cell the segment p1-p2 passes through (supercover traversal).
    ///
    /// Axis steps are resolved one at a time; when the segment crosses a cell
    /// corner exactly, both adjacent cells are visited, which is what keeps
    /// the superset guarantee for obstacles touching only at that corner.
    pub fn cells_along(&self, p1: Point, p2: Point) -> Vec<(i32, i32)> {
        let (mut cx, mut cy) = self.cell_of(p1);
        let (end_cx, end_cy) = self.cell_of(p2);
        let mut visited = vec![(cx, cy)];

        let dx = p2.x - p1.x;
        let dy = p2.y - p1.y;
        let step_x: i32 = if dx > 0.0 { 1 } else { -1 };
        let step_y: i32 = if dy > 0.0 { 1 } else { -1 };

        // Parameter t at which the ray crosses the next cell boundary per axis
        let mut t_max_x = if dx.abs() < 1e-12 {
            f32::INFINITY
        } else {
            let next_x = if dx > 0.0 {
                (cx + 1) as f32 * self.cell_size
            } else {
                cx as f32 * self.cell_size
            };
            (next_x - p1.x) / dx
        };
        let mut t_max_y = if dy.abs() < 1e-12 {
            f32::INFINITY
        } else {
            let next_y = if dy > 0.0 {
                (cy + 1) as f32 * self.cell_size
            } else {
                cy as f32 * self.cell_size
            };
            (next_y - p1.y) / dy
        };
        let t_delta_x = if dx.abs() < 1e-12 {
            f32::INFINITY
        } else {
            self.cell_size / dx.abs()
        };
        let t_delta_y = if dy.abs() < 1e-12 {
            f32::INFINITY
        } else {
            self.cell_size / dy.abs()
        };

        // Hard bound on the walk in case of float drift
        let max_steps =
            ((end_cx - cx).abs() + (end_cy - cy).abs()) as usize * 2 + 4;

        for _ in 0..max_steps {
            if cx == end_cx && cy == end_cy {
                break;
            }
            if (t_max_x - t_max_y).abs() < 1e-9 {
                // Exact corner crossing: take both intermediate cells
                visited.push((cx + step_x, cy));
                visited.push((cx, cy + step_y));
                cx += step_x;
                cy += step_y;
                t_max_x += t_delta_x;
                t_max_y += t_delta_y;
            } else if t_max_x < t_max_y {
                cx += step_x;
                t_max_x += t_delta_x;
            } else {
                cy += step_y;
                t_max_y += t_delta_y;
            }
            visited.push((cx, cy));
        }

        if cx != end_cx || cy != end_cy {
            // Float drift cut the walk short; the end cell always belongs
            visited.push((end_cx, end_cy));
        }

        visited
    }

    /// Deduplicated obstacle indices registered along the segment
    pub fn query(&self, p1: Point, p2: Point) -> Vec<usize> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for cell in self.cells_along(p1, p2) {
            if let Some(indices) = self.cells.get(&cell) {
                for &idx in indices {
                    if seen.insert(idx) {
                        result.push(idx);
                    }
                }
            }
        }
        result
    }

    /// Exact obstruction test for a candidate path segment.
    ///
    /// A segment is blocked if it properly crosses any obstacle edge, or if
    /// its midpoint lies inside an obstacle (segments swallowed whole by a
    /// polygon cross no edge).
    pub fn segment_blocked(&self, p1: Point, p2: Point, obstacles: &[Obstacle]) -> bool {
        let mid = Point::new((p1.x + p2.x) / 2.0, (p1.y + p2.y) / 2.0);

        for idx in self.query(p1, p2) {
            let obstacle = &obstacles[idx];
            for (e1, e2) in obstacle.polygon.edges() {
                if segments_intersect(p1, p2, e1, e2) {
                    return true;
                }
            }
            if obstacle.polygon.contains(mid) {
                return true;
            }
        }

        false
    }

    #[cfg(test)]
    fn cell_count(&self) -> usize {
        self.cells.len()
    }
}
