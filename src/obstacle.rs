//! Obstacle model for creepage pathfinding
//!
//! A creepage path between two voltage domains must not cross copper that
//! belongs to any other net. This module turns the board snapshot into a
//! per-layer list of opaque polygons, restricted to a search window around
//! the candidate pad pair so dense boards stay tractable.

use crate::board::{BoardSnapshot, ItemKind};
use crate::geom::{BoundingBox, Polygon};
use std::collections::HashSet;

/// Source feature class of an obstacle polygon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleKind {
    Pad,
    Track,
    Zone,
}

/// An opaque copper polygon a surface path must avoid
#[derive(Debug, Clone)]
pub struct Obstacle {
    pub polygon: Polygon,
    pub bbox: BoundingBox,
    pub net: String,
    pub kind: ObstacleKind,
}

impl Obstacle {
    pub fn new(polygon: Polygon, net: String, kind: ObstacleKind) -> Self {
        let bbox = polygon.bbox();
        Self {
            polygon,
            bbox,
            net,
            kind,
        }
    }
}

/// Collect every pad/track/zone polygon on `layer` whose net is not excluded
/// and whose bounding box intersects the search window.
///
/// Read-only against the snapshot; the result is owned by the caller and
/// discarded after the path query.
pub fn collect_obstacles(
    snapshot: &BoardSnapshot,
    layer: &str,
    excluded_nets: &HashSet<String>,
    window: &BoundingBox,
) -> Vec<Obstacle> {
    let mut obstacles = Vec::new();

    for item in snapshot.items_in_window(window) {
        match item.kind {
            ItemKind::Pad => {
                let pad = &snapshot.pads[item.index];
                if !pad.on_layer(layer) || excluded_nets.contains(&pad.net) {
                    continue;
                }
                obstacles.push(Obstacle::new(
                    pad.outline(),
                    pad.net.clone(),
                    ObstacleKind::Pad,
                ));
            }
            ItemKind::Track => {
                let track = &snapshot.tracks[item.index];
                if track.layer != layer || excluded_nets.contains(&track.net) {
                    continue;
                }
                obstacles.push(Obstacle::new(
                    track.corridor(),
                    track.net.clone(),
                    ObstacleKind::Track,
                ));
            }
            ItemKind::Zone => {
                let zone = &snapshot.zones[item.index];
                if zone.layer != layer || excluded_nets.contains(&zone.net) {
                    continue;
                }
                if zone.outline.points.len() < 3 {
                    continue;
                }
                obstacles.push(Obstacle::new(
                    zone.outline.clone(),
                    zone.net.clone(),
                    ObstacleKind::Zone,
                ));
            }
        }
    }

    obstacles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{LayerInfo, PadForm, PadShape, TrackSeg, ZoneFill};
    use crate::geom::Point;

    fn test_snapshot() -> BoardSnapshot {
        BoardSnapshot::new(
            vec![
                PadShape {
                    position: Point::new(0.0, 0.0),
                    form: PadForm::Circle { diameter: 1.0 },
                    rotation_deg: 0.0,
                    net: "GND".to_string(),
                    layers: vec!["F.Cu".to_string()],
                },
                PadShape {
                    position: Point::new(5.0, 0.0),
                    form: PadForm::Circle { diameter: 1.0 },
                    rotation_deg: 0.0,
                    net: "HV+".to_string(),
                    layers: vec!["F.Cu".to_string()],
                },
            ],
            vec![TrackSeg {
                start: Point::new(0.0, 2.0),
                end: Point::new(5.0, 2.0),
                width: 0.3,
                net: "SIG1".to_string(),
                layer: "F.Cu".to_string(),
            }],
            vec![ZoneFill {
                outline: Polygon::new(vec![
                    Point::new(0.0, -5.0),
                    Point::new(5.0, -5.0),
                    Point::new(5.0, -3.0),
                    Point::new(0.0, -3.0),
                ]),
                net: "GND".to_string(),
                layer: "B.Cu".to_string(),
            }],
            vec![
                LayerInfo {
                    id: "F.Cu".to_string(),
                    internal: false,
                },
                LayerInfo {
                    id: "B.Cu".to_string(),
                    internal: false,
                },
            ],
        )
    }

    fn wide_window() -> BoundingBox {
        BoundingBox {
            min: [-100.0, -100.0],
            max: [100.0, 100.0],
        }
    }

    #[test]
    fn test_excluded_nets_are_filtered() {
        let snapshot = test_snapshot();
        let excluded: HashSet<String> = ["GND", "HV+"].iter().map(|s| s.to_string()).collect();
        let obstacles = collect_obstacles(&snapshot, "F.Cu", &excluded, &wide_window());
        // Only the SIG1 track survives
        assert_eq!(obstacles.len(), 1);
        assert_eq!(obstacles[0].kind, ObstacleKind::Track);
        assert_eq!(obstacles[0].net, "SIG1");
    }

    #[test]
    fn test_layer_restriction() {
        let snapshot = test_snapshot();
        let excluded = HashSet::new();
        let obstacles = collect_obstacles(&snapshot, "B.Cu", &excluded, &wide_window());
        assert_eq!(obstacles.len(), 1);
        assert_eq!(obstacles[0].kind, ObstacleKind::Zone);
    }

    #[test]
    fn test_window_restriction() {
        let snapshot = test_snapshot();
        let excluded = HashSet::new();
        let window = BoundingBox {
            min: [-1.0, -1.0],
            max: [1.0, 1.0],
        };
        let obstacles = collect_obstacles(&snapshot, "F.Cu", &excluded, &window);
        // Only the GND pad at the origin overlaps the window
        assert_eq!(obstacles.len(), 1);
        assert_eq!(obstacles[0].net, "GND");
    }

    #[test]
    fn test_bbox_cached_tightly() {
        let snapshot = test_snapshot();
        let excluded = HashSet::new();
        let obstacles = collect_obstacles(&snapshot, "F.Cu", &excluded, &wide_window());
        for obstacle in &obstacles {
            let recomputed = obstacle.polygon.bbox();
            assert_eq!(obstacle.bbox.min, recomputed.min);
            assert_eq!(obstacle.bbox.max, recomputed.max);
        }
    }
}
