//! Immutable board snapshot consumed by the spacing checks
//!
//! The host CAD model is flattened into plain value structs (pads, track
//! segments, zone fills, layers) before any measurement runs. All coordinates
//! are millimetres; unit conversion is the host's responsibility. The snapshot
//! carries an R-tree over item bounding boxes for windowed queries.

use crate::geom::{BoundingBox, Point, Polygon};
use rstar::{RTree, RTreeObject, AABB};
use std::collections::{BTreeSet, HashMap};

/// Pad outline shape, before rotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PadForm {
    Circle { diameter: f32 },
    Rect { width: f32, height: f32 },
    Oval { width: f32, height: f32 },
    RoundRect { width: f32, height: f32, corner_radius: f32 },
}

/// A copper pad
#[derive(Debug, Clone)]
pub struct PadShape {
    pub position: Point,
    pub form: PadForm,
    pub rotation_deg: f32,
    pub net: String,
    /// Copper layers this pad appears on (all of them for through-hole)
    pub layers: Vec<String>,
}

/// A track segment with width
#[derive(Debug, Clone)]
pub struct TrackSeg {
    pub start: Point,
    pub end: Point,
    pub width: f32,
    pub net: String,
    pub layer: String,
}

/// A filled copper zone outline
#[derive(Debug, Clone)]
pub struct ZoneFill {
    pub outline: Polygon,
    pub net: String,
    pub layer: String,
}

/// Copper layer identity and stackup classification
#[derive(Debug, Clone)]
pub struct LayerInfo {
    pub id: String,
    pub internal: bool,
}

/// Which snapshot collection an indexed item lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Pad,
    Track,
    Zone,
}

/// R-tree entry pointing back into the snapshot collections
#[derive(Debug, Clone)]
pub struct IndexedItem {
    pub kind: ItemKind,
    pub index: usize,
    envelope: AABB<[f32; 2]>,
}

impl RTreeObject for IndexedItem {
    type Envelope = AABB<[f32; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Immutable board state captured at check start
pub struct BoardSnapshot {
    pub pads: Vec<PadShape>,
    pub tracks: Vec<TrackSeg>,
    pub zones: Vec<ZoneFill>,
    pub layers: Vec<LayerInfo>,
    /// Net class name -> member net names, as assigned in the host CAD tool
    net_classes: HashMap<String, Vec<String>>,
    index: RTree<IndexedItem>,
}

const CIRCLE_SEGMENTS: usize = 16;
const ARC_SEGMENTS: usize = 6;

impl BoardSnapshot {
    pub fn new(
        pads: Vec<PadShape>,
        tracks: Vec<TrackSeg>,
        zones: Vec<ZoneFill>,
        layers: Vec<LayerInfo>,
    ) -> Self {
        let mut items = Vec::with_capacity(pads.len() + tracks.len() + zones.len());
        for (i, pad) in pads.iter().enumerate() {
            items.push(IndexedItem {
                kind: ItemKind::Pad,
                index: i,
                envelope: bbox_envelope(&pad.outline().bbox()),
            });
        }
        for (i, track) in tracks.iter().enumerate() {
            items.push(IndexedItem {
                kind: ItemKind::Track,
                index: i,
                envelope: bbox_envelope(&track.corridor().bbox()),
            });
        }
        for (i, zone) in zones.iter().enumerate() {
            items.push(IndexedItem {
                kind: ItemKind::Zone,
                index: i,
                envelope: bbox_envelope(&zone.outline.bbox()),
            });
        }
        Self {
            pads,
            tracks,
            zones,
            layers,
            net_classes: HashMap::new(),
            index: RTree::bulk_load(items),
        }
    }

    pub fn with_net_classes(mut self, net_classes: HashMap<String, Vec<String>>) -> Self {
        self.net_classes = net_classes;
        self
    }

    /// Member nets of a net class; empty when the class is unknown
    pub fn nets_in_class(&self, class: &str) -> &[String] {
        self.net_classes
            .get(class)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Every distinct net name on the board, in stable order
    pub fn all_nets(&self) -> Vec<String> {
        let mut nets = BTreeSet::new();
        for pad in &self.pads {
            nets.insert(pad.net.clone());
        }
        for track in &self.tracks {
            nets.insert(track.net.clone());
        }
        for zone in &self.zones {
            nets.insert(zone.net.clone());
        }
        nets.into_iter().collect()
    }

    /// All indexed items whose bounding box intersects `window`
    pub fn items_in_window(&self, window: &BoundingBox) -> impl Iterator<Item = &IndexedItem> {
        let envelope = bbox_envelope(window);
        self.index.locate_in_envelope_intersecting(&envelope)
    }

    pub fn layer(&self, id: &str) -> Option<&LayerInfo> {
        self.layers.iter().find(|l| l.id == id)
    }
}

fn bbox_envelope(bbox: &BoundingBox) -> AABB<[f32; 2]> {
    AABB::from_corners(bbox.min, bbox.max)
}

impl PadShape {
    /// Exact outline polygon: the base shape rotated about the pad origin,
    /// then translated to the pad position
    pub fn outline(&self) -> Polygon {
        let local = match self.form {
            PadForm::Circle { diameter } => circle_points(diameter / 2.0),
            PadForm::Rect { width, height } => rect_points(width, height),
            PadForm::Oval { width, height } => oval_points(width, height),
            PadForm::RoundRect {
                width,
                height,
                corner_radius,
            } => roundrect_points(width, height, corner_radius),
        };

        let rot = self.rotation_deg.to_radians();
        let (sin_r, cos_r) = rot.sin_cos();
        let points = local
            .into_iter()
            .map(|p| {
                Point::new(
                    p.x * cos_r - p.y * sin_r + self.position.x,
                    p.x * sin_r + p.y * cos_r + self.position.y,
                )
            })
            .collect();
        Polygon::new(points)
    }

    /// Half the largest bounding dimension, used for clearance prefiltering
    pub fn extent_radius(&self) -> f32 {
        match self.form {
            PadForm::Circle { diameter } => diameter / 2.0,
            PadForm::Rect { width, height }
            | PadForm::Oval { width, height }
            | PadForm::RoundRect { width, height, .. } => {
                // Rotation-safe: half diagonal for rects, half major axis for ovals
                match self.form {
                    PadForm::Oval { .. } => width.max(height) / 2.0,
                    _ => (width * width + height * height).sqrt() / 2.0,
                }
            }
        }
    }

    pub fn on_layer(&self, layer: &str) -> bool {
        self.layers.iter().any(|l| l == layer)
    }
}

impl TrackSeg {
    /// Rectangle swept along the segment, extended by the half-width at both
    /// ends so round end caps stay covered
    pub fn corridor(&self) -> Polygon {
        let half = self.width / 2.0;
        let dx = self.end.x - self.start.x;
        let dy = self.end.y - self.start.y;
        let len = (dx * dx + dy * dy).sqrt();

        if len < 1e-6 {
            // Zero-length stub: treat as a square dot
            return Polygon::new(vec![
                Point::new(self.start.x - half, self.start.y - half),
                Point::new(self.start.x + half, self.start.y - half),
                Point::new(self.start.x + half, self.start.y + half),
                Point::new(self.start.x - half, self.start.y + half),
            ]);
        }

        let ux = dx / len;
        let uy = dy / len;
        // Normal to the segment direction
        let nx = -uy * half;
        let ny = ux * half;
        // Extend ends by half-width (square cap covering round ends)
        let sx = self.start.x - ux * half;
        let sy = self.start.y - uy * half;
        let ex = self.end.x + ux * half;
        let ey = self.end.y + uy * half;

        Polygon::new(vec![
            Point::new(sx + nx, sy + ny),
            Point::new(ex + nx, ey + ny),
            Point::new(ex - nx, ey - ny),
            Point::new(sx - nx, sy - ny),
        ])
    }
}

fn circle_points(radius: f32) -> Vec<Point> {
    (0..CIRCLE_SEGMENTS)
        .map(|i| {
            let angle = std::f32::consts::TAU * i as f32 / CIRCLE_SEGMENTS as f32;
            Point::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

fn rect_points(width: f32, height: f32) -> Vec<Point> {
    let hw = width / 2.0;
    let hh = height / 2.0;
    vec![
        Point::new(-hw, -hh),
        Point::new(hw, -hh),
        Point::new(hw, hh),
        Point::new(-hw, hh),
    ]
}

/// Stadium shape: straight sides along the major axis, semicircular ends
fn oval_points(width: f32, height: f32) -> Vec<Point> {
    let (major, minor, swap) = if width >= height {
        (width, height, false)
    } else {
        (height, width, true)
    };
    let radius = minor / 2.0;
    let half_flat = (major - minor) / 2.0;

    let mut points = Vec::with_capacity(2 * (ARC_SEGMENTS + 1));
    // Right cap: -90deg .. +90deg
    for i in 0..=ARC_SEGMENTS {
        let angle = -std::f32::consts::FRAC_PI_2
            + std::f32::consts::PI * i as f32 / ARC_SEGMENTS as f32;
        points.push(Point::new(
            half_flat + radius * angle.cos(),
            radius * angle.sin(),
        ));
    }
    // Left cap: +90deg .. +270deg
    for i in 0..=ARC_SEGMENTS {
        let angle = std::f32::consts::FRAC_PI_2
            + std::f32::consts::PI * i as f32 / ARC_SEGMENTS as f32;
        points.push(Point::new(
            -half_flat + radius * angle.cos(),
            radius * angle.sin(),
        ));
    }

    if swap {
        points.iter().map(|p| Point::new(p.y, p.x)).collect()
    } else {
        points
    }
}

fn roundrect_points(width: f32, height: f32, corner_radius: f32) -> Vec<Point> {
    let hw = width / 2.0;
    let hh = height / 2.0;
    let r = corner_radius.min(hw).min(hh);
    if r <= 0.0 {
        return rect_points(width, height);
    }

    // Corner arc centers and their start angles, counter-clockwise
    let corners = [
        (hw - r, hh - r, 0.0f32),
        (-(hw - r), hh - r, std::f32::consts::FRAC_PI_2),
        (-(hw - r), -(hh - r), std::f32::consts::PI),
        (hw - r, -(hh - r), 3.0 * std::f32::consts::FRAC_PI_2),
    ];

    let mut points = Vec::with_capacity(4 * (ARC_SEGMENTS + 1));
    for (cx, cy, start) in corners {
        for i in 0..=ARC_SEGMENTS {
            let angle = start + std::f32::consts::FRAC_PI_2 * i as f32 / ARC_SEGMENTS as f32;
            points.push(Point::new(cx + r * angle.cos(), cy + r * angle.sin()));
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pad(x: f32, y: f32, form: PadForm, rotation_deg: f32) -> PadShape {
        PadShape {
            position: Point::new(x, y),
            form,
            rotation_deg,
            net: "NET1".to_string(),
            layers: vec!["F.Cu".to_string()],
        }
    }

    #[test]
    fn test_rect_pad_outline_unrotated() {
        let p = pad(
            10.0,
            5.0,
            PadForm::Rect {
                width: 2.0,
                height: 1.0,
            },
            0.0,
        );
        let bbox = p.outline().bbox();
        assert_relative_eq!(bbox.min[0], 9.0, epsilon = 1e-5);
        assert_relative_eq!(bbox.max[0], 11.0, epsilon = 1e-5);
        assert_relative_eq!(bbox.min[1], 4.5, epsilon = 1e-5);
        assert_relative_eq!(bbox.max[1], 5.5, epsilon = 1e-5);
    }

    #[test]
    fn test_rect_pad_outline_rotated_90() {
        let p = pad(
            0.0,
            0.0,
            PadForm::Rect {
                width: 2.0,
                height: 1.0,
            },
            90.0,
        );
        let bbox = p.outline().bbox();
        // Width and height swap under a quarter turn
        assert_relative_eq!(bbox.max[0] - bbox.min[0], 1.0, epsilon = 1e-4);
        assert_relative_eq!(bbox.max[1] - bbox.min[1], 2.0, epsilon = 1e-4);
    }

    #[test]
    fn test_circle_pad_outline_radius() {
        let p = pad(0.0, 0.0, PadForm::Circle { diameter: 3.0 }, 45.0);
        for pt in &p.outline().points {
            assert_relative_eq!(pt.distance(Point::new(0.0, 0.0)), 1.5, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_oval_pad_bbox() {
        let p = pad(
            0.0,
            0.0,
            PadForm::Oval {
                width: 4.0,
                height: 2.0,
            },
            0.0,
        );
        let bbox = p.outline().bbox();
        assert_relative_eq!(bbox.max[0] - bbox.min[0], 4.0, epsilon = 1e-4);
        assert_relative_eq!(bbox.max[1] - bbox.min[1], 2.0, epsilon = 1e-4);
    }

    #[test]
    fn test_extent_radius_covers_rotation() {
        let p = pad(
            0.0,
            0.0,
            PadForm::Rect {
                width: 2.0,
                height: 1.0,
            },
            33.0,
        );
        let r = p.extent_radius();
        for pt in &p.outline().points {
            assert!(pt.distance(Point::new(0.0, 0.0)) <= r + 1e-4);
        }
    }

    #[test]
    fn test_track_corridor_covers_endpoints() {
        let t = TrackSeg {
            start: Point::new(0.0, 0.0),
            end: Point::new(10.0, 0.0),
            width: 0.5,
            net: "NET1".to_string(),
            layer: "F.Cu".to_string(),
        };
        let corridor = t.corridor();
        assert!(corridor.contains(Point::new(5.0, 0.0)));
        assert!(corridor.contains(Point::new(0.0, 0.0)));
        assert!(corridor.contains(Point::new(10.0, 0.0)));
        assert!(!corridor.contains(Point::new(5.0, 1.0)));
    }

    #[test]
    fn test_snapshot_window_query() {
        let snapshot = BoardSnapshot::new(
            vec![
                pad(0.0, 0.0, PadForm::Circle { diameter: 1.0 }, 0.0),
                pad(50.0, 50.0, PadForm::Circle { diameter: 1.0 }, 0.0),
            ],
            vec![],
            vec![],
            vec![LayerInfo {
                id: "F.Cu".to_string(),
                internal: false,
            }],
        );
        let window = BoundingBox {
            min: [-2.0, -2.0],
            max: [2.0, 2.0],
        };
        let hits: Vec<_> = snapshot.items_in_window(&window).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].index, 0);
    }
}
