//! Clearance engine: closest air gap between two voltage domains
//!
//! Two-phase nearest-feature search across all pad pairs: a cheap
//! center-distance prefilter first, exact polygon edge distance only for
//! candidates close to the best-known minimum.

use crate::board::PadShape;
use crate::geom::{polygon_edge_distance, Point, Polygon};

/// Exact distances are only computed when the cheap lower bound lands within
/// this margin of the current best minimum.
pub const PREFILTER_MARGIN_MM: f32 = 2.0;

/// The clearance engine's view of a pad
#[derive(Debug, Clone)]
pub struct FeaturePoint {
    pub position: Point,
    /// Half the pad's largest bounding dimension; prefiltering only
    pub extent_radius: f32,
    pub net: String,
    pub voltage_rms: f32,
    pub reinforced: bool,
    shape: PadShape,
}

impl FeaturePoint {
    pub fn from_pad(pad: &PadShape, voltage_rms: f32, reinforced: bool) -> Self {
        Self {
            position: pad.position,
            extent_radius: pad.extent_radius(),
            net: pad.net.clone(),
            voltage_rms,
            reinforced,
            shape: pad.clone(),
        }
    }

    /// Rotation- and shape-aware outline, built on demand
    pub fn outline(&self) -> Polygon {
        self.shape.outline()
    }

    pub fn on_layer(&self, layer: &str) -> bool {
        self.shape.on_layer(layer)
    }
}

/// Closest copper-to-copper approach between two domains
#[derive(Debug, Clone)]
pub struct ClearanceHit {
    pub distance_mm: f32,
    pub point_a: Point,
    pub point_b: Point,
    pub net_a: String,
    pub net_b: String,
}

/// Minimum clearance over every pad pair across the two domains.
///
/// Returns `None` when either side is empty; that is a normal "nothing to
/// compare" outcome, not an error. The result is clamped to >= 0 (overlapping
/// copper measures as zero gap).
pub fn min_clearance(features_a: &[FeaturePoint], features_b: &[FeaturePoint]) -> Option<ClearanceHit> {
    if features_a.is_empty() || features_b.is_empty() {
        return None;
    }

    // Outlines are built once per feature, and only for surviving candidates
    let mut outlines_a: Vec<Option<Polygon>> = vec![None; features_a.len()];
    let mut outlines_b: Vec<Option<Polygon>> = vec![None; features_b.len()];

    let mut best: Option<ClearanceHit> = None;
    let mut best_dist = f32::MAX;

    for (ia, fa) in features_a.iter().enumerate() {
        for (ib, fb) in features_b.iter().enumerate() {
            let center = fa.position.distance(fb.position);
            let lower_bound = center - fa.extent_radius - fb.extent_radius;

            // Cannot beat the current minimum by more than the margin
            if best_dist < f32::MAX && lower_bound > best_dist + PREFILTER_MARGIN_MM {
                continue;
            }

            let outline_a = outlines_a[ia].get_or_insert_with(|| fa.outline());
            let outline_b = outlines_b[ib].get_or_insert_with(|| fb.outline());
            let (dist, pa, pb) = polygon_edge_distance(outline_a, outline_b);
            let dist = dist.max(0.0);

            if dist < best_dist {
                best_dist = dist;
                best = Some(ClearanceHit {
                    distance_mm: dist,
                    point_a: pa,
                    point_b: pb,
                    net_a: fa.net.clone(),
                    net_b: fb.net.clone(),
                });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::PadForm;
    use approx::assert_relative_eq;

    fn square_pad(x: f32, y: f32, side: f32, net: &str) -> FeaturePoint {
        FeaturePoint::from_pad(
            &PadShape {
                position: Point::new(x, y),
                form: PadForm::Rect {
                    width: side,
                    height: side,
                },
                rotation_deg: 0.0,
                net: net.to_string(),
                layers: vec!["F.Cu".to_string()],
            },
            48.0,
            false,
        )
    }

    #[test]
    fn test_empty_side_returns_none() {
        let a = vec![square_pad(0.0, 0.0, 1.0, "A1")];
        assert!(min_clearance(&a, &[]).is_none());
        assert!(min_clearance(&[], &a).is_none());
    }

    #[test]
    fn test_two_square_pads_3mm_apart() {
        // 1mm squares centered 3mm apart: 3.0 - 0.5 - 0.5 = 2mm edge gap
        let a = vec![square_pad(0.0, 0.0, 1.0, "HV+")];
        let b = vec![square_pad(3.0, 0.0, 1.0, "GND")];
        let hit = min_clearance(&a, &b).unwrap();
        assert_relative_eq!(hit.distance_mm, 2.0, epsilon = 1e-4);
        assert_eq!(hit.net_a, "HV+");
        assert_eq!(hit.net_b, "GND");
        assert_relative_eq!(hit.point_a.x, 0.5, epsilon = 1e-4);
        assert_relative_eq!(hit.point_b.x, 2.5, epsilon = 1e-4);
    }

    #[test]
    fn test_minimum_over_multiple_pairs() {
        let a = vec![square_pad(0.0, 0.0, 1.0, "A1"), square_pad(0.0, 10.0, 1.0, "A2")];
        let b = vec![square_pad(20.0, 0.0, 1.0, "B1"), square_pad(2.0, 10.0, 1.0, "B2")];
        let hit = min_clearance(&a, &b).unwrap();
        // A2 <-> B2 are 2mm apart center to center, 1mm edge to edge
        assert_relative_eq!(hit.distance_mm, 1.0, epsilon = 1e-4);
        assert_eq!(hit.net_a, "A2");
        assert_eq!(hit.net_b, "B2");
    }

    #[test]
    fn test_overlapping_pads_clamp_to_zero() {
        let a = vec![square_pad(0.0, 0.0, 2.0, "A1")];
        let b = vec![square_pad(0.5, 0.0, 2.0, "B1")];
        let hit = min_clearance(&a, &b).unwrap();
        assert!(hit.distance_mm >= 0.0);
        assert!(hit.distance_mm < 0.1);
    }

    #[test]
    fn test_result_bounded_by_center_distance() {
        let a = vec![square_pad(0.0, 0.0, 1.5, "A1")];
        let b = vec![square_pad(4.0, 3.0, 0.8, "B1")];
        let hit = min_clearance(&a, &b).unwrap();
        assert!(hit.distance_mm <= 5.0); // center distance
    }
}
