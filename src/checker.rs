//! Spacing check orchestration
//!
//! Assigns nets to voltage domains, then for every unordered domain pair
//! measures the closest air gap (clearance) and, per copper layer, the
//! shortest surface path (creepage), comparing both against the required
//! minimums. Domain pairs are independent and are checked in parallel; each
//! worker owns its obstacle list and grid index.

use crate::board::BoardSnapshot;
use crate::clearance::{min_clearance, ClearanceHit, FeaturePoint};
use crate::config::SpacingConfig;
use crate::creepage::{heuristic, visibility, PathOutcome};
use crate::geom::BoundingBox;
use crate::grid::SpatialGrid;
use crate::obstacle::collect_obstacles;
use crate::report::{CreepageSkip, PathFailure, SpacingReport, SpacingViolation, ViolationKind};
use crate::standards::{apply_safety_margin, required_clearance, required_creepage};
use indexmap::IndexMap;
use rayon::prelude::*;
use std::collections::HashSet;

/// How a net ended up in a voltage domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentSource {
    NetClass,
    Pattern,
}

/// Domain membership for a single net
#[derive(Debug, Clone)]
pub struct DomainAssignment {
    pub domain: String,
    pub voltage_rms: f32,
    pub reinforced: bool,
    pub source: AssignmentSource,
}

fn debug_enabled() -> bool {
    std::env::var("EMC_SPACING_DEBUG").is_ok()
}

/// Map nets to voltage domains.
///
/// Net-class membership wins: each domain first claims the members of its
/// net class (the class named by `net_class`, defaulting to the domain
/// name). Pattern matching is the fallback, case-insensitive substring, and
/// never overrides an existing class assignment.
pub fn assign_domains(
    snapshot: &BoardSnapshot,
    config: &SpacingConfig,
) -> IndexMap<String, DomainAssignment> {
    let mut assignments: IndexMap<String, DomainAssignment> = IndexMap::new();
    let all_nets = snapshot.all_nets();

    for domain in &config.voltage_domains {
        let class = domain.net_class.as_deref().unwrap_or(&domain.name);
        let class_nets = snapshot.nets_in_class(class);

        if !class_nets.is_empty() {
            for net in class_nets {
                assignments.insert(
                    net.clone(),
                    DomainAssignment {
                        domain: domain.name.clone(),
                        voltage_rms: domain.voltage_rms,
                        reinforced: domain.requires_reinforced_insulation,
                        source: AssignmentSource::NetClass,
                    },
                );
            }
            continue; // class matched, patterns not consulted for this domain
        }

        for net in &all_nets {
            if assignments.contains_key(net) {
                continue;
            }
            let net_upper = net.to_uppercase();
            if domain
                .net_patterns
                .iter()
                .any(|p| net_upper.contains(&p.to_uppercase()))
            {
                assignments.insert(
                    net.clone(),
                    DomainAssignment {
                        domain: domain.name.clone(),
                        voltage_rms: domain.voltage_rms,
                        reinforced: domain.requires_reinforced_insulation,
                        source: AssignmentSource::Pattern,
                    },
                );
            }
        }
    }

    assignments
}

/// Pad features grouped by domain, preserving configuration order
fn features_by_domain(
    snapshot: &BoardSnapshot,
    assignments: &IndexMap<String, DomainAssignment>,
    config: &SpacingConfig,
) -> IndexMap<String, Vec<FeaturePoint>> {
    let mut grouped: IndexMap<String, Vec<FeaturePoint>> = IndexMap::new();
    for domain in &config.voltage_domains {
        grouped.entry(domain.name.clone()).or_default();
    }

    for pad in &snapshot.pads {
        if let Some(assignment) = assignments.get(&pad.net) {
            grouped
                .entry(assignment.domain.clone())
                .or_default()
                .push(FeaturePoint::from_pad(
                    pad,
                    assignment.voltage_rms,
                    assignment.reinforced,
                ));
        }
    }

    grouped
}

/// Run the complete clearance/creepage verification over the snapshot.
pub fn run_spacing_check(snapshot: &BoardSnapshot, config: &SpacingConfig) -> SpacingReport {
    let start = std::time::Instant::now();

    let assignments = assign_domains(snapshot, config);
    if assignments.is_empty() {
        eprintln!("[SPACING] no nets assigned to voltage domains, nothing to check");
        return SpacingReport::default();
    }

    let grouped = features_by_domain(snapshot, &assignments, config);
    if debug_enabled() {
        for (domain, features) in &grouped {
            eprintln!("[SPACING] domain {}: {} pad(s)", domain, features.len());
        }
    }

    let names: Vec<&String> = grouped.keys().collect();
    let mut pairs = Vec::new();
    for i in 0..names.len() {
        for j in (i + 1)..names.len() {
            pairs.push((names[i].clone(), names[j].clone()));
        }
    }

    let mut report = pairs
        .par_iter()
        .map(|(a, b)| {
            // Every net assigned to either compared domain is transparent to
            // the pair's creepage path, including nets carrying only tracks
            // or zones and therefore absent from the feature lists
            let excluded: HashSet<String> = assignments
                .iter()
                .filter(|(_, assignment)| assignment.domain == *a || assignment.domain == *b)
                .map(|(net, _)| net.clone())
                .collect();
            check_pair(snapshot, config, a, b, &grouped[a], &grouped[b], &excluded)
        })
        .reduce(SpacingReport::default, |mut acc, r| {
            acc.merge(r);
            acc
        });
    report.pairs_checked = pairs.len();

    eprintln!(
        "[SPACING] {} pair(s) checked, {} violation(s), {} skip(s) in {:?}",
        report.pairs_checked,
        report.violation_count(),
        report.skips.len(),
        start.elapsed()
    );

    report
}

/// Clearance + creepage for a single domain pair
#[allow(clippy::too_many_arguments)]
fn check_pair(
    snapshot: &BoardSnapshot,
    config: &SpacingConfig,
    domain_a: &str,
    domain_b: &str,
    features_a: &[FeaturePoint],
    features_b: &[FeaturePoint],
    excluded_nets: &HashSet<String>,
) -> SpacingReport {
    let mut report = SpacingReport::default();

    let hit = match min_clearance(features_a, features_b) {
        Some(hit) => hit,
        None => {
            if debug_enabled() {
                eprintln!(
                    "[SPACING] {} <-> {}: skipped (no features on one or both sides)",
                    domain_a, domain_b
                );
            }
            return report;
        }
    };

    let voltage_a = features_a[0].voltage_rms;
    let voltage_b = features_b[0].voltage_rms;
    let voltage_diff = (voltage_a - voltage_b).abs();
    let reinforced = features_a[0].reinforced || features_b[0].reinforced;

    let clearance_table = config.clearance_table();
    let override_req = config.find_override(domain_a, domain_b);

    let isolation = match override_req {
        Some(req) => req.isolation_type.clone(),
        None if reinforced => "reinforced".to_string(),
        None => "basic".to_string(),
    };

    // An override value is pre-corrected and gets the safety margin only; an
    // override leaving the value unset falls back to the table lookup
    let required_mm = match override_req.and_then(|req| req.min_clearance_mm) {
        Some(mm) => apply_safety_margin(mm, config.safety_margin_factor),
        None => {
            let ctx = config.correction_context(reinforced, false);
            required_clearance(&clearance_table, voltage_diff, &ctx)
        }
    };

    if debug_enabled() {
        eprintln!(
            "[SPACING] {} <-> {}: clearance {:.3}mm, required {:.3}mm ({})",
            domain_a, domain_b, hit.distance_mm, required_mm, isolation
        );
    }

    if hit.distance_mm < required_mm {
        report.violations.push(SpacingViolation {
            kind: ViolationKind::Clearance,
            domain_a: domain_a.to_string(),
            domain_b: domain_b.to_string(),
            net_a: hit.net_a.clone(),
            net_b: hit.net_b.clone(),
            layer: None,
            measured_mm: Some(hit.distance_mm),
            required_mm,
            isolation: isolation.clone(),
            points: vec![hit.point_a, hit.point_b],
            path_failure: None,
        });
    }

    if config.check_creepage {
        check_pair_creepage(
            snapshot,
            config,
            domain_a,
            domain_b,
            features_a,
            features_b,
            excluded_nets,
            voltage_diff,
            reinforced,
            &isolation,
            &mut report,
        );
    }

    report
}

/// Per-layer creepage for a domain pair
#[allow(clippy::too_many_arguments)]
fn check_pair_creepage(
    snapshot: &BoardSnapshot,
    config: &SpacingConfig,
    domain_a: &str,
    domain_b: &str,
    features_a: &[FeaturePoint],
    features_b: &[FeaturePoint],
    excluded_nets: &HashSet<String>,
    voltage_diff: f32,
    reinforced: bool,
    isolation: &str,
    report: &mut SpacingReport,
) {
    let clearance_table = config.clearance_table();
    let creepage_tables = config.creepage_tables();
    let override_req = config.find_override(domain_a, domain_b);
    let caps = config.path_caps();

    for layer in &snapshot.layers {
        let on_layer_a: Vec<FeaturePoint> = features_a
            .iter()
            .filter(|f| f.on_layer(&layer.id))
            .cloned()
            .collect();
        let on_layer_b: Vec<FeaturePoint> = features_b
            .iter()
            .filter(|f| f.on_layer(&layer.id))
            .cloned()
            .collect();

        // Anchor the path at the closest copper points on this layer
        let hit: ClearanceHit = match min_clearance(&on_layer_a, &on_layer_b) {
            Some(hit) => hit,
            None => continue,
        };

        let window = BoundingBox::from_points(&[hit.point_a, hit.point_b])
            .inflated(config.search_window_margin_mm);
        let obstacles = collect_obstacles(snapshot, &layer.id, excluded_nets, &window);

        if obstacles.len() > config.max_obstacles_skip {
            eprintln!(
                "[SPACING] {} <-> {} on {}: creepage skipped, {} obstacles over cap {}",
                domain_a,
                domain_b,
                layer.id,
                obstacles.len(),
                config.max_obstacles_skip
            );
            report.skips.push(CreepageSkip {
                domain_a: domain_a.to_string(),
                domain_b: domain_b.to_string(),
                layer: layer.id.clone(),
                obstacle_count: obstacles.len(),
                cap: config.max_obstacles_skip,
            });
            continue;
        }

        let grid = SpatialGrid::build(&obstacles, config.grid_cell_mm);
        let outcome = if obstacles.len() > config.max_obstacles_exact {
            heuristic::shortest_path(hit.point_a, hit.point_b, &obstacles, &grid, &caps)
        } else {
            visibility::shortest_path(hit.point_a, hit.point_b, &obstacles, &grid, &caps)
        };

        let required_mm = match override_req.and_then(|req| req.min_creepage_mm) {
            Some(mm) => apply_safety_margin(mm, config.safety_margin_factor),
            None => {
                let ctx = config.correction_context(reinforced, layer.internal);
                required_creepage(
                    &clearance_table,
                    &creepage_tables,
                    &config.material_group,
                    config.pollution_degree,
                    voltage_diff,
                    &ctx,
                )
            }
        };

        match outcome {
            PathOutcome::Found { length_mm, points } => {
                if debug_enabled() {
                    eprintln!(
                        "[SPACING] {} <-> {} on {}: creepage {:.3}mm, required {:.3}mm",
                        domain_a, domain_b, layer.id, length_mm, required_mm
                    );
                }
                if length_mm < required_mm {
                    report.violations.push(SpacingViolation {
                        kind: ViolationKind::Creepage,
                        domain_a: domain_a.to_string(),
                        domain_b: domain_b.to_string(),
                        net_a: hit.net_a.clone(),
                        net_b: hit.net_b.clone(),
                        layer: Some(layer.id.clone()),
                        measured_mm: Some(length_mm),
                        required_mm,
                        isolation: isolation.to_string(),
                        points,
                        path_failure: None,
                    });
                }
            }
            PathOutcome::Unreachable | PathOutcome::Exhausted => {
                // No finite path: infinite creepage, always reported. The
                // failure reason lets the operator tell a board cutout from
                // an exhausted search.
                let failure = if outcome == PathOutcome::Unreachable {
                    PathFailure::Unreachable
                } else {
                    PathFailure::Exhausted
                };
                report.violations.push(SpacingViolation {
                    kind: ViolationKind::Creepage,
                    domain_a: domain_a.to_string(),
                    domain_b: domain_b.to_string(),
                    net_a: hit.net_a.clone(),
                    net_b: hit.net_b.clone(),
                    layer: Some(layer.id.clone()),
                    measured_mm: None,
                    required_mm,
                    isolation: isolation.to_string(),
                    points: vec![hit.point_a, hit.point_b],
                    path_failure: Some(failure),
                });
            }
        }
    }
}
