//! Check results handed to the reporting collaborator
//!
//! The core draws nothing; it returns explicit value results carrying the
//! domain pair, nets, measured vs required distances, and enough geometry
//! for the host to render markers and arrows.

use crate::geom::Point;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ViolationKind {
    Clearance,
    Creepage,
}

/// Why a creepage measurement produced no finite path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PathFailure {
    /// Goal disconnected in the searched graph: a structural separation such
    /// as a board cutout or closed copper ring between the domains
    Unreachable,
    /// A search cap was hit before any conclusion; treat as "unknown, assume
    /// violating" and consider raising the caps
    Exhausted,
}

/// A single spacing violation between two voltage domains
#[derive(Debug, Clone, Serialize)]
pub struct SpacingViolation {
    pub kind: ViolationKind,
    pub domain_a: String,
    pub domain_b: String,
    pub net_a: String,
    pub net_b: String,
    /// Creepage violations are per copper layer; clearance collapses layers
    pub layer: Option<String>,
    /// `None` means no surface path exists (infinite creepage)
    pub measured_mm: Option<f32>,
    pub required_mm: f32,
    /// "basic" or "reinforced", or the override's configured type
    pub isolation: String,
    /// Two points for clearance; the ordered surface path for creepage
    pub points: Vec<Point>,
    pub path_failure: Option<PathFailure>,
}

/// A creepage check that was skipped rather than measured
#[derive(Debug, Clone, Serialize)]
pub struct CreepageSkip {
    pub domain_a: String,
    pub domain_b: String,
    pub layer: String,
    pub obstacle_count: usize,
    pub cap: usize,
}

/// Aggregate result of a full spacing check
#[derive(Debug, Clone, Default, Serialize)]
pub struct SpacingReport {
    pub pairs_checked: usize,
    pub violations: Vec<SpacingViolation>,
    pub skips: Vec<CreepageSkip>,
}

impl SpacingReport {
    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }

    /// JSON export for the host reporting layer
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn merge(&mut self, other: SpacingReport) {
        self.pairs_checked += other.pairs_checked;
        self.violations.extend(other.violations);
        self.skips.extend(other.skips);
    }
}
