//! Rule configuration for the spacing check
//!
//! Deserialized from the `[clearance_creepage]` section of the rule TOML
//! file. Defaults mirror the shipped rule set: IEC 60664-1, overvoltage
//! category II, pollution degree 2, material group II, 1.2 safety margin.

use crate::creepage::PathCaps;
use crate::standards::{
    CorrectionContext, CreepageSubTable, CreepageTables, InterpolationTable, OvervoltageCategory,
};
use anyhow::{ensure, Context, Result};
use serde::Deserialize;

/// A named group of nets sharing a working voltage and insulation class
#[derive(Debug, Clone, Deserialize)]
pub struct VoltageDomainConfig {
    pub name: String,
    pub voltage_rms: f32,
    /// Net class whose members join this domain; defaults to the domain name
    #[serde(default)]
    pub net_class: Option<String>,
    /// Case-insensitive substring patterns, used only for nets no class matched
    #[serde(default)]
    pub net_patterns: Vec<String>,
    #[serde(default)]
    pub requires_reinforced_insulation: bool,
}

/// Explicit per-pair spacing override. Set values are pre-corrected and get
/// only the safety margin on top; a value left unset keeps the table lookup
/// for that measurement, so a clearance-only override never zeroes the
/// creepage requirement (and vice versa).
#[derive(Debug, Clone, Deserialize)]
pub struct IsolationRequirement {
    pub domain_a: String,
    pub domain_b: String,
    #[serde(default = "default_isolation_type")]
    pub isolation_type: String,
    #[serde(default)]
    pub min_clearance_mm: Option<f32>,
    #[serde(default)]
    pub min_creepage_mm: Option<f32>,
    #[serde(default)]
    pub description: String,
}

impl IsolationRequirement {
    /// Direction-insensitive pair match
    pub fn matches(&self, a: &str, b: &str) -> bool {
        (self.domain_a == a && self.domain_b == b) || (self.domain_a == b && self.domain_b == a)
    }
}

fn default_isolation_type() -> String {
    "basic".to_string()
}

/// Creepage sub-table as configured
#[derive(Debug, Clone, Deserialize)]
pub struct CreepageTableConfig {
    pub material_group: String,
    pub pollution_degree: u8,
    pub entries: Vec<(f32, f32)>,
}

/// The `[clearance_creepage]` rule section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpacingConfig {
    pub standard: String,
    pub overvoltage_category: OvervoltageCategory,
    pub pollution_degree: u8,
    pub material_group: String,
    pub altitude_m: f32,
    pub safety_margin_factor: f32,
    /// Creepage reduction for internal (resin-sealed) layers
    pub internal_layer_factor: f32,

    pub voltage_domains: Vec<VoltageDomainConfig>,
    pub isolation_requirements: Vec<IsolationRequirement>,
    /// Ascending (voltage, mm) pairs for clearance
    pub clearance_table: Vec<(f32, f32)>,
    pub creepage_tables: Vec<CreepageTableConfig>,

    pub check_creepage: bool,
    /// Above this count the exact visibility graph gives way to the heuristic
    pub max_obstacles_exact: usize,
    /// Above this count the layer's creepage check is skipped and recorded
    pub max_obstacles_skip: usize,
    pub corners_per_obstacle: usize,
    pub max_graph_vertices: usize,
    pub max_iterations: usize,
    pub max_neighbors: usize,
    pub grid_cell_mm: f32,
    /// Padding around the closest pad pair for obstacle collection
    pub search_window_margin_mm: f32,
}

impl Default for SpacingConfig {
    fn default() -> Self {
        Self {
            standard: "IEC60664-1".to_string(),
            overvoltage_category: OvervoltageCategory::II,
            pollution_degree: 2,
            material_group: "II".to_string(),
            altitude_m: 1000.0,
            safety_margin_factor: 1.2,
            internal_layer_factor: 1.0,
            voltage_domains: Vec::new(),
            isolation_requirements: Vec::new(),
            clearance_table: Vec::new(),
            creepage_tables: Vec::new(),
            check_creepage: true,
            max_obstacles_exact: 500,
            max_obstacles_skip: 2000,
            corners_per_obstacle: 3,
            max_graph_vertices: 256,
            max_iterations: 10_000,
            max_neighbors: 8,
            grid_cell_mm: 1.0,
            search_window_margin_mm: 5.0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    clearance_creepage: Option<SpacingConfig>,
}

impl SpacingConfig {
    /// Parse the `[clearance_creepage]` section out of a rule TOML document
    pub fn from_toml_str(toml_text: &str) -> Result<Self> {
        let file: RuleFile =
            toml::from_str(toml_text).context("failed to parse rule TOML")?;
        let config = file
            .clearance_creepage
            .context("missing [clearance_creepage] section")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read rule file {}", path.display()))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            (1..=4).contains(&self.pollution_degree),
            "pollution_degree must be 1..=4, got {}",
            self.pollution_degree
        );
        ensure!(
            self.safety_margin_factor > 0.0,
            "safety_margin_factor must be positive"
        );
        ensure!(self.grid_cell_mm > 0.0, "grid_cell_mm must be positive");
        ensure!(
            self.search_window_margin_mm >= 0.0,
            "search_window_margin_mm must not be negative"
        );
        ensure!(
            self.max_obstacles_skip >= self.max_obstacles_exact,
            "max_obstacles_skip ({}) must be >= max_obstacles_exact ({})",
            self.max_obstacles_skip,
            self.max_obstacles_exact
        );
        ensure!(self.max_graph_vertices >= 3, "max_graph_vertices must be >= 3");
        ensure!(self.max_iterations > 0, "max_iterations must be positive");
        ensure!(self.max_neighbors > 0, "max_neighbors must be positive");
        for domain in &self.voltage_domains {
            ensure!(!domain.name.is_empty(), "voltage domain with empty name");
            ensure!(
                domain.voltage_rms >= 0.0,
                "domain '{}' has negative voltage",
                domain.name
            );
        }
        for req in &self.isolation_requirements {
            for (label, value) in [
                ("min_clearance_mm", req.min_clearance_mm),
                ("min_creepage_mm", req.min_creepage_mm),
            ] {
                if let Some(mm) = value {
                    ensure!(
                        mm > 0.0,
                        "override {} <-> {}: {} must be positive, got {}",
                        req.domain_a,
                        req.domain_b,
                        label,
                        mm
                    );
                }
            }
        }
        Ok(())
    }

    pub fn clearance_table(&self) -> InterpolationTable {
        InterpolationTable::new(self.clearance_table.clone())
    }

    pub fn creepage_tables(&self) -> CreepageTables {
        CreepageTables {
            sub_tables: self
                .creepage_tables
                .iter()
                .map(|t| CreepageSubTable {
                    material_group: t.material_group.clone(),
                    pollution_degree: t.pollution_degree,
                    table: InterpolationTable::new(t.entries.clone()),
                })
                .collect(),
        }
    }

    pub fn path_caps(&self) -> PathCaps {
        PathCaps {
            corners_per_obstacle: self.corners_per_obstacle,
            max_graph_vertices: self.max_graph_vertices,
            max_iterations: self.max_iterations,
            max_neighbors: self.max_neighbors,
            ..PathCaps::default()
        }
    }

    pub fn correction_context(&self, reinforced: bool, internal_layer: bool) -> CorrectionContext {
        CorrectionContext {
            overvoltage: self.overvoltage_category,
            altitude_m: self.altitude_m,
            reinforced,
            internal_layer,
            internal_layer_factor: self.internal_layer_factor,
            safety_margin_factor: self.safety_margin_factor,
        }
    }

    pub fn find_override(&self, domain_a: &str, domain_b: &str) -> Option<&IsolationRequirement> {
        self.isolation_requirements
            .iter()
            .find(|req| req.matches(domain_a, domain_b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RULES: &str = r#"
[clearance_creepage]
standard = "IEC60664-1"
overvoltage_category = "II"
pollution_degree = 2
material_group = "II"
altitude_m = 2500.0
safety_margin_factor = 1.2
clearance_table = [[0.0, 0.5], [50.0, 0.6], [150.0, 1.0]]

[[clearance_creepage.voltage_domains]]
name = "HV"
voltage_rms = 230.0
net_patterns = ["HV", "MAINS"]
requires_reinforced_insulation = true

[[clearance_creepage.voltage_domains]]
name = "LV"
voltage_rms = 5.0
net_patterns = ["VCC", "SIG"]

[[clearance_creepage.isolation_requirements]]
domain_a = "HV"
domain_b = "LV"
isolation_type = "reinforced"
min_clearance_mm = 4.0
min_creepage_mm = 6.4
description = "Mains to SELV barrier"

[[clearance_creepage.creepage_tables]]
material_group = "II"
pollution_degree = 2
entries = [[0.0, 1.0], [100.0, 2.0]]
"#;

    #[test]
    fn test_parse_sample_rules() {
        let config = SpacingConfig::from_toml_str(SAMPLE_RULES).unwrap();
        assert_eq!(config.voltage_domains.len(), 2);
        assert_eq!(config.voltage_domains[0].name, "HV");
        assert!(config.voltage_domains[0].requires_reinforced_insulation);
        assert_eq!(config.isolation_requirements.len(), 1);
        assert_eq!(config.altitude_m, 2500.0);
        // Defaults fill unspecified caps
        assert_eq!(config.max_obstacles_exact, 500);
        assert_eq!(config.max_iterations, 10_000);
    }

    #[test]
    fn test_missing_section_is_error() {
        assert!(SpacingConfig::from_toml_str("[other_check]\nfoo = 1\n").is_err());
    }

    #[test]
    fn test_invalid_pollution_degree_rejected() {
        let text = "[clearance_creepage]\npollution_degree = 9\n";
        assert!(SpacingConfig::from_toml_str(text).is_err());
    }

    #[test]
    fn test_partial_override_leaves_other_value_unset() {
        let text = r#"
[clearance_creepage]
[[clearance_creepage.isolation_requirements]]
domain_a = "HV"
domain_b = "LV"
min_clearance_mm = 4.0
"#;
        let config = SpacingConfig::from_toml_str(text).unwrap();
        let req = &config.isolation_requirements[0];
        assert_eq!(req.min_clearance_mm, Some(4.0));
        assert_eq!(req.min_creepage_mm, None);
    }

    #[test]
    fn test_nonpositive_override_rejected() {
        let text = r#"
[clearance_creepage]
[[clearance_creepage.isolation_requirements]]
domain_a = "HV"
domain_b = "LV"
min_creepage_mm = 0.0
"#;
        assert!(SpacingConfig::from_toml_str(text).is_err());
    }

    #[test]
    fn test_override_lookup_is_direction_insensitive() {
        let config = SpacingConfig::from_toml_str(SAMPLE_RULES).unwrap();
        assert!(config.find_override("HV", "LV").is_some());
        assert!(config.find_override("LV", "HV").is_some());
        assert!(config.find_override("HV", "OTHER").is_none());
    }

    #[test]
    fn test_tables_constructed_sorted() {
        let config = SpacingConfig::from_toml_str(SAMPLE_RULES).unwrap();
        let table = config.clearance_table();
        assert!((table.required_distance(100.0) - 0.8).abs() < 1e-6);
        assert!(config.creepage_tables().select("II", 2).is_some());
        assert!(config.creepage_tables().select("IIIa", 2).is_none());
    }
}
