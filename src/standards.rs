//! Required-spacing lookup per IEC 60664-1 style tables
//!
//! Piecewise-linear interpolation of required distance versus working
//! voltage, independently for clearance and creepage, with the correction
//! factors layered on top in a fixed multiplicative order.

use serde::Deserialize;

/// Conservative minimum used when no table data is available
pub const FALLBACK_MIN_DISTANCE_MM: f32 = 0.5;

/// Creepage fallback when no (material group, pollution degree) sub-table
/// matches: 1.5x the clearance requirement
pub const CREEPAGE_FROM_CLEARANCE_FACTOR: f32 = 1.5;

/// Altitude above which air density starts reducing withstand voltage
pub const ALTITUDE_CORRECTION_START_M: f32 = 2000.0;

/// Overvoltage category per IEC 60664-1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum OvervoltageCategory {
    I,
    II,
    III,
    IV,
}

impl OvervoltageCategory {
    /// Multiplier on the interpolated base distance
    pub fn factor(&self) -> f32 {
        match self {
            OvervoltageCategory::I => 0.8,
            OvervoltageCategory::II => 1.0,
            OvervoltageCategory::III => 1.25,
            OvervoltageCategory::IV => 1.6,
        }
    }
}

impl Default for OvervoltageCategory {
    fn default() -> Self {
        OvervoltageCategory::II
    }
}

/// Ascending (voltage, required distance) pairs; sorted once at construction
#[derive(Debug, Clone)]
pub struct InterpolationTable {
    entries: Vec<(f32, f32)>,
}

impl InterpolationTable {
    pub fn new(mut entries: Vec<(f32, f32)>) -> Self {
        entries.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Required distance at `voltage`, clamped to the boundary values outside
    /// the table range, linearly interpolated between bracketing entries.
    /// An empty table yields the conservative fallback minimum.
    pub fn required_distance(&self, voltage: f32) -> f32 {
        let entries = &self.entries;
        if entries.is_empty() {
            return FALLBACK_MIN_DISTANCE_MM;
        }
        if voltage <= entries[0].0 {
            return entries[0].1;
        }
        if voltage >= entries[entries.len() - 1].0 {
            return entries[entries.len() - 1].1;
        }

        for window in entries.windows(2) {
            let (v_low, d_low) = window[0];
            let (v_high, d_high) = window[1];
            if v_low <= voltage && voltage <= v_high {
                let ratio = (voltage - v_low) / (v_high - v_low);
                return d_low + ratio * (d_high - d_low);
            }
        }

        FALLBACK_MIN_DISTANCE_MM
    }
}

/// A creepage sub-table keyed by insulation material group and pollution degree
#[derive(Debug, Clone)]
pub struct CreepageSubTable {
    pub material_group: String,
    pub pollution_degree: u8,
    pub table: InterpolationTable,
}

/// All creepage sub-tables from the rule configuration
#[derive(Debug, Clone, Default)]
pub struct CreepageTables {
    pub sub_tables: Vec<CreepageSubTable>,
}

impl CreepageTables {
    pub fn select(&self, material_group: &str, pollution_degree: u8) -> Option<&InterpolationTable> {
        self.sub_tables
            .iter()
            .find(|s| {
                s.material_group.eq_ignore_ascii_case(material_group)
                    && s.pollution_degree == pollution_degree
            })
            .map(|s| &s.table)
    }
}

/// Inputs to the correction chain
#[derive(Debug, Clone, Copy)]
pub struct CorrectionContext {
    pub overvoltage: OvervoltageCategory,
    pub altitude_m: f32,
    /// Either domain of the pair requires reinforced insulation
    pub reinforced: bool,
    /// Creepage on an internal layer (resin-sealed surfaces)
    pub internal_layer: bool,
    pub internal_layer_factor: f32,
    pub safety_margin_factor: f32,
}

/// Air-gap derating above 2000 m: +0.025% per metre
pub fn altitude_factor(altitude_m: f32) -> f32 {
    if altitude_m > ALTITUDE_CORRECTION_START_M {
        1.0 + 0.00025 * (altitude_m - ALTITUDE_CORRECTION_START_M)
    } else {
        1.0
    }
}

/// Apply the correction chain to an interpolated base distance.
///
/// Fixed order: overvoltage category, altitude, reinforced (x2),
/// internal-layer reduction, safety margin last. The safety margin always
/// comes last so explicitly configured override values, which bypass this
/// chain, receive exactly one margin application and are never
/// double-corrected.
pub fn apply_corrections(base_mm: f32, ctx: &CorrectionContext) -> f32 {
    let mut distance = base_mm;
    distance *= ctx.overvoltage.factor();
    distance *= altitude_factor(ctx.altitude_m);
    if ctx.reinforced {
        distance *= 2.0;
    }
    if ctx.internal_layer {
        distance *= ctx.internal_layer_factor;
    }
    distance * ctx.safety_margin_factor
}

/// Safety margin only, for pre-corrected override values from configuration
pub fn apply_safety_margin(override_mm: f32, safety_margin_factor: f32) -> f32 {
    override_mm * safety_margin_factor
}

/// Required clearance for a voltage differential, fully corrected
pub fn required_clearance(table: &InterpolationTable, voltage_diff: f32, ctx: &CorrectionContext) -> f32 {
    let ctx = CorrectionContext {
        internal_layer: false, // internal-layer reduction applies to creepage only
        ..*ctx
    };
    apply_corrections(table.required_distance(voltage_diff), &ctx)
}

/// Required creepage for a voltage differential, fully corrected.
///
/// Selects the sub-table for the configured material group and pollution
/// degree; when none matches, the base value falls back to 1.5x the
/// clearance table's interpolation.
pub fn required_creepage(
    clearance_table: &InterpolationTable,
    creepage_tables: &CreepageTables,
    material_group: &str,
    pollution_degree: u8,
    voltage_diff: f32,
    ctx: &CorrectionContext,
) -> f32 {
    let base = match creepage_tables.select(material_group, pollution_degree) {
        Some(table) => table.required_distance(voltage_diff),
        None => clearance_table.required_distance(voltage_diff) * CREEPAGE_FROM_CLEARANCE_FACTOR,
    };
    apply_corrections(base, ctx)
}
