//! Electrical-safety spacing audit core for printed circuit boards.
//!
//! Measures clearance (shortest air gap) and creepage (shortest path along
//! the board surface) between configured voltage domains and compares both
//! against IEC 60664-1 style required minimums. The host CAD tool supplies a
//! flattened [`board::BoardSnapshot`] and a [`config::SpacingConfig`]; the
//! check returns a [`report::SpacingReport`] of violations for the host to
//! render.
//!
//! ```ignore
//! let config = SpacingConfig::load(Path::new("rules.toml"))?;
//! let report = run_spacing_check(&snapshot, &config);
//! println!("{}", report.to_json()?);
//! ```

pub mod board;
pub mod checker;
pub mod clearance;
pub mod config;
pub mod creepage;
pub mod geom;
pub mod grid;
pub mod obstacle;
pub mod report;
pub mod standards;

pub use board::{BoardSnapshot, LayerInfo, PadForm, PadShape, TrackSeg, ZoneFill};
pub use checker::run_spacing_check;
pub use config::SpacingConfig;
pub use creepage::{PathCaps, PathOutcome};
pub use report::{SpacingReport, SpacingViolation, ViolationKind};
