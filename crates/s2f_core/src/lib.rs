//! # s2f_core - s2f connectivity recipe calibration
//!
//! Validates circuit connectivity statistics against biological reference
//! data and rescales the s2f connection recipe to close the gap.
//!
//! ## Flow
//! - `connectome-stats` output + reference table → [`validation`] CSV
//! - validation CSV → proportional [`fit`] → scale factor
//! - scale factor → clamped rewrite of one [`recipe`] attribute

pub mod circuit;
pub mod config;
pub mod connectome_stats;
pub mod error;
pub mod fit;
pub mod pipeline;
pub mod recipe;
pub mod stats;
pub mod validation;

pub use config::{CalibrationConfig, Policy, StatisticKind};
pub use error::{CalibrationError, Result, EXIT_FAILURE, EXIT_USAGE};
pub use fit::{fit_proportional, fit_records, FitError, FitSummary, ScaleFactor};
pub use pipeline::{
    adjust, default_output_path, validate, AdjustRequest, AdjustmentReport, AppliedAdjustment,
    ValidateRequest,
};
pub use recipe::{AdjustmentSpec, RecipeError, RecipeNode, RecipeTree};
pub use stats::{Key, KeyLayout, StatPoint, StatSet};
pub use validation::ValidationRecord;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
