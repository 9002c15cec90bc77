//! Proportional least-squares fit
//!
//! Fits `mean_ref ≈ b * mean_model` through the origin:
//!
//! ```text
//! b = Σ(x_i * y_i) / Σ(x_i^2)
//! ```
//!
//! with `x` the model means and `y` the reference means of every record that
//! has a defined error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation::{fit_pairs, ValidationRecord};

#[derive(Error, Debug, PartialEq)]
pub enum FitError {
    #[error("No valid validation records to fit")]
    NoRecords,

    #[error("Degenerate fit: sum of squared model means is zero ({records} records)")]
    DegenerateDesign { records: usize },

    #[error("Fitted scale factor {value} is not a finite non-negative number")]
    InvalidScale { value: f64 },
}

/// Fitted proportionality constant mapping model means to reference means.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScaleFactor(f64);

impl ScaleFactor {
    /// Accepts finite, non-negative values only
    pub fn new(value: f64) -> Result<Self, FitError> {
        if value.is_finite() && value >= 0.0 {
            Ok(Self(value))
        } else {
            Err(FitError::InvalidScale { value })
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// Scale factor plus goodness-of-fit figures for logging and reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSummary {
    pub scale: ScaleFactor,
    pub records: usize,
    pub residual_sum_squares: f64,
    /// Uncentered R² (no-intercept model)
    pub r_squared: Option<f64>,
    /// Standard error of the coefficient; needs at least 2 records
    pub std_error: Option<f64>,
}

/// Fit the scale factor from `(model, reference)` mean pairs.
pub fn fit_proportional(pairs: &[(f64, f64)]) -> Result<FitSummary, FitError> {
    if pairs.is_empty() {
        return Err(FitError::NoRecords);
    }

    let (sxy, sxx, syy) = pairs.iter().fold((0.0, 0.0, 0.0), |(sxy, sxx, syy), &(x, y)| {
        (sxy + x * y, sxx + x * x, syy + y * y)
    });

    if sxx == 0.0 {
        return Err(FitError::DegenerateDesign {
            records: pairs.len(),
        });
    }

    let b = sxy / sxx;
    let scale = ScaleFactor::new(b)?;

    let rss: f64 = pairs.iter().map(|&(x, y)| (y - b * x).powi(2)).sum();
    let r_squared = (syy > 0.0).then(|| 1.0 - rss / syy);
    let dof = pairs.len() - 1;
    let std_error = (dof > 0).then(|| (rss / dof as f64 / sxx).sqrt());

    Ok(FitSummary {
        scale,
        records: pairs.len(),
        residual_sum_squares: rss,
        r_squared,
        std_error,
    })
}

/// Fit from validation records, skipping rows with an undefined error.
pub fn fit_records(records: &[ValidationRecord]) -> Result<FitSummary, FitError> {
    let pairs = fit_pairs(records);
    let skipped = records.len() - pairs.len();
    if skipped > 0 {
        tracing::debug!("Excluding {} of {} records without a defined error", skipped, records.len());
    }
    fit_proportional(&pairs)
}
