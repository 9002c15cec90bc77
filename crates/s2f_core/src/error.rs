use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::connectome_stats::ToolError;
use crate::fit::FitError;
use crate::recipe::RecipeError;
use crate::stats::StatsError;
use crate::validation::TableError;

/// Exit status for usage-class failures (missing inputs, unresolvable references).
pub const EXIT_USAGE: i32 = 2;
/// Exit status for every other fatal failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Error, Debug)]
pub enum CalibrationError {
    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error(transparent)]
    Fit(#[from] FitError),

    #[error(transparent)]
    Recipe(#[from] RecipeError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Lookup of biological reference dataset failed: {reason}")]
    ReferenceUnresolved { reason: String },

    #[error(transparent)]
    Table(#[from] TableError),

    #[error("Model statistics unavailable: '{program}' could not be run")]
    StatsUnavailable { program: String },

    #[error("IO error ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CalibrationError {
    /// Process exit status this failure maps to.
    pub fn exit_code(&self) -> i32 {
        match self {
            CalibrationError::ReferenceUnresolved { .. } => EXIT_USAGE,
            CalibrationError::Tool(ToolError::NotFound { .. }) => EXIT_USAGE,
            _ => EXIT_FAILURE,
        }
    }
}

pub type Result<T> = std::result::Result<T, CalibrationError>;
