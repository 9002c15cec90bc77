//! End-to-end runs
//!
//! - [`validate`]: model vs. reference statistics → validation CSV
//! - [`adjust`]: validation CSVs → fitted scale factors → adjusted recipe

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::circuit::{lookup_reference, ReferenceLookup};
use crate::config::{CalibrationConfig, Policy, StatisticKind};
use crate::connectome_stats::{locate, run_stats_tool, StatsInvocation, ToolError};
use crate::error::{CalibrationError, Result};
use crate::fit::{fit_records, FitSummary};
use crate::recipe::{apply_scale, read_recipe, write_recipe, AdjustmentSpec, RecipeError};
use crate::stats::{read_stat_table, StatSet};
use crate::validation::{compare, read_validation_table, write_validation_table, ValidationRecord};

/// Inputs of a validation run.
#[derive(Debug, Clone)]
pub struct ValidateRequest<'a> {
    pub circuit_config: &'a Path,
    pub target: &'a str,
    pub output_csv: &'a Path,
    /// Explicit reference table; looked up from the bioname when `None`
    pub reference: Option<&'a Path>,
}

/// Compare model statistics for `kind` with the biological reference and
/// write the validation table.
pub fn validate(
    kind: StatisticKind,
    request: &ValidateRequest,
    config: &CalibrationConfig,
) -> Result<Vec<ValidationRecord>> {
    let task = config.task(kind);
    let layout = kind.layout();

    let lookup = match request.reference {
        Some(path) => ReferenceLookup::Resolved(path.to_path_buf()),
        None => {
            tracing::info!(
                "No biological reference dataset provided! Will try to look up relevant data from the circuit bioname"
            );
            let lookup = lookup_reference(request.circuit_config, &task.bioname_task);
            if let ReferenceLookup::Resolved(path) = &lookup {
                tracing::info!(
                    "Will use {} as biological reference dataset. If that is wrong, provide it explicitly",
                    path.display()
                );
            }
            lookup
        }
    };

    let reference = match lookup {
        ReferenceLookup::Resolved(path) => read_stat_table(&path, &layout)?,
        ReferenceLookup::Unresolved(reason) => match task.reference_lookup {
            Policy::Required => return Err(CalibrationError::ReferenceUnresolved { reason }),
            Policy::BestEffort => {
                tracing::warn!(
                    "Lookup of biological reference dataset failed ({}). Continuing without reference data; provide it explicitly to compute errors",
                    reason
                );
                StatSet::new(layout.clone())
            }
        },
    };

    if locate(&config.stats_tool.program).is_none() {
        let err = ToolError::NotFound {
            program: config.stats_tool.program.clone(),
        };
        match task.stats_tool {
            Policy::Required => return Err(err.into()),
            Policy::BestEffort => tracing::warn!("{}", err),
        }
    }

    let invocation = StatsInvocation {
        subcommand: kind.subcommand(),
        extra_args: &task.extra_args,
        target_args: kind.target_args(request.target),
        circuit_config: request.circuit_config,
    };
    let model = run_stats_tool(&config.stats_tool, &invocation, &layout).map_err(|err| {
        match (err, task.stats_tool) {
            (ToolError::NotFound { program }, Policy::BestEffort) => {
                CalibrationError::StatsUnavailable { program }
            }
            (err, _) => err.into(),
        }
    })?;

    let records = compare(&model, &reference);
    write_validation_table(request.output_csv, &layout, &records)?;

    let errors: Vec<f64> = records.iter().filter_map(|r| r.error).collect();
    if errors.is_empty() {
        tracing::warn!("No {} row has a defined error", kind.label());
    } else {
        let mean_abs = errors.iter().map(|e| e.abs()).sum::<f64>() / errors.len() as f64;
        tracing::info!(
            "Validated {}: {} of {} rows comparable, mean |error| {:.1}%",
            kind.label(),
            errors.len(),
            records.len(),
            mean_abs
        );
    }

    Ok(records)
}

/// Inputs of a recipe adjustment run.
#[derive(Debug, Clone)]
pub struct AdjustRequest<'a> {
    pub input: &'a Path,
    /// Defaults to [`default_output_path`]
    pub output: Option<&'a Path>,
    pub bouton_table: Option<&'a Path>,
    pub syns_table: Option<&'a Path>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedAdjustment {
    pub attribute: String,
    pub source_table: PathBuf,
    pub fit: FitSummary,
    pub nodes_updated: usize,
}

/// What an adjustment run did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentReport {
    pub input: PathBuf,
    pub output: PathBuf,
    /// RFC3339
    pub created_at: String,
    pub adjustments: Vec<AppliedAdjustment>,
}

/// `<stem>_adjusted.<ext>` next to the input.
pub fn default_output_path(input: &Path) -> PathBuf {
    let mut name: OsString = input
        .file_stem()
        .unwrap_or_else(|| OsStr::new(""))
        .to_os_string();
    name.push("_adjusted");
    if let Some(ext) = input.extension() {
        name.push(".");
        name.push(ext);
    }
    input.with_file_name(name)
}

/// Fit a scale factor from each supplied validation table and write the
/// rescaled recipe.
///
/// Tables are applied bouton density first, then synapses per connection;
/// each one only touches its own attribute. The output path is checked before
/// any fitting so a collision fails fast.
pub fn adjust(request: &AdjustRequest, config: &CalibrationConfig) -> Result<AdjustmentReport> {
    let output = request
        .output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(request.input));
    if output.exists() {
        return Err(RecipeError::OutputExists { path: output }.into());
    }

    let mut tree = read_recipe(request.input)?;

    if request.bouton_table.is_none() && request.syns_table.is_none() {
        tracing::warn!(
            "Neither results on bouton density nor synapses per connection provided. No adjustments will be performed!"
        );
    }

    let plan: [(Option<&Path>, &AdjustmentSpec); 2] = [
        (request.bouton_table, &config.adjustments.bouton_reduction),
        (request.syns_table, &config.adjustments.mean_syns_connection),
    ];

    let mut adjustments = Vec::new();
    for (table, spec) in plan {
        let Some(table) = table else {
            continue;
        };
        tracing::info!(
            "Adjusting {} based on results in {}",
            spec.attribute_key,
            table.display()
        );

        let records = read_validation_table(table)?;
        let fit = fit_records(&records)?;
        tracing::info!(
            "Fit for {}: scale={:.6} records={} r2={} se={}",
            spec.attribute_key,
            fit.scale.value(),
            fit.records,
            fit.r_squared.map_or("n/a".to_string(), |v| format!("{:.4}", v)),
            fit.std_error.map_or("n/a".to_string(), |v| format!("{:.4e}", v)),
        );

        let nodes_updated = apply_scale(&mut tree, spec, fit.scale)?;
        adjustments.push(AppliedAdjustment {
            attribute: spec.attribute_key.clone(),
            source_table: table.to_path_buf(),
            fit,
            nodes_updated,
        });
    }

    write_recipe(&tree, &output)?;

    Ok(AdjustmentReport {
        input: request.input.to_path_buf(),
        output,
        created_at: chrono::Utc::now().to_rfc3339(),
        adjustments,
    })
}
