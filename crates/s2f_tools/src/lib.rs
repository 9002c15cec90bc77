//! s2f calibration tools
//!
//! Shared plumbing for the `validate-*` and `adjust-s2f-recipe` binaries:
//! logging setup, validation CLI arguments, exit status mapping and the
//! adjustment report file.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use s2f_core::{AdjustmentReport, CalibrationError};

#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use s2f_core::{CalibrationConfig, StatisticKind, ValidateRequest};

/// Exit status for a failed run.
pub fn failure_exit(err: &CalibrationError) -> ExitCode {
    tracing::error!("{}", err);
    ExitCode::from(err.exit_code() as u8)
}

/// Write the adjustment report as pretty JSON.
pub fn save_report(path: &Path, report: &AdjustmentReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    tracing::info!("Report saved to {}", path.display());
    Ok(())
}

/// Log to stderr, `info` and above unless `RUST_LOG` says otherwise.
#[cfg(feature = "cli")]
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Positional arguments shared by the validate tools.
#[cfg(feature = "cli")]
#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Circuit config of the circuit to validate
    pub circuit_config: PathBuf,

    /// Target (cell set) to sample
    pub target: String,

    /// Output validation CSV
    pub output_csv: PathBuf,

    /// Biological reference table; looked up from the circuit bioname when omitted
    pub reference: Option<PathBuf>,

    /// Calibration config (YAML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Run one validate tool end to end.
#[cfg(feature = "cli")]
pub fn run_validation(kind: StatisticKind, args: &ValidateArgs) -> ExitCode {
    let config = match CalibrationConfig::load_or_default(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => return failure_exit(&e.into()),
    };

    let request = ValidateRequest {
        circuit_config: &args.circuit_config,
        target: &args.target,
        output_csv: &args.output_csv,
        reference: args.reference.as_deref(),
    };

    match s2f_core::validate(kind, &request, &config) {
        Ok(records) => {
            println!(
                "Wrote {} {} rows to {}",
                records.len(),
                kind.label(),
                args.output_csv.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => failure_exit(&e),
    }
}
