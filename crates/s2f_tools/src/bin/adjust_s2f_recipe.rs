//! Adjust an s2f connection recipe from validation results
//!
//! Validation CSV → fitted scale factor → rescaled recipe attribute

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use s2f_core::{AdjustRequest, AdjustmentReport, CalibrationConfig};
use s2f_tools::{failure_exit, init_logging, save_report};

#[derive(Parser)]
#[command(name = "adjust-s2f-recipe")]
#[command(about = "Rescale s2f recipe parameters using validation results", long_about = None)]
struct Cli {
    /// Input recipe XML
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Output recipe XML (default: <input stem>_adjusted<ext>)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Bouton density validation CSV
    #[arg(short = 'b', long = "bouton-density")]
    bouton_density: Option<PathBuf>,

    /// Synapses per connection validation CSV
    #[arg(short = 's', long = "syns-con")]
    syns_con: Option<PathBuf>,

    /// Calibration config (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output report JSON file
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let config = match CalibrationConfig::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => return failure_exit(&e.into()),
    };

    let request = AdjustRequest {
        input: &cli.input,
        output: cli.output.as_deref(),
        bouton_table: cli.bouton_density.as_deref(),
        syns_table: cli.syns_con.as_deref(),
    };

    let report = match s2f_core::adjust(&request, &config) {
        Ok(report) => report,
        Err(e) => return failure_exit(&e),
    };

    print_report(&report);

    if let Some(path) = &cli.report {
        if let Err(e) = save_report(path, &report) {
            tracing::error!("{:#}", e);
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}

fn print_report(report: &AdjustmentReport) {
    for applied in &report.adjustments {
        let fit = &applied.fit;
        println!("{} ({})", applied.attribute, applied.source_table.display());
        println!("   Scale factor:  {}", fit.scale.value());
        println!("   Records:       {}", fit.records);
        println!("   Residual SS:   {:.6e}", fit.residual_sum_squares);
        if let Some(r2) = fit.r_squared {
            println!("   R²:            {:.4}", r2);
        }
        if let Some(se) = fit.std_error {
            println!("   Std. error:    {:.6e}", se);
        }
        println!("   Nodes updated: {}", applied.nodes_updated);
    }
    println!("Recipe written to {}", report.output.display());
}
