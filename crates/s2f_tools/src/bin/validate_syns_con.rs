//! Validate synapses per connection per pathway against biological reference data

use std::process::ExitCode;

use clap::Parser;
use s2f_core::StatisticKind;
use s2f_tools::{init_logging, run_validation, ValidateArgs};

#[derive(Parser)]
#[command(name = "validate-syns-con")]
#[command(about = "Compare circuit synapses per connection with biological reference data", long_about = None)]
struct Cli {
    #[command(flatten)]
    args: ValidateArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();
    run_validation(StatisticKind::SynsPerConnection, &cli.args)
}
