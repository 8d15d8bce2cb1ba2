//! Command-line arguments for the `storage-sizer` binary.

use std::path::PathBuf;

use clap::Parser;

/// Sizes a behind-the-meter battery for a scenario and prints the decision.
///
/// If neither `--scenario` nor `--preset` is given, the baseline preset is used.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Load the scenario from a TOML file.
    #[clap(long, conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Use a built-in preset (baseline, demand_only, flat_rate).
    #[clap(long)]
    pub preset: Option<String>,

    /// Override the scenario's random seed.
    #[clap(long)]
    pub seed: Option<u64>,

    /// Write the decision pack as JSON to this path.
    #[clap(long = "pack-out")]
    pub pack_out: Option<PathBuf>,

    /// Write the selected candidate's dispatch trace as CSV.
    #[clap(long = "dispatch-out")]
    pub dispatch_out: Option<PathBuf>,

    /// Write every ranked candidate as CSV.
    #[clap(long = "candidates-out")]
    pub candidates_out: Option<PathBuf>,

    /// Print the decision pack as JSON instead of the summary.
    #[clap(long)]
    pub json: bool,
}
