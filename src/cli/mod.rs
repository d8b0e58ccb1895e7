//! Command-line parsing for the bond rate / VIX analysis.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the statistics code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{PlotMode, Rating, RatingSet};
use crate::io::workbook::DEFAULT_DATASET;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "bvx",
    version,
    about = "Corporate bond rates, returns and VIX: regressions and residual diagnostics"
)]
pub struct Cli {
    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the regressions and diagnostics on a workbook and print the report.
    Analyze(AnalyzeArgs),
    /// Write a seeded synthetic workbook.
    Synth(SynthArgs),
}

#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    /// Workbook directory holding rates.csv, wealth.csv and common.csv.
    #[arg(short, long, value_name = "DIR", default_value = DEFAULT_DATASET)]
    pub data: PathBuf,

    /// Which rating columns to analyse.
    #[arg(long, value_enum, default_value_t = RatingSet::All)]
    pub rating_set: RatingSet,

    /// Explicit comma-separated rating list (overrides --rating-set).
    #[arg(short, long, value_enum, value_delimiter = ',')]
    pub ratings: Option<Vec<Rating>>,

    /// Where the diagnostic figures go.
    #[arg(long, value_enum, default_value_t = PlotMode::None)]
    pub plot: PlotMode,

    /// Output directory for `--plot svg`.
    #[arg(long, value_name = "DIR", default_value = "plots")]
    pub plot_dir: PathBuf,

    /// ASCII plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// ASCII plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Write the full report as JSON.
    #[arg(long, value_name = "PATH")]
    pub export_json: Option<PathBuf>,

    /// Write every residual series as CSV.
    #[arg(long, value_name = "PATH")]
    pub export_residuals: Option<PathBuf>,

    /// Do not print the text report.
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Args, Clone)]
pub struct SynthArgs {
    /// Output workbook directory.
    #[arg(short, long, value_name = "DIR")]
    pub out: PathBuf,

    /// Number of annual observations.
    #[arg(long, default_value_t = 27)]
    pub years: usize,

    /// First year of the index.
    #[arg(long, default_value_t = 1996)]
    pub start_year: i32,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Leave out the `Corporate` composite column.
    #[arg(long)]
    pub no_composite: bool,
}
