//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - loads the workbook and runs the analysis pipeline
//! - prints the report and renders figures
//! - writes optional exports

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{AnalyzeArgs, Command, SynthArgs};
use crate::data::{SynthConfig, generate};
use crate::domain::{AnalysisConfig, PlotMode};
use crate::error::AppError;
use crate::io::workbook::write_workbook;
use crate::plot::{AsciiSink, SvgSink, render_report};

pub mod pipeline;

/// Entry point for the `bvx` binary.
pub fn run() -> Result<(), AppError> {
    // `bvx` and `bvx --data DIR` behave like `bvx analyze ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    init_tracing(cli.verbose);

    match cli.command {
        Command::Analyze(args) => handle_analyze(&args),
        Command::Synth(args) => handle_synth(&args),
    }
}

/// Log to stderr; `RUST_LOG` wins over the `--verbose` default.
fn init_tracing(verbose: bool) {
    let default = if verbose { "bond_vix=debug" } else { "bond_vix=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // Ignore "already initialised" (tests, embedding).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_analyze(args: &AnalyzeArgs) -> Result<(), AppError> {
    let config = config_from_args(args);
    let run = pipeline::run(&config)?;

    if !config.quiet {
        println!("{}", crate::report::format_report(&run.report));
    }

    match config.plot {
        PlotMode::None => {}
        PlotMode::Ascii => {
            let mut sink = AsciiSink::stdout(config.plot_width, config.plot_height);
            render_report(&mut sink, &run.dataset, &run.report)?;
        }
        PlotMode::Svg => {
            let dir = config.plot_dir.clone().unwrap_or_else(|| "plots".into());
            let mut sink = SvgSink::new(&dir)?;
            render_report(&mut sink, &run.dataset, &run.report)?;
            info!(dir = %dir.display(), figures = sink.written().len(), "figures written");
        }
    }

    // Optional exports.
    if let Some(path) = &config.export_json {
        crate::io::export::write_report_json(path, &run.report)?;
        info!(path = %path.display(), "report exported");
    }
    if let Some(path) = &config.export_residuals {
        crate::io::export::write_residuals_csv(path, &run.report, &run.dataset.years)?;
        info!(path = %path.display(), "residuals exported");
    }

    Ok(())
}

fn handle_synth(args: &SynthArgs) -> Result<(), AppError> {
    let config = SynthConfig {
        years: args.years,
        start_year: args.start_year,
        seed: args.seed,
        include_composite: !args.no_composite,
    };
    let dataset = generate(&config)?;
    write_workbook(&args.out, &dataset)?;
    println!(
        "Wrote synthetic workbook to {} ({} years, {} ratings, seed {})",
        args.out.display(),
        dataset.n_years(),
        dataset.series.len(),
        config.seed
    );
    Ok(())
}

pub fn config_from_args(args: &AnalyzeArgs) -> AnalysisConfig {
    AnalysisConfig {
        data_dir: args.data.clone(),
        rating_set: args.rating_set,
        ratings: args.ratings.clone(),
        plot: args.plot,
        plot_dir: Some(args.plot_dir.clone()),
        plot_width: args.width,
        plot_height: args.height,
        export_json: args.export_json.clone(),
        export_residuals: args.export_residuals.clone(),
        quiet: args.quiet,
    }
}

/// Rewrite argv so `bvx` defaults to `bvx analyze`.
///
/// Rules:
/// - `bvx`                      -> `bvx analyze`
/// - `bvx --data DIR ...`       -> `bvx analyze --data DIR ...`
/// - `bvx --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("analyze".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "analyze" | "synth");
    if is_subcommand {
        return argv;
    }

    // A leading flag is an `analyze` flag.
    if arg1.starts_with('-') {
        argv.insert(1, "analyze".to_string());
        return argv;
    }

    argv
}
