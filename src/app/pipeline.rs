//! Shared analysis pipeline.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! workbook -> rating selection -> volatility AR -> per-rating regressions -> report
//!
//! Nothing here prints; the CLI decides what to do with the `Report`.

use std::path::Path;

use chrono::Utc;
use tracing::info;

use crate::analysis::{analyze_ratings, analyze_volatility};
use crate::domain::{AnalysisConfig, Dataset, Rating, RatingSet, Report};
use crate::error::AppError;
use crate::io::workbook::load_workbook;
use crate::report::summarize_dataset;

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub dataset: Dataset,
    pub report: Report,
}

/// Load the configured workbook and analyse the selected ratings.
pub fn run(config: &AnalysisConfig) -> Result<RunOutput, AppError> {
    let dataset = load_workbook(&config.data_dir)?;
    let ratings = resolve_ratings(&dataset, config.rating_set, config.ratings.as_deref())?;
    let report = run_with_dataset(&dataset, &ratings)?;
    Ok(RunOutput { dataset, report })
}

/// Analyse every rating column of the workbook at `path`.
pub fn run_path(path: &Path) -> Result<Report, AppError> {
    let config = AnalysisConfig {
        data_dir: path.to_path_buf(),
        ..AnalysisConfig::default()
    };
    Ok(run(&config)?.report)
}

/// Execute the analysis on an already-loaded dataset.
pub fn run_with_dataset(dataset: &Dataset, ratings: &[Rating]) -> Result<Report, AppError> {
    if ratings.is_empty() {
        return Err(AppError::data("No ratings selected for analysis."));
    }

    info!(years = dataset.n_years(), ratings = ratings.len(), "running analysis");

    // 1) Volatility autoregression; its residuals Z feed every rating.
    let volatility = analyze_volatility(dataset)?;

    // 2) Per-rating regressions (parallel, collected in rating order).
    let ratings_out = analyze_ratings(dataset, ratings, &volatility.residuals)?;

    info!("analysis complete");

    Ok(Report {
        generated_at: Utc::now(),
        dataset: summarize_dataset(dataset, ratings),
        volatility,
        ratings: ratings_out,
    })
}

/// Pick the ratings to analyse.
///
/// An explicit list wins and must name columns present in the dataset;
/// otherwise the rating set filters the dataset's columns in header order.
pub fn resolve_ratings(
    dataset: &Dataset,
    rating_set: RatingSet,
    explicit: Option<&[Rating]>,
) -> Result<Vec<Rating>, AppError> {
    let available = dataset.ratings();

    let selected: Vec<Rating> = match explicit {
        Some(list) => {
            if let Some(missing) = list.iter().find(|r| !available.contains(r)) {
                return Err(AppError::data(format!("Rating {missing} is not present in the dataset.")));
            }
            let mut out = Vec::with_capacity(list.len());
            for &r in list {
                if !out.contains(&r) {
                    out.push(r);
                }
            }
            out
        }
        None => available
            .into_iter()
            .filter(|r| rating_set == RatingSet::All || !r.is_composite())
            .collect(),
    };

    if selected.is_empty() {
        return Err(AppError::data("No ratings selected for analysis."));
    }
    Ok(selected)
}
