//! Export the report to JSON and the residual series to CSV.
//!
//! Both are meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::domain::{ModelReport, Report};
use crate::error::AppError;

/// Write the full structured report as pretty JSON.
///
/// Non-finite floats (degenerate fits) are written as `null`.
pub fn write_report_json(path: &Path, report: &Report) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create report JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, report)
        .map_err(|e| AppError::input(format!("Failed to write report JSON: {e}")))?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct ResidualRow<'a> {
    rating: &'a str,
    model: &'a str,
    t: usize,
    year: Option<i32>,
    residual: f64,
}

/// Write one row per `(rating, model, t)` residual.
///
/// `years` is the dataset's time index; residual `t` belongs to `years[t + 1]`.
/// The volatility residuals are written with rating `VIX`.
pub fn write_residuals_csv(path: &Path, report: &Report, years: &[i32]) -> Result<(), AppError> {
    let err = |e: csv::Error| AppError::input(format!("Failed to write residuals CSV '{}': {e}", path.display()));
    let mut writer = csv::Writer::from_path(path).map_err(err)?;

    let mut blocks: Vec<(&str, &ModelReport)> = vec![("VIX", &report.volatility)];
    for rating in &report.ratings {
        for model in rating.models() {
            blocks.push((rating.rating.display_name(), model));
        }
    }

    for (rating, model) in blocks {
        for (t, &residual) in model.residuals.iter().enumerate() {
            writer
                .serialize(ResidualRow {
                    rating,
                    model: model.kind.slug(),
                    t,
                    year: years.get(t + 1).copied(),
                    residual,
                })
                .map_err(err)?;
        }
    }

    writer
        .flush()
        .map_err(|e| AppError::input(format!("Failed to write residuals CSV '{}': {e}", path.display())))
}
