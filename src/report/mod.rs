//! Reporting utilities: dataset summary and formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::{Dataset, DatasetSummary, Rating};
use crate::math::mean;

/// Summarise the dataset and the ratings selected for analysis.
pub fn summarize_dataset(dataset: &Dataset, ratings: &[Rating]) -> DatasetSummary {
    DatasetSummary {
        first_year: dataset.years.first().copied().unwrap_or_default(),
        last_year: dataset.years.last().copied().unwrap_or_default(),
        n_years: dataset.n_years(),
        ratings: ratings.to_vec(),
        vix_mean: mean(&dataset.vix),
        trate_mean: mean(&dataset.trate),
    }
}
