//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - rating buckets and run configuration (`Rating`, `RatingSet`, `AnalysisConfig`)
//! - the loaded dataset (`Dataset`, `RatingSeries`)
//! - fit and diagnostics outputs (`SimpleFit`, `OlsFit`, `Diagnostics`, `Report`, etc.)

pub mod types;

pub use types::*;
