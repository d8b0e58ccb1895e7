//! Data sources other than a workbook on disk.

pub mod synthetic;

pub use synthetic::{SynthConfig, generate, linear_dataset};
