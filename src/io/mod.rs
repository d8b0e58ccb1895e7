//! Input/output helpers.
//!
//! - workbook loading + validation (`workbook`)
//! - report and residual exports (JSON/CSV) (`export`)

pub mod export;
pub mod workbook;

pub use export::*;
pub use workbook::*;
