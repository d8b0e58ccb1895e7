//! `bond-vix` library crate.
//!
//! The binary (`bvx`) is a thin wrapper around this library so that:
//!
//! - the analysis is testable without spawning processes
//! - `app::pipeline::run_path` can be called from other Rust code with no
//!   side effects beyond reading the workbook
//! - code stays easy to navigate as the project grows

pub mod analysis;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod plot;
pub mod report;
