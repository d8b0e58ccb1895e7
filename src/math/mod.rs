//! Numerical building blocks: least squares, moments, autocorrelation, and
//! normality tests.

pub mod acf;
pub mod linregress;
pub mod moments;
pub mod normality;
pub mod ols;

pub use acf::*;
pub use linregress::*;
pub use moments::*;
pub use normality::*;
pub use ols::*;
