//! The regression analyses and their residual diagnostics.
//!
//! - `diagnostics`: stdev, shape, ACF sums, and normality tests of a residual series
//! - `volatility`: the log-VIX autoregression and its residuals `Z`
//! - `rating`: the four rate/return specifications for one rating

pub mod diagnostics;
pub mod rating;
pub mod volatility;

pub use diagnostics::*;
pub use rating::*;
pub use volatility::*;
