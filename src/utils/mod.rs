//! Numerical helpers shared by the statistical tests and the model.

pub mod ols;
pub mod optimization;
pub mod stats;

pub use ols::{invert_symmetric, ols_fit, OLSResult};
pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use stats::{normal_cdf, quantile_normal};
