//! Seasonal ARIMA: SARIMA(p, d, q)(P, D, Q)s.
//!
//! This module provides:
//! - [`SARIMASpec`] and the dashboard-facing [`ModelParameters`]
//! - the [`SARIMA`] model with its diagnostic [`ModelSummary`]
//! - [`forecast`] for date-indexed out-of-sample predictions

mod diff;
mod model;
mod order;
mod summary;

pub use diff::{difference, differencing_polynomial, integrate, polymul, seasonal_difference};
pub use model::{forecast, SARIMA};
pub use order::{ModelParameters, SARIMASpec, MAX_ORDER, MAX_SEASONAL_PERIOD};
pub use summary::{CoefficientRow, ModelSummary};
