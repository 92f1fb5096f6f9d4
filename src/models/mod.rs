//! Forecasting models.

mod traits;

pub mod sarima;

pub use sarima::{forecast, ModelParameters, ModelSummary, SARIMASpec, SARIMA};
pub use traits::Forecaster;
