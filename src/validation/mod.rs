//! Statistical tests: stationarity of the input and residual diagnostics.
//!
//! # Example
//!
//! ```
//! use stock_forecast::validation::{adf_test, ljung_box};
//!
//! let series: Vec<f64> = (0..120).map(|i| ((i * 37 + 11) % 101) as f64).collect();
//! let adf = adf_test(&series, None).unwrap();
//! println!("ADF statistic {:.3}, p-value {:.4}", adf.statistic, adf.p_value);
//!
//! let lb = ljung_box(&series, Some(1), 0);
//! assert!(lb.statistic >= 0.0);
//! ```

pub mod stationarity;

pub use residual_tests::{jarque_bera, ljung_box, JarqueBeraResult, LjungBoxResult};
pub use stationarity::{
    adf_test, is_stationary, mackinnon_critical_values, mackinnon_p_value, rejects_unit_root,
    AdfResult, CriticalValues, STATIONARITY_SIGNIFICANCE,
};
