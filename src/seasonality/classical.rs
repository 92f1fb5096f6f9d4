//! Classical additive decomposition with a centred moving-average trend.
//!
//! `y = trend + seasonal + residual`, where
//! - trend is a centred moving average over one period (a 2×period filter
//!   with half weights at both ends when the period is even),
//! - seasonal is the per-position mean of the detrended series, re-centred so
//!   that one cycle sums to zero,
//! - residual is what remains.
//!
//! The trend is undefined for the first and last `period / 2` observations;
//! those positions are NaN in both trend and residual.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::utils::stats::{nan_mean, variance};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Default seasonal period.
pub const DEFAULT_PERIOD: usize = 12;

/// Result of a classical decomposition.
#[derive(Debug, Clone, PartialEq)]
pub struct DecompositionResult {
    timestamps: Vec<DateTime<Utc>>,
    period: usize,
    trend: Vec<f64>,
    seasonal: Vec<f64>,
    residual: Vec<f64>,
    seasonal_figure: Vec<f64>,
}

impl DecompositionResult {
    /// Timestamps of the decomposed series (empty when built from raw values).
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Trend component; NaN where the moving average is undefined.
    pub fn trend(&self) -> &[f64] {
        &self.trend
    }

    pub fn seasonal(&self) -> &[f64] {
        &self.seasonal
    }

    /// Residual component; NaN where the trend is undefined.
    pub fn residual(&self) -> &[f64] {
        &self.residual
    }

    /// One cycle of seasonal effects, indexed by position within the period.
    pub fn seasonal_figure(&self) -> &[f64] {
        &self.seasonal_figure
    }

    pub fn len(&self) -> usize {
        self.trend.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trend.is_empty()
    }

    /// Seasonal strength `max(0, 1 − Var(R) / Var(S + R))` over defined positions.
    pub fn seasonal_strength(&self) -> f64 {
        strength(&self.seasonal, &self.residual)
    }

    /// Trend strength `max(0, 1 − Var(R) / Var(T + R))` over defined positions.
    pub fn trend_strength(&self) -> f64 {
        strength(&self.trend, &self.residual)
    }

    fn with_timestamps(mut self, timestamps: Vec<DateTime<Utc>>) -> Self {
        self.timestamps = timestamps;
        self
    }
}

fn strength(component: &[f64], residual: &[f64]) -> f64 {
    let (combined, remainder): (Vec<f64>, Vec<f64>) = component
        .iter()
        .zip(residual.iter())
        .filter(|(c, r)| c.is_finite() && r.is_finite())
        .map(|(c, r)| (c + r, *r))
        .unzip();

    let var_combined = variance(&combined);
    if var_combined.is_nan() || var_combined < 1e-10 {
        return 0.0;
    }
    (1.0 - variance(&remainder) / var_combined).max(0.0)
}

/// Classical decomposition configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassicalDecomposition {
    period: usize,
}

impl Default for ClassicalDecomposition {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD)
    }
}

impl ClassicalDecomposition {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Decompose a series, keeping its timestamps on the result.
    pub fn decompose(&self, series: &TimeSeries) -> Result<DecompositionResult> {
        let result = seasonal_decompose(series.values(), self.period)?;
        Ok(result.with_timestamps(series.timestamps().to_vec()))
    }
}

/// Decompose raw values with the given period.
///
/// # Errors
/// - [`ForecastError::InvalidParameter`] if `period < 2`
/// - [`ForecastError::InsufficientData`] if `values.len() < 2 * period`
/// - [`ForecastError::MissingValues`] if any value is NaN or infinite
pub fn seasonal_decompose(values: &[f64], period: usize) -> Result<DecompositionResult> {
    if period < 2 {
        return Err(ForecastError::InvalidParameter(format!(
            "decomposition period must be at least 2, got {}",
            period
        )));
    }
    let n = values.len();
    if n < 2 * period {
        return Err(ForecastError::InsufficientData {
            needed: 2 * period,
            got: n,
        });
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::MissingValues);
    }

    let trend = centred_moving_average(values, period);
    let detrended: Vec<f64> = values.iter().zip(&trend).map(|(x, t)| x - t).collect();

    let mut seasonal_figure: Vec<f64> = (0..period)
        .map(|position| {
            let column: Vec<f64> = detrended
                .iter()
                .skip(position)
                .step_by(period)
                .copied()
                .collect();
            nan_mean(&column)
        })
        .collect();
    let level = nan_mean(&seasonal_figure);
    seasonal_figure.iter_mut().for_each(|s| *s -= level);

    let seasonal: Vec<f64> = (0..n).map(|i| seasonal_figure[i % period]).collect();
    let residual: Vec<f64> = values
        .iter()
        .zip(&trend)
        .zip(&seasonal)
        .map(|((x, t), s)| x - t - s)
        .collect();

    debug!(period, observations = n, "classical decomposition");

    Ok(DecompositionResult {
        timestamps: Vec::new(),
        period,
        trend,
        seasonal,
        residual,
        seasonal_figure,
    })
}

/// Centred moving average; NaN where the window does not fit.
fn centred_moving_average(values: &[f64], period: usize) -> Vec<f64> {
    let weights: Vec<f64> = if period % 2 == 0 {
        let mut w = vec![1.0 / period as f64; period + 1];
        w[0] = 0.5 / period as f64;
        w[period] = 0.5 / period as f64;
        w
    } else {
        vec![1.0 / period as f64; period]
    };

    let half = weights.len() / 2;
    let n = values.len();
    let mut trend = vec![f64::NAN; n];
    for (i, slot) in trend.iter_mut().enumerate().take(n - half).skip(half) {
        *slot = values[i - half..=i + half]
            .iter()
            .zip(&weights)
            .map(|(v, w)| v * w)
            .sum();
    }
    trend
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use std::f64::consts::PI;

    fn seasonal_series(n: usize, period: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let trend = 50.0 + 0.5 * i as f64;
                let seasonal = 3.0 * (2.0 * PI * i as f64 / period as f64).sin();
                trend + seasonal
            })
            .collect()
    }

    #[test]
    fn decomposition_recovers_linear_trend_and_sine() {
        let period = 12;
        let values = seasonal_series(72, period);

        let result = seasonal_decompose(&values, period).unwrap();

        for i in 6..66 {
            assert_relative_eq!(result.trend()[i], 50.0 + 0.5 * i as f64, epsilon = 1e-9);
            assert_relative_eq!(result.residual()[i], 0.0, epsilon = 1e-9);
        }
        for (i, s) in result.seasonal().iter().enumerate() {
            let expected = 3.0 * (2.0 * PI * i as f64 / period as f64).sin();
            assert_relative_eq!(*s, expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn decomposition_additive_identity() {
        let values: Vec<f64> = (0..40)
            .map(|i| 10.0 + ((i * 7 + 3) % 11) as f64 + (i % 4) as f64)
            .collect();

        let result = seasonal_decompose(&values, 4).unwrap();

        for i in 0..values.len() {
            let (t, s, r) = (result.trend()[i], result.seasonal()[i], result.residual()[i]);
            if t.is_finite() {
                assert_relative_eq!(t + s + r, values[i], epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn decomposition_edges_are_undefined() {
        let result = seasonal_decompose(&seasonal_series(48, 12), 12).unwrap();
        let undefined: Vec<usize> = result
            .trend()
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_nan())
            .map(|(i, _)| i)
            .collect();
        let expected: Vec<usize> = (0..6).chain(42..48).collect();
        assert_eq!(undefined, expected);
        assert!(result.residual()[0].is_nan());
        assert!(result.seasonal().iter().all(|s| s.is_finite()));

        // odd period: (period - 1) / 2 on each side
        let result = seasonal_decompose(&seasonal_series(21, 7), 7).unwrap();
        assert_eq!(result.trend().iter().filter(|t| t.is_nan()).count(), 6);
        assert!(result.trend()[3].is_finite());
        assert!(result.trend()[2].is_nan());
    }

    #[test]
    fn decomposition_odd_period_moving_average() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let result = seasonal_decompose(&values, 3).unwrap();
        assert!(result.trend()[0].is_nan());
        assert_relative_eq!(result.trend()[1], 2.0, epsilon = 1e-12);
        assert_relative_eq!(result.trend()[5], 6.0, epsilon = 1e-12);
        assert!(result.trend()[6].is_nan());
    }

    #[test]
    fn seasonal_figure_sums_to_zero() {
        let values: Vec<f64> = (0..36).map(|i| ((i * 5) % 9) as f64 + 0.2 * i as f64).collect();
        let result = seasonal_decompose(&values, 6).unwrap();

        assert_eq!(result.seasonal_figure().len(), 6);
        let total: f64 = result.seasonal_figure().iter().sum();
        assert_relative_eq!(total, 0.0, epsilon = 1e-10);
        for (i, s) in result.seasonal().iter().enumerate() {
            assert_eq!(*s, result.seasonal_figure()[i % 6]);
        }
    }

    #[test]
    fn decomposition_exactly_two_periods() {
        let result = seasonal_decompose(&seasonal_series(24, 12), 12).unwrap();
        assert_eq!(result.len(), 24);
        assert!(result.seasonal_figure().iter().all(|s| s.is_finite()));
    }

    #[test]
    fn decomposition_rejects_short_series() {
        let values = seasonal_series(23, 12);
        assert!(matches!(
            seasonal_decompose(&values, 12),
            Err(ForecastError::InsufficientData { needed: 24, got: 23 })
        ));
    }

    #[test]
    fn decomposition_rejects_small_period() {
        assert!(matches!(
            seasonal_decompose(&[1.0, 2.0, 3.0, 4.0], 1),
            Err(ForecastError::InvalidParameter(_))
        ));
        assert!(matches!(
            seasonal_decompose(&[1.0, 2.0, 3.0, 4.0], 0),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn decomposition_rejects_missing_values() {
        let mut values = seasonal_series(48, 12);
        values[20] = f64::NAN;
        assert!(matches!(
            seasonal_decompose(&values, 12),
            Err(ForecastError::MissingValues)
        ));
    }

    #[test]
    fn strength_measures() {
        let result = seasonal_decompose(&seasonal_series(120, 12), 12).unwrap();
        assert!(result.trend_strength() > 0.99);
        assert!(result.seasonal_strength() > 0.99);

        let flat: Vec<f64> = (0..48).map(|i| 5.0 + ((i * 7) % 5) as f64 * 0.01).collect();
        let result = seasonal_decompose(&flat, 12).unwrap();
        assert!((0.0..=1.0).contains(&result.trend_strength()));
        assert!((0.0..=1.0).contains(&result.seasonal_strength()));
    }

    #[test]
    fn decomposer_keeps_timestamps() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let dates: Vec<NaiveDate> = (0..36)
            .map(|i| start + chrono::Duration::days(i))
            .collect();
        let series = TimeSeries::from_dates(&dates, seasonal_series(36, 12)).unwrap();

        let result = ClassicalDecomposition::default().decompose(&series).unwrap();

        assert_eq!(result.period(), 12);
        assert_eq!(result.timestamps(), series.timestamps());
        assert_eq!(result.len(), 36);
    }
}
