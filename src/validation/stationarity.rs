//! Augmented Dickey-Fuller unit-root test.
//!
//! The regression includes a constant:
//!
//! ```text
//! Δy_t = α + β·y_{t-1} + Σ γ_i·Δy_{t-i} + ε_t
//! ```
//!
//! The null hypothesis is a unit root (β = 0, non-stationary). The number of
//! augmenting lags is chosen by AIC over a common estimation sample and the
//! p-value comes from MacKinnon's (1994) response surface.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::utils::ols::ols_fit;
use crate::utils::stats::normal_cdf;
use tracing::debug;

/// Significance level below which a series is reported as stationary.
pub const STATIONARITY_SIGNIFICANCE: f64 = 0.05;

/// Result of an augmented Dickey-Fuller test.
#[derive(Debug, Clone, PartialEq)]
pub struct AdfResult {
    /// t statistic of the lagged level coefficient.
    pub statistic: f64,
    /// MacKinnon approximate p-value.
    pub p_value: f64,
    /// Number of lagged differences in the final regression.
    pub used_lag: usize,
    /// Observations in the final regression.
    pub nobs: usize,
    /// Finite-sample critical values.
    pub critical_values: CriticalValues,
    /// Best AIC found during lag selection.
    pub ic_best: f64,
}

impl AdfResult {
    /// Whether the unit root is rejected at [`STATIONARITY_SIGNIFICANCE`].
    pub fn is_stationary(&self) -> bool {
        rejects_unit_root(self.p_value)
    }
}

/// Critical values of the test statistic.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CriticalValues {
    /// Critical value at 1% significance
    pub cv_1pct: f64,
    /// Critical value at 5% significance
    pub cv_5pct: f64,
    /// Critical value at 10% significance
    pub cv_10pct: f64,
}

/// Decision rule: strict `p < 0.05`.
pub fn rejects_unit_root(p_value: f64) -> bool {
    p_value < STATIONARITY_SIGNIFICANCE
}

/// Run the ADF test on a series and report whether it is stationary.
pub fn is_stationary(series: &TimeSeries) -> Result<bool> {
    adf_test(series.values(), None).map(|r| r.is_stationary())
}

/// Augmented Dickey-Fuller test with constant and AIC lag selection.
///
/// # Arguments
/// * `series` - Observations in time order
/// * `max_lags` - Largest lag considered (default `ceil(12·(n/100)^{1/4})`)
///
/// # Errors
/// [`ForecastError::Statistical`] when the series is too short, constant,
/// contains non-finite values or yields a singular regression. A regression
/// that fits exactly is not an error: its statistic is `-inf` and its
/// p-value 0.
pub fn adf_test(series: &[f64], max_lags: Option<usize>) -> Result<AdfResult> {
    let n = series.len();

    if series.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::Statistical(
            "series contains missing or infinite values".to_string(),
        ));
    }
    if n < 4 {
        return Err(ForecastError::Statistical(format!(
            "need at least 4 observations for the unit-root test, got {}",
            n
        )));
    }

    let (min, max) = series
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if max == min {
        return Err(ForecastError::Statistical("series is constant".to_string()));
    }

    let cap = n as i64 / 2 - 2;
    if cap < 0 {
        return Err(ForecastError::Statistical(
            "sample size is too short for the unit-root regression".to_string(),
        ));
    }
    let default_lags = (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as i64;
    let max_lag = max_lags.map(|l| l as i64).unwrap_or(default_lags).min(cap) as usize;

    let diff: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();

    let (best_lag, ic_best) = select_lag_aic(series, &diff, max_lag)?;

    let design = AdfDesign::new(series, &diff, best_lag);
    let mut columns = design.columns(best_lag);
    columns.push(vec![1.0; design.nobs]);
    let fit = ols_fit(&design.target, &columns).map_err(as_statistical)?;

    // An exact fit leaves no residual variance: the unit root is rejected
    // with certainty.
    let tss: f64 = design.target.iter().map(|v| v * v).sum();
    let se = fit.std_errors[0];
    let exact = fit.ssr <= f64::EPSILON * tss || (se.is_finite() && !se.is_normal());
    let statistic = if exact {
        f64::NEG_INFINITY
    } else {
        fit.params[0] / se
    };
    if statistic.is_nan() {
        return Err(ForecastError::Statistical(
            "test statistic is undefined for this series".to_string(),
        ));
    }

    let result = AdfResult {
        statistic,
        p_value: mackinnon_p_value(statistic),
        used_lag: best_lag,
        nobs: design.nobs,
        critical_values: mackinnon_critical_values(design.nobs),
        ic_best,
    };

    debug!(
        statistic = result.statistic,
        p_value = result.p_value,
        used_lag = result.used_lag,
        nobs = result.nobs,
        "augmented Dickey-Fuller test"
    );

    Ok(result)
}

/// Regression sample for a given number of lagged differences.
struct AdfDesign {
    /// Δy_t for the usable rows.
    target: Vec<f64>,
    /// y_{t-1} for the usable rows.
    level: Vec<f64>,
    /// lags[i][r] = Δy_{t-i-1} for row r.
    lags: Vec<Vec<f64>>,
    nobs: usize,
}

impl AdfDesign {
    fn new(series: &[f64], diff: &[f64], lags: usize) -> Self {
        let rows = lags..diff.len();
        AdfDesign {
            target: diff[rows.clone()].to_vec(),
            level: rows.clone().map(|t| series[t]).collect(),
            lags: (1..=lags)
                .map(|i| rows.clone().map(|t| diff[t - i]).collect())
                .collect(),
            nobs: rows.len(),
        }
    }

    /// Level column followed by the first `k` lagged differences.
    fn columns(&self, k: usize) -> Vec<Vec<f64>> {
        let mut columns = Vec::with_capacity(k + 2);
        columns.push(self.level.clone());
        columns.extend(self.lags.iter().take(k).cloned());
        columns
    }
}

/// Choose the number of lagged differences minimising AIC on a common sample.
fn select_lag_aic(series: &[f64], diff: &[f64], max_lag: usize) -> Result<(usize, f64)> {
    let design = AdfDesign::new(series, diff, max_lag);
    let mut best: Option<(usize, f64)> = None;

    for lag in 0..=max_lag {
        let mut columns = vec![vec![1.0; design.nobs]];
        columns.extend(design.columns(lag));

        let aic = match ols_fit(&design.target, &columns) {
            Ok(fit) => fit.aic(),
            Err(_) => continue,
        };
        if aic.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, b)| aic < b) {
            best = Some((lag, aic));
        }
    }

    best.ok_or_else(|| {
        ForecastError::Statistical("unit-root regression is singular for every lag".to_string())
    })
}

fn as_statistical(err: ForecastError) -> ForecastError {
    match err {
        ForecastError::Statistical(_) => err,
        other => ForecastError::Statistical(other.to_string()),
    }
}

// MacKinnon (1994) response surface, constant only, one variable.
const TAU_MAX: f64 = 2.74;
const TAU_MIN: f64 = -18.83;
const TAU_STAR: f64 = -1.61;
const TAU_SMALL_P: [f64; 3] = [2.1659, 1.4412, 0.038269];
const TAU_LARGE_P: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

// MacKinnon (2010) finite-sample critical values, constant only, one variable.
const CRIT_1PCT: [f64; 4] = [-3.43035, -6.5393, -16.786, -79.433];
const CRIT_5PCT: [f64; 4] = [-2.86154, -2.8903, -4.234, -40.040];
const CRIT_10PCT: [f64; 4] = [-2.56677, -1.5384, -2.809, 0.0];

/// Approximate p-value of an ADF statistic (regression with constant).
pub fn mackinnon_p_value(statistic: f64) -> f64 {
    if statistic.is_nan() {
        return f64::NAN;
    }
    if statistic > TAU_MAX {
        return 1.0;
    }
    if statistic < TAU_MIN {
        return 0.0;
    }
    let z = if statistic <= TAU_STAR {
        polynomial(&TAU_SMALL_P, statistic)
    } else {
        polynomial(&TAU_LARGE_P, statistic)
    };
    normal_cdf(z)
}

/// Critical values for a regression with `nobs` observations.
pub fn mackinnon_critical_values(nobs: usize) -> CriticalValues {
    let inv = 1.0 / nobs.max(1) as f64;
    CriticalValues {
        cv_1pct: polynomial(&CRIT_1PCT, inv),
        cv_5pct: polynomial(&CRIT_5PCT, inv),
        cv_10pct: polynomial(&CRIT_10PCT, inv),
    }
}

/// Evaluate `c[0] + c[1]·x + c[2]·x² + ...`.
fn polynomial(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    /// Deterministic uniform noise in [-1, 1).
    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut state = seed;
        (0..n)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                ((state >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
            })
            .collect()
    }

    // ==================== adf_test ====================

    #[test]
    fn adf_mean_reverting_series_is_stationary() {
        let e = noise(300, 7);
        let mut series = vec![0.0; 300];
        for t in 1..300 {
            series[t] = 0.3 * series[t - 1] + e[t];
        }

        let result = adf_test(&series, None).unwrap();

        assert!(result.statistic < result.critical_values.cv_1pct);
        assert!(result.p_value < 0.01);
        assert!(result.is_stationary());
    }

    #[test]
    fn adf_accelerating_trend_is_not_stationary() {
        let e = noise(200, 11);
        let series: Vec<f64> = (0..200)
            .map(|i| 100.0 + 0.02 * (i * i) as f64 + 0.1 * e[i])
            .collect();

        let result = adf_test(&series, Some(0)).unwrap();

        assert_eq!(result.used_lag, 0);
        assert!(result.statistic > 0.0);
        assert!(result.p_value >= STATIONARITY_SIGNIFICANCE);
        assert!(!result.is_stationary());
    }

    #[test]
    fn adf_respects_explicit_lag_cap() {
        let e = noise(120, 3);
        let result = adf_test(&e, Some(2)).unwrap();
        assert!(result.used_lag <= 2);
        assert_eq!(result.nobs, 119 - result.used_lag);
    }

    #[test]
    fn adf_default_lag_bound() {
        let e = noise(100, 5);
        let result = adf_test(&e, None).unwrap();
        // ceil(12 * 1^(1/4)) = 12
        assert!(result.used_lag <= 12);
    }

    #[test]
    fn adf_constant_series_is_an_error() {
        let series = vec![5.0; 50];
        assert!(matches!(
            adf_test(&series, None),
            Err(ForecastError::Statistical(_))
        ));
    }

    #[test]
    fn adf_short_series_is_an_error() {
        assert!(matches!(
            adf_test(&[1.0, 2.0, 3.0], None),
            Err(ForecastError::Statistical(_))
        ));
        assert!(matches!(
            adf_test(&[], None),
            Err(ForecastError::Statistical(_))
        ));
    }

    #[test]
    fn adf_missing_values_are_an_error() {
        let mut series = noise(50, 1);
        series[10] = f64::NAN;
        assert!(matches!(
            adf_test(&series, None),
            Err(ForecastError::Statistical(_))
        ));
    }

    #[test]
    fn adf_exact_fit_rejects_unit_root() {
        let series: Vec<f64> = (0..60).map(|i| 2.0 * i as f64).collect();
        let result = adf_test(&series, None).unwrap();
        assert_eq!(result.statistic, f64::NEG_INFINITY);
        assert_eq!(result.p_value, 0.0);
        assert!(result.is_stationary());
    }

    #[test]
    fn adf_noise_free_seasonal_trend_is_stationary() {
        let series: Vec<f64> = (0..365)
            .map(|i| 100.0 + 0.2 * i as f64 + 5.0 * (2.0 * PI * i as f64 / 12.0).sin())
            .collect();
        let result = adf_test(&series, None).unwrap();
        assert!(!result.statistic.is_nan());
        assert!(result.p_value.is_finite());
        assert!(result.is_stationary());
    }

    // ==================== decision rule ====================

    #[test]
    fn decision_uses_strict_inequality() {
        assert!(rejects_unit_root(0.0499));
        assert!(!rejects_unit_root(0.05));
        assert!(!rejects_unit_root(0.5));
        assert!(!rejects_unit_root(f64::NAN));
    }

    // ==================== MacKinnon tables ====================

    #[test]
    fn p_value_matches_asymptotic_critical_value() {
        assert_relative_eq!(mackinnon_p_value(-2.86), 0.05, epsilon = 0.003);
        assert_relative_eq!(mackinnon_p_value(-3.43), 0.01, epsilon = 0.003);
    }

    #[test]
    fn p_value_is_clamped_outside_surface() {
        assert_eq!(mackinnon_p_value(3.0), 1.0);
        assert_eq!(mackinnon_p_value(-25.0), 0.0);
        assert!(mackinnon_p_value(f64::NAN).is_nan());
    }

    #[test]
    fn p_value_is_monotone_and_continuous() {
        let mut previous = 0.0;
        let mut t = -18.0;
        while t < 2.7 {
            let p = mackinnon_p_value(t);
            assert!(p >= previous, "p-value decreased at t = {}", t);
            previous = p;
            t += 0.05;
        }
        let left = mackinnon_p_value(TAU_STAR);
        let right = mackinnon_p_value(TAU_STAR + 1e-9);
        assert_relative_eq!(left, right, epsilon = 1e-3);
    }

    #[test]
    fn critical_values_are_ordered_and_converge() {
        let cv = mackinnon_critical_values(100_000);
        assert_relative_eq!(cv.cv_1pct, -3.43, epsilon = 0.01);
        assert_relative_eq!(cv.cv_5pct, -2.86, epsilon = 0.01);
        assert_relative_eq!(cv.cv_10pct, -2.57, epsilon = 0.01);

        let small = mackinnon_critical_values(50);
        assert!(small.cv_1pct < small.cv_5pct);
        assert!(small.cv_5pct < small.cv_10pct);
        assert!(small.cv_1pct < cv.cv_1pct);
    }
}
