//! Seasonal ARIMA model fitted by conditional sum of squares.

use crate::core::{Forecast, ForecastResult, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::sarima::diff::{
    difference, differencing_polynomial, integrate, polymul, seasonal_difference,
};
use crate::models::sarima::order::SARIMASpec;
use crate::models::sarima::summary::{CoefficientRow, ModelSummary};
use crate::models::Forecaster;
use crate::utils::ols::invert_symmetric;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::quantile_normal;
use crate::validation::{jarque_bera, ljung_box};
use chrono::{DateTime, NaiveDate, Utc};
use std::f64::consts::PI;
use tracing::{debug, warn};

/// Box bound applied to every ARMA coefficient during estimation.
const COEFFICIENT_BOUND: f64 = 0.99;
/// Relative step for the numerical Hessian.
const HESSIAN_STEP: f64 = 1e-4;

/// State produced by a successful fit.
#[derive(Debug, Clone)]
struct FitState {
    original: Vec<f64>,
    differenced: Vec<f64>,
    /// Innovations on the differenced scale; zero for the conditioning values.
    innovations: Vec<f64>,
    /// One-step fitted values on the original scale (NaN where undefined).
    fitted: Vec<f64>,
    /// Residuals on the original scale (NaN where undefined).
    residuals: Vec<f64>,
    sigma2: f64,
    log_likelihood: f64,
    aic: f64,
    bic: f64,
    hqic: f64,
    /// Standard errors of the ARMA coefficients then sigma2.
    std_errors: Vec<f64>,
    iterations: usize,
    label: Option<String>,
    first_timestamp: Option<DateTime<Utc>>,
    last_timestamp: Option<DateTime<Utc>>,
}

/// SARIMA(p, d, q)(P, D, Q)s forecasting model.
///
/// The differenced series `w_t = (1 − B)^d (1 − B^s)^D y_t` follows a
/// zero-mean multiplicative ARMA:
///
/// ```text
/// φ(B)·Φ(B^s)·w_t = θ(B)·Θ(B^s)·ε_t
/// ```
///
/// Coefficients maximise the Gaussian likelihood conditional on the first
/// `p + P·s` differenced values with pre-sample innovations set to zero.
#[derive(Debug, Clone)]
pub struct SARIMA {
    spec: SARIMASpec,
    ar_coefficients: Vec<f64>,
    ma_coefficients: Vec<f64>,
    seasonal_ar_coefficients: Vec<f64>,
    seasonal_ma_coefficients: Vec<f64>,
    state: Option<FitState>,
}

impl SARIMA {
    /// Create an unfitted model.
    pub fn new(spec: SARIMASpec) -> Self {
        Self {
            spec,
            ar_coefficients: vec![],
            ma_coefficients: vec![],
            seasonal_ar_coefficients: vec![],
            seasonal_ma_coefficients: vec![],
            state: None,
        }
    }

    /// Get the model specification.
    pub fn spec(&self) -> SARIMASpec {
        self.spec
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    pub fn seasonal_ar_coefficients(&self) -> &[f64] {
        &self.seasonal_ar_coefficients
    }

    pub fn seasonal_ma_coefficients(&self) -> &[f64] {
        &self.seasonal_ma_coefficients
    }

    /// Innovation variance.
    pub fn sigma2(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.sigma2)
    }

    pub fn log_likelihood(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.log_likelihood)
    }

    pub fn aic(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.aic)
    }

    pub fn bic(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.bic)
    }

    pub fn hqic(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.hqic)
    }

    /// Length of the fitted series.
    pub fn nobs(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.original.len())
    }

    /// Optimiser iterations used by the last fit.
    pub fn iterations(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.iterations)
    }

    /// Estimated parameters in estimation order: ar, ma, seasonal ar,
    /// seasonal ma, sigma2.
    pub fn params(&self) -> Option<Vec<f64>> {
        let state = self.state.as_ref()?;
        let mut params = self.arma_params();
        params.push(state.sigma2);
        Some(params)
    }

    fn arma_params(&self) -> Vec<f64> {
        self.ar_coefficients
            .iter()
            .chain(&self.ma_coefficients)
            .chain(&self.seasonal_ar_coefficients)
            .chain(&self.seasonal_ma_coefficients)
            .copied()
            .collect()
    }

    /// Fit statistics, coefficient table and residual diagnostics.
    pub fn summary(&self) -> Result<ModelSummary> {
        let state = self.state.as_ref().ok_or(ForecastError::FitRequired)?;

        let coefficients = self
            .spec
            .param_names()
            .into_iter()
            .zip(self.params().unwrap_or_default())
            .zip(state.std_errors.iter())
            .map(|((name, coef), &se)| CoefficientRow::new(name, coef, se))
            .collect();

        let residuals: Vec<f64> = state
            .residuals
            .iter()
            .copied()
            .filter(|r| r.is_finite())
            .collect();

        Ok(ModelSummary {
            model: self.spec.to_string(),
            dependent: state.label.clone().unwrap_or_else(|| "y".to_string()),
            sample_start: state.first_timestamp,
            sample_end: state.last_timestamp,
            nobs: state.original.len(),
            log_likelihood: state.log_likelihood,
            aic: state.aic,
            bic: state.bic,
            hqic: state.hqic,
            coefficients,
            sigma2: state.sigma2,
            ljung_box: ljung_box(&residuals, Some(1), 0),
            jarque_bera: jarque_bera(&residuals),
        })
    }

    /// Split a flat parameter vector into (ar, ma, seasonal ar, seasonal ma).
    fn split_params<'a>(
        spec: &SARIMASpec,
        params: &'a [f64],
    ) -> (&'a [f64], &'a [f64], &'a [f64], &'a [f64]) {
        let (ar, rest) = params.split_at(spec.p);
        let (ma, rest) = rest.split_at(spec.q);
        let (sar, sma) = rest.split_at(spec.seasonal_p);
        (ar, ma, sar, sma)
    }

    /// Lag coefficients `a_k` with `w_t = Σ a_k·w_{t−k} + ...`.
    fn expanded_ar(spec: &SARIMASpec, ar: &[f64], sar: &[f64]) -> Vec<f64> {
        let regular: Vec<f64> = std::iter::once(1.0).chain(ar.iter().map(|c| -c)).collect();
        let seasonal = seasonal_polynomial(sar, spec.period, -1.0);
        polymul(&regular, &seasonal)
            .into_iter()
            .skip(1)
            .map(|c| -c)
            .collect()
    }

    /// Lag coefficients `b_k` with `w_t = ... + ε_t + Σ b_k·ε_{t−k}`.
    fn expanded_ma(spec: &SARIMASpec, ma: &[f64], sma: &[f64]) -> Vec<f64> {
        let regular: Vec<f64> = std::iter::once(1.0).chain(ma.iter().copied()).collect();
        let seasonal = seasonal_polynomial(sma, spec.period, 1.0);
        polymul(&regular, &seasonal).into_iter().skip(1).collect()
    }

    /// Conditional innovations; the first `start` are fixed at zero.
    fn innovations(w: &[f64], ar: &[f64], ma: &[f64], start: usize) -> Vec<f64> {
        let n = w.len();
        let mut e = vec![0.0; n];
        for t in start..n {
            let mut pred = 0.0;
            for (k, a) in ar.iter().enumerate() {
                pred += a * w[t - 1 - k];
            }
            for (k, b) in ma.iter().enumerate() {
                if t > k {
                    pred += b * e[t - 1 - k];
                }
            }
            e[t] = w[t] - pred;
        }
        e
    }

    /// Concentrated negative log-likelihood (up to a constant).
    fn objective(spec: &SARIMASpec, w: &[f64], params: &[f64]) -> f64 {
        let (ar, ma, sar, sma) = Self::split_params(spec, params);
        let a = Self::expanded_ar(spec, ar, sar);
        let b = Self::expanded_ma(spec, ma, sma);
        let start = spec.max_ar_lag();

        let e = Self::innovations(w, &a, &b, start);
        let css: f64 = e[start..].iter().map(|x| x * x).sum();
        let n_eff = (w.len() - start) as f64;

        if !css.is_finite() || css <= 0.0 {
            return f64::INFINITY;
        }
        0.5 * n_eff * (css / n_eff).ln()
    }

    fn estimate(&mut self, w: &[f64]) -> Result<usize> {
        let spec = self.spec;
        let k = spec.num_arma_params();
        if k == 0 {
            return Ok(0);
        }

        let initial: Vec<f64> = [spec.p, spec.q, spec.seasonal_p, spec.seasonal_q]
            .iter()
            .flat_map(|&order| (0..order).map(|i| 0.1 / (i + 1) as f64))
            .collect();
        let bounds = vec![(-COEFFICIENT_BOUND, COEFFICIENT_BOUND); k];
        let config = NelderMeadConfig {
            max_iter: 2000 + 500 * k,
            ..Default::default()
        };

        let result = nelder_mead(
            |params| Self::objective(&spec, w, params),
            &initial,
            Some(&bounds),
            &config,
        );

        if !result.converged {
            warn!(iterations = result.iterations, "SARIMA optimiser did not converge");
            return Err(ForecastError::Convergence {
                iterations: result.iterations,
            });
        }

        let (ar, ma, sar, sma) = Self::split_params(&spec, &result.optimal_point);
        self.ar_coefficients = ar.to_vec();
        self.ma_coefficients = ma.to_vec();
        self.seasonal_ar_coefficients = sar.to_vec();
        self.seasonal_ma_coefficients = sma.to_vec();
        Ok(result.iterations)
    }

    /// Standard errors from the inverse numerical Hessian of the objective.
    fn standard_errors(&self, w: &[f64], sigma2: f64, n_eff: usize) -> Vec<f64> {
        let theta = self.arma_params();
        let k = theta.len();
        let sigma2_se = (2.0 * sigma2 * sigma2 / n_eff as f64).sqrt();

        let mut errors = vec![f64::NAN; k];
        if k > 0 {
            let f = |x: &[f64]| Self::objective(&self.spec, w, x);
            if let Some(cov) = numerical_hessian(f, &theta).and_then(|h| invert_symmetric(&h)) {
                for (i, se) in errors.iter_mut().enumerate() {
                    if cov[i][i] > 0.0 {
                        *se = cov[i][i].sqrt();
                    }
                }
            }
        }
        errors.push(sigma2_se);
        errors
    }

    fn state(&self) -> Result<&FitState> {
        self.state.as_ref().ok_or(ForecastError::FitRequired)
    }
}

impl Default for SARIMA {
    fn default() -> Self {
        Self::new(SARIMASpec::default())
    }
}

/// `1 + sign·Σ c_j·B^{j·s}`.
fn seasonal_polynomial(coefficients: &[f64], period: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coefficients.len() * period + 1];
    poly[0] = 1.0;
    for (j, c) in coefficients.iter().enumerate() {
        poly[(j + 1) * period] = sign * c;
    }
    poly
}

/// Central-difference Hessian; `None` if any evaluation is non-finite.
fn numerical_hessian<F>(f: F, x: &[f64]) -> Option<Vec<Vec<f64>>>
where
    F: Fn(&[f64]) -> f64,
{
    let k = x.len();
    let h: Vec<f64> = x.iter().map(|v| HESSIAN_STEP * v.abs().max(1.0)).collect();
    let at = |shifts: &[(usize, f64)]| -> f64 {
        let mut point = x.to_vec();
        for &(i, delta) in shifts {
            point[i] += delta;
        }
        f(&point)
    };

    let f0 = f(x);
    let mut hess = vec![vec![0.0; k]; k];
    for i in 0..k {
        let value = (at(&[(i, h[i])]) - 2.0 * f0 + at(&[(i, -h[i])])) / (h[i] * h[i]);
        hess[i][i] = value;
        for j in 0..i {
            let value = (at(&[(i, h[i]), (j, h[j])]) - at(&[(i, h[i]), (j, -h[j])])
                - at(&[(i, -h[i]), (j, h[j])])
                + at(&[(i, -h[i]), (j, -h[j])]))
                / (4.0 * h[i] * h[j]);
            hess[i][j] = value;
            hess[j][i] = value;
        }
    }

    if hess.iter().flatten().all(|v| v.is_finite()) {
        Some(hess)
    } else {
        None
    }
}

impl Forecaster for SARIMA {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        if values.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if series.has_missing_values() {
            return Err(ForecastError::MissingValues);
        }

        let spec = self.spec;
        spec.validate()?;

        let n = values.len();
        let loss = spec.differencing_loss();
        if n <= loss {
            return Err(ForecastError::InvalidOrder(format!(
                "{} observations cannot be differenced with d={} and D={} at period {}",
                n, spec.d, spec.seasonal_d, spec.period
            )));
        }

        let w = seasonal_difference(&difference(values, spec.d), spec.seasonal_d, spec.period);
        let start = spec.max_ar_lag();
        if w.len() <= start + spec.num_params() {
            return Err(ForecastError::InvalidOrder(format!(
                "{} differenced observations are too few for {} with {} parameters",
                w.len(),
                spec,
                spec.num_params()
            )));
        }

        self.state = None;
        let iterations = self.estimate(&w)?;

        let a = Self::expanded_ar(
            &spec,
            &self.ar_coefficients,
            &self.seasonal_ar_coefficients,
        );
        let b = Self::expanded_ma(
            &spec,
            &self.ma_coefficients,
            &self.seasonal_ma_coefficients,
        );
        let innovations = Self::innovations(&w, &a, &b, start);
        let n_eff = w.len() - start;
        let css: f64 = innovations[start..].iter().map(|e| e * e).sum();
        let sigma2 = css / n_eff as f64;
        if !(sigma2.is_finite() && sigma2 > 0.0) {
            return Err(ForecastError::ComputationError(
                "residual variance is zero or undefined".to_string(),
            ));
        }

        let nf = n_eff as f64;
        let k = spec.num_params() as f64;
        let log_likelihood = -0.5 * nf * ((2.0 * PI * sigma2).ln() + 1.0);
        let aic = -2.0 * log_likelihood + 2.0 * k;
        let bic = -2.0 * log_likelihood + k * nf.ln();
        let hqic = -2.0 * log_likelihood + 2.0 * k * nf.ln().ln();

        // Map innovations back onto the original index.
        let mut residuals = vec![f64::NAN; n];
        let mut fitted = vec![f64::NAN; n];
        for t in start..w.len() {
            let idx = t + loss;
            residuals[idx] = innovations[t];
            fitted[idx] = values[idx] - innovations[t];
        }

        let std_errors = self.standard_errors(&w, sigma2, n_eff);

        debug!(
            model = %spec,
            iterations,
            sigma2,
            log_likelihood,
            aic,
            "SARIMA fit"
        );

        self.state = Some(FitState {
            original: values.to_vec(),
            differenced: w,
            innovations,
            fitted,
            residuals,
            sigma2,
            log_likelihood,
            aic,
            bic,
            hqic,
            std_errors,
            iterations,
            label: series.label().map(str::to_string),
            first_timestamp: series.first_timestamp(),
            last_timestamp: series.last_timestamp(),
        });

        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let state = self.state()?;
        if horizon == 0 {
            return Ok(Forecast::new());
        }

        let a = Self::expanded_ar(
            &self.spec,
            &self.ar_coefficients,
            &self.seasonal_ar_coefficients,
        );
        let b = Self::expanded_ma(
            &self.spec,
            &self.ma_coefficients,
            &self.seasonal_ma_coefficients,
        );

        // Forecast on differenced scale; future innovations are zero.
        let mut extended = state.differenced.clone();
        let mut shocks = state.innovations.clone();
        for _ in 0..horizon {
            let t = extended.len();
            let mut pred = 0.0;
            for (k, coef) in a.iter().enumerate() {
                if t > k {
                    pred += coef * extended[t - 1 - k];
                }
            }
            for (k, coef) in b.iter().enumerate() {
                if t > k {
                    pred += coef * shocks[t - 1 - k];
                }
            }
            extended.push(pred);
            shocks.push(0.0);
        }

        let forecast_diff = &extended[state.differenced.len()..];
        let delta = differencing_polynomial(self.spec.d, self.spec.seasonal_d, self.spec.period);
        Ok(Forecast::from_values(integrate(
            forecast_diff,
            &state.original,
            &delta,
        )))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        if !(level > 0.0 && level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "confidence level must be in (0, 1), got {}",
                level
            )));
        }
        let forecast = self.predict(horizon)?;
        if horizon == 0 {
            return Ok(forecast);
        }

        let state = self.state()?;
        let psi = self.psi_weights(horizon);
        let z = quantile_normal((1.0 + level) / 2.0);

        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        let mut cumulative = 0.0;
        for (h, point) in forecast.point().iter().enumerate() {
            cumulative += psi[h] * psi[h];
            let se = (state.sigma2 * cumulative).sqrt();
            lower.push(point - z * se);
            upper.push(point + z * se);
        }

        Forecast::from_values_with_intervals(forecast.point().to_vec(), lower, upper)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.fitted.as_slice())
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.residuals.as_slice())
    }

    fn name(&self) -> &str {
        "SARIMA"
    }
}

impl SARIMA {
    /// ψ-weights of the integrated model, `ψ_0 = 1`.
    fn psi_weights(&self, count: usize) -> Vec<f64> {
        let a = Self::expanded_ar(
            &self.spec,
            &self.ar_coefficients,
            &self.seasonal_ar_coefficients,
        );
        let b = Self::expanded_ma(
            &self.spec,
            &self.ma_coefficients,
            &self.seasonal_ma_coefficients,
        );

        let ar_poly: Vec<f64> = std::iter::once(1.0).chain(a.iter().map(|c| -c)).collect();
        let delta = differencing_polynomial(self.spec.d, self.spec.seasonal_d, self.spec.period);
        let full = polymul(&ar_poly, &delta);

        let mut psi = vec![0.0; count];
        for j in 0..count {
            let ma_term = if j == 0 {
                1.0
            } else {
                b.get(j - 1).copied().unwrap_or(0.0)
            };
            let ar_term: f64 = (1..=j.min(full.len() - 1))
                .map(|i| full[i] * psi[j - i])
                .sum();
            psi[j] = ma_term - ar_term;
        }
        psi
    }
}

/// Out-of-sample forecast of `horizon_days + 1` steps, dated daily from
/// `window_end`.
///
/// The first point is stamped with `window_end` itself, matching a
/// prediction that starts right after the last fitted observation.
pub fn forecast(model: &SARIMA, horizon_days: usize, window_end: NaiveDate) -> Result<ForecastResult> {
    let predictions = model.predict_with_intervals(horizon_days + 1, 0.95)?;
    Ok(predictions.with_daily_index(window_end))
}
