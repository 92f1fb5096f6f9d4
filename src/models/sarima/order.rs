//! Model orders: the full SARIMA specification and the dashboard parameters
//! it is derived from.

use crate::error::{ForecastError, Result};
use std::fmt;

/// Largest accepted value for p, d and q.
pub const MAX_ORDER: usize = 5;
/// Largest accepted seasonal period.
pub const MAX_SEASONAL_PERIOD: usize = 24;

/// SARIMA(p, d, q)(P, D, Q)s specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SARIMASpec {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
    /// Seasonal AR order (P)
    pub seasonal_p: usize,
    /// Seasonal differencing order (D)
    pub seasonal_d: usize,
    /// Seasonal MA order (Q)
    pub seasonal_q: usize,
    /// Seasonal period (s)
    pub period: usize,
}

impl SARIMASpec {
    /// Non-seasonal specification.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self {
            p,
            d,
            q,
            seasonal_p: 0,
            seasonal_d: 0,
            seasonal_q: 0,
            period: 0,
        }
    }

    /// Add a seasonal part.
    pub fn with_seasonal(mut self, p: usize, d: usize, q: usize, period: usize) -> Self {
        self.seasonal_p = p;
        self.seasonal_d = d;
        self.seasonal_q = q;
        self.period = period;
        self
    }

    pub fn has_seasonal(&self) -> bool {
        self.seasonal_p > 0 || self.seasonal_d > 0 || self.seasonal_q > 0
    }

    /// Number of ARMA coefficients.
    pub fn num_arma_params(&self) -> usize {
        self.p + self.q + self.seasonal_p + self.seasonal_q
    }

    /// Number of estimated parameters including the innovation variance.
    pub fn num_params(&self) -> usize {
        self.num_arma_params() + 1
    }

    /// Highest lag of the expanded AR polynomial.
    pub fn max_ar_lag(&self) -> usize {
        self.p + self.seasonal_p * self.period
    }

    /// Highest lag of the expanded MA polynomial.
    pub fn max_ma_lag(&self) -> usize {
        self.q + self.seasonal_q * self.period
    }

    /// Observations consumed by differencing.
    pub fn differencing_loss(&self) -> usize {
        self.d + self.seasonal_d * self.period
    }

    /// Reject orders that cannot define a model.
    pub fn validate(&self) -> Result<()> {
        if self.has_seasonal() && self.period < 2 {
            return Err(ForecastError::InvalidOrder(format!(
                "seasonal period must be at least 2 when seasonal orders are set, got {}",
                self.period
            )));
        }
        if self.seasonal_p > 0 && self.period <= self.p {
            return Err(ForecastError::InvalidOrder(format!(
                "autoregressive lag {} appears in both the seasonal and non-seasonal parts",
                self.period
            )));
        }
        if self.seasonal_q > 0 && self.period <= self.q {
            return Err(ForecastError::InvalidOrder(format!(
                "moving average lag {} appears in both the seasonal and non-seasonal parts",
                self.period
            )));
        }
        Ok(())
    }

    /// Names of the estimated parameters, in estimation order.
    pub fn param_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.num_params());
        names.extend((1..=self.p).map(|i| format!("ar.L{}", i)));
        names.extend((1..=self.q).map(|i| format!("ma.L{}", i)));
        names.extend((1..=self.seasonal_p).map(|i| format!("ar.S.L{}", i * self.period)));
        names.extend((1..=self.seasonal_q).map(|i| format!("ma.S.L{}", i * self.period)));
        names.push("sigma2".to_string());
        names
    }
}

impl Default for SARIMASpec {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

impl fmt::Display for SARIMASpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SARIMAX({}, {}, {})", self.p, self.d, self.q)?;
        if self.has_seasonal() {
            write!(
                f,
                "x({}, {}, {}, {})",
                self.seasonal_p, self.seasonal_d, self.seasonal_q, self.period
            )?;
        }
        Ok(())
    }
}

/// User-facing model parameters.
///
/// The seasonal part reuses `(p, d, q)` unless an explicit seasonal order
/// is set with [`ModelParameters::with_seasonal_override`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelParameters {
    p: usize,
    d: usize,
    q: usize,
    seasonal_period: usize,
    seasonal_override: Option<(usize, usize, usize)>,
}

impl ModelParameters {
    /// Validate ranges: p, d, q in `[0, 5]`, seasonal period in `[0, 24]`.
    pub fn new(p: usize, d: usize, q: usize, seasonal_period: usize) -> Result<Self> {
        for (name, value) in [("p", p), ("d", d), ("q", q)] {
            check_order(name, value)?;
        }
        if seasonal_period > MAX_SEASONAL_PERIOD {
            return Err(ForecastError::InvalidParameter(format!(
                "seasonal period must be between 0 and {}, got {}",
                MAX_SEASONAL_PERIOD, seasonal_period
            )));
        }
        Ok(Self {
            p,
            d,
            q,
            seasonal_period,
            seasonal_override: None,
        })
    }

    /// Use an explicit seasonal `(P, D, Q)` instead of repeating `(p, d, q)`.
    pub fn with_seasonal_override(mut self, p: usize, d: usize, q: usize) -> Result<Self> {
        for (name, value) in [("seasonal p", p), ("seasonal d", d), ("seasonal q", q)] {
            check_order(name, value)?;
        }
        self.seasonal_override = Some((p, d, q));
        Ok(self)
    }

    pub fn order(&self) -> (usize, usize, usize) {
        (self.p, self.d, self.q)
    }

    pub fn seasonal_period(&self) -> usize {
        self.seasonal_period
    }

    pub fn seasonal_override(&self) -> Option<(usize, usize, usize)> {
        self.seasonal_override
    }

    /// `(P, D, Q, s)`; `(p, d, q, s)` unless overridden.
    pub fn seasonal_order(&self) -> (usize, usize, usize, usize) {
        let (sp, sd, sq) = self.seasonal_override.unwrap_or((self.p, self.d, self.q));
        (sp, sd, sq, self.seasonal_period)
    }

    pub fn to_spec(&self) -> SARIMASpec {
        let (sp, sd, sq, s) = self.seasonal_order();
        SARIMASpec::new(self.p, self.d, self.q).with_seasonal(sp, sd, sq, s)
    }
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            p: 2,
            d: 1,
            q: 2,
            seasonal_period: 12,
            seasonal_override: None,
        }
    }
}

fn check_order(name: &str, value: usize) -> Result<()> {
    if value > MAX_ORDER {
        return Err(ForecastError::InvalidParameter(format!(
            "{} must be between 0 and {}, got {}",
            name, MAX_ORDER, value
        )));
    }
    Ok(())
}
