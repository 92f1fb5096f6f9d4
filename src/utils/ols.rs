//! Ordinary Least Squares (OLS) regression and small dense linear algebra.
//!
//! Used by the Dickey-Fuller regressions and for inverting the observed
//! information matrix of fitted SARIMA models.

use crate::error::{ForecastError, Result};

/// OLS fit of `y = X @ beta + e`.
#[derive(Debug, Clone)]
pub struct OLSResult {
    /// Estimated coefficients, one per design column.
    pub params: Vec<f64>,
    /// Standard errors of the coefficients.
    pub std_errors: Vec<f64>,
    /// Residual sum of squares.
    pub ssr: f64,
    /// Number of observations.
    pub nobs: usize,
}

impl OLSResult {
    /// Number of estimated coefficients.
    pub fn num_params(&self) -> usize {
        self.params.len()
    }

    /// t statistics (`coef / std_err`).
    pub fn t_values(&self) -> Vec<f64> {
        self.params
            .iter()
            .zip(self.std_errors.iter())
            .map(|(b, se)| b / se)
            .collect()
    }

    /// Gaussian log-likelihood evaluated at the OLS estimate.
    pub fn log_likelihood(&self) -> f64 {
        let n = self.nobs as f64;
        -0.5 * n * ((2.0 * std::f64::consts::PI).ln() + (self.ssr / n).ln() + 1.0)
    }

    /// Akaike information criterion, counting every design column.
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.num_params() as f64
    }
}

/// Fit OLS regression of `y` on the given design columns.
///
/// `columns[j][i]` is regressor `j` at observation `i`. No constant is added;
/// include a column of ones for an intercept.
pub fn ols_fit(y: &[f64], columns: &[Vec<f64>]) -> Result<OLSResult> {
    let n = y.len();
    let k = columns.len();

    if k == 0 {
        return Err(ForecastError::InvalidParameter(
            "OLS needs at least one regressor".to_string(),
        ));
    }
    if n <= k {
        return Err(ForecastError::InsufficientData {
            needed: k + 1,
            got: n,
        });
    }
    for column in columns {
        if column.len() != n {
            return Err(ForecastError::DimensionMismatch {
                expected: n,
                got: column.len(),
            });
        }
    }

    // Normal equations X'X beta = X'y
    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for i in 0..k {
        for j in 0..=i {
            let s: f64 = columns[i]
                .iter()
                .zip(columns[j].iter())
                .map(|(a, b)| a * b)
                .sum();
            xtx[i][j] = s;
            xtx[j][i] = s;
        }
        xty[i] = columns[i].iter().zip(y.iter()).map(|(a, b)| a * b).sum();
    }

    let chol = cholesky(&xtx).ok_or_else(|| {
        ForecastError::ComputationError("regression design matrix is singular".to_string())
    })?;
    let params = cholesky_solve(&chol, &xty);

    let ssr: f64 = (0..n)
        .map(|i| {
            let fitted: f64 = (0..k).map(|j| columns[j][i] * params[j]).sum();
            (y[i] - fitted).powi(2)
        })
        .sum();

    let sigma2 = ssr / (n - k) as f64;
    let inv = cholesky_inverse(&chol);
    let std_errors = (0..k).map(|j| (sigma2 * inv[j][j]).sqrt()).collect();

    Ok(OLSResult {
        params,
        std_errors,
        ssr,
        nobs: n,
    })
}

/// Invert a symmetric positive definite matrix.
///
/// Returns `None` when the matrix is not numerically positive definite.
pub fn invert_symmetric(a: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    cholesky(a).map(|l| cholesky_inverse(&l))
}

/// Cholesky factor `L` with `A = L @ L'`.
fn cholesky(a: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = a.len();
    if n == 0 || a.iter().any(|row| row.len() != n) {
        return None;
    }

    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                // Pivot relative to the original diagonal catches collinear columns.
                if !sum.is_finite() || sum <= a[i][i].abs() * 1e-12 {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }
    Some(l)
}

fn cholesky_solve(l: &[Vec<f64>], b: &[f64]) -> Vec<f64> {
    let n = b.len();

    // Forward substitution: L @ y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    // Backward substitution: L' @ x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }
    x
}

fn cholesky_inverse(l: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = l.len();
    let mut inv = vec![vec![0.0; n]; n];
    for col in 0..n {
        let mut e = vec![0.0; n];
        e[col] = 1.0;
        let x = cholesky_solve(l, &e);
        for row in 0..n {
            inv[row][col] = x[row];
        }
    }
    inv
}
