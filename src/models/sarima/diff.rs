//! Differencing and polynomial helpers for seasonal ARIMA models.
//!
//! Polynomials in the backshift operator are stored by ascending power with
//! the constant term first, so `[1.0, -0.5]` is `1 − 0.5B`.

/// Apply differencing to a time series.
///
/// # Arguments
/// * `series` - The input series
/// * `d` - Differencing order (number of times to difference)
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    if d == 0 || series.is_empty() {
        return series.to_vec();
    }

    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Apply seasonal differencing `(1 − B^period)^d` to a time series.
///
/// Returns an empty vector when the series is too short for the requested
/// order.
pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    if d == 0 || period == 0 {
        return series.to_vec();
    }

    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= period {
            return Vec::new();
        }
        result = result
            .iter()
            .skip(period)
            .zip(result.iter())
            .map(|(curr, prev)| curr - prev)
            .collect();
    }
    result
}

/// Multiply two polynomials.
pub fn polymul(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Expanded differencing operator `(1 − B)^d (1 − B^period)^seasonal_d`.
///
/// # Example
/// ```
/// use stock_forecast::models::sarima::differencing_polynomial;
///
/// // (1 - B)(1 - B^4) = 1 - B - B^4 + B^5
/// let delta = differencing_polynomial(1, 1, 4);
/// assert_eq!(delta, vec![1.0, -1.0, 0.0, 0.0, -1.0, 1.0]);
/// ```
pub fn differencing_polynomial(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = polymul(&poly, &[1.0, -1.0]);
    }
    if period > 0 {
        let mut seasonal = vec![0.0; period + 1];
        seasonal[0] = 1.0;
        seasonal[period] = -1.0;
        for _ in 0..seasonal_d {
            poly = polymul(&poly, &seasonal);
        }
    }
    poly
}

/// Undo differencing for values that follow `history`.
///
/// `delta` is the differencing operator from [`differencing_polynomial`];
/// each new level is `y_t = w_t − Σ_{j≥1} δ_j·y_{t−j}`. `history` must hold at
/// least `delta.len() − 1` observations.
pub fn integrate(differenced: &[f64], history: &[f64], delta: &[f64]) -> Vec<f64> {
    let order = delta.len().saturating_sub(1);
    if order == 0 {
        return differenced.to_vec();
    }

    let mut levels: Vec<f64> = history[history.len().saturating_sub(order)..].to_vec();
    let offset = levels.len();
    for &w in differenced {
        let t = levels.len();
        let carried: f64 = (1..=order.min(t))
            .map(|j| delta[j] * levels[t - j])
            .sum();
        levels.push(w - carried);
    }
    levels.split_off(offset)
}
