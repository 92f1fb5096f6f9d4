//! Derivative-free minimisation used for model parameter estimation.

use std::cmp::Ordering;

/// Result of Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// The best point found.
    pub optimal_point: Vec<f64>,
    /// The objective function value at the best point.
    pub optimal_value: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether a stopping tolerance was met before `max_iter`.
    pub converged: bool,
}

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Relative tolerance on the spread of objective values in the simplex.
    pub f_tolerance: f64,
    /// Absolute tolerance on the simplex diameter.
    pub x_tolerance: f64,
    /// Initial simplex step size.
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            f_tolerance: 1e-10,
            x_tolerance: 1e-8,
            initial_step: 0.05,
        }
    }
}

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Simplex vertex with its cached objective value.
#[derive(Debug, Clone)]
struct Vertex {
    point: Vec<f64>,
    value: f64,
}

/// Minimise `objective` starting from `initial` with the Nelder-Mead simplex method.
///
/// Every trial point is clamped into `bounds` (one `(min, max)` pair per
/// coordinate) before evaluation. Non-finite objective values are treated as
/// `+inf`, so the simplex moves away from regions where the objective is
/// undefined.
///
/// # Example
/// ```
/// use stock_forecast::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// // Minimize (x-2)^2 + (y-3)^2
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     &NelderMeadConfig::default(),
/// );
///
/// assert!(result.converged);
/// assert!((result.optimal_point[0] - 2.0).abs() < 0.01);
/// assert!((result.optimal_point[1] - 3.0).abs() < 0.01);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: &NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    let evaluate = |point: Vec<f64>| -> Vertex {
        let point = clamp(point, bounds);
        let value = objective(&point);
        Vertex {
            value: if value.is_finite() { value } else { f64::INFINITY },
            point,
        }
    };

    let mut simplex: Vec<Vertex> = Vec::with_capacity(n + 1);
    simplex.push(evaluate(initial.to_vec()));
    for i in 0..n {
        let mut point = initial.to_vec();
        let step = if initial[i].abs() > 1e-10 {
            config.initial_step * initial[i].abs()
        } else {
            config.initial_step
        };
        // Step inwards when the outward step would be clamped onto the start.
        point[i] += step;
        if let Some(&(lo, hi)) = bounds.and_then(|b| b.get(i)) {
            if point[i] > hi {
                point[i] = (initial[i] - step).max(lo);
            }
        }
        simplex.push(evaluate(point));
    }

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        simplex.sort_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal));

        if has_converged(&simplex, config) {
            converged = true;
            break;
        }
        iterations += 1;

        let best = simplex[0].value;
        let second_worst = simplex[n - 1].value;
        let worst = simplex[n].clone();
        let centroid = centroid(&simplex[..n]);

        let reflected = evaluate(towards(&centroid, &worst.point, -REFLECTION));

        if reflected.value < best {
            let expanded = evaluate(towards(&centroid, &worst.point, -EXPANSION));
            simplex[n] = if expanded.value < reflected.value {
                expanded
            } else {
                reflected
            };
            continue;
        }

        if reflected.value < second_worst {
            simplex[n] = reflected;
            continue;
        }

        let contracted = if reflected.value < worst.value {
            evaluate(towards(&centroid, &worst.point, -CONTRACTION))
        } else {
            evaluate(towards(&centroid, &worst.point, CONTRACTION))
        };
        if contracted.value < reflected.value.min(worst.value) {
            simplex[n] = contracted;
            continue;
        }

        let anchor = simplex[0].point.clone();
        for vertex in simplex.iter_mut().skip(1) {
            let shrunk = towards(&anchor, &vertex.point, SHRINK);
            *vertex = evaluate(shrunk);
        }
    }

    simplex.sort_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal));
    let best = simplex.swap_remove(0);

    NelderMeadResult {
        optimal_point: best.point,
        optimal_value: best.value,
        iterations,
        converged,
    }
}

fn has_converged(sorted: &[Vertex], config: &NelderMeadConfig) -> bool {
    let best = &sorted[0];
    let worst = &sorted[sorted.len() - 1];
    if !best.value.is_finite() {
        return false;
    }

    let f_spread = worst.value - best.value;
    if f_spread <= config.f_tolerance * (1.0 + best.value.abs()) {
        return true;
    }

    let diameter = sorted
        .iter()
        .skip(1)
        .map(|v| {
            v.point
                .iter()
                .zip(best.point.iter())
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max)
        })
        .fold(0.0, f64::max);
    diameter <= config.x_tolerance
}

fn centroid(vertices: &[Vertex]) -> Vec<f64> {
    let dims = vertices[0].point.len();
    let mut c = vec![0.0; dims];
    for v in vertices {
        for (ci, xi) in c.iter_mut().zip(v.point.iter()) {
            *ci += xi;
        }
    }
    let count = vertices.len() as f64;
    c.iter_mut().for_each(|ci| *ci /= count);
    c
}

/// `origin + t * (point - origin)`; negative `t` moves through the origin.
fn towards(origin: &[f64], point: &[f64], t: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(point.iter())
        .map(|(o, p)| o + t * (p - o))
        .collect()
}

fn clamp(point: Vec<f64>, bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    match bounds {
        None => point,
        Some(b) => point
            .into_iter()
            .enumerate()
            .map(|(i, x)| match b.get(i) {
                Some(&(lo, hi)) => x.clamp(lo, hi),
                None => x,
            })
            .collect(),
    }
}
