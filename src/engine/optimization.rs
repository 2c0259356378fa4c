//! Bounded Nelder-Mead simplex search used to minimise the CSS objective.

use std::cmp::Ordering;

/// Configuration for the simplex search.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Stop once the spread of objective values (or the simplex size) drops below this.
    pub tolerance: f64,
    /// Reflection coefficient.
    pub alpha: f64,
    /// Expansion coefficient.
    pub gamma: f64,
    /// Contraction coefficient.
    pub rho: f64,
    /// Shrink coefficient.
    pub sigma: f64,
    /// Relative size of the initial simplex.
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 2000,
            tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
        }
    }
}

/// Outcome of a simplex search.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    pub optimal_point: Vec<f64>,
    pub optimal_value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Box constraints, one `(min, max)` pair per dimension.
pub type Bounds = [(f64, f64)];

/// Minimise `objective` starting from `initial`.
///
/// Every trial point is clamped into `bounds` before evaluation.
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&Bounds>,
    config: &NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let dim = initial.len();
    if dim == 0 {
        // Nothing to search over
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: objective(&[]),
            iterations: 0,
            converged: true,
        };
    }

    let clamp = |point: Vec<f64>| clamp_to(point, bounds);

    let start = clamp(initial.to_vec());
    let mut vertices: Vec<(Vec<f64>, f64)> = Vec::with_capacity(dim + 1);
    vertices.push((start.clone(), objective(&start)));
    for i in 0..dim {
        let mut vertex = start.clone();
        let scale = if vertex[i].abs() > 1e-10 {
            vertex[i].abs()
        } else {
            1.0
        };
        vertex[i] += config.initial_step * scale;
        let vertex = clamp(vertex);
        let value = objective(&vertex);
        vertices.push((vertex, value));
    }

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;
        vertices.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

        let best_value = vertices[0].1;
        let worst_value = vertices[dim].1;
        let second_worst_value = vertices[dim - 1].1;

        if (worst_value - best_value).abs() < config.tolerance {
            converged = true;
            break;
        }

        let centroid = centroid(&vertices[..dim]);
        let diameter = vertices
            .iter()
            .map(|(v, _)| distance(v, &centroid))
            .fold(0.0, f64::max);
        if diameter < config.tolerance {
            converged = true;
            break;
        }

        let worst = vertices[dim].0.clone();
        let reflected = clamp(towards(&centroid, &worst, -config.alpha));
        let reflected_value = objective(&reflected);

        if reflected_value < best_value {
            let expanded = clamp(towards(&centroid, &reflected, config.gamma));
            let expanded_value = objective(&expanded);
            vertices[dim] = if expanded_value < reflected_value {
                (expanded, expanded_value)
            } else {
                (reflected, reflected_value)
            };
            continue;
        }

        if reflected_value < second_worst_value {
            vertices[dim] = (reflected, reflected_value);
            continue;
        }

        // Contract towards the better of the worst vertex and its reflection.
        let (anchor, anchor_value) = if reflected_value < worst_value {
            (reflected, reflected_value)
        } else {
            (worst, worst_value)
        };
        let contracted = clamp(towards(&centroid, &anchor, config.rho));
        let contracted_value = objective(&contracted);
        if contracted_value < anchor_value {
            vertices[dim] = (contracted, contracted_value);
            continue;
        }

        let best = vertices[0].0.clone();
        for (vertex, value) in vertices.iter_mut().skip(1) {
            let shrunk = clamp(towards(&best, vertex, config.sigma));
            *value = objective(&shrunk);
            *vertex = shrunk;
        }
    }

    let (optimal_point, optimal_value) = vertices
        .into_iter()
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
        .unwrap_or_else(|| (initial.to_vec(), f64::NAN));

    NelderMeadResult {
        optimal_point,
        optimal_value,
        iterations,
        converged,
    }
}

/// `origin + factor * (point - origin)`
fn towards(origin: &[f64], point: &[f64], factor: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(point)
        .map(|(o, p)| o + factor * (p - o))
        .collect()
}

fn centroid(vertices: &[(Vec<f64>, f64)]) -> Vec<f64> {
    let dim = vertices[0].0.len();
    let mut sum = vec![0.0; dim];
    for (vertex, _) in vertices {
        for (s, v) in sum.iter_mut().zip(vertex) {
            *s += v;
        }
    }
    let count = vertices.len() as f64;
    sum.into_iter().map(|s| s / count).collect()
}

fn clamp_to(mut point: Vec<f64>, bounds: Option<&Bounds>) -> Vec<f64> {
    if let Some(bounds) = bounds {
        for (x, &(lo, hi)) in point.iter_mut().zip(bounds) {
            *x = x.clamp(lo, hi);
        }
    }
    point
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn minimises_quadratic_2d() {
        let result = nelder_mead(
            |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
            &[0.0, 0.0],
            None,
            &NelderMeadConfig::default(),
        );

        assert!(result.converged);
        assert_relative_eq!(result.optimal_point[0], 2.0, epsilon = 1e-3);
        assert_relative_eq!(result.optimal_point[1], 3.0, epsilon = 1e-3);
        assert_relative_eq!(result.optimal_value, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn respects_bounds() {
        // Unconstrained optimum at 5, box stops at 3
        let result = nelder_mead(
            |x| (x[0] - 5.0).powi(2),
            &[1.0],
            Some(&[(0.0, 3.0)]),
            &NelderMeadConfig::default(),
        );

        assert_relative_eq!(result.optimal_point[0], 3.0, epsilon = 1e-4);
    }

    #[test]
    fn bounded_intercept_and_coefficient() {
        // Only the second coordinate is boxed
        let result = nelder_mead(
            |x| (x[0] - 10.0).powi(2) + (x[1] - 2.0).powi(2),
            &[0.0, 0.1],
            Some(&[(f64::NEG_INFINITY, f64::INFINITY), (-0.99, 0.99)]),
            &NelderMeadConfig::default(),
        );

        assert_relative_eq!(result.optimal_point[0], 10.0, epsilon = 1e-2);
        assert_relative_eq!(result.optimal_point[1], 0.99, epsilon = 1e-4);
    }

    #[test]
    fn empty_problem_evaluates_objective_once() {
        let result = nelder_mead(|_| 4.2, &[], None, &NelderMeadConfig::default());
        assert!(result.converged);
        assert_eq!(result.iterations, 0);
        assert!(result.optimal_point.is_empty());
        assert_relative_eq!(result.optimal_value, 4.2);
    }

    #[test]
    fn iteration_cap_is_reported() {
        let config = NelderMeadConfig {
            max_iter: 3,
            ..Default::default()
        };
        let result = nelder_mead(
            |x| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0].powi(2)).powi(2),
            &[-1.2, 1.0],
            None,
            &config,
        );

        assert_eq!(result.iterations, 3);
        assert!(!result.converged);
    }
}
