//! Derivative-free minimization with the Nelder-Mead simplex method

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Settings for the simplex search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplexSettings {
    /// Maximum number of iterations before giving up
    pub max_iter: usize,
    /// Absolute spread of objective values across the simplex at convergence
    pub f_tolerance: f64,
    /// Absolute spread of vertex coordinates at convergence
    pub x_tolerance: f64,
    /// Relative size of the initial simplex (absolute when a coordinate is zero)
    pub initial_step: f64,
}

impl Default for SimplexSettings {
    fn default() -> Self {
        Self {
            max_iter: 5000,
            f_tolerance: 1e-9,
            x_tolerance: 1e-6,
            initial_step: 0.1,
        }
    }
}

/// Outcome of a simplex search
#[derive(Debug, Clone)]
pub struct SimplexSolution {
    /// Best point found
    pub point: Vec<f64>,
    /// Objective value at `point`
    pub value: f64,
    /// Iterations performed
    pub iterations: usize,
    /// Whether both tolerances were met before `max_iter`
    pub converged: bool,
}

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Minimize `objective` starting from `initial`.
///
/// Non-finite objective values are treated as `+inf`, so the search steps
/// away from regions where the objective blows up.
pub fn minimize<F>(objective: F, initial: &[f64], settings: &SimplexSettings) -> SimplexSolution
where
    F: Fn(&[f64]) -> f64,
{
    let eval = |x: &[f64]| {
        let v = objective(x);
        if v.is_finite() {
            v
        } else {
            f64::INFINITY
        }
    };

    let n = initial.len();
    if n == 0 {
        return SimplexSolution {
            point: Vec::new(),
            value: eval(initial),
            iterations: 0,
            converged: true,
        };
    }

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(initial.to_vec());
    for i in 0..n {
        let mut vertex = initial.to_vec();
        vertex[i] += if initial[i].abs() > 1e-10 {
            settings.initial_step * initial[i].abs()
        } else {
            settings.initial_step
        };
        simplex.push(vertex);
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < settings.max_iter {
        order_simplex(&mut simplex, &mut values);

        if has_converged(&simplex, &values, settings) {
            converged = true;
            break;
        }
        iterations += 1;

        let centroid = centroid(&simplex[..n]);
        let worst = simplex[n].clone();

        let reflected = along(&centroid, &worst, -REFLECTION);
        let f_reflected = eval(&reflected);

        if f_reflected < values[0] {
            let expanded = along(&centroid, &worst, -EXPANSION);
            let f_expanded = eval(&expanded);
            if f_expanded < f_reflected {
                simplex[n] = expanded;
                values[n] = f_expanded;
            } else {
                simplex[n] = reflected;
                values[n] = f_reflected;
            }
            continue;
        }

        if f_reflected < values[n - 1] {
            simplex[n] = reflected;
            values[n] = f_reflected;
            continue;
        }

        let (contracted, f_contracted) = if f_reflected < values[n] {
            let outside = along(&centroid, &worst, -CONTRACTION);
            let f = eval(&outside);
            (outside, f)
        } else {
            let inside = along(&centroid, &worst, CONTRACTION);
            let f = eval(&inside);
            (inside, f)
        };

        if f_contracted < values[n].min(f_reflected) {
            simplex[n] = contracted;
            values[n] = f_contracted;
            continue;
        }

        let best = simplex[0].clone();
        for i in 1..=n {
            for (x, b) in simplex[i].iter_mut().zip(best.iter()) {
                *x = b + SHRINK * (*x - b);
            }
            values[i] = eval(&simplex[i]);
        }
    }

    order_simplex(&mut simplex, &mut values);
    SimplexSolution {
        point: simplex.swap_remove(0),
        value: values[0],
        iterations,
        converged,
    }
}

fn order_simplex(simplex: &mut Vec<Vec<f64>>, values: &mut Vec<f64>) {
    let mut paired: Vec<(f64, Vec<f64>)> = values
        .iter()
        .copied()
        .zip(simplex.drain(..))
        .collect();
    paired.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    values.clear();
    for (value, vertex) in paired {
        values.push(value);
        simplex.push(vertex);
    }
}

fn has_converged(simplex: &[Vec<f64>], values: &[f64], settings: &SimplexSettings) -> bool {
    let best = &simplex[0];
    let f_spread = values
        .iter()
        .skip(1)
        .map(|v| (v - values[0]).abs())
        .fold(0.0, f64::max);
    let x_spread = simplex
        .iter()
        .skip(1)
        .flat_map(|v| v.iter().zip(best.iter()).map(|(a, b)| (a - b).abs()))
        .fold(0.0, f64::max);
    f_spread <= settings.f_tolerance && x_spread <= settings.x_tolerance
}

fn centroid(vertices: &[Vec<f64>]) -> Vec<f64> {
    let dim = vertices[0].len();
    let mut c = vec![0.0; dim];
    for v in vertices {
        for (ci, vi) in c.iter_mut().zip(v.iter()) {
            *ci += vi;
        }
    }
    let k = vertices.len() as f64;
    c.iter_mut().for_each(|ci| *ci /= k);
    c
}

/// Point `centroid + t * (worst - centroid)`
fn along(centroid: &[f64], worst: &[f64], t: f64) -> Vec<f64> {
    centroid
        .iter()
        .zip(worst.iter())
        .map(|(c, w)| c + t * (w - c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_quadratic_bowl() {
        let solution = minimize(
            |x| (x[0] - 2.0).powi(2) + (x[1] + 3.0).powi(2),
            &[0.0, 0.0],
            &SimplexSettings::default(),
        );
        assert!(solution.converged);
        assert_relative_eq!(solution.point[0], 2.0, epsilon = 1e-4);
        assert_relative_eq!(solution.point[1], -3.0, epsilon = 1e-4);
    }

    #[test]
    fn test_rosenbrock() {
        let settings = SimplexSettings {
            max_iter: 20_000,
            ..SimplexSettings::default()
        };
        let solution = minimize(
            |x| 100.0 * (x[1] - x[0] * x[0]).powi(2) + (1.0 - x[0]).powi(2),
            &[-1.2, 1.0],
            &settings,
        );
        assert!(solution.converged);
        assert_relative_eq!(solution.point[0], 1.0, epsilon = 1e-3);
        assert_relative_eq!(solution.point[1], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_non_finite_regions_are_avoided() {
        let solution = minimize(
            |x| {
                if x[0] < 0.0 {
                    f64::NAN
                } else {
                    (x[0] - 1.0).powi(2)
                }
            },
            &[3.0],
            &SimplexSettings::default(),
        );
        assert!(solution.value.is_finite());
        assert_relative_eq!(solution.point[0], 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_iteration_budget() {
        let settings = SimplexSettings {
            max_iter: 3,
            ..SimplexSettings::default()
        };
        let solution = minimize(|x| (x[0] - 50.0).powi(2), &[0.0], &settings);
        assert!(!solution.converged);
        assert_eq!(solution.iterations, 3);
    }
}
