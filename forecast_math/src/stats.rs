//! Small statistics helpers shared by the estimators

use crate::{MathError, Result};
use statrs::distribution::{ContinuousCDF, Normal};

/// Arithmetic mean, `NaN` for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance, `NaN` for an empty slice
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Whether every value equals the first one up to a relative tolerance
pub fn is_constant(values: &[f64]) -> bool {
    let Some(&first) = values.first() else {
        return true;
    };
    let tolerance = 1e-12 * first.abs().max(1.0);
    values.iter().all(|v| (v - first).abs() <= tolerance)
}

/// Quantile of the standard normal distribution
pub fn normal_quantile(p: f64) -> Result<f64> {
    if !(p > 0.0 && p < 1.0) {
        return Err(MathError::InvalidInput(format!(
            "Probability must lie strictly between 0 and 1, got {}",
            p
        )));
    }
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| MathError::CalculationError(e.to_string()))?;
    Ok(normal.inverse_cdf(p))
}

/// Solve `a * x = b` by Gaussian elimination with partial pivoting.
///
/// `a` is given row-major. Returns an error when the system is singular.
pub fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    if a.len() != n || a.iter().any(|row| row.len() != n) {
        return Err(MathError::InvalidInput(
            "Linear system must be square and match the right-hand side".to_string(),
        ));
    }

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| {
                a[i][col]
                    .abs()
                    .partial_cmp(&a[j][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);

        if a[pivot][col].abs() < 1e-14 {
            return Err(MathError::CalculationError(
                "Singular linear system".to_string(),
            ));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}
