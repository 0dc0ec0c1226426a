//! Metrics for evaluating forecast performance

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Accuracy of a forecast against held-out values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    /// Mean absolute percentage error as a fraction (0.05 = 5%)
    pub mape: f64,
    /// Root mean squared error
    pub rmse: f64,
    /// Coefficient of determination, negative when worse than the mean
    pub r2: f64,
}

impl fmt::Display for AccuracyMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MAPE: {:.2}%, RMSE: {:.4}, R²: {:.4}",
            self.mape * 100.0,
            self.rmse,
            self.r2
        )
    }
}

fn check_lengths(actual: &[f64], forecast: &[f64]) -> Result<()> {
    if actual.len() != forecast.len() {
        return Err(ForecastError::AlignmentError(format!(
            "Actual has {} values but forecast has {}",
            actual.len(),
            forecast.len()
        )));
    }
    if actual.is_empty() {
        return Err(ForecastError::DataError(
            "Cannot score an empty forecast".to_string(),
        ));
    }
    Ok(())
}

/// Mean of `|a - f| / max(|a|, ε)`
pub fn mean_absolute_percentage_error(actual: &[f64], forecast: &[f64]) -> Result<f64> {
    check_lengths(actual, forecast)?;
    let total: f64 = actual
        .iter()
        .zip(forecast)
        .map(|(a, f)| (a - f).abs() / a.abs().max(f64::EPSILON))
        .sum();
    Ok(total / actual.len() as f64)
}

pub fn root_mean_squared_error(actual: &[f64], forecast: &[f64]) -> Result<f64> {
    check_lengths(actual, forecast)?;
    let mse = actual
        .iter()
        .zip(forecast)
        .map(|(a, f)| (a - f).powi(2))
        .sum::<f64>()
        / actual.len() as f64;
    Ok(mse.sqrt())
}

/// `1 - SS_res / SS_tot`.
///
/// A constant target scores 1.0 when matched exactly and 0.0 otherwise.
pub fn r2_score(actual: &[f64], forecast: &[f64]) -> Result<f64> {
    check_lengths(actual, forecast)?;
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_res: f64 = actual.iter().zip(forecast).map(|(a, f)| (a - f).powi(2)).sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}

/// Evaluate forecast accuracy against actual values
pub fn evaluate_forecast(actual: &[f64], forecast: &[f64]) -> Result<AccuracyMetrics> {
    Ok(AccuracyMetrics {
        mape: mean_absolute_percentage_error(actual, forecast)?,
        rmse: root_mean_squared_error(actual, forecast)?,
        r2: r2_score(actual, forecast)?,
    })
}
