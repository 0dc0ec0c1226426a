//! Deterministic trend regressors for the seasonal model

use crate::error::ForecastError;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Shape of the deterministic trend added as exogenous regressors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendKind {
    /// No regressors
    #[default]
    None,
    /// One column `t`
    Linear,
    /// Two columns `t, t²`
    Quadratic,
}

impl TrendKind {
    /// Number of regressor columns this trend contributes
    pub fn n_columns(&self) -> usize {
        match self {
            TrendKind::None => 0,
            TrendKind::Linear => 1,
            TrendKind::Quadratic => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendKind::None => "none",
            TrendKind::Linear => "linear",
            TrendKind::Quadratic => "quadratic",
        }
    }
}

impl fmt::Display for TrendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrendKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "" => Ok(TrendKind::None),
            "linear" => Ok(TrendKind::Linear),
            "quadratic" => Ok(TrendKind::Quadratic),
            other => Err(ForecastError::InvalidParameter(format!(
                "Unknown trend '{}', expected none, linear or quadratic",
                other
            ))),
        }
    }
}

/// Regressors for a training window and the horizon that continues it
#[derive(Debug, Clone, PartialEq)]
pub struct TrendRegressors {
    pub train: Array2<f64>,
    pub forecast: Array2<f64>,
}

/// Trend columns for the time indices in `range`, `None` for [`TrendKind::None`]
pub fn trend_matrix(kind: TrendKind, range: Range<usize>) -> Option<Array2<f64>> {
    let width = kind.n_columns();
    if width == 0 {
        return None;
    }
    let rows = range.len();
    Some(Array2::from_shape_fn((rows, width), |(i, j)| {
        let t = (range.start + i) as f64;
        t.powi(j as i32 + 1)
    }))
}

/// Training rows use `t = 0..train_len`, forecast rows continue at `t = train_len`
pub fn build_trend_regressors(
    kind: TrendKind,
    train_len: usize,
    horizon: usize,
) -> Option<TrendRegressors> {
    let train = trend_matrix(kind, 0..train_len)?;
    let forecast = trend_matrix(kind, train_len..train_len + horizon)?;
    Some(TrendRegressors { train, forecast })
}
