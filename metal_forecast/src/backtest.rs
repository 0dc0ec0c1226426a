//! Hold-out and rolling-origin evaluation of forecast models

use crate::data::PriceSeries;
use crate::error::{ForecastError, Result};
use crate::metrics::{evaluate_forecast, AccuracyMetrics};
use crate::models::{ForecastModel, TrainedForecastModel};
use crate::utils::train_test_split;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Forecast and actual values over the held-out window, with their scores
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub forecast: PriceSeries,
    pub actual: PriceSeries,
    pub metrics: AccuracyMetrics,
}

/// Scores of one rolling-origin fold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoldMetrics {
    /// 1-based fold number
    pub fold: usize,
    pub train_size: usize,
    pub mape: f64,
    pub rmse: f64,
    pub r2: f64,
}

/// Per-fold scores of a rolling-origin backtest, oldest fold first
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RollingBacktestReport {
    pub folds: Vec<FoldMetrics>,
}

impl RollingBacktestReport {
    fn mean_of(&self, field: impl Fn(&FoldMetrics) -> f64) -> f64 {
        if self.folds.is_empty() {
            return f64::NAN;
        }
        self.folds.iter().map(field).sum::<f64>() / self.folds.len() as f64
    }

    pub fn mean_mape(&self) -> f64 {
        self.mean_of(|f| f.mape)
    }

    pub fn mean_rmse(&self) -> f64 {
        self.mean_of(|f| f.rmse)
    }

    pub fn mean_r2(&self) -> f64 {
        self.mean_of(|f| f.r2)
    }
}

/// Train on `train`, forecast its length, and score against `test`
fn score_window<M: ForecastModel>(
    model: &M,
    train: &PriceSeries,
    test: &PriceSeries,
) -> Result<BacktestResult> {
    let trained = model.train(train)?;
    let (forecast, _) = trained.forecast(test.len())?.into_parts();

    if forecast.dates() != test.dates() {
        return Err(ForecastError::AlignmentError(format!(
            "{} forecast covers {:?}..{:?} but the held-out window is {:?}..{:?}",
            trained.name(),
            forecast.first_date(),
            forecast.last_date(),
            test.first_date(),
            test.last_date()
        )));
    }

    let metrics = evaluate_forecast(test.values(), forecast.values())?;
    Ok(BacktestResult {
        forecast,
        actual: test.clone(),
        metrics,
    })
}

/// Hold out the last `steps` business days of the prepared series
pub fn backtest<M: ForecastModel>(
    model: &M,
    series: &PriceSeries,
    steps: usize,
) -> Result<BacktestResult> {
    let prepared = series.prepare()?;
    if steps == 0 || steps >= prepared.len() {
        return Err(ForecastError::InvalidParameter(format!(
            "Backtest steps must be between 1 and {}, got {}",
            prepared.len().saturating_sub(1),
            steps
        )));
    }

    let (train, test) = train_test_split(&prepared, steps)?;
    debug!(
        model = %model.name(),
        train = train.len(),
        test = test.len(),
        "Running hold-out backtest"
    );

    let result = score_window(model, &train, &test)?;
    info!(model = %model.name(), "Backtest {}", result.metrics);
    Ok(result)
}

/// Score `n_splits` consecutive `steps`-long windows at the end of the series.
///
/// Fold `i` trains on the prefix ending `(n_splits - i) * steps` observations
/// before the end and is tested on the following `steps` observations.
pub fn rolling_backtest<M: ForecastModel>(
    model: &M,
    series: &PriceSeries,
    steps: usize,
    n_splits: usize,
) -> Result<RollingBacktestReport> {
    if steps == 0 || n_splits == 0 {
        return Err(ForecastError::InvalidParameter(format!(
            "Rolling backtest needs steps and n_splits of at least 1, got {} and {}",
            steps, n_splits
        )));
    }

    let prepared = series.prepare()?;
    let n = prepared.len();
    let held_out = steps.checked_mul(n_splits).unwrap_or(usize::MAX);
    if held_out >= n {
        return Err(ForecastError::InvalidParameter(format!(
            "{} folds of {} steps need more than {} observations, series has {}",
            n_splits, steps, held_out, n
        )));
    }

    let mut report = RollingBacktestReport::default();
    for i in 0..n_splits {
        let train_end = n - (n_splits - i) * steps;
        let train = prepared.slice(0..train_end)?;
        let test = prepared.slice(train_end..train_end + steps)?;

        debug!(fold = i + 1, train = train_end, "Starting fold");
        let result = score_window(model, &train, &test)?;
        info!(fold = i + 1, train = train_end, "Fold {}", result.metrics);

        report.folds.push(FoldMetrics {
            fold: i + 1,
            train_size: train_end,
            mape: result.metrics.mape,
            rmse: result.metrics.rmse,
            r2: result.metrics.r2,
        });
    }

    info!(
        model = %model.name(),
        folds = report.folds.len(),
        mean_mape = report.mean_mape(),
        "Rolling backtest finished"
    );
    Ok(report)
}
