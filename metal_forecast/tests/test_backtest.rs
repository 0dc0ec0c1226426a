mod common;

use assert_approx_eq::assert_approx_eq;
use chrono::NaiveDate;
use metal_forecast::backtest::{backtest, rolling_backtest};
use metal_forecast::config::{ArimaOrder, LagFeatureConfig, SarimaxConfig, SeasonalOrder};
use metal_forecast::models::{lag_features, sarimax};
use metal_forecast::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use metal_forecast::utils::{business_days_after, next_business_day};
use metal_forecast::{ForecastError, PriceSeries, Result, TrendKind};

/// Repeats the last observed value, optionally starting one business day late
#[derive(Debug, Clone)]
struct NaiveModel {
    skip_day: bool,
}

#[derive(Debug)]
struct TrainedNaive {
    last_value: f64,
    last_date: NaiveDate,
    skip_day: bool,
}

impl ForecastModel for NaiveModel {
    type Trained = TrainedNaive;

    fn train(&self, series: &PriceSeries) -> Result<TrainedNaive> {
        let prepared = series.prepare()?;
        Ok(TrainedNaive {
            last_value: prepared.last_value().unwrap(),
            last_date: prepared.last_date().unwrap(),
            skip_day: self.skip_day,
        })
    }

    fn name(&self) -> String {
        "naive".to_string()
    }
}

impl TrainedForecastModel for TrainedNaive {
    fn forecast(&self, steps: usize) -> Result<ForecastResult> {
        let origin = if self.skip_day {
            next_business_day(self.last_date)
        } else {
            self.last_date
        };
        let dates = business_days_after(origin, steps);
        Ok(ForecastResult::new(PriceSeries::new(
            "forecast",
            dates,
            vec![self.last_value; steps],
        )?))
    }

    fn name(&self) -> String {
        "naive".to_string()
    }
}

fn weekly_config() -> SarimaxConfig {
    SarimaxConfig::new(
        ArimaOrder::new(1, 1, 1),
        SeasonalOrder::new(0, 1, 1, 5),
        TrendKind::None,
    )
}

#[test]
fn test_backtest_holds_out_trailing_window() {
    let values: Vec<f64> = (0..50).map(|t| 100.0 + t as f64).collect();
    let series = common::business_series("Gold", values);

    let result = backtest(&NaiveModel { skip_day: false }, &series, 10).unwrap();

    assert_eq!(result.forecast.len(), 10);
    assert_eq!(result.actual.dates(), &series.dates()[40..]);
    assert_eq!(result.forecast.dates(), result.actual.dates());
    // Last training value is 139, errors are 1..=10
    let expected_rmse = ((1..=10).map(|e| (e * e) as f64).sum::<f64>() / 10.0).sqrt();
    assert_approx_eq!(result.metrics.rmse, expected_rmse);
}

#[test]
fn test_backtest_rejects_misaligned_forecast() {
    let series = common::synthetic_metal(60, 1);
    let result = backtest(&NaiveModel { skip_day: true }, &series, 10);
    assert!(matches!(result, Err(ForecastError::AlignmentError(_))));
}

#[test]
fn test_backtest_step_bounds() {
    let series = common::synthetic_metal(60, 1);
    let model = NaiveModel { skip_day: false };

    assert!(matches!(
        backtest(&model, &series, 0),
        Err(ForecastError::InvalidParameter(_))
    ));
    assert!(matches!(
        backtest(&model, &series, 60),
        Err(ForecastError::InvalidParameter(_))
    ));
}

#[test]
fn test_seasonal_backtest() {
    let series = common::synthetic_metal(250, 9);
    let result = sarimax::backtest(&series, 30, &weekly_config()).unwrap();

    assert_eq!(result.forecast.len(), 30);
    assert_eq!(result.actual.values(), &series.values()[220..]);
    assert!(result.metrics.mape >= 0.0 && result.metrics.mape < 0.1);
    assert!(result.metrics.rmse.is_finite());
}

#[test]
fn test_exact_backtest_scores_r2_of_one() {
    let series = common::business_series("Silver", vec![10.0; 80]);
    let result = lag_features::backtest(&series, 20, &LagFeatureConfig::default()).unwrap();

    assert_eq!(result.metrics.mape, 0.0);
    assert_eq!(result.metrics.rmse, 0.0);
    assert_eq!(result.metrics.r2, 1.0);
}

#[test]
fn test_rolling_backtest_folds() {
    let series = common::synthetic_metal(300, 13);
    let report = sarimax::rolling_backtest(&series, 20, 5, &weekly_config()).unwrap();

    assert_eq!(report.folds.len(), 5);
    let train_sizes: Vec<usize> = report.folds.iter().map(|f| f.train_size).collect();
    assert_eq!(train_sizes, vec![200, 220, 240, 260, 280]);
    let folds: Vec<usize> = report.folds.iter().map(|f| f.fold).collect();
    assert_eq!(folds, vec![1, 2, 3, 4, 5]);
    assert!(report.mean_mape().is_finite());
    assert!(report.mean_rmse() > 0.0);
}

#[test]
fn test_rolling_backtest_parameter_checks() {
    let series = common::synthetic_metal(100, 13);
    let model = NaiveModel { skip_day: false };

    for (steps, n_splits) in [(0, 5), (20, 0), (20, 5), (60, 2)] {
        assert!(
            matches!(
                rolling_backtest(&model, &series, steps, n_splits),
                Err(ForecastError::InvalidParameter(_))
            ),
            "steps={} n_splits={}",
            steps,
            n_splits
        );
    }

    let report = rolling_backtest(&model, &series, 20, 4).unwrap();
    assert_eq!(report.folds[0].train_size, 20);
}
