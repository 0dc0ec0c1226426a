//! Gradient-boosted trees over lagged values with recursive multi-step prediction

use crate::backtest::{self, BacktestResult};
use crate::config::LagFeatureConfig;
use crate::data::PriceSeries;
use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use crate::utils::business_days_after;
use chrono::NaiveDate;
use forecast_math::boosting::GradientBoostedTrees;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Column layout shared by training rows and recursive prediction rows:
/// `lag_1..lag_k` followed by `roll_mean_w`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LagFeatureSchema {
    lags: usize,
    rolling_window: usize,
}

impl LagFeatureSchema {
    pub fn new(lags: usize, rolling_window: usize) -> Result<Self> {
        if lags == 0 {
            return Err(ForecastError::InvalidParameter(
                "At least one lag is required".to_string(),
            ));
        }
        if rolling_window == 0 {
            return Err(ForecastError::InvalidParameter(
                "Rolling window must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            lags,
            rolling_window,
        })
    }

    pub fn lags(&self) -> usize {
        self.lags
    }

    pub fn rolling_window(&self) -> usize {
        self.rolling_window
    }

    pub fn width(&self) -> usize {
        self.lags + 1
    }

    /// History length needed before the first complete row
    pub fn warmup(&self) -> usize {
        self.lags.max(self.rolling_window)
    }

    pub fn column_names(&self) -> Vec<String> {
        (1..=self.lags)
            .map(|k| format!("lag_{}", k))
            .chain(std::iter::once(format!("roll_mean_{}", self.rolling_window)))
            .collect()
    }

    /// Features describing the value that follows `history`
    pub fn next_features(&self, history: &[f64]) -> Result<Vec<f64>> {
        let n = history.len();
        if n < self.warmup() {
            return Err(ForecastError::DataError(format!(
                "Need {} values to build features, got {}",
                self.warmup(),
                n
            )));
        }
        let mut row: Vec<f64> = (1..=self.lags).map(|k| history[n - k]).collect();
        let window = &history[n - self.rolling_window..];
        row.push(window.iter().sum::<f64>() / self.rolling_window as f64);
        Ok(row)
    }

    /// Feature table and targets for every position with a complete row
    pub fn training_table(&self, values: &[f64]) -> Result<(Array2<f64>, Array1<f64>)> {
        let start = self.warmup();
        if values.len() <= start {
            return Err(ForecastError::estimation(
                "building lag features",
                format!(
                    "{} observations leave no complete row for {} lags and a {}-day rolling mean",
                    values.len(),
                    self.lags,
                    self.rolling_window
                ),
            ));
        }

        let rows = values.len() - start;
        let mut x = Array2::zeros((rows, self.width()));
        for (i, t) in (start..values.len()).enumerate() {
            for (j, v) in self.next_features(&values[..t])?.into_iter().enumerate() {
                x[[i, j]] = v;
            }
        }
        let y = Array1::from_iter(values[start..].iter().copied());
        Ok((x, y))
    }
}

/// Lag-feature forecaster configured with lags, window and booster settings
#[derive(Debug, Clone)]
pub struct LagFeatureForecaster {
    config: LagFeatureConfig,
}

/// Booster trained on lag features plus the history it continues from
#[derive(Debug, Clone)]
pub struct LagFeatureModel {
    schema: LagFeatureSchema,
    booster: GradientBoostedTrees,
    history: Vec<f64>,
    last_date: NaiveDate,
}

/// Recursive forecast together with the model that produced it
#[derive(Debug, Clone)]
pub struct LagFeatureForecast {
    pub forecast: PriceSeries,
    pub model: LagFeatureModel,
}

impl LagFeatureForecaster {
    pub fn new(config: LagFeatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LagFeatureConfig {
        &self.config
    }
}

impl ForecastModel for LagFeatureForecaster {
    type Trained = LagFeatureModel;

    fn train(&self, series: &PriceSeries) -> Result<Self::Trained> {
        let schema = LagFeatureSchema::new(self.config.lags, self.config.rolling_window)?;
        let prepared = series.prepare()?;
        let (x, y) = schema.training_table(prepared.values())?;

        debug!(
            rows = x.nrows(),
            columns = ?schema.column_names(),
            "Training gradient-boosted trees on lag features"
        );

        let booster = GradientBoostedTrees::fit(x.view(), y.view(), &self.config.boosting)
            .map_err(|e| ForecastError::estimation("training gradient-boosted trees", e))?;

        info!(
            trees = booster.n_trees(),
            rows = x.nrows(),
            "Lag-feature model trained"
        );

        let last_date = prepared
            .last_date()
            .ok_or_else(|| ForecastError::DataError("Prepared series is empty".to_string()))?;

        Ok(LagFeatureModel {
            schema,
            booster,
            history: prepared.values().to_vec(),
            last_date,
        })
    }

    fn name(&self) -> String {
        format!(
            "GBT(lags={}, roll={})",
            self.config.lags, self.config.rolling_window
        )
    }
}

impl LagFeatureModel {
    pub fn schema(&self) -> &LagFeatureSchema {
        &self.schema
    }

    pub fn booster(&self) -> &GradientBoostedTrees {
        &self.booster
    }

    pub fn last_date(&self) -> NaiveDate {
        self.last_date
    }

    /// Predict the value that follows `history`
    pub fn predict_next(&self, history: &[f64]) -> Result<f64> {
        let row = self.schema.next_features(history)?;
        self.booster
            .predict_row(&row)
            .map_err(|e| ForecastError::estimation("predicting with gradient-boosted trees", e))
    }
}

impl TrainedForecastModel for LagFeatureModel {
    /// Each prediction is appended to the history before the next step
    fn forecast(&self, steps: usize) -> Result<ForecastResult> {
        if steps == 0 {
            return Err(ForecastError::InvalidParameter(
                "Forecast steps must be at least 1".to_string(),
            ));
        }

        let mut history = self.history.clone();
        let mut predictions = Vec::with_capacity(steps);
        for _ in 0..steps {
            let next = self.predict_next(&history)?;
            history.push(next);
            predictions.push(next);
        }

        let dates = business_days_after(self.last_date, steps);
        Ok(ForecastResult::new(PriceSeries::new(
            "forecast",
            dates,
            predictions,
        )?))
    }

    fn name(&self) -> String {
        format!(
            "GBT(lags={}, roll={})",
            self.schema.lags, self.schema.rolling_window
        )
    }
}

/// Train on `series` and forecast the next `steps` business days recursively
pub fn fit_and_forecast(
    series: &PriceSeries,
    steps: usize,
    config: &LagFeatureConfig,
) -> Result<LagFeatureForecast> {
    let model = LagFeatureForecaster::new(*config).train(series)?;
    let (forecast, _) = model.forecast(steps)?.into_parts();
    Ok(LagFeatureForecast { forecast, model })
}

/// Hold out the last `steps` business days and score the recursive forecast on them
pub fn backtest(
    series: &PriceSeries,
    steps: usize,
    config: &LagFeatureConfig,
) -> Result<BacktestResult> {
    backtest::backtest(&LagFeatureForecaster::new(*config), series, steps)
}
