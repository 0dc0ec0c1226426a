//! Seasonal ARIMA with optional trend regressors

use crate::backtest::{self, BacktestResult, RollingBacktestReport};
use crate::config::SarimaxConfig;
use crate::data::PriceSeries;
use crate::error::{ForecastError, Result};
use crate::exog::{build_trend_regressors, trend_matrix, TrendKind};
use crate::models::{ForecastModel, ForecastResult, IntervalTable, TrainedForecastModel};
use crate::utils::business_days_after;
use chrono::NaiveDate;
use forecast_math::sarimax::{SarimaxEstimator, SarimaxFit};
use tracing::{debug, info};

/// Seasonal forecaster configured with orders, period and trend
#[derive(Debug, Clone)]
pub struct SeasonalForecaster {
    config: SarimaxConfig,
}

/// Seasonal model estimated on a prepared series
#[derive(Debug, Clone)]
pub struct TrainedSeasonalModel {
    name: String,
    fit: SarimaxFit,
    trend: TrendKind,
    level: f64,
    train_len: usize,
    last_date: NaiveDate,
}

/// Point forecast with its interval table
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalForecast {
    pub forecast: PriceSeries,
    pub intervals: IntervalTable,
}

impl SeasonalForecaster {
    pub fn new(config: SarimaxConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SarimaxConfig {
        &self.config
    }
}

impl ForecastModel for SeasonalForecaster {
    type Trained = TrainedSeasonalModel;

    fn train(&self, series: &PriceSeries) -> Result<Self::Trained> {
        self.config.validate()?;
        let prepared = series.prepare()?;
        let spec = self.config.spec();
        let exog = trend_matrix(self.config.trend, 0..prepared.len());

        let stage = format!(
            "fitting {} with {} trend on '{}' ({} observations)",
            spec,
            self.config.trend,
            prepared.name(),
            prepared.len()
        );
        debug!("{}", stage);

        let fit = SarimaxEstimator::new(spec)
            .with_settings(self.config.estimator)
            .fit(prepared.values(), exog.as_ref().map(|x| x.view()))
            .map_err(|e| ForecastError::estimation(stage, e))?;

        info!(
            model = %spec,
            iterations = fit.iterations(),
            sigma2 = fit.sigma2(),
            aic = fit.aic(),
            "Seasonal model estimated"
        );

        let last_date = prepared
            .last_date()
            .ok_or_else(|| ForecastError::DataError("Prepared series is empty".to_string()))?;

        Ok(TrainedSeasonalModel {
            name: self.name(),
            fit,
            trend: self.config.trend,
            level: self.config.interval_level,
            train_len: prepared.len(),
            last_date,
        })
    }

    fn name(&self) -> String {
        match self.config.trend {
            TrendKind::None => self.config.spec().to_string(),
            trend => format!("{} + {} trend", self.config.spec(), trend),
        }
    }
}

impl TrainedSeasonalModel {
    /// The underlying estimated model
    pub fn fit(&self) -> &SarimaxFit {
        &self.fit
    }

    pub fn last_date(&self) -> NaiveDate {
        self.last_date
    }
}

impl TrainedForecastModel for TrainedSeasonalModel {
    fn forecast(&self, steps: usize) -> Result<ForecastResult> {
        if steps == 0 {
            return Err(ForecastError::InvalidParameter(
                "Forecast steps must be at least 1".to_string(),
            ));
        }

        let regressors = build_trend_regressors(self.trend, self.train_len, steps);
        let output = self
            .fit
            .forecast(
                steps,
                regressors.as_ref().map(|r| r.forecast.view()),
                self.level,
            )
            .map_err(|e| ForecastError::estimation(format!("forecasting with {}", self.name), e))?;

        let dates = business_days_after(self.last_date, steps);
        let forecast = PriceSeries::new("forecast", dates.clone(), output.mean)?;
        let intervals = IntervalTable::new(dates, output.lower, output.upper, output.level)?;
        ForecastResult::new_with_intervals(forecast, intervals)
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Fit the seasonal model on `series` and forecast the next `steps` business days
pub fn fit_and_forecast(
    series: &PriceSeries,
    steps: usize,
    config: &SarimaxConfig,
) -> Result<SeasonalForecast> {
    let trained = SeasonalForecaster::new(*config).train(series)?;
    let (forecast, intervals) = trained.forecast(steps)?.into_parts();
    let intervals = intervals.ok_or_else(|| {
        ForecastError::estimation("forecasting", "seasonal model returned no intervals")
    })?;
    Ok(SeasonalForecast {
        forecast,
        intervals,
    })
}

/// Hold out the last `steps` business days and score the seasonal forecast on them
pub fn backtest(series: &PriceSeries, steps: usize, config: &SarimaxConfig) -> Result<BacktestResult> {
    backtest::backtest(&SeasonalForecaster::new(*config), series, steps)
}

/// Score the seasonal model on `n_splits` consecutive rolling-origin folds
pub fn rolling_backtest(
    series: &PriceSeries,
    steps: usize,
    n_splits: usize,
    config: &SarimaxConfig,
) -> Result<RollingBacktestReport> {
    backtest::rolling_backtest(&SeasonalForecaster::new(*config), series, steps, n_splits)
}
