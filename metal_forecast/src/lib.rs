//! # Metal Forecast
//!
//! Forecasting and backtesting of commodity metal closing prices.
//!
//! ## Features
//!
//! - Business-day preparation of raw closing-price series (forward-filled grid)
//! - Seasonal ARIMA forecasts with optional linear or quadratic trend regressors
//!   and interval bounds
//! - Gradient-boosted trees over lag and rolling-mean features with recursive
//!   multi-step prediction
//! - Hold-out and rolling-origin backtests scored with MAPE, RMSE and R²
//! - CSV loading through polars and CSV export of forecasts and fold reports
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use metal_forecast::config::SarimaxConfig;
//! use metal_forecast::models::sarimax;
//! use metal_forecast::source::{CsvPriceSource, FetchRequest, Metal, PriceSource};
//!
//! fn main() -> metal_forecast::Result<()> {
//!     let source = CsvPriceSource::new("data");
//!     let prices = source.closing_prices(&FetchRequest::new(Metal::Gold))?;
//!
//!     let config = SarimaxConfig::default();
//!     let result = sarimax::fit_and_forecast(&prices, 30, &config)?;
//!     for (date, lower, upper) in result.intervals.rows() {
//!         println!("{}: [{:.2}, {:.2}]", date, lower, upper);
//!     }
//!
//!     let scores = sarimax::backtest(&prices, 30, &config)?;
//!     println!("{}", scores.metrics);
//!     Ok(())
//! }
//! ```

pub mod backtest;
pub mod config;
pub mod data;
pub mod error;
pub mod exog;
pub mod export;
pub mod metrics;
pub mod models;
pub mod source;
pub mod utils;

pub use backtest::{BacktestResult, FoldMetrics, RollingBacktestReport};
pub use config::{
    ArimaOrder, BoostingParams, ForecastConfig, Horizon, LagFeatureConfig, RollingConfig,
    SarimaxConfig, SeasonalOrder,
};
pub use data::{prepare_series, prepare_table, DataLoader, PriceSeries};
pub use error::{ForecastError, Result};
pub use exog::{build_trend_regressors, TrendKind, TrendRegressors};
pub use metrics::AccuracyMetrics;
pub use models::lag_features::{LagFeatureForecast, LagFeatureModel, LagFeatureSchema};
pub use models::sarimax::SeasonalForecast;
pub use models::{ForecastModel, ForecastResult, IntervalTable, TrainedForecastModel};
pub use source::{CsvPriceSource, FetchRequest, Metal, PriceSource};
