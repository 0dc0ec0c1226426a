//! CSV export of forecasts and rolling backtest reports

use crate::backtest::RollingBacktestReport;
use crate::data::PriceSeries;
use crate::error::Result;
use crate::metrics::AccuracyMetrics;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Serialize)]
struct ForecastRow {
    date: String,
    price: f64,
    #[serde(rename = "MAPE")]
    mape: Option<f64>,
    #[serde(rename = "RMSE")]
    rmse: Option<f64>,
    #[serde(rename = "R2")]
    r2: Option<f64>,
}

#[derive(Debug, Serialize)]
struct FoldRow {
    fold: usize,
    train_size: usize,
    #[serde(rename = "MAPE")]
    mape: f64,
    #[serde(rename = "RMSE")]
    rmse: f64,
    #[serde(rename = "R2")]
    r2: f64,
}

/// Write `date,price,MAPE,RMSE,R2`, one row per forecast date.
///
/// The metric columns repeat the backtest scores on every row and are left
/// empty when no scores are given.
pub fn write_forecast_csv<W: Write>(
    writer: W,
    forecast: &PriceSeries,
    metrics: Option<&AccuracyMetrics>,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);

    for (date, price) in forecast.iter() {
        writer.serialize(ForecastRow {
            date: date.format(DATE_FORMAT).to_string(),
            price,
            mape: metrics.map(|m| m.mape),
            rmse: metrics.map(|m| m.rmse),
            r2: metrics.map(|m| m.r2),
        })?;
    }

    writer.flush()?;
    Ok(())
}

/// [`write_forecast_csv`] into a file, creating parent directories
pub fn export_forecast_csv<P: AsRef<Path>>(
    path: P,
    forecast: &PriceSeries,
    metrics: Option<&AccuracyMetrics>,
) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    write_forecast_csv(fs::File::create(path)?, forecast, metrics)
}

/// Write `fold,train_size,MAPE,RMSE,R2`, one row per fold
pub fn write_rolling_csv<W: Write>(writer: W, report: &RollingBacktestReport) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);

    for fold in &report.folds {
        writer.serialize(FoldRow {
            fold: fold.fold,
            train_size: fold.train_size,
            mape: fold.mape,
            rmse: fold.rmse,
            r2: fold.r2,
        })?;
    }

    writer.flush()?;
    Ok(())
}
