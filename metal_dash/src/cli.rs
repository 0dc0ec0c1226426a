//! CLI argument definitions and command handlers for metal-dash.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `history` | Most recent closing prices of a metal |
//! | `forecast` | Forecast with interval bounds and hold-out scores |
//! | `backtest` | Hold-out backtest of one model |
//! | `rolling` | Rolling-origin backtest of the seasonal model |
//!
//! # Examples
//!
//! ```bash
//! metal-dash --data-dir data forecast --metal gold --horizon 60 --trend linear
//! metal-dash rolling --metal copper --steps 20 --splits 5 --export folds.csv
//! ```

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use metal_forecast::backtest::RollingBacktestReport;
use metal_forecast::config::{ForecastConfig, Horizon, SarimaxConfig};
use metal_forecast::export::{export_forecast_csv, write_rolling_csv};
use metal_forecast::models::{lag_features, sarimax};
use metal_forecast::source::{CsvPriceSource, FetchRequest, Metal, PriceSource};
use metal_forecast::{AccuracyMetrics, IntervalTable, PriceSeries, TrendKind};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Metal price dashboard: history, forecasts and backtests
#[derive(Debug, Parser)]
#[command(name = "metal-dash", author, version, about = "Metal price forecasting dashboard")]
pub struct Cli {
    /// Directory holding `<TICKER>.csv` or `<metal>.csv` price files
    #[arg(long, global = true, default_value = "data")]
    pub data_dir: PathBuf,

    /// JSON file with model settings; defaults apply to anything left out
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the most recent closing prices
    History(HistoryArgs),
    /// Forecast future closing prices
    Forecast(ForecastArgs),
    /// Score a model on the most recent business days
    Backtest(BacktestArgs),
    /// Score the seasonal model on consecutive rolling-origin folds
    Rolling(RollingArgs),
}

/// Forecasting model family
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelArg {
    /// Seasonal ARIMA with optional trend regressors
    Sarimax,
    /// Gradient-boosted trees on lag features
    Lag,
}

#[derive(Debug, Args)]
pub struct SeriesArgs {
    /// Metal name or futures ticker
    #[arg(long, default_value = "gold")]
    pub metal: Metal,

    /// Trailing years of history to use
    #[arg(long, default_value_t = 5)]
    pub years: u32,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    #[command(flatten)]
    pub series: SeriesArgs,

    /// Number of trailing rows to show
    #[arg(long, default_value_t = 10)]
    pub tail: usize,
}

#[derive(Debug, Args)]
pub struct ForecastArgs {
    #[command(flatten)]
    pub series: SeriesArgs,

    #[arg(long, value_enum, default_value_t = ModelArg::Sarimax)]
    pub model: ModelArg,

    /// Forecast horizon in days: 30, 60 or 90
    #[arg(long, default_value = "30")]
    pub horizon: Horizon,

    /// Trend regressors for the seasonal model (none, linear, quadratic)
    #[arg(long)]
    pub trend: Option<TrendKind>,

    /// Write the forecast and backtest scores to this CSV file
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct BacktestArgs {
    #[command(flatten)]
    pub series: SeriesArgs,

    #[arg(long, value_enum, default_value_t = ModelArg::Sarimax)]
    pub model: ModelArg,

    /// Held-out business days, defaults to the configured backtest length
    #[arg(long)]
    pub steps: Option<usize>,

    #[arg(long)]
    pub trend: Option<TrendKind>,
}

#[derive(Debug, Args)]
pub struct RollingArgs {
    #[command(flatten)]
    pub series: SeriesArgs,

    /// Business days per fold
    #[arg(long)]
    pub steps: Option<usize>,

    /// Number of folds
    #[arg(long)]
    pub splits: Option<usize>,

    #[arg(long)]
    pub trend: Option<TrendKind>,

    /// Write the fold table to this CSV file
    #[arg(long)]
    pub export: Option<PathBuf>,
}

/// Price source and model settings shared by every command
#[derive(Debug, Clone)]
pub struct Context {
    pub source: CsvPriceSource,
    pub config: ForecastConfig,
}

impl Cli {
    pub fn context(&self) -> Result<Context> {
        let config = match &self.config {
            Some(path) => ForecastConfig::from_json_file(path)?,
            None => ForecastConfig::default(),
        };
        Ok(Context {
            source: CsvPriceSource::new(&self.data_dir),
            config,
        })
    }
}

impl Context {
    fn load(&self, args: &SeriesArgs) -> Result<PriceSeries> {
        let request = FetchRequest::new(args.metal).with_period_years(args.years);
        let prices = self.source.closing_prices(&request)?;
        info!(metal = %args.metal, rows = prices.len(), "Loaded closing prices");
        Ok(prices)
    }

    fn sarimax_config(&self, trend: Option<TrendKind>) -> SarimaxConfig {
        let mut config = self.config.sarimax;
        if let Some(trend) = trend {
            config.trend = trend;
        }
        config
    }
}

/// Trend regressors only exist in the seasonal model
fn check_trend(model: ModelArg, trend: Option<TrendKind>) -> Result<()> {
    if let (ModelArg::Lag, Some(trend)) = (model, trend) {
        bail!(
            "--trend {} applies to the sarimax model only, not to --model lag",
            trend
        );
    }
    Ok(())
}

pub fn cmd_history<W: Write>(ctx: &Context, args: &HistoryArgs, out: &mut W) -> Result<()> {
    let prices = ctx.load(&args.series)?;
    writeln!(
        out,
        "{} ({}) closing prices, {} rows",
        args.series.metal,
        args.series.metal.ticker(),
        prices.len()
    )?;

    let skip = prices.len().saturating_sub(args.tail);
    for (date, value) in prices.iter().skip(skip) {
        writeln!(out, "{}  {:>12.2}", date, value)?;
    }
    Ok(())
}

pub fn cmd_forecast<W: Write>(ctx: &Context, args: &ForecastArgs, out: &mut W) -> Result<()> {
    check_trend(args.model, args.trend)?;
    let prices = ctx.load(&args.series)?;
    let steps = args.horizon.days();
    let holdout = ctx.config.backtest_steps;

    let (forecast, metrics) = match args.model {
        ModelArg::Sarimax => {
            let config = ctx.sarimax_config(args.trend);
            let scores = sarimax::backtest(&prices, holdout, &config)?;
            let result = sarimax::fit_and_forecast(&prices, steps, &config)?;
            writeln!(
                out,
                "{} forecast for {}, {:.0}% interval",
                args.series.metal,
                args.horizon,
                result.intervals.level() * 100.0
            )?;
            write_forecast_table(out, &result.forecast, Some(&result.intervals))?;
            (result.forecast, scores.metrics)
        }
        ModelArg::Lag => {
            let config = ctx.config.lag_features;
            let scores = lag_features::backtest(&prices, holdout, &config)?;
            let result = lag_features::fit_and_forecast(&prices, steps, &config)?;
            writeln!(out, "{} forecast for {}", args.series.metal, args.horizon)?;
            write_forecast_table(out, &result.forecast, None)?;
            (result.forecast, scores.metrics)
        }
    };

    write_metrics(out, holdout, &metrics)?;
    if args.horizon.is_extended() {
        writeln!(
            out,
            "Note: forecasts beyond 30 days carry considerably wider uncertainty."
        )?;
    }

    if let Some(path) = &args.export {
        export_forecast_csv(path, &forecast, Some(&metrics))?;
        writeln!(out, "Exported forecast to {}", path.display())?;
    }
    Ok(())
}

pub fn cmd_backtest<W: Write>(ctx: &Context, args: &BacktestArgs, out: &mut W) -> Result<()> {
    check_trend(args.model, args.trend)?;
    let prices = ctx.load(&args.series)?;
    let steps = args.steps.unwrap_or(ctx.config.backtest_steps);

    let result = match args.model {
        ModelArg::Sarimax => sarimax::backtest(&prices, steps, &ctx.sarimax_config(args.trend))?,
        ModelArg::Lag => lag_features::backtest(&prices, steps, &ctx.config.lag_features)?,
    };

    writeln!(out, "{:<12} {:>12} {:>12}", "date", "actual", "forecast")?;
    for ((date, actual), (_, predicted)) in result.actual.iter().zip(result.forecast.iter()) {
        writeln!(out, "{:<12} {:>12.2} {:>12.2}", date, actual, predicted)?;
    }
    write_metrics(out, steps, &result.metrics)
}

pub fn cmd_rolling<W: Write>(ctx: &Context, args: &RollingArgs, out: &mut W) -> Result<()> {
    let prices = ctx.load(&args.series)?;
    let steps = args.steps.unwrap_or(ctx.config.rolling.steps);
    let n_splits = args.splits.unwrap_or(ctx.config.rolling.n_splits);

    let report = sarimax::rolling_backtest(&prices, steps, n_splits, &ctx.sarimax_config(args.trend))?;
    write_fold_table(out, &report)?;

    if let Some(path) = &args.export {
        write_rolling_csv(File::create(path)?, &report)?;
        writeln!(out, "Exported folds to {}", path.display())?;
    }
    Ok(())
}

fn write_forecast_table<W: Write>(
    out: &mut W,
    forecast: &PriceSeries,
    intervals: Option<&IntervalTable>,
) -> Result<()> {
    writeln!(out, "{:<12} {:>12} {:>12} {:>12}", "date", "forecast", "lower", "upper")?;
    for (i, (date, value)) in forecast.iter().enumerate() {
        match intervals {
            Some(table) => writeln!(
                out,
                "{:<12} {:>12.2} {:>12.2} {:>12.2}",
                date,
                value,
                table.lower()[i],
                table.upper()[i]
            )?,
            None => writeln!(out, "{:<12} {:>12.2} {:>12} {:>12}", date, value, "-", "-")?,
        }
    }
    Ok(())
}

fn write_metrics<W: Write>(out: &mut W, holdout: usize, metrics: &AccuracyMetrics) -> Result<()> {
    writeln!(out, "Backtest over the last {} business days: {}", holdout, metrics)?;
    Ok(())
}

fn write_fold_table<W: Write>(out: &mut W, report: &RollingBacktestReport) -> Result<()> {
    writeln!(out, "{:>5} {:>10} {:>8} {:>12} {:>8}", "fold", "train", "MAPE", "RMSE", "R²")?;
    for fold in &report.folds {
        writeln!(
            out,
            "{:>5} {:>10} {:>7.2}% {:>12.4} {:>8.4}",
            fold.fold,
            fold.train_size,
            fold.mape * 100.0,
            fold.rmse,
            fold.r2
        )?;
    }
    writeln!(out, "Average MAPE: {:.2}%", report.mean_mape() * 100.0)?;
    Ok(())
}
