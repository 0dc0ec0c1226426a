//! Command-line dashboard over `metal_forecast`
//!
//! Reads closing prices from a directory of CSV files, then shows history,
//! forecasts with interval bounds, and hold-out or rolling backtest scores.

pub mod cli;
