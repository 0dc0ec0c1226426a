//! Forecasting models for metal price series

use crate::data::PriceSeries;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Lower and upper forecast bounds indexed by date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalTable {
    dates: Vec<NaiveDate>,
    lower: Vec<f64>,
    upper: Vec<f64>,
    /// Nominal coverage, e.g. 0.95
    level: f64,
}

impl IntervalTable {
    pub const COLUMNS: [&'static str; 2] = ["lower", "upper"];

    pub fn new(dates: Vec<NaiveDate>, lower: Vec<f64>, upper: Vec<f64>, level: f64) -> Result<Self> {
        if dates.len() != lower.len() || dates.len() != upper.len() {
            return Err(ForecastError::DataError(format!(
                "Interval table has {} dates, {} lower and {} upper bounds",
                dates.len(),
                lower.len(),
                upper.len()
            )));
        }
        Ok(Self {
            dates,
            lower,
            upper,
            level,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn n_rows(&self) -> usize {
        self.dates.len()
    }

    pub fn n_columns(&self) -> usize {
        Self::COLUMNS.len()
    }

    /// Iterate over `(date, lower, upper)` rows
    pub fn rows(&self) -> impl Iterator<Item = (NaiveDate, f64, f64)> + '_ {
        self.dates
            .iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .map(|(d, (l, u))| (*d, *l, *u))
    }
}

/// Forecast result containing predicted values
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    forecast: PriceSeries,
    intervals: Option<IntervalTable>,
}

impl ForecastResult {
    /// Create a new forecast result without intervals
    pub fn new(forecast: PriceSeries) -> Self {
        Self {
            forecast,
            intervals: None,
        }
    }

    /// Create a new forecast result with intervals on the same dates
    pub fn new_with_intervals(forecast: PriceSeries, intervals: IntervalTable) -> Result<Self> {
        if forecast.dates() != intervals.dates() {
            return Err(ForecastError::AlignmentError(
                "Interval dates do not match forecast dates".to_string(),
            ));
        }
        Ok(Self {
            forecast,
            intervals: Some(intervals),
        })
    }

    pub fn forecast(&self) -> &PriceSeries {
        &self.forecast
    }

    pub fn intervals(&self) -> Option<&IntervalTable> {
        self.intervals.as_ref()
    }

    /// Number of periods forecasted
    pub fn horizons(&self) -> usize {
        self.forecast.len()
    }

    pub fn into_parts(self) -> (PriceSeries, Option<IntervalTable>) {
        (self.forecast, self.intervals)
    }
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug {
    /// Forecast the `steps` business days following the training series
    fn forecast(&self, steps: usize) -> Result<ForecastResult>;

    /// Name of the model
    fn name(&self) -> String;
}

/// Forecast model that can be trained on a price series
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Prepare `series` and estimate the model on it
    fn train(&self, series: &PriceSeries) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> String;
}

pub mod lag_features;
pub mod sarimax;
