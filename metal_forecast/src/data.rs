//! Price series handling: loading, validation and business-day preparation

use crate::error::{ForecastError, Result};
use crate::utils::{
    business_day_on_or_after, business_day_on_or_before, business_day_range, is_business_day,
};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::ops::Range;
use std::path::Path;
use tracing::debug;

/// Column names tried, in order, before falling back to the first numeric column
pub const PREFERRED_VALUE_COLUMNS: [&str; 4] = ["Price", "Close", "Adj Close", "Adjusted Close"];

/// A named, date-indexed series of closing prices.
///
/// Dates are strictly increasing. Values may contain `NaN` for missing
/// observations until the series is prepared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    name: String,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl PriceSeries {
    /// Create a new series, validating lengths and date order
    pub fn new(name: impl Into<String>, dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ForecastError::DataError(format!(
                "Series has {} dates but {} values",
                dates.len(),
                values.len()
            )));
        }
        if let Some(pos) = dates.windows(2).position(|w| w[0] >= w[1]) {
            return Err(ForecastError::DataError(format!(
                "Dates must be strictly increasing, found {} followed by {}",
                dates[pos],
                dates[pos + 1]
            )));
        }
        Ok(Self {
            name: name.into(),
            dates,
            values,
        })
    }

    /// Create a series from `(date, value)` pairs in any order
    pub fn from_observations(
        name: impl Into<String>,
        mut observations: Vec<(NaiveDate, f64)>,
    ) -> Result<Self> {
        observations.sort_by_key(|(date, _)| *date);
        let (dates, values) = observations.into_iter().unzip();
        Self::new(name, dates, values)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn last_value(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Iterate over `(date, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    /// Same data under another name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Contiguous sub-series by position
    pub fn slice(&self, range: Range<usize>) -> Result<Self> {
        if range.start > range.end || range.end > self.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "Range {:?} is out of bounds for a series of length {}",
                range,
                self.len()
            )));
        }
        Ok(Self {
            name: self.name.clone(),
            dates: self.dates[range.clone()].to_vec(),
            values: self.values[range].to_vec(),
        })
    }

    /// Observations dated on or after `start`
    pub fn since(&self, start: NaiveDate) -> Self {
        let from = self.dates.partition_point(|d| *d < start);
        Self {
            name: self.name.clone(),
            dates: self.dates[from..].to_vec(),
            values: self.values[from..].to_vec(),
        }
    }

    /// Whether the series already sits on a gap-free business-day grid with finite values
    pub fn is_prepared(&self) -> bool {
        !self.is_empty()
            && self.values.iter().all(|v| v.is_finite())
            && self.dates.iter().all(|d| is_business_day(*d))
            && self
                .dates
                .windows(2)
                .all(|w| crate::utils::next_business_day(w[0]) == w[1])
    }

    /// Reindex onto the business-day grid spanning the series and forward-fill.
    ///
    /// The grid runs from the first business day on or after the first
    /// finite observation to the last business day on or before the last
    /// date. Each grid date takes the most recent finite observation at or
    /// before it. Preparing a prepared series returns it unchanged.
    pub fn prepare(&self) -> Result<Self> {
        let observations: Vec<(NaiveDate, f64)> =
            self.iter().filter(|(_, v)| v.is_finite()).collect();

        let Some(first) = observations.first() else {
            return Err(ForecastError::DataError(format!(
                "Series '{}' has no finite observations",
                self.name
            )));
        };

        let start = business_day_on_or_after(first.0);
        let end = business_day_on_or_before(self.dates[self.len() - 1]);
        let grid = business_day_range(start, end);
        if grid.is_empty() {
            return Err(ForecastError::DataError(format!(
                "Series '{}' does not cover a single business day",
                self.name
            )));
        }

        let mut values = Vec::with_capacity(grid.len());
        let mut cursor = 0;
        let mut carried = first.1;
        for date in &grid {
            while cursor < observations.len() && observations[cursor].0 <= *date {
                carried = observations[cursor].1;
                cursor += 1;
            }
            values.push(carried);
        }

        debug!(
            series = %self.name,
            raw = self.len(),
            prepared = grid.len(),
            "Prepared series on business-day grid"
        );

        Ok(Self {
            name: self.name.clone(),
            dates: grid,
            values,
        })
    }
}

/// Prepare a series-like input
pub fn prepare_series(series: &PriceSeries) -> Result<PriceSeries> {
    series.prepare()
}

/// Prepare a table-like input by selecting its value column first
pub fn prepare_table(df: &DataFrame) -> Result<PriceSeries> {
    DataLoader::from_dataframe(df)?.prepare()
}

/// Data loader for price tables
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a price series from a CSV file with a header row
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<PriceSeries> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        debug!(path = %path.display(), rows = df.height(), "Loaded price table");
        Self::from_dataframe(&df)
    }

    /// Build a price series from a table with a date column and at least one numeric column
    pub fn from_dataframe(df: &DataFrame) -> Result<PriceSeries> {
        let time_column = Self::detect_time_column(df)?;
        let value_column = Self::detect_value_column(df, &time_column)?;

        let dates = column_dates(df.column(&time_column)?)?;
        let values = column_values(df.column(&value_column)?)?;

        let observations = dates
            .into_iter()
            .zip(values)
            .filter_map(|(date, value)| date.map(|d| (d, value)))
            .collect();

        PriceSeries::from_observations(value_column, observations)
    }

    /// Detect the date column in a DataFrame
    fn detect_time_column(df: &DataFrame) -> Result<String> {
        for name in df.get_column_names() {
            let lower_name = name.to_lowercase();
            if lower_name.contains("date") || lower_name.contains("time") {
                return Ok(name.to_string());
            }
        }

        if let Some(first_col) = df.get_columns().first() {
            if first_col.dtype().is_temporal() {
                return Ok(first_col.name().to_string());
            }
        }

        Err(ForecastError::DataError(
            "No date column found in data".to_string(),
        ))
    }

    /// Detect the closing-price column, preferring well-known names
    fn detect_value_column(df: &DataFrame, time_column: &str) -> Result<String> {
        let numeric: Vec<&Series> = df
            .get_columns()
            .iter()
            .filter(|s| s.name() != time_column && s.dtype().is_numeric())
            .collect();

        for preferred in PREFERRED_VALUE_COLUMNS {
            if let Some(series) = numeric
                .iter()
                .find(|s| s.name().eq_ignore_ascii_case(preferred))
            {
                return Ok(series.name().to_string());
            }
        }

        numeric
            .first()
            .map(|s| s.name().to_string())
            .ok_or_else(|| ForecastError::DataError("No numeric price column found in data".to_string()))
    }
}

/// Dates from a Date, Datetime, epoch-millisecond or string column. Nulls stay `None`.
fn column_dates(column: &Series) -> Result<Vec<Option<NaiveDate>>> {
    let from_days = |days: i64| {
        NaiveDate::from_ymd_opt(1970, 1, 1).and_then(|epoch| epoch.checked_add_signed(Duration::days(days)))
    };

    match column.dtype() {
        DataType::Date => {
            let days = column.cast(&DataType::Int32)?;
            Ok(days
                .i32()?
                .into_iter()
                .map(|d| d.and_then(|d| from_days(d as i64)))
                .collect())
        }
        DataType::Datetime(unit, _) => {
            let per_day: i64 = match unit {
                TimeUnit::Nanoseconds => 86_400_000_000_000,
                TimeUnit::Microseconds => 86_400_000_000,
                TimeUnit::Milliseconds => 86_400_000,
            };
            let raw = column.cast(&DataType::Int64)?;
            Ok(raw
                .i64()?
                .into_iter()
                .map(|v| v.and_then(|v| from_days(v.div_euclid(per_day))))
                .collect())
        }
        DataType::Int64 => Ok(column
            .i64()?
            .into_iter()
            .map(|v| v.and_then(|v| from_days(v.div_euclid(86_400_000))))
            .collect()),
        DataType::Utf8 => column
            .utf8()?
            .into_iter()
            .map(|s| match s {
                None => Ok(None),
                Some(text) => parse_date(text).map(Some).ok_or_else(|| {
                    ForecastError::DataError(format!("Unparseable date '{}'", text))
                }),
            })
            .collect(),
        other => Err(ForecastError::DataError(format!(
            "Column '{}' of type {} cannot be read as dates",
            column.name(),
            other
        ))),
    }
}

/// Values as `f64`, nulls become `NaN`
fn column_values(column: &Series) -> Result<Vec<f64>> {
    let cast = column.cast(&DataType::Float64)?;
    Ok(cast
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// Parse the date part of common date and timestamp spellings
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.date());
        }
    }
    for format in ["%m/%d/%Y", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }
    // "2024-01-05 00:00:00-05:00" as written by market data exports
    text.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}
