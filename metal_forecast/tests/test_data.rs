mod common;

use chrono::NaiveDate;
use metal_forecast::data::{prepare_table, DataLoader, PriceSeries};
use metal_forecast::utils::is_business_day;
use metal_forecast::ForecastError;
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_data_loader_from_csv() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Date,Open,High,Low,Close,Volume").unwrap();
    writeln!(file, "2024-01-02,2060.0,2070.0,2050.0,2064.4,1000").unwrap();
    writeln!(file, "2024-01-03,2064.0,2066.0,2035.0,2042.3,1200").unwrap();
    writeln!(file, "2024-01-04,2042.0,2055.0,2040.0,2050.1,1500").unwrap();

    let series = DataLoader::from_csv(file.path()).unwrap();

    assert_eq!(series.name(), "Close");
    assert_eq!(series.len(), 3);
    assert_eq!(series.values(), &[2064.4, 2042.3, 2050.1]);
    assert_eq!(series.first_date(), Some(date(2024, 1, 2)));
}

#[test]
fn test_data_loader_error_handling() {
    let result = DataLoader::from_csv("nonexistent_file.csv");
    assert!(matches!(result, Err(ForecastError::IoError(_))));

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "invalid,csv,format").unwrap();
    let result = DataLoader::from_csv(file.path());
    assert!(result.is_err());
}

#[test]
fn test_prepare_table_prefers_named_price_column() {
    let df = DataFrame::new(vec![
        Series::new("Date", &["2024-01-02", "2024-01-03", "2024-01-05"]),
        Series::new("Volume", &[10.0, 11.0, 12.0]),
        Series::new("Adj Close", &[25.0, 25.5, 26.0]),
    ])
    .unwrap();

    let prepared = prepare_table(&df).unwrap();
    assert_eq!(prepared.name(), "Adj Close");
    assert_eq!(
        prepared.dates(),
        &[date(2024, 1, 2), date(2024, 1, 3), date(2024, 1, 4), date(2024, 1, 5)]
    );
    assert_eq!(prepared.values(), &[25.0, 25.5, 25.5, 26.0]);
}

#[test]
fn test_prepare_table_falls_back_to_first_numeric_column() {
    let df = DataFrame::new(vec![
        Series::new("timestamp", &["2024-01-02 00:00:00", "2024-01-03 00:00:00"]),
        Series::new("ticker", &["HG=F", "HG=F"]),
        Series::new("settle", &[3.85, 3.91]),
    ])
    .unwrap();

    let prepared = prepare_table(&df).unwrap();
    assert_eq!(prepared.name(), "settle");
    assert_eq!(prepared.values(), &[3.85, 3.91]);
}

#[test]
fn test_prepare_table_without_numeric_column() {
    let df = DataFrame::new(vec![
        Series::new("Date", &["2024-01-02", "2024-01-03"]),
        Series::new("ticker", &["GC=F", "GC=F"]),
    ])
    .unwrap();

    assert!(matches!(prepare_table(&df), Err(ForecastError::DataError(_))));
}

#[test]
fn test_prepare_is_idempotent() {
    let raw = PriceSeries::new(
        "Silver",
        vec![
            date(2024, 1, 3),
            date(2024, 1, 6),
            date(2024, 1, 10),
            date(2024, 1, 11),
            date(2024, 1, 15),
        ],
        vec![23.1, 23.4, f64::NAN, 22.9, 23.0],
    )
    .unwrap();

    let once = raw.prepare().unwrap();
    let twice = once.prepare().unwrap();

    assert_eq!(once, twice);
    assert!(once.dates().iter().all(|d| is_business_day(*d)));
    assert!(once.values().iter().all(|v| v.is_finite()));
}

#[test]
fn test_prepare_leading_missing_values_are_dropped() {
    let raw = PriceSeries::new(
        "Copper",
        vec![date(2024, 1, 2), date(2024, 1, 3), date(2024, 1, 4)],
        vec![f64::NAN, 3.9, 3.95],
    )
    .unwrap();

    let prepared = raw.prepare().unwrap();
    assert_eq!(prepared.first_date(), Some(date(2024, 1, 3)));
    assert_eq!(prepared.values(), &[3.9, 3.95]);
}

#[test]
fn test_prepare_on_clean_business_series_is_unchanged() {
    let series = common::synthetic_metal(40, 3);
    assert!(series.is_prepared());
    assert_eq!(series.prepare().unwrap(), series);
}

#[test]
fn test_slice_bounds() {
    let series = common::business_series("Gold", vec![1.0, 2.0, 3.0]);
    assert_eq!(series.slice(1..3).unwrap().values(), &[2.0, 3.0]);
    assert!(matches!(
        series.slice(2..5),
        Err(ForecastError::InvalidParameter(_))
    ));
}
