use chrono::NaiveDate;
use metal_forecast::source::{CsvPriceSource, FetchRequest, Metal, PriceSource};
use metal_forecast::ForecastError;
use rstest::rstest;
use std::fs;
use std::io::Write;
use tempfile::tempdir;

#[rstest]
#[case("gold", Metal::Gold)]
#[case("SILVER", Metal::Silver)]
#[case("HG=F", Metal::Copper)]
#[case("Platinum", Metal::Platinum)]
#[case("ali=f", Metal::Aluminum)]
fn test_metal_parsing(#[case] text: &str, #[case] expected: Metal) {
    assert_eq!(text.parse::<Metal>().unwrap(), expected);
}

#[test]
fn test_unknown_metal() {
    assert!(matches!(
        "palladium".parse::<Metal>(),
        Err(ForecastError::InvalidParameter(_))
    ));
}

#[test]
fn test_reads_ticker_file_and_drops_missing() {
    let dir = tempdir().unwrap();
    let mut file = fs::File::create(dir.path().join("GC=F.csv")).unwrap();
    writeln!(file, "Date,Open,Close").unwrap();
    writeln!(file, "2024-01-02,2060.0,2064.4").unwrap();
    writeln!(file, "2024-01-03,2064.0,").unwrap();
    writeln!(file, "2024-01-04,2042.0,2050.1").unwrap();
    drop(file);

    let source = CsvPriceSource::new(dir.path());
    let series = source.closing_prices(&FetchRequest::new(Metal::Gold)).unwrap();

    assert_eq!(series.name(), "Gold");
    assert_eq!(series.values(), &[2064.4, 2050.1]);
}

#[test]
fn test_falls_back_to_metal_name_and_trims_period() {
    let dir = tempdir().unwrap();
    let mut file = fs::File::create(dir.path().join("copper.csv")).unwrap();
    writeln!(file, "Date,Close").unwrap();
    writeln!(file, "2019-06-03,2.65").unwrap();
    writeln!(file, "2022-06-01,4.40").unwrap();
    writeln!(file, "2024-06-03,4.60").unwrap();
    drop(file);

    let source = CsvPriceSource::new(dir.path());
    let request = FetchRequest::new(Metal::Copper).with_period_years(3);
    let series = source.closing_prices(&request).unwrap();

    assert_eq!(series.len(), 2);
    assert_eq!(series.first_date(), NaiveDate::from_ymd_opt(2022, 6, 1));
}

#[test]
fn test_missing_file() {
    let dir = tempdir().unwrap();
    let source = CsvPriceSource::new(dir.path());
    let result = source.closing_prices(&FetchRequest::new(Metal::Platinum));
    assert!(matches!(result, Err(ForecastError::DataError(_))));
}
