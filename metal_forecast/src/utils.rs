//! Business-day calendar and series splitting helpers

use crate::data::PriceSeries;
use crate::error::{ForecastError, Result};
use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Monday through Friday. Exchange holidays are not modelled.
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The first business day strictly after `date`
pub fn next_business_day(date: NaiveDate) -> NaiveDate {
    let mut current = date + Duration::days(1);
    while !is_business_day(current) {
        current = current + Duration::days(1);
    }
    current
}

/// `date` itself when it is a business day, otherwise the following Monday
pub fn business_day_on_or_after(date: NaiveDate) -> NaiveDate {
    if is_business_day(date) {
        date
    } else {
        next_business_day(date)
    }
}

/// `date` itself when it is a business day, otherwise the preceding Friday
pub fn business_day_on_or_before(date: NaiveDate) -> NaiveDate {
    let mut current = date;
    while !is_business_day(current) {
        current = current - Duration::days(1);
    }
    current
}

/// The `count` consecutive business days following `last`
pub fn business_days_after(last: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(count);
    let mut current = last;
    for _ in 0..count {
        current = next_business_day(current);
        dates.push(current);
    }
    dates
}

/// All business days in `[start, end]`, empty when `start > end`
pub fn business_day_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = business_day_on_or_after(start);
    while current <= end {
        dates.push(current);
        current = next_business_day(current);
    }
    dates
}

/// Split a series into a training prefix and the trailing `test_size` observations
pub fn train_test_split(series: &PriceSeries, test_size: usize) -> Result<(PriceSeries, PriceSeries)> {
    if test_size == 0 || test_size >= series.len() {
        return Err(ForecastError::InvalidParameter(format!(
            "Test size must be between 1 and {}, got {}",
            series.len().saturating_sub(1),
            test_size
        )));
    }
    let split = series.len() - test_size;
    Ok((series.slice(0..split)?, series.slice(split..series.len())?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_next_business_day_skips_weekend() {
        // 2024-01-05 is a Friday
        assert_eq!(next_business_day(date(2024, 1, 5)), date(2024, 1, 8));
        assert_eq!(next_business_day(date(2024, 1, 6)), date(2024, 1, 8));
        assert_eq!(next_business_day(date(2024, 1, 8)), date(2024, 1, 9));
    }

    #[test]
    fn test_snapping_to_business_days() {
        assert_eq!(business_day_on_or_after(date(2024, 1, 6)), date(2024, 1, 8));
        assert_eq!(business_day_on_or_before(date(2024, 1, 7)), date(2024, 1, 5));
        assert_eq!(business_day_on_or_before(date(2024, 1, 3)), date(2024, 1, 3));
    }

    #[test]
    fn test_business_days_after() {
        let dates = business_days_after(date(2024, 1, 4), 3);
        assert_eq!(dates, vec![date(2024, 1, 5), date(2024, 1, 8), date(2024, 1, 9)]);
        assert!(business_days_after(date(2024, 1, 4), 0).is_empty());
    }

    #[test]
    fn test_business_day_range() {
        let dates = business_day_range(date(2024, 1, 6), date(2024, 1, 16));
        assert_eq!(dates.len(), 7);
        assert_eq!(dates[0], date(2024, 1, 8));
        assert_eq!(*dates.last().unwrap(), date(2024, 1, 16));
        assert!(dates.iter().all(|d| is_business_day(*d)));
        assert!(business_day_range(date(2024, 1, 6), date(2024, 1, 7)).is_empty());
    }
}
