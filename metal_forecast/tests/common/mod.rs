#![allow(dead_code)]

use chrono::NaiveDate;
use metal_forecast::utils::business_days_after;
use metal_forecast::PriceSeries;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// Monday 6 January 2020
pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 6).unwrap()
}

/// `values` on consecutive business days starting at [`start_date`]
pub fn business_series(name: &str, values: Vec<f64>) -> PriceSeries {
    let mut dates = vec![start_date()];
    dates.extend(business_days_after(start_date(), values.len().saturating_sub(1)));
    PriceSeries::new(name, dates, values).unwrap()
}

/// Drifting level with a weekly cycle and random-walk noise
pub fn synthetic_metal(n: usize, seed: u64) -> PriceSeries {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 2.0).unwrap();
    let mut walk = 0.0;
    let values = (0..n)
        .map(|t| {
            walk += noise.sample(&mut rng);
            let season = 8.0 * (2.0 * std::f64::consts::PI * t as f64 / 5.0).sin();
            1800.0 + 0.4 * t as f64 + season + walk
        })
        .collect();
    business_series("Gold", values)
}

/// Gaussian random walk around a gold-like price level
pub fn random_walk(n: usize, seed: u64) -> PriceSeries {
    let mut rng = StdRng::seed_from_u64(seed);
    let step = Normal::new(0.2, 12.0).unwrap();
    let mut level = 1500.0;
    let values = (0..n)
        .map(|_| {
            level += step.sample(&mut rng);
            level
        })
        .collect();
    business_series("Gold", values)
}
