use chrono::NaiveDate;
use metal_forecast::config::{ArimaOrder, LagFeatureConfig, SarimaxConfig, SeasonalOrder};
use metal_forecast::models::{lag_features, sarimax};
use metal_forecast::utils::business_days_after;
use metal_forecast::{PriceSeries, TrendKind};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Metal Forecast: Basic Forecasting Example");
    println!("=========================================\n");

    let prices = sample_gold_prices(500)?;
    println!(
        "Sample data created: {} business days from {} to {}\n",
        prices.len(),
        prices.first_date().map(|d| d.to_string()).unwrap_or_default(),
        prices.last_date().map(|d| d.to_string()).unwrap_or_default()
    );

    let config = SarimaxConfig::new(
        ArimaOrder::new(1, 1, 1),
        SeasonalOrder::new(0, 1, 1, 5),
        TrendKind::Linear,
    );
    let seasonal = sarimax::fit_and_forecast(&prices, 30, &config)?;

    println!("Seasonal forecast with 95% intervals (every 5th day):");
    for ((date, point), (_, lower, upper)) in seasonal
        .forecast
        .iter()
        .zip(seasonal.intervals.rows())
        .step_by(5)
    {
        println!("  {}: {:.2} ({:.2}, {:.2})", date, point, lower, upper);
    }

    let lag = lag_features::fit_and_forecast(&prices, 30, &LagFeatureConfig::default())?;
    println!("\nGradient-boosted forecast (every 5th day):");
    for (date, point) in lag.forecast.iter().step_by(5) {
        println!("  {}: {:.2}", date, point);
    }

    let importances = lag.model.booster().feature_importances();
    println!("\nFeature importances:");
    for (name, weight) in lag.model.schema().column_names().iter().zip(importances) {
        println!("  {:<12} {:.3}", name, weight);
    }

    Ok(())
}

fn sample_gold_prices(n: usize) -> Result<PriceSeries, Box<dyn std::error::Error>> {
    let start = NaiveDate::from_ymd_opt(2022, 1, 3).ok_or("invalid start date")?;
    let mut dates = vec![start];
    dates.extend(business_days_after(start, n - 1));

    let mut rng = StdRng::seed_from_u64(7);
    let noise = Normal::new(0.0, 6.0)?;
    let mut level = 1800.0;
    let values = (0..n)
        .map(|t| {
            level += 0.3 + noise.sample(&mut rng);
            level + 12.0 * (2.0 * std::f64::consts::PI * t as f64 / 5.0).sin()
        })
        .collect();

    Ok(PriceSeries::new("Gold", dates, values)?)
}
