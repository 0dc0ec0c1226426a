use metal_forecast::config::ForecastConfig;
use metal_forecast::models::{lag_features, sarimax};
use metal_forecast::source::{CsvPriceSource, FetchRequest, Metal, PriceSource};
use std::env;

/// Usage: backtest_metal <data-dir> [metal]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let data_dir = args.next().unwrap_or_else(|| "data".to_string());
    let metal: Metal = args.next().as_deref().unwrap_or("gold").parse()?;

    let source = CsvPriceSource::new(&data_dir);
    let prices = source.closing_prices(&FetchRequest::new(metal))?;
    println!("{}: {} closing prices from {}", metal, prices.len(), data_dir);

    let config = ForecastConfig::default();

    let seasonal = sarimax::backtest(&prices, config.backtest_steps, &config.sarimax)?;
    println!("Seasonal hold-out ({} days): {}", config.backtest_steps, seasonal.metrics);

    let lag = lag_features::backtest(&prices, config.backtest_steps, &config.lag_features)?;
    println!("Lag-feature hold-out ({} days): {}", config.backtest_steps, lag.metrics);

    let report = sarimax::rolling_backtest(
        &prices,
        config.rolling.steps,
        config.rolling.n_splits,
        &config.sarimax,
    )?;
    println!("\nRolling backtest:");
    println!("{:>5} {:>10} {:>8} {:>10} {:>8}", "fold", "train", "MAPE", "RMSE", "R²");
    for fold in &report.folds {
        println!(
            "{:>5} {:>10} {:>7.2}% {:>10.4} {:>8.4}",
            fold.fold,
            fold.train_size,
            fold.mape * 100.0,
            fold.rmse,
            fold.r2
        );
    }
    println!("Average MAPE: {:.2}%", report.mean_mape() * 100.0);

    Ok(())
}
