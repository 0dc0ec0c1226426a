use clap::Parser;
use metal_dash::cli::{cmd_backtest, cmd_forecast, cmd_history, cmd_rolling, Cli, Commands};
use metal_forecast::utils::business_days_after;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::{tempdir, TempDir};

const WEEKLY_CONFIG: &str = r#"{
    "sarimax": {
        "order": { "p": 1, "d": 1, "q": 1 },
        "seasonal_order": { "p": 0, "d": 1, "q": 1, "period": 5 }
    },
    "rolling": { "steps": 20, "n_splits": 3 }
}"#;

fn write_prices(dir: &Path, file_name: &str, n: usize) {
    let start = chrono::NaiveDate::from_ymd_opt(2021, 3, 1).unwrap();
    let mut dates = vec![start];
    dates.extend(business_days_after(start, n - 1));

    let mut rng = StdRng::seed_from_u64(99);
    let noise = Normal::new(0.0, 0.05).unwrap();
    let mut level = 25.0;

    let mut file = fs::File::create(dir.join(file_name)).unwrap();
    writeln!(file, "Date,Open,Close").unwrap();
    for (t, date) in dates.iter().enumerate() {
        level += 0.01 + noise.sample(&mut rng);
        let close = level + 0.2 * (2.0 * std::f64::consts::PI * t as f64 / 5.0).sin();
        writeln!(file, "{},{:.4},{:.4}", date, close - 0.1, close).unwrap();
    }
}

fn setup() -> TempDir {
    let dir = tempdir().unwrap();
    write_prices(dir.path(), "SI=F.csv", 300);
    fs::write(dir.path().join("config.json"), WEEKLY_CONFIG).unwrap();
    dir
}

fn parse(dir: &Path, args: &[&str]) -> Cli {
    let data_dir = dir.to_str().unwrap().to_string();
    let config = dir.join("config.json").to_str().unwrap().to_string();
    let mut argv = vec![
        "metal-dash".to_string(),
        "--data-dir".to_string(),
        data_dir,
        "--config".to_string(),
        config,
    ];
    argv.extend(args.iter().map(|a| a.to_string()));
    Cli::try_parse_from(argv).unwrap()
}

#[test]
fn test_history_shows_tail() {
    let dir = setup();
    let cli = parse(dir.path(), &["history", "--metal", "silver", "--tail", "5"]);
    let ctx = cli.context().unwrap();

    let mut out = Vec::new();
    match &cli.command {
        Commands::History(args) => cmd_history(&ctx, args, &mut out).unwrap(),
        other => panic!("unexpected command {:?}", other),
    }

    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("Silver (SI=F) closing prices, 300 rows"));
    assert_eq!(text.lines().count(), 6);
}

#[test]
fn test_forecast_with_export() {
    let dir = setup();
    let export = dir.path().join("out").join("silver.csv");
    let cli = parse(
        dir.path(),
        &[
            "forecast",
            "--metal",
            "silver",
            "--horizon",
            "60",
            "--trend",
            "linear",
            "--export",
            export.to_str().unwrap(),
        ],
    );
    let ctx = cli.context().unwrap();

    let mut out = Vec::new();
    match &cli.command {
        Commands::Forecast(args) => cmd_forecast(&ctx, args, &mut out).unwrap(),
        other => panic!("unexpected command {:?}", other),
    }

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("95% interval"));
    assert!(text.contains("Backtest over the last 30 business days"));
    assert!(text.contains("wider uncertainty"));

    let exported = fs::read_to_string(&export).unwrap();
    assert!(exported.starts_with("date,price,MAPE,RMSE,R2\n"));
    assert_eq!(exported.lines().count(), 61);
}

#[test]
fn test_lag_backtest() {
    let dir = setup();
    let cli = parse(
        dir.path(),
        &["backtest", "--metal", "SI=F", "--model", "lag", "--steps", "15"],
    );
    let ctx = cli.context().unwrap();

    let mut out = Vec::new();
    match &cli.command {
        Commands::Backtest(args) => cmd_backtest(&ctx, args, &mut out).unwrap(),
        other => panic!("unexpected command {:?}", other),
    }

    let text = String::from_utf8(out).unwrap();
    // header, 15 rows, metrics
    assert_eq!(text.lines().count(), 17);
    assert!(text.contains("MAPE"));
}

#[test]
fn test_rolling_uses_configured_folds() {
    let dir = setup();
    let export = dir.path().join("folds.csv");
    let cli = parse(
        dir.path(),
        &["rolling", "--metal", "silver", "--export", export.to_str().unwrap()],
    );
    let ctx = cli.context().unwrap();

    let mut out = Vec::new();
    match &cli.command {
        Commands::Rolling(args) => cmd_rolling(&ctx, args, &mut out).unwrap(),
        other => panic!("unexpected command {:?}", other),
    }

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Average MAPE"));

    let folds = fs::read_to_string(&export).unwrap();
    assert_eq!(folds.lines().count(), 4);
    assert!(folds.lines().nth(1).unwrap().starts_with("1,240,"));
}

#[test]
fn test_trend_with_lag_model_is_rejected() {
    let dir = setup();
    let cli = parse(
        dir.path(),
        &["forecast", "--metal", "silver", "--model", "lag", "--trend", "linear"],
    );
    let ctx = cli.context().unwrap();

    let mut out = Vec::new();
    let result = match &cli.command {
        Commands::Forecast(args) => cmd_forecast(&ctx, args, &mut out),
        other => panic!("unexpected command {:?}", other),
    };
    let message = result.unwrap_err().to_string();
    assert!(message.contains("sarimax model only"));
    assert!(out.is_empty());
}

#[test]
fn test_missing_data_is_reported() {
    let dir = setup();
    let cli = parse(dir.path(), &["history", "--metal", "gold"]);
    let ctx = cli.context().unwrap();

    let mut out = Vec::new();
    let result = match &cli.command {
        Commands::History(args) => cmd_history(&ctx, args, &mut out),
        other => panic!("unexpected command {:?}", other),
    };
    let message = result.unwrap_err().to_string();
    assert!(message.contains("No price file for Gold"));
}
