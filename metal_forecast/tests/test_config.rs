use metal_forecast::config::{ForecastConfig, Horizon};
use metal_forecast::{ForecastError, TrendKind};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_defaults() {
    let config = ForecastConfig::default();

    assert_eq!((config.sarimax.order.p, config.sarimax.order.d, config.sarimax.order.q), (2, 1, 2));
    assert_eq!(config.sarimax.seasonal_order.period, 12);
    assert_eq!(config.sarimax.trend, TrendKind::None);
    assert_eq!(config.sarimax.interval_level, 0.95);
    assert_eq!(config.lag_features.lags, 10);
    assert_eq!(config.lag_features.rolling_window, 5);
    assert_eq!(config.lag_features.boosting.n_estimators, 200);
    assert_eq!(config.lag_features.boosting.seed, 42);
    assert_eq!(config.rolling.steps, 20);
    assert_eq!(config.rolling.n_splits, 5);
    assert_eq!(config.backtest_steps, 30);
}

#[test]
fn test_partial_json_keeps_defaults() {
    let config = ForecastConfig::from_json_str(
        r#"{
            "sarimax": {
                "order": { "p": 1, "d": 1, "q": 1 },
                "trend": "quadratic"
            },
            "lag_features": { "lags": 5, "boosting": { "max_depth": 4 } }
        }"#,
    )
    .unwrap();

    assert_eq!(config.sarimax.order.p, 1);
    assert_eq!(config.sarimax.seasonal_order.period, 12);
    assert_eq!(config.sarimax.trend, TrendKind::Quadratic);
    assert_eq!(config.lag_features.lags, 5);
    assert_eq!(config.lag_features.rolling_window, 5);
    assert_eq!(config.lag_features.boosting.max_depth, 4);
    assert_eq!(config.lag_features.boosting.learning_rate, 0.05);
}

#[test]
fn test_unknown_field_rejected() {
    let result = ForecastConfig::from_json_str(r#"{ "sarimax": { "orders": {} } }"#);
    assert!(matches!(result, Err(ForecastError::ConfigError(_))));
}

#[test]
fn test_invalid_interval_level_rejected() {
    let result = ForecastConfig::from_json_str(r#"{ "sarimax": { "interval_level": 1.5 } }"#);
    assert!(matches!(result, Err(ForecastError::InvalidParameter(_))));
}

#[test]
fn test_oversized_seasonal_period_rejected() {
    let result = ForecastConfig::from_json_str(
        r#"{ "sarimax": { "seasonal_order": { "p": 1, "d": 1, "q": 1, "period": 18446744073709551615 } } }"#,
    );
    assert!(matches!(result, Err(ForecastError::InvalidParameter(_))));

    let yearly = ForecastConfig::from_json_str(
        r#"{ "sarimax": { "seasonal_order": { "p": 0, "d": 1, "q": 0, "period": 366 } } }"#,
    );
    assert!(yearly.is_ok());
}

#[test]
fn test_from_json_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, r#"{{ "rolling": {{ "steps": 10, "n_splits": 3 }} }}"#).unwrap();

    let config = ForecastConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.rolling.steps, 10);
    assert_eq!(config.rolling.n_splits, 3);

    assert!(matches!(
        ForecastConfig::from_json_file("missing-config.json"),
        Err(ForecastError::ConfigError(_))
    ));
}

#[rstest]
#[case(30, true)]
#[case(60, true)]
#[case(90, true)]
#[case(0, false)]
#[case(45, false)]
#[case(120, false)]
fn test_horizon_values(#[case] days: usize, #[case] valid: bool) {
    assert_eq!(Horizon::new(days).is_ok(), valid);
}

#[test]
fn test_horizon_parsing() {
    let horizon: Horizon = "60".parse().unwrap();
    assert_eq!(horizon.days(), 60);
    assert!(horizon.is_extended());
    assert!(!Horizon::default().is_extended());
    assert!("sixty".parse::<Horizon>().is_err());
}
