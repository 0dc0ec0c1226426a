//! # Metals Predictor
//!
//! Umbrella crate for the metals forecasting workspace.
//!
//! - [`forecast_math`]: estimation backends (simplex search, seasonal ARIMA
//!   with regressors, gradient-boosted trees)
//! - [`metal_forecast`]: price series preparation, forecasters, backtests,
//!   data sources and export
//!
//! ## Example
//!
//! ```
//! use metals_predictor::prelude::*;
//!
//! let horizon = Horizon::new(60).unwrap();
//! assert!(horizon.is_extended());
//! assert_eq!(Metal::Copper.ticker(), "HG=F");
//! ```

pub use forecast_math;
pub use metal_forecast;

/// The types most callers need
pub mod prelude {
    pub use metal_forecast::models::{lag_features, sarimax};
    pub use metal_forecast::{
        AccuracyMetrics, ArimaOrder, CsvPriceSource, FetchRequest, ForecastConfig, ForecastError,
        Horizon, LagFeatureConfig, Metal, PriceSeries, PriceSource, SarimaxConfig, SeasonalOrder,
        TrendKind,
    };
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_round_trip() {
        let config = ForecastConfig::default();
        assert_eq!(config.sarimax.order, ArimaOrder::new(2, 1, 2));
        assert_eq!(config.sarimax.seasonal_order, SeasonalOrder::new(1, 1, 1, 12));
        assert_eq!("platinum".parse::<Metal>().unwrap(), Metal::Platinum);
    }
}
