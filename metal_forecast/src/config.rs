//! Model configuration values and their JSON loading

use crate::error::{ForecastError, Result};
use crate::exog::TrendKind;
use forecast_math::optimization::SimplexSettings;
use forecast_math::sarimax::{SarimaxSpec, MAX_SEASONAL_PERIOD};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Hyperparameters of the gradient-boosted trees
pub use forecast_math::boosting::BoostingConfig as BoostingParams;

/// Non-seasonal `(p, d, q)` order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl ArimaOrder {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl Default for ArimaOrder {
    fn default() -> Self {
        Self::new(2, 1, 2)
    }
}

/// Seasonal `(P, D, Q, s)` order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub period: usize,
}

impl SeasonalOrder {
    pub fn new(p: usize, d: usize, q: usize, period: usize) -> Self {
        Self { p, d, q, period }
    }
}

impl Default for SeasonalOrder {
    fn default() -> Self {
        Self::new(1, 1, 1, 12)
    }
}

/// Configuration of the seasonal forecaster
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SarimaxConfig {
    pub order: ArimaOrder,
    pub seasonal_order: SeasonalOrder,
    pub trend: TrendKind,
    /// Simplex search settings for the parameter estimation
    pub estimator: SimplexSettings,
    /// Nominal coverage of the forecast interval
    pub interval_level: f64,
}

impl Default for SarimaxConfig {
    fn default() -> Self {
        Self {
            order: ArimaOrder::default(),
            seasonal_order: SeasonalOrder::default(),
            trend: TrendKind::None,
            estimator: SimplexSettings::default(),
            interval_level: 0.95,
        }
    }
}

impl SarimaxConfig {
    pub fn new(order: ArimaOrder, seasonal_order: SeasonalOrder, trend: TrendKind) -> Self {
        Self {
            order,
            seasonal_order,
            trend,
            ..Self::default()
        }
    }

    pub fn spec(&self) -> SarimaxSpec {
        SarimaxSpec::new(
            (self.order.p, self.order.d, self.order.q),
            (
                self.seasonal_order.p,
                self.seasonal_order.d,
                self.seasonal_order.q,
                self.seasonal_order.period,
            ),
        )
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.interval_level > 0.0 && self.interval_level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Interval level must lie in (0, 1), got {}",
                self.interval_level
            )));
        }
        if self.seasonal_order.period > MAX_SEASONAL_PERIOD {
            return Err(ForecastError::InvalidParameter(format!(
                "Seasonal period must not exceed {}, got {}",
                MAX_SEASONAL_PERIOD, self.seasonal_order.period
            )));
        }
        if self.estimator.max_iter == 0 {
            return Err(ForecastError::InvalidParameter(
                "Estimator needs at least one iteration".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration of the lag-feature forecaster
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LagFeatureConfig {
    /// Number of lagged values used as features
    pub lags: usize,
    /// Window of the trailing rolling mean feature
    pub rolling_window: usize,
    pub boosting: BoostingParams,
}

impl Default for LagFeatureConfig {
    fn default() -> Self {
        Self {
            lags: 10,
            rolling_window: 5,
            boosting: BoostingParams::default(),
        }
    }
}

/// Shape of a rolling-origin backtest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RollingConfig {
    pub steps: usize,
    pub n_splits: usize,
}

impl Default for RollingConfig {
    fn default() -> Self {
        Self {
            steps: 20,
            n_splits: 5,
        }
    }
}

/// Every model setting in one value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    pub sarimax: SarimaxConfig,
    pub lag_features: LagFeatureConfig,
    pub rolling: RollingConfig,
    /// Held-out length of a single backtest
    pub backtest_steps: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            sarimax: SarimaxConfig::default(),
            lag_features: LagFeatureConfig::default(),
            rolling: RollingConfig::default(),
            backtest_steps: 30,
        }
    }
}

impl ForecastConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.sarimax.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ForecastError::ConfigError(format!(
                "Cannot read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_json_str(&text)
    }
}

/// Forecast horizon in calendar-style days offered to users
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct Horizon(usize);

impl Horizon {
    pub const STEP: usize = 30;
    pub const MIN: usize = 30;
    pub const MAX: usize = 90;

    /// A multiple of 30 between 30 and 90
    pub fn new(days: usize) -> Result<Self> {
        if !(Self::MIN..=Self::MAX).contains(&days) || days % Self::STEP != 0 {
            return Err(ForecastError::InvalidParameter(format!(
                "Horizon must be one of 30, 60 or 90 days, got {}",
                days
            )));
        }
        Ok(Self(days))
    }

    pub fn days(&self) -> usize {
        self.0
    }

    /// Horizons past one month carry noticeably wider intervals
    pub fn is_extended(&self) -> bool {
        self.0 > Self::MIN
    }
}

impl Default for Horizon {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl TryFrom<usize> for Horizon {
    type Error = ForecastError;

    fn try_from(days: usize) -> Result<Self> {
        Self::new(days)
    }
}

impl From<Horizon> for usize {
    fn from(horizon: Horizon) -> usize {
        horizon.0
    }
}

impl FromStr for Horizon {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        let days = s
            .trim()
            .trim_end_matches('d')
            .parse::<usize>()
            .map_err(|_| ForecastError::InvalidParameter(format!("Invalid horizon '{}'", s)))?;
        Self::new(days)
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} days", self.0)
    }
}
