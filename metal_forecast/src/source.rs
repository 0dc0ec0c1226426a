//! Metals and the price sources that supply their closing prices

use crate::data::{DataLoader, PriceSeries};
use crate::error::{ForecastError, Result};
use chrono::Months;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// Traded metals and their front-month futures tickers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metal {
    Gold,
    Silver,
    Copper,
    Platinum,
    Aluminum,
}

impl Metal {
    pub const ALL: [Metal; 5] = [
        Metal::Gold,
        Metal::Silver,
        Metal::Copper,
        Metal::Platinum,
        Metal::Aluminum,
    ];

    pub fn ticker(&self) -> &'static str {
        match self {
            Metal::Gold => "GC=F",
            Metal::Silver => "SI=F",
            Metal::Copper => "HG=F",
            Metal::Platinum => "PL=F",
            Metal::Aluminum => "ALI=F",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Metal::Gold => "Gold",
            Metal::Silver => "Silver",
            Metal::Copper => "Copper",
            Metal::Platinum => "Platinum",
            Metal::Aluminum => "Aluminum",
        }
    }
}

impl fmt::Display for Metal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Metal {
    type Err = ForecastError;

    /// Accepts display names in any case and tickers
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Metal::ALL
            .into_iter()
            .find(|m| {
                m.display_name().eq_ignore_ascii_case(wanted)
                    || m.ticker().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| ForecastError::InvalidParameter(format!("Unknown metal '{}'", s)))
    }
}

/// Sampling interval of the requested prices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    #[default]
    Daily,
}

/// What to fetch: which metal, how many trailing years, at which interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub metal: Metal,
    pub period_years: u32,
    pub interval: Interval,
}

impl FetchRequest {
    pub fn new(metal: Metal) -> Self {
        Self {
            metal,
            period_years: 5,
            interval: Interval::Daily,
        }
    }

    pub fn with_period_years(mut self, years: u32) -> Self {
        self.period_years = years;
        self
    }
}

/// Anything that can supply a closing-price series for a metal
pub trait PriceSource {
    fn closing_prices(&self, request: &FetchRequest) -> Result<PriceSeries>;
}

/// Reads previously downloaded price tables from a directory
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    root: PathBuf,
}

impl CsvPriceSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<TICKER>.csv`, else `<root>/<metal>.csv`
    pub fn path_for(&self, metal: Metal) -> Option<PathBuf> {
        let candidates = [
            self.root.join(format!("{}.csv", metal.ticker())),
            self.root
                .join(format!("{}.csv", metal.display_name().to_lowercase())),
        ];
        candidates.into_iter().find(|p| p.is_file())
    }
}

impl PriceSource for CsvPriceSource {
    fn closing_prices(&self, request: &FetchRequest) -> Result<PriceSeries> {
        let path = self.path_for(request.metal).ok_or_else(|| {
            ForecastError::DataError(format!(
                "No price file for {} ({}) under {}",
                request.metal,
                request.metal.ticker(),
                self.root.display()
            ))
        })?;
        debug!(metal = %request.metal, path = %path.display(), "Reading closing prices");

        let raw = DataLoader::from_csv(&path)?;
        let observations: Vec<_> = raw.iter().filter(|(_, v)| v.is_finite()).collect();
        if observations.len() < raw.len() {
            warn!(
                metal = %request.metal,
                dropped = raw.len() - observations.len(),
                "Dropped missing closing prices"
            );
        }
        let series = PriceSeries::from_observations(request.metal.display_name(), observations)?;

        let Some(last) = series.last_date() else {
            return Err(ForecastError::DataError(format!(
                "{} has no closing prices",
                path.display()
            )));
        };
        let trailing = match last.checked_sub_months(Months::new(request.period_years * 12)) {
            Some(start) => series.since(start),
            None => series,
        };
        Ok(trailing)
    }
}
