//! Error types for the metal_forecast crate

use forecast_math::MathError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the metal_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Input could not be turned into a price series
    #[error("Data error: {0}")]
    DataError(String),

    /// Model estimation failed: no convergence, degenerate or too-short series
    #[error("Estimation error while {stage}: {message}")]
    EstimationError { stage: String, message: String },

    /// Forecast and held-out values do not line up
    #[error("Alignment error: {0}")]
    AlignmentError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error from CSV export
    #[error("CSV error: {0}")]
    CsvError(String),
}

impl ForecastError {
    /// Wrap a backend failure with the stage it happened in
    pub fn estimation(stage: impl Into<String>, err: impl std::fmt::Display) -> Self {
        ForecastError::EstimationError {
            stage: stage.into(),
            message: err.to_string(),
        }
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::CsvError(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::ConfigError(err.to_string())
    }
}

impl From<MathError> for ForecastError {
    fn from(err: MathError) -> Self {
        ForecastError::estimation("estimating model", err)
    }
}
