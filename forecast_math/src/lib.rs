//! # Forecast Math
//!
//! Numerical routines behind the metals forecaster.
//! This crate provides the estimation machinery that the forecasting layer
//! orchestrates: a Nelder-Mead simplex optimizer, a SARIMAX estimator with
//! optional regressors, and a gradient-boosted regression tree learner.

use thiserror::Error;

pub mod boosting;
pub mod optimization;
pub mod sarimax;
pub mod stats;

/// Errors that can occur in numerical routines
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Optimizer did not converge after {iterations} iterations")]
    NotConverged { iterations: usize },
}

/// Result type for numerical routines
pub type Result<T> = std::result::Result<T, MathError>;
