//! Error types for the spend_forecast crate

use procure_data::DataError;
use procure_math::MathError;
use thiserror::Error;

/// Custom error types for the spend_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Invalid model, risk or output parameters
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Month keys out of order, duplicated or gapped, or negative spend
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    /// The model could not be fitted to the supplied history
    #[error("Model fit error: {0}")]
    ModelFit(String),

    /// Error from the numeric kernels
    #[error("Math error: {0}")]
    Math(#[from] MathError),

    /// Error from reading or writing procurement tables
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Error from serializing summaries
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;
