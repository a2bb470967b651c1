//! Error types for the procurement pipeline

use procure_data::DataError;
use spend_forecast::ForecastError;
use thiserror::Error;

/// Errors raised while configuring or running pipeline stages
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid pipeline or output settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generation or transaction storage failed
    #[error(transparent)]
    Data(#[from] DataError),

    /// Aggregation, risk scoring or forecasting failed
    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
