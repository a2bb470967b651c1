//! # Procure Math
//!
//! Numeric building blocks for the procurement analytics crates.
//! This crate provides the dense linear algebra and regression bases the
//! spend forecaster is assembled from, plus the descriptive statistics the
//! risk aggregator needs.

use thiserror::Error;

pub mod basis;
pub mod regression;
pub mod stats;

pub use regression::{ridge_least_squares, RidgeFit};

/// Errors that can occur in numeric calculations
#[derive(Error, Debug)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;
