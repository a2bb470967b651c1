//! # Procure Data
//!
//! `procure_data` holds the pharmaceutical procurement transaction model and
//! everything that produces or stores it.
//!
//! - [`catalog`]: supplier and therapeutic category lists
//! - [`generator`]: seeded synthetic transaction generation
//! - [`io`]: CSV reading and atomic CSV/JSON writing
//!
//! ## Usage Example
//!
//! ```no_run
//! use procure_data::catalog::SupplierCatalog;
//! use procure_data::generator::{GeneratorConfig, TransactionGenerator};
//!
//! let generator = TransactionGenerator::new(GeneratorConfig::default(), SupplierCatalog::default())?;
//! let transactions = generator.generate()?;
//! procure_data::io::write_transactions("output/transactions.csv", &transactions)?;
//! # Ok::<(), procure_data::DataError>(())
//! ```

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod catalog;
pub mod generator;
pub mod io;

pub use catalog::SupplierCatalog;
pub use generator::{GeneratorConfig, TransactionGenerator};

/// Errors raised while generating, validating or storing transactions
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for data operations
pub type Result<T> = std::result::Result<T, DataError>;

/// A single purchase order placed with a supplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Transaction {
    /// Sequential order number, starting at 1
    #[serde(rename = "OrderID")]
    pub order_id: u64,
    /// Date the order was placed
    pub order_date: NaiveDate,
    /// Supplier the order was placed with
    pub supplier_name: String,
    /// Order value, rounded to cents
    pub total_spend: f64,
    /// Therapeutic category of the ordered product
    pub therapeutic_category: String,
    /// Whether the order arrived by the promised date
    #[serde(with = "delivery_flag")]
    pub on_time_delivery: bool,
    /// Days between order placement and delivery
    pub lead_time: u32,
}

impl Transaction {
    /// First day of the order's calendar month
    pub fn month(&self) -> NaiveDate {
        first_of_month(self.order_date)
    }

    /// Order value in whole cents
    pub fn spend_cents(&self) -> i64 {
        to_cents(self.total_spend)
    }
}

/// First day of the month containing `date`
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Largest amount whose whole-cent count still fits an `i64`
pub const MAX_SPEND: f64 = i64::MAX as f64 / 100.0;

/// Convert a currency amount to whole cents
///
/// Amounts at or above [`MAX_SPEND`] saturate; validation rejects them first.
pub fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Convert whole cents back to a currency amount
pub fn from_cents(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Round a currency amount to cents
pub fn round_to_cents(amount: f64) -> f64 {
    from_cents(to_cents(amount))
}

/// OnTimeDelivery is stored as 0/1 in CSV
mod delivery_flag {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(D::Error::custom(format!(
                "OnTimeDelivery must be 0 or 1, found {}",
                other
            ))),
        }
    }
}
