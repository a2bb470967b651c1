//! # Spend Forecast
//!
//! Monthly spend forecasting and supplier risk analysis for procurement
//! transaction tables.
//!
//! ## Features
//!
//! - Monthly aggregation into a gap-free series (zero-spend months filled)
//! - Seasonal additive forecasting: piecewise-linear trend plus yearly Fourier
//!   seasonality, with prediction intervals
//! - In-sample and holdout accuracy metrics
//! - Supplier risk scoring, category breakdown and headline KPIs
//!
//! ## Quick Start
//!
//! ```no_run
//! use procure_data::io::read_transactions;
//! use spend_forecast::data::aggregate_monthly;
//! use spend_forecast::models::{ForecastModel, SeasonalAdditiveModel, SeasonalModelConfig};
//! use spend_forecast::risk::RiskAnalyzer;
//!
//! let transactions = read_transactions("output/transactions.csv")?;
//!
//! // Aggregate and forecast
//! let series = aggregate_monthly(&transactions)?;
//! let model = SeasonalAdditiveModel::new(SeasonalModelConfig::default())?;
//! let forecast = model.train(&series)?.forecast_default()?;
//! forecast.to_csv("output/forecast.csv")?;
//!
//! // Score suppliers
//! let analyzer = RiskAnalyzer::default();
//! let suppliers = analyzer.assess_suppliers(&transactions)?;
//! let kpis = analyzer.summarize(&transactions, &suppliers)?.with_forecast(&forecast);
//! println!("{}", kpis.to_json()?);
//! # Ok::<(), spend_forecast::ForecastError>(())
//! ```

pub mod data;
pub mod error;
pub mod metrics;
pub mod models;
pub mod risk;

// Re-export commonly used types
pub use crate::data::{aggregate_monthly, MonthlyAggregate, MonthlySeries};
pub use crate::error::ForecastError;
pub use crate::models::{ForecastModel, ForecastResult, HistoryAssessment, TrainedForecastModel};
pub use crate::risk::{KpiSummary, RiskAnalyzer, RiskConfig, RiskLevel, SupplierRisk};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
