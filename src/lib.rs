//! # Pharma Procurement
//!
//! `pharma_procurement` runs the procurement analytics pipeline end to end:
//! a seeded synthetic transaction table, supplier risk scoring, monthly spend
//! aggregation and a six-month seasonal forecast, all written as flat files
//! for a BI dashboard.
//!
//! The work is split across the workspace:
//!
//! - `procure_data`: transaction model, generator and CSV storage
//! - `spend_forecast`: monthly aggregation, forecasting and risk analysis
//! - `procure_math`: least squares and basis functions behind the forecaster
//!
//! ## Example
//!
//! ```no_run
//! use pharma_procurement::config::PipelineConfig;
//! use pharma_procurement::pipeline::run_all;
//!
//! let config = PipelineConfig::default();
//! let report = run_all(&config)?;
//! println!("{} suppliers flagged", report.kpis.high_risk_supplier_count);
//! # Ok::<(), pharma_procurement::PipelineError>(())
//! ```

pub mod config;
pub mod error;
pub mod pipeline;

pub use config::{OutputConfig, PipelineConfig};
pub use error::PipelineError;
pub use pipeline::{run_all, run_analyze, run_forecast, run_generate, AnalysisReport};
