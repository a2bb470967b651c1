//! Forecasting models for monthly spend series

use crate::data::MonthlySeries;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::path::Path;

/// Column order of the forecast table
pub const FORECAST_HEADER: [&str; 4] = ["Month", "PredictedSpend", "LowerBound", "UpperBound"];

/// Months of history needed before yearly seasonality is estimated reliably
pub const FULL_HISTORY_MONTHS: usize = 24;

/// Below this many months the forecast is flagged low-confidence
pub const RELIABLE_HISTORY_MONTHS: usize = 12;

/// Fewest months a model can be fitted to at all
pub const MIN_FIT_MONTHS: usize = 3;

/// How much history backed a forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAssessment {
    /// Two or more years of history
    Full,
    /// At least a year but under two; seasonality is estimated from one cycle
    Limited,
    /// Under a year; seasonality is dropped and intervals are widened
    Insufficient,
}

impl HistoryAssessment {
    /// Classify a history length in months
    pub fn from_months(months: usize) -> Self {
        if months >= FULL_HISTORY_MONTHS {
            Self::Full
        } else if months >= RELIABLE_HISTORY_MONTHS {
            Self::Limited
        } else {
            Self::Insufficient
        }
    }

    /// Whether the forecast should be treated as low-confidence
    pub fn is_low_confidence(self) -> bool {
        self == Self::Insufficient
    }
}

impl fmt::Display for HistoryAssessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Full => "full",
            Self::Limited => "limited",
            Self::Insufficient => "insufficient",
        };
        f.write_str(label)
    }
}

/// One forecast month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ForecastPoint {
    /// First day of the forecast month
    pub month: NaiveDate,
    /// Point estimate
    pub predicted_spend: f64,
    /// Lower interval bound
    pub lower_bound: f64,
    /// Upper interval bound
    pub upper_bound: f64,
}

/// Forecast result containing predicted months and their intervals
#[derive(Debug, Clone, Serialize)]
pub struct ForecastResult {
    /// Name of the model that produced the forecast
    model: String,
    /// Forecast months, in order
    points: Vec<ForecastPoint>,
    /// Probability mass the intervals are designed to cover
    interval_width: f64,
    /// History backing the forecast
    confidence: HistoryAssessment,
    /// In-sample accuracy, `1 - MAPE`
    fit_accuracy: f64,
}

impl ForecastResult {
    /// Create a forecast result, checking every interval brackets its estimate
    pub fn new(
        model: impl Into<String>,
        points: Vec<ForecastPoint>,
        interval_width: f64,
        confidence: HistoryAssessment,
        fit_accuracy: f64,
    ) -> Result<Self> {
        for point in &points {
            let finite = point.predicted_spend.is_finite()
                && point.lower_bound.is_finite()
                && point.upper_bound.is_finite();
            if !finite
                || point.lower_bound > point.predicted_spend
                || point.predicted_spend > point.upper_bound
            {
                return Err(ForecastError::ModelFit(format!(
                    "Forecast for {} violates lower <= predicted <= upper: {} / {} / {}",
                    point.month, point.lower_bound, point.predicted_spend, point.upper_bound
                )));
            }
        }
        if points.windows(2).any(|w| w[1].month <= w[0].month) {
            return Err(ForecastError::ModelFit(
                "Forecast months must increase".to_string(),
            ));
        }

        Ok(Self {
            model: model.into(),
            points,
            interval_width,
            confidence,
            fit_accuracy,
        })
    }

    /// Name of the producing model
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Forecast months
    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    /// Number of periods forecasted
    pub fn horizons(&self) -> usize {
        self.points.len()
    }

    /// Point estimates
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.predicted_spend).collect()
    }

    /// `(lower, upper)` per forecast month
    pub fn intervals(&self) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|p| (p.lower_bound, p.upper_bound))
            .collect()
    }

    /// Designed interval coverage
    pub fn interval_width(&self) -> f64 {
        self.interval_width
    }

    /// History assessment
    pub fn confidence(&self) -> HistoryAssessment {
        self.confidence
    }

    /// Whether the forecast was produced from insufficient history
    pub fn is_low_confidence(&self) -> bool {
        self.confidence.is_low_confidence()
    }

    /// In-sample `1 - MAPE`
    pub fn fit_accuracy(&self) -> f64 {
        self.fit_accuracy
    }

    /// Write the forecast table as CSV
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        procure_data::io::write_csv(path, &FORECAST_HEADER, &self.points)?;
        Ok(())
    }

    /// Serialize the forecast and its metadata to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug {
    /// Generate forecast for future months
    fn forecast(&self, horizons: usize) -> Result<ForecastResult>;

    /// Fitted values for the training months
    fn predict_in_sample(&self) -> &[f64];

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be trained on a monthly series
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Train the model on a monthly series
    fn train(&self, series: &MonthlySeries) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

pub mod seasonal;

pub use seasonal::{SeasonalAdditiveModel, SeasonalModelConfig, TrainedSeasonalModel};
