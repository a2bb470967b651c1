//! Seasonal additive model for monthly spend
//!
//! `y(t) = trend(t) + yearly(t) + noise`, where the trend is piecewise linear
//! with hinge changepoints spread over the early history and the yearly
//! component is a truncated Fourier series. All coefficients come from one
//! penalised least squares solve, so a fit is fully deterministic.
//!
//! Prediction intervals are normal-theory regression intervals:
//! `yhat ± z * sigma * sqrt(1 + x' (X'X + Λ)^-1 x)`.

use crate::data::{add_months, MonthlySeries};
use crate::error::{ForecastError, Result};
use crate::metrics::forecast_accuracy;
use crate::models::{
    ForecastModel, ForecastPoint, ForecastResult, HistoryAssessment, TrainedForecastModel,
    MIN_FIT_MONTHS,
};
use chrono::NaiveDate;
use procure_math::basis::{changepoint_grid, fourier_terms, hinge_terms, YEAR_DAYS};
use procure_math::{ridge_least_squares, RidgeFit};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::{debug, info, warn};

/// Noise level on the max-scaled series that prior scales are measured against
const REFERENCE_NOISE: f64 = 0.05;

/// Highest yearly harmonic a monthly cadence can resolve without aliasing
const MAX_FOURIER_ORDER: usize = 5;

/// Hyperparameters of the seasonal additive model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonalModelConfig {
    /// Months to forecast beyond the last observation
    pub horizon: usize,
    /// Probability mass the prediction interval covers
    pub interval_width: f64,
    /// Number of yearly Fourier harmonics
    pub fourier_order: usize,
    /// Number of potential trend changepoints
    pub n_changepoints: usize,
    /// Share of the history changepoints are placed in
    pub changepoint_range: f64,
    /// Prior scale of trend slope changes; smaller is stiffer
    pub changepoint_prior_scale: f64,
    /// Prior scale of seasonal amplitudes; smaller is flatter
    pub seasonality_prior_scale: f64,
    /// Interval multiplier applied when history is insufficient
    pub low_confidence_widening: f64,
}

impl Default for SeasonalModelConfig {
    fn default() -> Self {
        Self {
            horizon: 6,
            interval_width: 0.95,
            fourier_order: 3,
            n_changepoints: 8,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            low_confidence_widening: 2.0,
        }
    }
}

impl SeasonalModelConfig {
    /// Check every hyperparameter is usable
    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(ForecastError::Configuration(
                "Forecast horizon must be at least one month".to_string(),
            ));
        }
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(ForecastError::Configuration(format!(
                "Interval width must be in (0, 1), got {}",
                self.interval_width
            )));
        }
        if self.fourier_order == 0 || self.fourier_order > MAX_FOURIER_ORDER {
            return Err(ForecastError::Configuration(format!(
                "Fourier order must be between 1 and {}, got {}",
                MAX_FOURIER_ORDER, self.fourier_order
            )));
        }
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(ForecastError::Configuration(format!(
                "Changepoint range must be in (0, 1], got {}",
                self.changepoint_range
            )));
        }
        for (name, value) in [
            ("changepoint_prior_scale", self.changepoint_prior_scale),
            ("seasonality_prior_scale", self.seasonality_prior_scale),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ForecastError::Configuration(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if !self.low_confidence_widening.is_finite() || self.low_confidence_widening < 1.0 {
            return Err(ForecastError::Configuration(format!(
                "Low-confidence widening must be at least 1, got {}",
                self.low_confidence_widening
            )));
        }
        Ok(())
    }
}

/// Seasonal additive forecasting model
#[derive(Debug, Clone)]
pub struct SeasonalAdditiveModel {
    name: String,
    config: SeasonalModelConfig,
}

/// Seasonal additive model fitted to a monthly series
#[derive(Debug, Clone)]
pub struct TrainedSeasonalModel {
    name: String,
    config: SeasonalModelConfig,
    first_month: NaiveDate,
    last_month: NaiveDate,
    /// Days from the first to the last training month; trend time is scaled by it
    span_days: f64,
    /// Training values are divided by this before fitting
    y_scale: f64,
    changepoints: Vec<f64>,
    fourier_order: usize,
    fit: RidgeFit,
    /// Residual standard deviation on the scaled series
    sigma: f64,
    fitted: Vec<f64>,
    confidence: HistoryAssessment,
    fit_accuracy: f64,
}

impl SeasonalAdditiveModel {
    /// Create a model after validating its hyperparameters
    pub fn new(config: SeasonalModelConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            name: model_name(&config),
            config,
        })
    }

    /// Model hyperparameters
    pub fn config(&self) -> &SeasonalModelConfig {
        &self.config
    }
}

impl Default for SeasonalAdditiveModel {
    fn default() -> Self {
        let config = SeasonalModelConfig::default();
        Self {
            name: model_name(&config),
            config,
        }
    }
}

fn model_name(config: &SeasonalModelConfig) -> String {
    format!(
        "Seasonal Additive (fourier_order={}, changepoints={})",
        config.fourier_order, config.n_changepoints
    )
}

/// Columns: intercept, slope, one hinge per changepoint, then sin/cos pairs
fn design_row(t_days: f64, span_days: f64, changepoints: &[f64], fourier_order: usize) -> Vec<f64> {
    let t = t_days / span_days;
    let mut row = Vec::with_capacity(2 + changepoints.len() + 2 * fourier_order);
    row.push(1.0);
    row.push(t);
    row.extend(hinge_terms(t, changepoints));
    row.extend(fourier_terms(t_days, YEAR_DAYS, fourier_order));
    row
}

fn days_between(from: NaiveDate, to: NaiveDate) -> f64 {
    (to - from).num_days() as f64
}

impl ForecastModel for SeasonalAdditiveModel {
    type Trained = TrainedSeasonalModel;

    fn train(&self, series: &MonthlySeries) -> Result<Self::Trained> {
        let n = series.len();
        if n < MIN_FIT_MONTHS {
            return Err(ForecastError::ModelFit(format!(
                "At least {} months are needed to fit a trend, got {}",
                MIN_FIT_MONTHS, n
            )));
        }

        let confidence = HistoryAssessment::from_months(n);
        match confidence {
            HistoryAssessment::Full => {}
            HistoryAssessment::Limited => warn!(
                months = n,
                "under two years of history; yearly seasonality rests on a single cycle"
            ),
            HistoryAssessment::Insufficient => warn!(
                months = n,
                widening = self.config.low_confidence_widening,
                "under a year of history; seasonality dropped and intervals widened"
            ),
        }

        let values = series.values();
        let y_scale = values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        if y_scale == 0.0 {
            return Err(ForecastError::ModelFit(
                "Series has no spend in any month".to_string(),
            ));
        }
        let targets: Vec<f64> = values.iter().map(|v| v / y_scale).collect();

        let first_month = series.first_month();
        let last_month = series.last_month();
        let span_days = days_between(first_month, last_month);
        let t_days: Vec<f64> = series
            .months()
            .into_iter()
            .map(|m| days_between(first_month, m))
            .collect();
        let t_scaled: Vec<f64> = t_days.iter().map(|t| t / span_days).collect();

        let changepoints = changepoint_grid(
            &t_scaled,
            self.config.n_changepoints,
            self.config.changepoint_range,
        )?;
        let fourier_order = if confidence.is_low_confidence() {
            0
        } else {
            self.config.fourier_order
        };

        let design: Vec<Vec<f64>> = t_days
            .iter()
            .map(|&t| design_row(t, span_days, &changepoints, fourier_order))
            .collect();

        let changepoint_penalty = (REFERENCE_NOISE / self.config.changepoint_prior_scale).powi(2);
        let seasonality_penalty = (REFERENCE_NOISE / self.config.seasonality_prior_scale).powi(2);
        let mut penalties = vec![0.0, 0.0];
        penalties.extend(std::iter::repeat(changepoint_penalty).take(changepoints.len()));
        penalties.extend(std::iter::repeat(seasonality_penalty).take(2 * fourier_order));

        let fit = ridge_least_squares(&design, &targets, &penalties)
            .map_err(|e| ForecastError::ModelFit(format!("Least squares solve failed: {}", e)))?;
        let sigma = fit.residual_variance().sqrt();

        let fitted = design
            .iter()
            .map(|row| fit.predict(row).map(|y| y * y_scale))
            .collect::<std::result::Result<Vec<f64>, _>>()?;
        let fit_accuracy = forecast_accuracy(&fitted, &values)?.accuracy();

        debug!(
            coefficients = ?fit.coefficients(),
            changepoints = ?changepoints,
            effective_dof = fit.effective_dof(),
            "fitted seasonal additive model"
        );
        info!(
            months = n,
            fourier_order,
            changepoints = changepoints.len(),
            sigma = sigma * y_scale,
            fit_accuracy,
            "trained {}",
            self.name
        );

        Ok(TrainedSeasonalModel {
            name: self.name.clone(),
            config: self.config.clone(),
            first_month,
            last_month,
            span_days,
            y_scale,
            changepoints,
            fourier_order,
            fit,
            sigma,
            fitted,
            confidence,
            fit_accuracy,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedSeasonalModel {
    /// Standard normal quantile for the configured interval width
    fn interval_z(&self) -> Result<f64> {
        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| ForecastError::ModelFit(format!("Standard normal: {}", e)))?;
        Ok(normal.inverse_cdf(0.5 + self.config.interval_width / 2.0))
    }

    /// Multiplier applied to interval half-widths
    fn widening(&self) -> f64 {
        if self.confidence.is_low_confidence() {
            self.config.low_confidence_widening
        } else {
            1.0
        }
    }

    /// History assessment of the training series
    pub fn confidence(&self) -> HistoryAssessment {
        self.confidence
    }

    /// In-sample `1 - MAPE`
    pub fn fit_accuracy(&self) -> f64 {
        self.fit_accuracy
    }

    /// Number of yearly harmonics actually fitted
    pub fn fourier_order(&self) -> usize {
        self.fourier_order
    }

    /// Forecast using the configured horizon
    pub fn forecast_default(&self) -> Result<ForecastResult> {
        self.forecast(self.config.horizon)
    }
}

impl TrainedForecastModel for TrainedSeasonalModel {
    fn forecast(&self, horizons: usize) -> Result<ForecastResult> {
        if horizons == 0 {
            return Err(ForecastError::Configuration(
                "Forecast horizon must be at least one month".to_string(),
            ));
        }

        let z = self.interval_z()?;
        let widening = self.widening();

        let mut points = Vec::with_capacity(horizons);
        for step in 1..=horizons as u32 {
            let month = add_months(self.last_month, step).ok_or_else(|| {
                ForecastError::ModelFit(format!(
                    "Forecast month {} after {} overflows the calendar",
                    step, self.last_month
                ))
            })?;
            let row = design_row(
                days_between(self.first_month, month),
                self.span_days,
                &self.changepoints,
                self.fourier_order,
            );

            let predicted = self.fit.predict(&row)? * self.y_scale;
            let std_error = self.sigma * (1.0 + self.fit.leverage(&row)?).sqrt() * self.y_scale;
            let half_width = z * std_error * widening;

            points.push(ForecastPoint {
                month,
                predicted_spend: predicted,
                lower_bound: predicted - half_width,
                upper_bound: predicted + half_width,
            });
        }

        ForecastResult::new(
            self.name.clone(),
            points,
            self.config.interval_width,
            self.confidence,
            self.fit_accuracy,
        )
    }

    fn predict_in_sample(&self) -> &[f64] {
        &self.fitted
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn series(values: &[f64]) -> MonthlySeries {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        MonthlySeries::from_pairs(
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| (add_months(start, i as u32).unwrap(), v)),
        )
        .unwrap()
    }

    #[test]
    fn test_config_validation() {
        assert!(SeasonalModelConfig::default().validate().is_ok());

        let bad = [
            SeasonalModelConfig {
                horizon: 0,
                ..SeasonalModelConfig::default()
            },
            SeasonalModelConfig {
                interval_width: 1.0,
                ..SeasonalModelConfig::default()
            },
            SeasonalModelConfig {
                fourier_order: 6,
                ..SeasonalModelConfig::default()
            },
            SeasonalModelConfig {
                changepoint_prior_scale: 0.0,
                ..SeasonalModelConfig::default()
            },
            SeasonalModelConfig {
                low_confidence_widening: 0.5,
                ..SeasonalModelConfig::default()
            },
        ];
        for config in bad {
            assert!(SeasonalAdditiveModel::new(config).is_err());
        }
    }

    #[test]
    fn test_too_short_series_fails_to_fit() {
        let model = SeasonalAdditiveModel::default();
        let result = model.train(&series(&[1.0, 2.0]));
        assert!(matches!(result, Err(ForecastError::ModelFit(_))));
    }

    #[test]
    fn test_all_zero_series_fails_to_fit() {
        let model = SeasonalAdditiveModel::default();
        let result = model.train(&series(&[0.0; 12]));
        assert!(matches!(result, Err(ForecastError::ModelFit(_))));
    }

    #[test]
    fn test_constant_series_forecasts_constant() {
        let model = SeasonalAdditiveModel::default();
        let trained = model.train(&series(&[500.0; 30])).unwrap();
        let forecast = trained.forecast(3).unwrap();

        for point in forecast.points() {
            assert_relative_eq!(point.predicted_spend, 500.0, max_relative = 1e-6);
        }
        assert_relative_eq!(trained.fit_accuracy(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_forecast_months_follow_history() {
        let model = SeasonalAdditiveModel::default();
        let values: Vec<f64> = (0..24).map(|i| 100.0 + i as f64).collect();
        let trained = model.train(&series(&values)).unwrap();
        let forecast = trained.forecast_default().unwrap();

        let months: Vec<NaiveDate> = forecast.points().iter().map(|p| p.month).collect();
        let expected: Vec<NaiveDate> = (1..=6)
            .map(|m| NaiveDate::from_ymd_opt(2023, m, 1).unwrap())
            .collect();
        assert_eq!(months, expected);
    }

    #[test]
    fn test_insufficient_history_drops_seasonality() {
        let model = SeasonalAdditiveModel::default();
        let trained = model
            .train(&series(&[10.0, 12.0, 11.0, 13.0, 12.0, 14.0, 13.0, 15.0, 14.0, 16.0, 15.0]))
            .unwrap();
        assert_eq!(trained.confidence(), HistoryAssessment::Insufficient);
        assert_eq!(trained.fourier_order(), 0);
    }
}
