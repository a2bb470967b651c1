//! Metrics for evaluating forecast performance

use crate::data::MonthlySeries;
use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, TrainedForecastModel};
use procure_math::MathError;

/// Forecast accuracy metrics
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastAccuracy {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error, over months with non-zero actuals
    pub mape: f64,
    /// Symmetric Mean Absolute Percentage Error
    pub smape: f64,
}

impl ForecastAccuracy {
    /// `1 - MAPE` as a fraction; negative when errors exceed the actuals
    pub fn accuracy(&self) -> f64 {
        1.0 - self.mape / 100.0
    }
}

impl std::fmt::Display for ForecastAccuracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Accuracy Metrics:")?;
        writeln!(f, "  MAE:      {:.2}", self.mae)?;
        writeln!(f, "  RMSE:     {:.2}", self.rmse)?;
        writeln!(f, "  MAPE:     {:.4}%", self.mape)?;
        writeln!(f, "  SMAPE:    {:.4}%", self.smape)?;
        writeln!(f, "  Accuracy: {:.2}%", self.accuracy() * 100.0)?;
        Ok(())
    }
}

/// Calculate accuracy metrics for a forecast vs actual values
pub fn forecast_accuracy(forecast: &[f64], actual: &[f64]) -> Result<ForecastAccuracy> {
    if forecast.len() != actual.len() || forecast.is_empty() {
        return Err(MathError::InvalidInput(
            "Forecast and actual values must have the same non-zero length".to_string(),
        )
        .into());
    }

    let n = forecast.len() as f64;
    let errors: Vec<f64> = forecast
        .iter()
        .zip(actual)
        .map(|(&f, &a)| a - f)
        .collect();

    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let mse = errors.iter().map(|e| e.powi(2)).sum::<f64>() / n;
    let rmse = mse.sqrt();

    let percentage_errors: Vec<f64> = actual
        .iter()
        .zip(&errors)
        .filter(|(&a, _)| a != 0.0)
        .map(|(&a, &e)| (e.abs() / a.abs()) * 100.0)
        .collect();
    if percentage_errors.is_empty() {
        return Err(MathError::InsufficientData(
            "MAPE needs at least one non-zero actual value".to_string(),
        )
        .into());
    }
    let mape = percentage_errors.iter().sum::<f64>() / percentage_errors.len() as f64;

    let smape = actual
        .iter()
        .zip(forecast)
        .map(|(&a, &f)| {
            let denominator = a.abs() + f.abs();
            if denominator == 0.0 {
                0.0
            } else {
                200.0 * (a - f).abs() / denominator
            }
        })
        .sum::<f64>()
        / n;

    Ok(ForecastAccuracy {
        mae,
        mse,
        rmse,
        mape,
        smape,
    })
}

/// Train on all but the last `holdout` months and score the forecast of those months
pub fn evaluate_holdout<M: ForecastModel>(
    model: &M,
    series: &MonthlySeries,
    holdout: usize,
) -> Result<ForecastAccuracy> {
    if holdout == 0 || holdout >= series.len() {
        return Err(ForecastError::Configuration(format!(
            "Holdout of {} months must be between 1 and {}",
            holdout,
            series.len().saturating_sub(1)
        )));
    }

    let training = series.head(series.len() - holdout)?;
    let trained = model.train(&training)?;
    let forecast = trained.forecast(holdout)?;

    let actual: Vec<f64> = series.values()[series.len() - holdout..].to_vec();
    forecast_accuracy(&forecast.values(), &actual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_forecast_accuracy_values() {
        let forecast = [110.0, 90.0, 100.0];
        let actual = [100.0, 100.0, 100.0];
        let metrics = forecast_accuracy(&forecast, &actual).unwrap();

        assert_relative_eq!(metrics.mae, 20.0 / 3.0);
        assert_relative_eq!(metrics.mse, 200.0 / 3.0);
        assert_relative_eq!(metrics.mape, 20.0 / 3.0);
        assert_relative_eq!(metrics.accuracy(), 1.0 - 20.0 / 300.0);
    }

    #[test]
    fn test_zero_actuals_excluded_from_mape() {
        let metrics = forecast_accuracy(&[5.0, 110.0], &[0.0, 100.0]).unwrap();
        assert_relative_eq!(metrics.mape, 10.0);

        assert!(forecast_accuracy(&[1.0], &[0.0]).is_err());
    }

    #[test]
    fn test_length_mismatch_rejected() {
        assert!(forecast_accuracy(&[1.0, 2.0], &[1.0]).is_err());
        assert!(forecast_accuracy(&[], &[]).is_err());
    }
}
