use approx::assert_relative_eq;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use spend_forecast::data::{add_months, MonthlySeries};
use spend_forecast::metrics::evaluate_holdout;
use spend_forecast::models::{
    ForecastModel, HistoryAssessment, SeasonalAdditiveModel, SeasonalModelConfig,
    TrainedForecastModel, FORECAST_HEADER,
};
use spend_forecast::ForecastError;
use std::f64::consts::PI;
use std::fs;
use tempfile::tempdir;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()
}

/// Linear trend plus a yearly sine wave, month index `i`
fn truth(i: usize) -> f64 {
    1_000.0 + 20.0 * i as f64 + 100.0 * (2.0 * PI * i as f64 / 12.0).sin()
}

fn synthetic_series(months: usize, noise_sd: f64, seed: u64) -> MonthlySeries {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, noise_sd).unwrap();
    MonthlySeries::from_pairs((0..months).map(|i| {
        (
            add_months(start(), i as u32).unwrap(),
            truth(i) + noise.sample(&mut rng),
        )
    }))
    .unwrap()
}

#[test]
fn test_forecast_tracks_injected_trend_and_seasonality() {
    let series = synthetic_series(36, 10.0, 7);
    let model = SeasonalAdditiveModel::new(SeasonalModelConfig::default()).unwrap();
    let trained = model.train(&series).unwrap();
    let forecast = trained.forecast(6).unwrap();

    assert_eq!(forecast.horizons(), 6);
    assert_eq!(forecast.confidence(), HistoryAssessment::Full);

    let mut covered = 0;
    for (step, point) in forecast.points().iter().enumerate() {
        let expected = truth(36 + step);
        assert_relative_eq!(point.predicted_spend, expected, max_relative = 0.10);
        if point.lower_bound <= expected && expected <= point.upper_bound {
            covered += 1;
        }
    }
    assert!(covered >= 5, "only {} of 6 intervals cover the truth", covered);
    assert!(trained.fit_accuracy() > 0.95);
}

#[test]
fn test_bounds_bracket_every_prediction() {
    let series = synthetic_series(30, 80.0, 11);
    let trained = SeasonalAdditiveModel::default().train(&series).unwrap();
    let forecast = trained.forecast(12).unwrap();

    for point in forecast.points() {
        assert!(point.lower_bound <= point.predicted_spend);
        assert!(point.predicted_spend <= point.upper_bound);
    }
}

#[test]
fn test_intervals_widen_with_horizon() {
    let series = synthetic_series(36, 25.0, 3);
    let forecast = SeasonalAdditiveModel::default()
        .train(&series)
        .unwrap()
        .forecast(6)
        .unwrap();

    let widths: Vec<f64> = forecast
        .intervals()
        .iter()
        .map(|(lower, upper)| upper - lower)
        .collect();
    assert!(widths[5] > widths[0]);
}

#[test]
fn test_narrower_interval_width_gives_narrower_bounds() {
    let series = synthetic_series(36, 25.0, 5);
    let wide = SeasonalAdditiveModel::new(SeasonalModelConfig::default())
        .unwrap()
        .train(&series)
        .unwrap()
        .forecast(1)
        .unwrap();
    let narrow = SeasonalAdditiveModel::new(SeasonalModelConfig {
        interval_width: 0.80,
        ..SeasonalModelConfig::default()
    })
    .unwrap()
    .train(&series)
    .unwrap()
    .forecast(1)
    .unwrap();

    let wide_width = wide.intervals()[0].1 - wide.intervals()[0].0;
    let narrow_width = narrow.intervals()[0].1 - narrow.intervals()[0].0;
    // z(0.80) / z(0.95) = 1.2816 / 1.9600
    assert_relative_eq!(narrow_width / wide_width, 1.281_551_6 / 1.959_964, max_relative = 1e-4);
}

#[test]
fn test_eleven_months_take_low_confidence_path() {
    let series = synthetic_series(11, 10.0, 1);
    let widened = SeasonalAdditiveModel::default().train(&series).unwrap();
    let forecast = widened.forecast_default().unwrap();

    assert_eq!(forecast.horizons(), 6);
    assert!(forecast.is_low_confidence());
    assert_eq!(forecast.confidence(), HistoryAssessment::Insufficient);

    let unwidened = SeasonalAdditiveModel::new(SeasonalModelConfig {
        low_confidence_widening: 1.0,
        ..SeasonalModelConfig::default()
    })
    .unwrap()
    .train(&series)
    .unwrap()
    .forecast_default()
    .unwrap();

    for (a, b) in forecast.points().iter().zip(unwidened.points()) {
        assert_relative_eq!(a.predicted_spend, b.predicted_spend);
        let ratio = (a.upper_bound - a.lower_bound) / (b.upper_bound - b.lower_bound);
        assert_relative_eq!(ratio, 2.0, max_relative = 1e-9);
    }
}

#[test]
fn test_one_to_two_years_is_limited_not_low_confidence() {
    let series = synthetic_series(18, 10.0, 2);
    let forecast = SeasonalAdditiveModel::default()
        .train(&series)
        .unwrap()
        .forecast(6)
        .unwrap();
    assert_eq!(forecast.confidence(), HistoryAssessment::Limited);
    assert!(!forecast.is_low_confidence());
}

#[test]
fn test_duplicate_month_keys_fail_before_fitting() {
    let month = start();
    let result = MonthlySeries::from_pairs(vec![(month, 1.0), (month, 2.0), (month, 3.0)]);
    assert!(matches!(result, Err(ForecastError::DataIntegrity(_))));
}

#[test]
fn test_fit_is_deterministic() {
    let series = synthetic_series(36, 30.0, 9);
    let model = SeasonalAdditiveModel::default();
    let first = model.train(&series).unwrap().forecast(6).unwrap();
    let second = model.train(&series).unwrap().forecast(6).unwrap();
    assert_eq!(first.points(), second.points());
}

#[test]
fn test_in_sample_predictions_cover_history() {
    let series = synthetic_series(24, 10.0, 4);
    let trained = SeasonalAdditiveModel::default().train(&series).unwrap();
    assert_eq!(trained.predict_in_sample().len(), 24);
}

#[test]
fn test_holdout_evaluation() {
    let series = synthetic_series(36, 10.0, 8);
    let model = SeasonalAdditiveModel::default();
    let accuracy = evaluate_holdout(&model, &series, 6).unwrap();
    assert!(accuracy.accuracy() > 0.9, "{}", accuracy);

    assert!(evaluate_holdout(&model, &series, 0).is_err());
    assert!(evaluate_holdout(&model, &series, 36).is_err());
}

#[test]
fn test_forecast_csv_has_six_rows_after_history() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("forecast.csv");
    let series = synthetic_series(36, 10.0, 6);
    let forecast = SeasonalAdditiveModel::default()
        .train(&series)
        .unwrap()
        .forecast_default()
        .unwrap();
    forecast.to_csv(&path).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 7);
    assert_eq!(lines[0], FORECAST_HEADER.join(","));
    assert!(lines[1].starts_with("2024-01-01,"));
    assert!(lines[6].starts_with("2024-06-01,"));
}
