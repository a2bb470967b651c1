//! Regression bases for additive time series models
//!
//! Contains the column generators used by the spend forecaster:
//! - Fourier terms for a periodic component
//! - Hinge terms for a piecewise-linear trend
//! - Changepoint placement over the training history

use crate::{MathError, Result};
use std::f64::consts::PI;

/// Days in a mean Gregorian year
pub const YEAR_DAYS: f64 = 365.25;

/// Fourier terms `[sin(2πkt/P), cos(2πkt/P)]` for `k = 1..=order`
///
/// The result has `2 * order` entries, sine before cosine for each harmonic.
pub fn fourier_terms(t: f64, period: f64, order: usize) -> Vec<f64> {
    let mut terms = Vec::with_capacity(2 * order);
    for k in 1..=order {
        let angle = 2.0 * PI * k as f64 * t / period;
        terms.push(angle.sin());
        terms.push(angle.cos());
    }
    terms
}

/// Hinge terms `max(t - c, 0)` for every changepoint `c`
pub fn hinge_terms(t: f64, changepoints: &[f64]) -> Vec<f64> {
    changepoints.iter().map(|&c| (t - c).max(0.0)).collect()
}

/// Place up to `count` changepoints evenly over the first `range` share of `times`
///
/// `times` must be sorted ascending. The first observation never carries a
/// changepoint, so fewer than `count` are returned for short histories.
pub fn changepoint_grid(times: &[f64], count: usize, range: f64) -> Result<Vec<f64>> {
    if !(0.0..=1.0).contains(&range) || range == 0.0 {
        return Err(MathError::InvalidInput(format!(
            "Changepoint range must be in (0, 1], got {}",
            range
        )));
    }
    if times.windows(2).any(|w| w[1] <= w[0]) {
        return Err(MathError::InvalidInput(
            "Times must be strictly increasing".to_string(),
        ));
    }
    if count == 0 || times.len() < 3 {
        return Ok(Vec::new());
    }

    let history = ((times.len() as f64 * range).floor() as usize).clamp(2, times.len());
    let count = count.min(history - 1);

    let step = (history - 1) as f64 / count as f64;
    let mut changepoints: Vec<f64> = (1..=count)
        .map(|i| times[(i as f64 * step).round() as usize])
        .collect();
    changepoints.dedup();
    Ok(changepoints)
}
