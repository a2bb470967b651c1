//! Descriptive statistics

use crate::{MathError, Result};

/// Arithmetic mean
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Mean of an empty slice".to_string(),
        ));
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Share of `true` values, in `[0, 1]`
pub fn proportion(flags: impl IntoIterator<Item = bool>) -> Result<f64> {
    let (hits, total) = flags
        .into_iter()
        .fold((0usize, 0usize), |(hits, total), flag| {
            (hits + usize::from(flag), total + 1)
        });
    if total == 0 {
        return Err(MathError::InsufficientData(
            "Proportion of an empty sequence".to_string(),
        ));
    }
    Ok(hits as f64 / total as f64)
}

/// `part / whole`, or zero when `whole` is zero
pub fn safe_ratio(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole
    }
}
