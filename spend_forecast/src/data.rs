//! Monthly spend series handling for forecasting

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Months, NaiveDate};
use procure_data::{from_cents, to_cents, Transaction, MAX_SPEND};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Column order of the monthly aggregate table
pub const MONTHLY_HEADER: [&str; 2] = ["Month", "TotalSpend"];

/// Total spend for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MonthlyAggregate {
    /// First day of the month
    pub month: NaiveDate,
    /// Sum of transaction spend in the month
    pub total_spend: f64,
}

/// Ordered, gap-free monthly spend series
///
/// Every month between the first and last point is present exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySeries {
    points: Vec<MonthlyAggregate>,
}

impl MonthlySeries {
    /// Validate and wrap an ordered sequence of monthly points
    pub fn new(points: Vec<MonthlyAggregate>) -> Result<Self> {
        if points.is_empty() {
            return Err(ForecastError::DataIntegrity(
                "Monthly series is empty".to_string(),
            ));
        }

        for point in &points {
            if point.month.day() != 1 {
                return Err(ForecastError::DataIntegrity(format!(
                    "Month key {} is not the first day of a month",
                    point.month
                )));
            }
            if !point.total_spend.is_finite() || point.total_spend < 0.0 {
                return Err(ForecastError::DataIntegrity(format!(
                    "Month {} has invalid spend {}",
                    point.month, point.total_spend
                )));
            }
        }

        for pair in points.windows(2) {
            let (prev, next) = (pair[0].month, pair[1].month);
            if next == prev {
                return Err(ForecastError::DataIntegrity(format!(
                    "Duplicate month key {}",
                    next
                )));
            }
            if next < prev {
                return Err(ForecastError::DataIntegrity(format!(
                    "Month {} follows {}; keys must increase",
                    next, prev
                )));
            }
            if Some(next) != add_months(prev, 1) {
                return Err(ForecastError::DataIntegrity(format!(
                    "Gap between {} and {}",
                    prev, next
                )));
            }
        }

        Ok(Self { points })
    }

    /// Build a series from `(month, spend)` pairs
    pub fn from_pairs(pairs: impl IntoIterator<Item = (NaiveDate, f64)>) -> Result<Self> {
        Self::new(
            pairs
                .into_iter()
                .map(|(month, total_spend)| MonthlyAggregate { month, total_spend })
                .collect(),
        )
    }

    /// Read a monthly aggregate CSV and validate it
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let points: Vec<MonthlyAggregate> = procure_data::io::read_csv(path)?;
        Self::new(points)
    }

    /// Write the series as a monthly aggregate CSV
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        procure_data::io::write_csv(path, &MONTHLY_HEADER, &self.points)?;
        Ok(())
    }

    /// The first `months` points as a new series
    pub fn head(&self, months: usize) -> Result<Self> {
        if months == 0 || months > self.points.len() {
            return Err(ForecastError::Configuration(format!(
                "Cannot take {} months from a {}-month series",
                months,
                self.points.len()
            )));
        }
        Ok(Self {
            points: self.points[..months].to_vec(),
        })
    }

    /// Monthly points in order
    pub fn points(&self) -> &[MonthlyAggregate] {
        &self.points
    }

    /// Month keys in order
    pub fn months(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.month).collect()
    }

    /// Monthly spend values in order
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.total_spend).collect()
    }

    /// Number of months
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; a validated series holds at least one month
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First month in the series
    pub fn first_month(&self) -> NaiveDate {
        self.points[0].month
    }

    /// Last month in the series
    pub fn last_month(&self) -> NaiveDate {
        self.points[self.points.len() - 1].month
    }

    /// Total spend across all months
    pub fn total_spend(&self) -> f64 {
        self.points.iter().map(|p| p.total_spend).sum()
    }

    /// Months with no spend
    pub fn zero_months(&self) -> usize {
        self.points.iter().filter(|p| p.total_spend == 0.0).count()
    }
}

/// Group transactions by calendar month and sum their spend
///
/// Months inside the observed range without orders appear with zero spend so
/// the forecaster always sees an unbroken monthly cadence. Sums are taken in
/// whole cents, so the monthly totals add up to exactly the transaction total.
pub fn aggregate_monthly(transactions: &[Transaction]) -> Result<MonthlySeries> {
    if transactions.is_empty() {
        return Err(ForecastError::DataIntegrity(
            "Cannot aggregate an empty transaction table".to_string(),
        ));
    }

    let mut cents_by_month: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for transaction in transactions {
        if !transaction.total_spend.is_finite() || transaction.total_spend <= 0.0 {
            return Err(ForecastError::DataIntegrity(format!(
                "Order {} has non-positive spend {}",
                transaction.order_id, transaction.total_spend
            )));
        }
        let cents = cents_by_month.entry(transaction.month()).or_insert(0);
        *cents = add_spend_cents(*cents, transaction)?;
    }

    let (first, last) = match (cents_by_month.keys().next(), cents_by_month.keys().next_back()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => {
            return Err(ForecastError::DataIntegrity(
                "No months to aggregate".to_string(),
            ))
        }
    };

    let mut points = Vec::new();
    let mut month = first;
    while month <= last {
        let cents = cents_by_month.get(&month).copied().unwrap_or(0);
        points.push(MonthlyAggregate {
            month,
            total_spend: from_cents(cents),
        });
        month = add_months(month, 1).ok_or_else(|| {
            ForecastError::DataIntegrity(format!("Month after {} overflows the calendar", month))
        })?;
    }

    let series = MonthlySeries::new(points)?;
    let gaps = series.zero_months();
    if gaps > 0 {
        warn!(gaps, "months without transactions filled with zero spend");
    }
    info!(
        months = series.len(),
        first = %series.first_month(),
        last = %series.last_month(),
        "aggregated monthly spend"
    );
    Ok(series)
}

/// Shift a month key forward by `count` months
pub fn add_months(month: NaiveDate, count: u32) -> Option<NaiveDate> {
    month.checked_add_months(Months::new(count))
}

/// Whole cents represented by a monthly series
pub fn total_cents(series: &MonthlySeries) -> Result<i64> {
    series.points.iter().try_fold(0i64, |total, point| {
        total.checked_add(to_cents(point.total_spend)).ok_or_else(|| {
            ForecastError::DataIntegrity(format!("Spend total overflows at {}", point.month))
        })
    })
}

/// Add an order's spend to a running cent total
pub(crate) fn add_spend_cents(total: i64, transaction: &Transaction) -> Result<i64> {
    if transaction.total_spend >= MAX_SPEND {
        return Err(ForecastError::DataIntegrity(format!(
            "Order {} spend {} exceeds {}",
            transaction.order_id, transaction.total_spend, MAX_SPEND
        )));
    }
    total.checked_add(transaction.spend_cents()).ok_or_else(|| {
        ForecastError::DataIntegrity(format!(
            "Spend total overflows at order {}",
            transaction.order_id
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn test_add_months_crosses_year() {
        assert_eq!(add_months(month(2023, 11), 3), Some(month(2024, 2)));
    }

    #[test]
    fn test_series_rejects_duplicates() {
        let result = MonthlySeries::from_pairs(vec![(month(2023, 1), 1.0), (month(2023, 1), 2.0)]);
        assert!(matches!(result, Err(ForecastError::DataIntegrity(msg)) if msg.contains("Duplicate")));
    }

    #[test]
    fn test_series_rejects_out_of_order() {
        let result = MonthlySeries::from_pairs(vec![(month(2023, 2), 1.0), (month(2023, 1), 2.0)]);
        assert!(matches!(result, Err(ForecastError::DataIntegrity(_))));
    }

    #[test]
    fn test_series_rejects_gaps_and_mid_month_keys() {
        let gap = MonthlySeries::from_pairs(vec![(month(2023, 1), 1.0), (month(2023, 3), 2.0)]);
        assert!(matches!(gap, Err(ForecastError::DataIntegrity(msg)) if msg.contains("Gap")));

        let mid = MonthlySeries::from_pairs(vec![(NaiveDate::from_ymd_opt(2023, 1, 15).unwrap(), 1.0)]);
        assert!(mid.is_err());
    }

    #[test]
    fn test_series_rejects_negative_spend() {
        let result = MonthlySeries::from_pairs(vec![(month(2023, 1), -1.0)]);
        assert!(matches!(result, Err(ForecastError::DataIntegrity(_))));
    }

    #[test]
    fn test_aggregate_monthly_empty_fails() {
        assert!(aggregate_monthly(&[]).is_err());
    }
}
