//! Supplier risk scoring and procurement KPIs
//!
//! Each supplier is scored as
//!
//! `RiskScore = delivery_weight * (1 - on_time_rate) + lead_time_weight * avg_lead_time`
//!
//! and bucketed by inclusive lower thresholds, so a score sitting exactly on a
//! threshold lands in the more severe level.

use crate::data::add_spend_cents;
use crate::error::{ForecastError, Result};
use crate::models::{ForecastResult, HistoryAssessment};
use procure_data::{from_cents, Transaction};
use procure_math::stats::{mean, proportion, safe_ratio};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

/// Column order of the supplier risk table
pub const RISK_HEADER: [&str; 6] = [
    "SupplierID",
    "TotalSpend",
    "OnTimeRate",
    "AvgLeadTime",
    "RiskScore",
    "RiskLevel",
];

/// Column order of the category breakdown table
pub const CATEGORY_HEADER: [&str; 4] = [
    "TherapeuticCategory",
    "TotalSpend",
    "OrderCount",
    "ShareOfSpend",
];

/// Supplier risk tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl RiskLevel {
    /// Critical and High suppliers count towards spend concentration
    pub fn is_elevated(self) -> bool {
        matches!(self, Self::Critical | Self::High)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Critical => "Critical",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        };
        f.write_str(label)
    }
}

/// Risk weights, level thresholds and the savings benchmark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Score points per unit of late-delivery share
    pub delivery_weight: f64,
    /// Score points per day of average lead time
    pub lead_time_weight: f64,
    /// Lowest Critical score
    pub critical_threshold: f64,
    /// Lowest High score
    pub high_threshold: f64,
    /// Lowest Medium score; anything below is Low
    pub medium_threshold: f64,
    /// List price per order the savings rate is measured against
    pub benchmark_unit_price: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            delivery_weight: 50.0,
            lead_time_weight: 0.2,
            critical_threshold: 35.0,
            high_threshold: 33.0,
            medium_threshold: 30.0,
            benchmark_unit_price: 30_000_000.0,
        }
    }
}

impl RiskConfig {
    /// Weights must be non-negative and thresholds strictly descending
    pub fn validate(&self) -> Result<()> {
        let values = [
            self.delivery_weight,
            self.lead_time_weight,
            self.critical_threshold,
            self.high_threshold,
            self.medium_threshold,
            self.benchmark_unit_price,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::Configuration(
                "Risk weights, thresholds and benchmark must be finite".to_string(),
            ));
        }
        if self.delivery_weight < 0.0 || self.lead_time_weight < 0.0 {
            return Err(ForecastError::Configuration(
                "Risk weights must be non-negative".to_string(),
            ));
        }
        if !(self.critical_threshold > self.high_threshold
            && self.high_threshold > self.medium_threshold)
        {
            return Err(ForecastError::Configuration(format!(
                "Thresholds must descend: critical {} > high {} > medium {}",
                self.critical_threshold, self.high_threshold, self.medium_threshold
            )));
        }
        if self.benchmark_unit_price <= 0.0 {
            return Err(ForecastError::Configuration(
                "Benchmark unit price must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Weighted score from delivery performance and lead time
    pub fn score(&self, on_time_rate: f64, avg_lead_time: f64) -> f64 {
        self.delivery_weight * (1.0 - on_time_rate) + self.lead_time_weight * avg_lead_time
    }

    /// Bucket a score; every finite score maps to exactly one level
    pub fn classify(&self, score: f64) -> RiskLevel {
        if score >= self.critical_threshold {
            RiskLevel::Critical
        } else if score >= self.high_threshold {
            RiskLevel::High
        } else if score >= self.medium_threshold {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Per-supplier performance and risk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SupplierRisk {
    /// Supplier name, the supplier key of the transaction table
    #[serde(rename = "SupplierID")]
    pub supplier_id: String,
    pub total_spend: f64,
    pub on_time_rate: f64,
    pub avg_lead_time: f64,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
}

/// Spend per therapeutic category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CategorySpend {
    pub therapeutic_category: String,
    pub total_spend: f64,
    pub order_count: usize,
    pub share_of_spend: f64,
}

/// Headline procurement KPIs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub total_spend: f64,
    pub order_count: usize,
    pub supplier_count: usize,
    /// Share of all orders delivered on time
    pub on_time_rate: f64,
    pub avg_lead_time: f64,
    /// Percentage saved against the benchmark list price
    pub savings_rate: f64,
    /// Share of spend held by Critical and High suppliers
    pub spend_concentration: f64,
    pub high_risk_supplier_count: usize,
    /// Suppliers per risk level
    pub risk_level_counts: BTreeMap<RiskLevel, usize>,
    pub forecast_accuracy: Option<f64>,
    pub forecast_confidence: Option<HistoryAssessment>,
}

impl KpiSummary {
    /// Attach forecast accuracy and confidence
    pub fn with_forecast(mut self, forecast: &ForecastResult) -> Self {
        self.forecast_accuracy = Some(forecast.fit_accuracy());
        self.forecast_confidence = Some(forecast.confidence());
        self
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Default)]
struct SupplierTally {
    spend_cents: i64,
    orders: usize,
    on_time: usize,
    lead_days: u64,
}

/// Groups transactions into supplier risk records and KPIs
#[derive(Debug, Clone, Default)]
pub struct RiskAnalyzer {
    config: RiskConfig,
}

impl RiskAnalyzer {
    /// Create an analyzer after validating its configuration
    pub fn new(config: RiskConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Risk weights and thresholds
    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// One risk record per supplier with at least one order
    ///
    /// Records are ordered by descending score, then supplier name.
    pub fn assess_suppliers(&self, transactions: &[Transaction]) -> Result<Vec<SupplierRisk>> {
        ensure_not_empty(transactions)?;

        let mut tallies: BTreeMap<&str, SupplierTally> = BTreeMap::new();
        for transaction in transactions {
            let tally = tallies
                .entry(transaction.supplier_name.as_str())
                .or_default();
            tally.spend_cents = add_spend_cents(tally.spend_cents, transaction)?;
            tally.orders += 1;
            tally.on_time += usize::from(transaction.on_time_delivery);
            tally.lead_days += u64::from(transaction.lead_time);
        }

        let mut records: Vec<SupplierRisk> = tallies
            .into_iter()
            .map(|(supplier, tally)| {
                let on_time_rate = tally.on_time as f64 / tally.orders as f64;
                let avg_lead_time = tally.lead_days as f64 / tally.orders as f64;
                let risk_score = self.config.score(on_time_rate, avg_lead_time);
                SupplierRisk {
                    supplier_id: supplier.to_string(),
                    total_spend: from_cents(tally.spend_cents),
                    on_time_rate,
                    avg_lead_time,
                    risk_score,
                    risk_level: self.config.classify(risk_score),
                }
            })
            .collect();

        records.sort_by(|a, b| {
            b.risk_score
                .partial_cmp(&a.risk_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.supplier_id.cmp(&b.supplier_id))
        });
        Ok(records)
    }

    /// Global KPIs over the transaction table and its supplier records
    pub fn summarize(
        &self,
        transactions: &[Transaction],
        suppliers: &[SupplierRisk],
    ) -> Result<KpiSummary> {
        ensure_not_empty(transactions)?;

        let order_count = transactions.len();
        let total_cents = transactions.iter().try_fold(0, add_spend_cents)?;
        let total_spend = from_cents(total_cents);
        let on_time_rate = proportion(transactions.iter().map(|t| t.on_time_delivery))?;
        let lead_times: Vec<f64> = transactions.iter().map(|t| f64::from(t.lead_time)).collect();
        let avg_lead_time = mean(&lead_times)?;

        let benchmark = self.config.benchmark_unit_price * order_count as f64;
        let savings_rate = (benchmark - total_spend) / benchmark * 100.0;

        let elevated_spend: f64 = suppliers
            .iter()
            .filter(|s| s.risk_level.is_elevated())
            .map(|s| s.total_spend)
            .sum();

        let mut risk_level_counts = BTreeMap::new();
        for level in [
            RiskLevel::Critical,
            RiskLevel::High,
            RiskLevel::Medium,
            RiskLevel::Low,
        ] {
            risk_level_counts.insert(level, 0);
        }
        for supplier in suppliers {
            *risk_level_counts.entry(supplier.risk_level).or_insert(0) += 1;
        }

        let summary = KpiSummary {
            total_spend,
            order_count,
            supplier_count: suppliers.len(),
            on_time_rate,
            avg_lead_time,
            savings_rate,
            spend_concentration: safe_ratio(elevated_spend, total_spend),
            high_risk_supplier_count: suppliers
                .iter()
                .filter(|s| s.risk_level.is_elevated())
                .count(),
            risk_level_counts,
            forecast_accuracy: None,
            forecast_confidence: None,
        };

        info!(
            total_spend = summary.total_spend,
            on_time_rate = summary.on_time_rate,
            high_risk_suppliers = summary.high_risk_supplier_count,
            spend_concentration = summary.spend_concentration,
            "summarized procurement KPIs"
        );
        Ok(summary)
    }
}

/// Spend and order count per therapeutic category, largest spend first
pub fn category_breakdown(transactions: &[Transaction]) -> Result<Vec<CategorySpend>> {
    ensure_not_empty(transactions)?;

    let mut by_category: BTreeMap<&str, (i64, usize)> = BTreeMap::new();
    for transaction in transactions {
        let entry = by_category
            .entry(transaction.therapeutic_category.as_str())
            .or_insert((0, 0));
        entry.0 = add_spend_cents(entry.0, transaction)?;
        entry.1 += 1;
    }
    let total_cents = transactions.iter().try_fold(0, add_spend_cents)?;

    let mut categories: Vec<CategorySpend> = by_category
        .into_iter()
        .map(|(category, (cents, orders))| CategorySpend {
            therapeutic_category: category.to_string(),
            total_spend: from_cents(cents),
            order_count: orders,
            share_of_spend: safe_ratio(cents as f64, total_cents as f64),
        })
        .collect();
    categories.sort_by(|a, b| {
        b.total_spend
            .partial_cmp(&a.total_spend)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.therapeutic_category.cmp(&b.therapeutic_category))
    });
    Ok(categories)
}

fn ensure_not_empty(transactions: &[Transaction]) -> Result<()> {
    if transactions.is_empty() {
        return Err(ForecastError::DataIntegrity(
            "Transaction table is empty".to_string(),
        ));
    }
    Ok(())
}
