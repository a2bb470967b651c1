//! Seeded synthetic transaction generation
//!
//! Every field is drawn from a named distribution:
//!
//! | Field               | Distribution                                   |
//! |---------------------|------------------------------------------------|
//! | OrderDate           | uniform day offset over `window_days` from `epoch` |
//! | SupplierName        | uniform, or weighted by `supplier_weights`     |
//! | TotalSpend          | uniform over `[spend_min, spend_max]`, cents   |
//! | TherapeuticCategory | uniform                                        |
//! | OnTimeDelivery      | Bernoulli(`on_time_probability`)               |
//! | LeadTime            | uniform integer over `[lead_time_min, lead_time_max]` |
//!
//! The same seed, configuration and catalog reproduce the same table. Draws
//! come from `ChaCha12Rng`, whose output stream is fixed across releases.

use crate::catalog::SupplierCatalog;
use crate::{round_to_cents, DataError, Result, Transaction, MAX_SPEND};
use chrono::{Days, NaiveDate};
use rand::distributions::{Bernoulli, Distribution, Uniform, WeightedIndex};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Parameters of the synthetic transaction table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Number of transactions to produce
    pub transaction_count: usize,
    /// Random seed
    pub seed: u64,
    /// First possible order date
    pub epoch: NaiveDate,
    /// Number of days in the order date window
    pub window_days: u32,
    /// Smallest order value
    pub spend_min: f64,
    /// Largest order value
    pub spend_max: f64,
    /// Probability an order is delivered on time
    pub on_time_probability: f64,
    /// Shortest lead time in days
    pub lead_time_min: u32,
    /// Longest lead time in days
    pub lead_time_max: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            transaction_count: 2000,
            seed: 42,
            epoch: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap_or_default(),
            window_days: 1095,
            spend_min: 10_000.0,
            spend_max: 50_000_000.0,
            on_time_probability: 0.456,
            lead_time_min: 25,
            lead_time_max: 40,
        }
    }
}

impl GeneratorConfig {
    /// Reject counts, ranges and probabilities the generator cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.transaction_count == 0 {
            return Err(DataError::Configuration(
                "Transaction count must be positive".to_string(),
            ));
        }
        if self.window_days == 0 {
            return Err(DataError::Configuration(
                "Order date window must span at least one day".to_string(),
            ));
        }
        if self.last_order_date().is_none() {
            return Err(DataError::Configuration(format!(
                "Order date window of {} days from {} overflows the calendar",
                self.window_days, self.epoch
            )));
        }
        if !self.spend_min.is_finite() || !self.spend_max.is_finite() || self.spend_min < 0.01 {
            return Err(DataError::Configuration(
                "Spend bounds must be finite and at least one cent".to_string(),
            ));
        }
        if self.spend_min > self.spend_max {
            return Err(DataError::Configuration(format!(
                "Spend range is empty: [{}, {}]",
                self.spend_min, self.spend_max
            )));
        }
        if self.transaction_count as f64 * self.spend_max >= MAX_SPEND {
            return Err(DataError::Configuration(format!(
                "{} orders of up to {} can overflow the cent totals",
                self.transaction_count, self.spend_max
            )));
        }
        if !(0.0..=1.0).contains(&self.on_time_probability) {
            return Err(DataError::Configuration(format!(
                "On-time probability must be in [0, 1], got {}",
                self.on_time_probability
            )));
        }
        if self.lead_time_min == 0 {
            return Err(DataError::Configuration(
                "Lead time must be at least one day".to_string(),
            ));
        }
        if self.lead_time_min > self.lead_time_max {
            return Err(DataError::Configuration(format!(
                "Lead time range is empty: [{}, {}]",
                self.lead_time_min, self.lead_time_max
            )));
        }
        Ok(())
    }

    /// Last date inside the order window
    pub fn last_order_date(&self) -> Option<NaiveDate> {
        self.epoch
            .checked_add_days(Days::new(u64::from(self.window_days.saturating_sub(1))))
    }
}

/// Produces synthetic transaction tables
#[derive(Debug, Clone)]
pub struct TransactionGenerator {
    config: GeneratorConfig,
    catalog: SupplierCatalog,
}

/// Supplier index sampler
enum SupplierSampler {
    Uniform(Uniform<usize>),
    Weighted(WeightedIndex<f64>),
}

impl SupplierSampler {
    fn sample(&self, rng: &mut ChaCha12Rng) -> usize {
        match self {
            Self::Uniform(dist) => dist.sample(rng),
            Self::Weighted(dist) => dist.sample(rng),
        }
    }
}

impl TransactionGenerator {
    /// Create a generator after validating the configuration and catalog
    pub fn new(config: GeneratorConfig, catalog: SupplierCatalog) -> Result<Self> {
        config.validate()?;
        catalog.validate()?;
        Ok(Self { config, catalog })
    }

    /// Generate the full transaction table
    pub fn generate(&self) -> Result<Vec<Transaction>> {
        let config = &self.config;
        let mut rng = ChaCha12Rng::seed_from_u64(config.seed);

        let day_offset = Uniform::new(0u64, u64::from(config.window_days));
        let supplier = match &self.catalog.supplier_weights {
            Some(weights) => SupplierSampler::Weighted(
                WeightedIndex::new(weights)
                    .map_err(|e| DataError::Configuration(format!("Supplier weights: {}", e)))?,
            ),
            None => SupplierSampler::Uniform(Uniform::new(0, self.catalog.suppliers.len())),
        };
        let spend = Uniform::new_inclusive(config.spend_min, config.spend_max);
        let category = Uniform::new(0, self.catalog.categories.len());
        let on_time = Bernoulli::new(config.on_time_probability)
            .map_err(|e| DataError::Configuration(format!("On-time probability: {}", e)))?;
        let lead_days = Uniform::new_inclusive(config.lead_time_min, config.lead_time_max);

        let mut transactions = Vec::with_capacity(config.transaction_count);
        for order_id in 1..=config.transaction_count as u64 {
            let order_date = config
                .epoch
                .checked_add_days(Days::new(day_offset.sample(&mut rng)))
                .ok_or_else(|| {
                    DataError::Configuration("Order date overflows the calendar".to_string())
                })?;
            let supplier_name = self.catalog.suppliers[supplier.sample(&mut rng)].clone();
            // spend_min is at least one cent, so rounding keeps spend positive
            let total_spend = round_to_cents(spend.sample(&mut rng));
            let therapeutic_category = self.catalog.categories[category.sample(&mut rng)].clone();
            let on_time_delivery = on_time.sample(&mut rng);
            let lead_time = lead_days.sample(&mut rng);

            transactions.push(Transaction {
                order_id,
                order_date,
                supplier_name,
                total_spend,
                therapeutic_category,
                on_time_delivery,
                lead_time,
            });
        }

        debug!(
            seed = config.seed,
            suppliers = self.catalog.suppliers.len(),
            categories = self.catalog.categories.len(),
            "sampled transaction table"
        );
        info!(
            transactions = transactions.len(),
            first_date = %config.epoch,
            window_days = config.window_days,
            "generated synthetic transactions"
        );
        Ok(transactions)
    }

    /// Generate the table and write it to `path` as CSV
    pub fn generate_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Transaction>> {
        let transactions = self.generate()?;
        crate::io::write_transactions(path, &transactions)?;
        Ok(transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_catalog() -> SupplierCatalog {
        SupplierCatalog::new(vec!["Alpha", "Beta", "Gamma"], vec!["Oncology", "Vaccines"]).unwrap()
    }

    #[test]
    fn test_zero_count_rejected() {
        let config = GeneratorConfig {
            transaction_count: 0,
            ..GeneratorConfig::default()
        };
        let result = TransactionGenerator::new(config, small_catalog());
        assert!(matches!(result, Err(DataError::Configuration(_))));
    }

    #[test]
    fn test_invalid_ranges_rejected() {
        let bad = [
            GeneratorConfig {
                spend_min: 0.0,
                ..GeneratorConfig::default()
            },
            GeneratorConfig {
                spend_min: 10.0,
                spend_max: 5.0,
                ..GeneratorConfig::default()
            },
            GeneratorConfig {
                on_time_probability: 1.5,
                ..GeneratorConfig::default()
            },
            GeneratorConfig {
                lead_time_min: 41,
                ..GeneratorConfig::default()
            },
            GeneratorConfig {
                lead_time_min: 0,
                ..GeneratorConfig::default()
            },
            GeneratorConfig {
                window_days: 0,
                ..GeneratorConfig::default()
            },
            GeneratorConfig {
                transaction_count: 200,
                spend_min: 1e16,
                spend_max: 1e17,
                ..GeneratorConfig::default()
            },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{:?} should be rejected", config);
        }
    }

    #[test]
    fn test_default_window_ends_on_last_day_of_third_year() {
        let config = GeneratorConfig::default();
        assert_eq!(
            config.last_order_date(),
            NaiveDate::from_ymd_opt(2023, 12, 31)
        );
    }

    #[test]
    fn test_weighted_sampling_skips_zero_weight_supplier() {
        let catalog = small_catalog().with_weights(vec![0.0, 1.0, 1.0]).unwrap();
        let config = GeneratorConfig {
            transaction_count: 300,
            ..GeneratorConfig::default()
        };
        let transactions = TransactionGenerator::new(config, catalog)
            .unwrap()
            .generate()
            .unwrap();
        assert!(transactions.iter().all(|t| t.supplier_name != "Alpha"));
    }
}
