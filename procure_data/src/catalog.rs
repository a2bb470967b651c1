//! Supplier and therapeutic category lists
//!
//! The lists are configuration data rather than constants so tests and
//! alternative scenarios can substitute smaller fixtures.

use crate::{DataError, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_SUPPLIERS: [&str; 22] = [
    "Pfizer",
    "Novartis",
    "Roche",
    "Merck & Co",
    "GSK",
    "Sanofi",
    "AstraZeneca",
    "Johnson & Johnson",
    "AbbVie",
    "Bristol-Myers Squibb",
    "Eli Lilly",
    "Amgen",
    "Gilead Sciences",
    "Bayer",
    "Novo Nordisk",
    "Takeda",
    "Boehringer Ingelheim",
    "Teva",
    "Viatris",
    "Sandoz",
    "Cardinal Health",
    "McKesson",
];

const DEFAULT_CATEGORIES: [&str; 8] = [
    "Oncology",
    "Cardiovascular",
    "Anti-infectives",
    "Neurology",
    "Diabetes & Endocrine",
    "Respiratory",
    "Immunology",
    "Vaccines",
];

/// Suppliers and categories transactions are drawn from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplierCatalog {
    /// Supplier names; order fixes the sampling index
    pub suppliers: Vec<String>,
    /// Therapeutic categories
    pub categories: Vec<String>,
    /// Optional relative sampling weight per supplier
    pub supplier_weights: Option<Vec<f64>>,
}

impl Default for SupplierCatalog {
    fn default() -> Self {
        Self {
            suppliers: DEFAULT_SUPPLIERS.iter().map(|s| s.to_string()).collect(),
            categories: DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect(),
            supplier_weights: None,
        }
    }
}

impl SupplierCatalog {
    /// Build a catalog with uniform supplier weights
    pub fn new<S: Into<String>>(
        suppliers: impl IntoIterator<Item = S>,
        categories: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let catalog = Self {
            suppliers: suppliers.into_iter().map(Into::into).collect(),
            categories: categories.into_iter().map(Into::into).collect(),
            supplier_weights: None,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Attach per-supplier sampling weights
    pub fn with_weights(mut self, weights: Vec<f64>) -> Result<Self> {
        self.supplier_weights = Some(weights);
        self.validate()?;
        Ok(self)
    }

    /// Check lists are non-empty, names unique and weights usable
    pub fn validate(&self) -> Result<()> {
        if self.suppliers.is_empty() {
            return Err(DataError::Configuration(
                "Supplier list must not be empty".to_string(),
            ));
        }
        if self.categories.is_empty() {
            return Err(DataError::Configuration(
                "Category list must not be empty".to_string(),
            ));
        }
        if let Some(name) = first_duplicate(&self.suppliers) {
            return Err(DataError::Configuration(format!(
                "Duplicate supplier name: {}",
                name
            )));
        }
        if let Some(name) = first_duplicate(&self.categories) {
            return Err(DataError::Configuration(format!(
                "Duplicate category name: {}",
                name
            )));
        }

        if let Some(weights) = &self.supplier_weights {
            if weights.len() != self.suppliers.len() {
                return Err(DataError::Configuration(format!(
                    "Expected {} supplier weights, found {}",
                    self.suppliers.len(),
                    weights.len()
                )));
            }
            if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(DataError::Configuration(
                    "Supplier weights must be finite and non-negative".to_string(),
                ));
            }
            if weights.iter().all(|w| *w == 0.0) {
                return Err(DataError::Configuration(
                    "At least one supplier weight must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn first_duplicate(names: &[String]) -> Option<&str> {
    let mut seen = std::collections::HashSet::new();
    names
        .iter()
        .find(|name| !seen.insert(name.as_str()))
        .map(String::as_str)
}
