//! Pipeline configuration
//!
//! Every section carries `#[serde(default)]`, so a configuration file only
//! needs the values it changes:
//!
//! ```json
//! { "generator": { "seed": 7 }, "forecast": { "horizon": 12 } }
//! ```

use crate::error::{PipelineError, Result};
use procure_data::io::write_atomically;
use procure_data::{GeneratorConfig, SupplierCatalog};
use serde::{Deserialize, Serialize};
use spend_forecast::models::SeasonalModelConfig;
use spend_forecast::RiskConfig;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where pipeline tables are written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory holding every output file
    pub directory: PathBuf,
    pub transactions_file: String,
    pub monthly_file: String,
    pub forecast_file: String,
    pub risk_file: String,
    pub category_file: String,
    pub kpi_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            transactions_file: "transactions.csv".to_string(),
            monthly_file: "monthly_spend.csv".to_string(),
            forecast_file: "forecast.csv".to_string(),
            risk_file: "supplier_risk.csv".to_string(),
            category_file: "category_spend.csv".to_string(),
            kpi_file: "kpi_summary.json".to_string(),
        }
    }
}

impl OutputConfig {
    fn file_names(&self) -> [(&'static str, &str); 6] {
        [
            ("transactions_file", self.transactions_file.as_str()),
            ("monthly_file", self.monthly_file.as_str()),
            ("forecast_file", self.forecast_file.as_str()),
            ("risk_file", self.risk_file.as_str()),
            ("category_file", self.category_file.as_str()),
            ("kpi_file", self.kpi_file.as_str()),
        ]
    }

    /// File names must be non-empty, bare and distinct
    pub fn validate(&self) -> Result<()> {
        if self.directory.as_os_str().is_empty() {
            return Err(PipelineError::Configuration(
                "Output directory must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for (field, name) in self.file_names() {
            if name.trim().is_empty() {
                return Err(PipelineError::Configuration(format!(
                    "Output {} must not be empty",
                    field
                )));
            }
            if Path::new(name).components().count() != 1 {
                return Err(PipelineError::Configuration(format!(
                    "Output {} must be a file name, got {:?}",
                    field, name
                )));
            }
            if !seen.insert(name) {
                return Err(PipelineError::Configuration(format!(
                    "Output file {:?} is used by more than one table",
                    name
                )));
            }
        }
        Ok(())
    }

    pub fn transactions_path(&self) -> PathBuf {
        self.directory.join(&self.transactions_file)
    }

    pub fn monthly_path(&self) -> PathBuf {
        self.directory.join(&self.monthly_file)
    }

    pub fn forecast_path(&self) -> PathBuf {
        self.directory.join(&self.forecast_file)
    }

    pub fn risk_path(&self) -> PathBuf {
        self.directory.join(&self.risk_file)
    }

    pub fn category_path(&self) -> PathBuf {
        self.directory.join(&self.category_file)
    }

    pub fn kpi_path(&self) -> PathBuf {
        self.directory.join(&self.kpi_file)
    }
}

/// Complete configuration of a pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Synthetic transaction table parameters
    pub generator: GeneratorConfig,
    /// Supplier and category lists
    pub catalog: SupplierCatalog,
    /// Risk weights and thresholds
    pub risk: RiskConfig,
    /// Forecaster hyperparameters
    pub forecast: SeasonalModelConfig,
    /// Output locations
    pub output: OutputConfig,
}

impl PipelineConfig {
    /// Load a JSON configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        debug!(path = %path.display(), "loaded pipeline configuration");
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomically(path, |file| {
            file.write_all(json.as_bytes())?;
            file.write_all(b"\n")?;
            Ok(())
        })?;
        Ok(())
    }

    /// Check every section before any stage runs
    pub fn validate(&self) -> Result<()> {
        self.generator.validate()?;
        self.catalog.validate()?;
        self.risk.validate()?;
        self.forecast.validate()?;
        self.output.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "generator": { "seed": 7 }, "output": { "directory": "out" } }"#)
                .unwrap();

        assert_eq!(config.generator.seed, 7);
        assert_eq!(config.generator.transaction_count, 2000);
        assert_eq!(config.output.directory, PathBuf::from("out"));
        assert_eq!(config.output.forecast_file, "forecast.csv");
        assert_eq!(config.forecast, SeasonalModelConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pipeline.json");

        let mut config = PipelineConfig::default();
        config.generator.transaction_count = 500;
        config.risk.critical_threshold = 40.0;
        config.save(&path).unwrap();

        assert_eq!(PipelineConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_validate_rejects_bad_sections() {
        let mut config = PipelineConfig::default();
        config.generator.transaction_count = 0;
        assert!(matches!(config.validate(), Err(PipelineError::Data(_))));

        let mut config = PipelineConfig::default();
        config.catalog.categories.clear();
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.forecast.interval_width = 1.5;
        assert!(matches!(config.validate(), Err(PipelineError::Forecast(_))));
    }

    #[test]
    fn test_output_names_must_be_distinct_bare_files() {
        let mut output = OutputConfig::default();
        output.forecast_file = output.monthly_file.clone();
        assert!(output.validate().is_err());

        let mut output = OutputConfig::default();
        output.kpi_file = "nested/kpi.json".to_string();
        assert!(output.validate().is_err());

        let mut output = OutputConfig::default();
        output.risk_file = " ".to_string();
        assert!(output.validate().is_err());
    }

    #[test]
    fn test_malformed_json_is_a_serialization_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            PipelineConfig::load(&path),
            Err(PipelineError::Serialization(_))
        ));
    }
}
