//! Batch stages of the procurement pipeline
//!
//! Stages communicate only through files: `generate` writes the transaction
//! table, `analyze` reads it back and writes the monthly, risk, category,
//! forecast and KPI outputs. Every file is replaced atomically.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use procure_data::io::{read_transactions, write_atomically, write_csv};
use procure_data::{Transaction, TransactionGenerator};
use spend_forecast::data::{aggregate_monthly, MonthlySeries};
use spend_forecast::metrics::{evaluate_holdout, ForecastAccuracy};
use spend_forecast::models::{
    ForecastModel, SeasonalAdditiveModel, TrainedForecastModel, RELIABLE_HISTORY_MONTHS,
};
use spend_forecast::risk::{category_breakdown, CATEGORY_HEADER, RISK_HEADER};
use spend_forecast::{ForecastResult, KpiSummary, RiskAnalyzer, SupplierRisk};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Outputs of the analysis stage
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// Gap-free monthly spend series
    pub monthly: MonthlySeries,
    /// Supplier risk records, highest score first
    pub suppliers: Vec<SupplierRisk>,
    /// Forecast beyond the last observed month
    pub forecast: ForecastResult,
    /// Headline KPIs including forecast accuracy
    pub kpis: KpiSummary,
    /// Out-of-sample accuracy over the last `horizon` months, when history allows
    pub holdout: Option<ForecastAccuracy>,
}

fn ensure_output_directory(config: &PipelineConfig) -> Result<()> {
    fs::create_dir_all(&config.output.directory).map_err(|e| {
        PipelineError::Configuration(format!(
            "Cannot create output directory {}: {}",
            config.output.directory.display(),
            e
        ))
    })
}

/// Generate the synthetic transaction table and write it to the output directory
pub fn run_generate(config: &PipelineConfig) -> Result<Vec<Transaction>> {
    config.validate()?;
    ensure_output_directory(config)?;

    let generator = TransactionGenerator::new(config.generator.clone(), config.catalog.clone())?;
    let path = config.output.transactions_path();
    let transactions = generator.generate_to_csv(&path)?;

    info!(
        transactions = transactions.len(),
        path = %path.display(),
        "generate stage complete"
    );
    Ok(transactions)
}

/// Aggregate, score and forecast the transaction table at `input`
pub fn run_analyze<P: AsRef<Path>>(config: &PipelineConfig, input: P) -> Result<AnalysisReport> {
    config.validate()?;
    ensure_output_directory(config)?;

    let input = input.as_ref();
    let transactions = read_transactions(input)?;
    info!(
        transactions = transactions.len(),
        path = %input.display(),
        "loaded transaction table"
    );

    let monthly = aggregate_monthly(&transactions)?;
    monthly.to_csv(config.output.monthly_path())?;

    let analyzer = RiskAnalyzer::new(config.risk.clone())?;
    let suppliers = analyzer.assess_suppliers(&transactions)?;
    write_csv(config.output.risk_path(), &RISK_HEADER, &suppliers)?;

    let categories = category_breakdown(&transactions)?;
    write_csv(config.output.category_path(), &CATEGORY_HEADER, &categories)?;

    let forecast = forecast_series(config, &monthly)?;
    let holdout = holdout_accuracy(config, &monthly);

    let kpis = analyzer
        .summarize(&transactions, &suppliers)?
        .with_forecast(&forecast);
    write_kpis(config.output.kpi_path(), &kpis)?;

    info!(
        months = monthly.len(),
        suppliers = suppliers.len(),
        categories = categories.len(),
        directory = %config.output.directory.display(),
        "analyze stage complete"
    );
    Ok(AnalysisReport {
        monthly,
        suppliers,
        forecast,
        kpis,
        holdout,
    })
}

/// Generate, then analyze the freshly written table
pub fn run_all(config: &PipelineConfig) -> Result<AnalysisReport> {
    run_generate(config)?;
    run_analyze(config, config.output.transactions_path())
}

/// Forecast an existing monthly aggregate CSV
pub fn run_forecast<P: AsRef<Path>>(config: &PipelineConfig, monthly: P) -> Result<ForecastResult> {
    config.validate()?;
    ensure_output_directory(config)?;

    let series = MonthlySeries::from_csv(monthly)?;
    forecast_series(config, &series)
}

fn forecast_series(config: &PipelineConfig, series: &MonthlySeries) -> Result<ForecastResult> {
    let model = SeasonalAdditiveModel::new(config.forecast.clone())?;
    let trained = model.train(series)?;
    let forecast = trained.forecast(config.forecast.horizon)?;

    if forecast.is_low_confidence() {
        warn!(
            months = series.len(),
            "forecast is low-confidence; treat its intervals with care"
        );
    }
    forecast.to_csv(config.output.forecast_path())?;
    info!(
        model = trained.name(),
        horizon = forecast.horizons(),
        confidence = %forecast.confidence(),
        fit_accuracy = forecast.fit_accuracy(),
        "wrote forecast"
    );
    Ok(forecast)
}

/// Holdout scoring is a diagnostic; failures are logged, never fatal
fn holdout_accuracy(config: &PipelineConfig, series: &MonthlySeries) -> Option<ForecastAccuracy> {
    let holdout = config.forecast.horizon;
    if series.len() < RELIABLE_HISTORY_MONTHS + holdout {
        return None;
    }

    let model = SeasonalAdditiveModel::new(config.forecast.clone()).ok()?;
    match evaluate_holdout(&model, series, holdout) {
        Ok(accuracy) => {
            info!(
                holdout,
                mape = accuracy.mape,
                rmse = accuracy.rmse,
                "holdout accuracy"
            );
            Some(accuracy)
        }
        Err(e) => {
            warn!(holdout, error = %e, "holdout evaluation failed");
            None
        }
    }
}

fn write_kpis(path: impl AsRef<Path>, kpis: &KpiSummary) -> Result<()> {
    let json = kpis.to_json()?;
    write_atomically(path, |file| {
        file.write_all(json.as_bytes())?;
        file.write_all(b"\n")?;
        Ok(())
    })?;
    Ok(())
}
