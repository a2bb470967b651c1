//! `procurement` command line entry point

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pharma_procurement::config::PipelineConfig;
use pharma_procurement::pipeline::{run_all, run_analyze, run_forecast, run_generate, AnalysisReport};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Pharmaceutical procurement analytics pipeline
#[derive(Parser)]
#[command(name = "procurement")]
#[command(about = "Synthetic procurement data, supplier risk scoring and spend forecasting", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON configuration file; defaults apply to anything it leaves out
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the random seed
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Override the number of generated transactions
    #[arg(long, global = true)]
    transactions: Option<usize>,

    /// Override the output directory
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the synthetic transaction table
    Generate,

    /// Aggregate, score and forecast an existing transaction table
    Analyze {
        /// Transaction CSV; defaults to the configured output file
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Forecast an existing monthly aggregate CSV
    Forecast {
        /// Monthly CSV with Month,TotalSpend columns
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Generate then analyze
    Run,

    /// Write the default configuration as JSON
    InitConfig {
        /// Destination file
        #[arg(default_value = "procurement.json")]
        path: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(seed) = cli.seed {
        config.generator.seed = seed;
    }
    if let Some(count) = cli.transactions {
        config.generator.transaction_count = count;
    }
    if let Some(directory) = &cli.output_dir {
        config.output.directory = directory.clone();
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn print_report(report: &AnalysisReport) {
    let kpis = &report.kpis;
    println!("Months analysed:      {}", report.monthly.len());
    println!("Total spend:          {:.2}", kpis.total_spend);
    println!("On-time rate:         {:.1}%", kpis.on_time_rate * 100.0);
    println!("Savings rate:         {:.1}%", kpis.savings_rate);
    println!(
        "High-risk suppliers:  {} of {} ({:.1}% of spend)",
        kpis.high_risk_supplier_count,
        kpis.supplier_count,
        kpis.spend_concentration * 100.0
    );
    println!(
        "Forecast:             {} months, {} history, fit accuracy {:.1}%",
        report.forecast.horizons(),
        report.forecast.confidence(),
        report.forecast.fit_accuracy() * 100.0
    );
    if let Some(holdout) = &report.holdout {
        print!("{}", holdout);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::InitConfig { path } => {
            PipelineConfig::default()
                .save(path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote default configuration to {}", path.display());
        }
        Commands::Generate => {
            let config = load_config(&cli)?;
            let transactions = run_generate(&config).context("Generate stage failed")?;
            println!(
                "Wrote {} transactions to {}",
                transactions.len(),
                config.output.transactions_path().display()
            );
        }
        Commands::Analyze { input } => {
            let config = load_config(&cli)?;
            let input = input
                .clone()
                .unwrap_or_else(|| config.output.transactions_path());
            let report = run_analyze(&config, &input)
                .with_context(|| format!("Analyze stage failed for {}", input.display()))?;
            print_report(&report);
        }
        Commands::Forecast { input } => {
            let config = load_config(&cli)?;
            let forecast = run_forecast(&config, input)
                .with_context(|| format!("Forecast failed for {}", input.display()))?;
            for point in forecast.points() {
                println!(
                    "{}  {:>18.2}  [{:.2}, {:.2}]",
                    point.month, point.predicted_spend, point.lower_bound, point.upper_bound
                );
            }
        }
        Commands::Run => {
            let config = load_config(&cli)?;
            let report = run_all(&config).context("Pipeline run failed")?;
            print_report(&report);
        }
    }

    Ok(())
}
