//! Run many optimization requests against one account catalog
//!
//! Reads a JSON array of inputs, optimizes them in parallel and writes one
//! summary row per request

use anyhow::{Context, Result};
use clap::Parser;
use savings_optimizer::{
    default_catalog, load_accounts, OptimizationInput, OptimizationResult, Optimizer,
    OptimizerConfig,
};
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Parser)]
#[command(name = "run_batch", about = "Optimize a batch of savings requests")]
struct Args {
    /// JSON array of optimization inputs
    #[arg(short, long)]
    input: PathBuf,

    /// Account catalog (.csv or .json); the demo catalog when omitted
    #[arg(short, long)]
    accounts: Option<PathBuf>,

    /// Optimizer config JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Summary CSV
    #[arg(short, long, default_value = "batch_summary.csv")]
    output: PathBuf,
}

/// One CSV row per request
#[derive(Debug, Serialize)]
struct SummaryRow {
    request: usize,
    status: String,
    total_investment: f64,
    investments: usize,
    gross_annual_interest: Option<f64>,
    tax_due: Option<f64>,
    net_annual_interest: Option<f64>,
    net_effective_aer: Option<f64>,
    tax_band: Option<String>,
}

impl SummaryRow {
    fn new(request: usize, input: &OptimizationInput, result: &OptimizationResult) -> Self {
        let summary = result.summary.as_ref();
        Self {
            request,
            status: result.status.clone(),
            total_investment: input.total_investment,
            investments: result.investments.len(),
            gross_annual_interest: summary.map(|s| s.gross_annual_interest),
            tax_due: summary.map(|s| s.tax_due),
            net_annual_interest: summary.map(|s| s.net_annual_interest),
            net_effective_aer: summary.map(|s| s.net_effective_aer),
            tax_band: summary.map(|s| s.tax_band.clone()),
        }
    }

    fn error(request: usize, input: &OptimizationInput, message: String) -> Self {
        Self {
            request,
            status: format!("Error: {}", message),
            total_investment: input.total_investment,
            investments: 0,
            gross_annual_interest: None,
            tax_due: None,
            net_annual_interest: None,
            net_effective_aer: None,
            tax_band: None,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let start = Instant::now();

    let file = File::open(&args.input)
        .with_context(|| format!("Unable to open requests {}", args.input.display()))?;
    let inputs: Vec<OptimizationInput> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Invalid requests in {}", args.input.display()))?;
    println!("Loaded {} requests", inputs.len());

    let accounts = match &args.accounts {
        Some(path) => load_accounts(path)
            .with_context(|| format!("Failed to load accounts from {}", path.display()))?,
        None => default_catalog(),
    };
    println!("Using {} accounts", accounts.len());

    let config = match &args.config {
        Some(path) => OptimizerConfig::from_json_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => OptimizerConfig::default(),
    };
    let optimizer = Optimizer::new(config)?;

    let solve_start = Instant::now();
    let results = optimizer.optimize_batch(&inputs, &accounts);
    println!("Optimizations complete in {:?}", solve_start.elapsed());

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    let mut optimal = 0;
    for (i, (input, result)) in inputs.iter().zip(&results).enumerate() {
        let row = match result {
            Ok(result) => {
                if result.is_optimal() {
                    optimal += 1;
                }
                SummaryRow::new(i, input, result)
            }
            Err(err) => SummaryRow::error(i, input, err.to_string()),
        };
        writer.serialize(row)?;
    }
    writer.flush()?;

    println!("Output written to {}", args.output.display());
    println!("\nBatch Summary:");
    println!("  Requests: {}", inputs.len());
    println!("  Optimal:  {}", optimal);
    println!("  Other:    {}", inputs.len() - optimal);
    println!("\nTotal time: {:?}", start.elapsed());

    Ok(())
}
