//! Savings Optimizer CLI
//!
//! Runs one optimization from a JSON request and prints the result as JSON

use anyhow::{Context, Result};
use clap::Parser;
use savings_optimizer::{
    default_catalog, load_accounts, OptimizationInput, Optimizer, OptimizerConfig, SavingsGoal,
};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "savings-optimizer", version, about = "Allocate savings across accounts for the best after-tax return")]
struct Args {
    /// JSON request: savings_goals, earnings, isa_allowance_used, ...
    #[arg(short, long)]
    input: PathBuf,

    /// Account catalog (.csv or .json); the demo catalog when omitted
    #[arg(short, long)]
    accounts: Option<PathBuf>,

    /// Optimizer config JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Single-line JSON output
    #[arg(long)]
    compact: bool,
}

/// Request body; `total_investment` defaults to the sum of the goals
#[derive(Debug, Deserialize)]
struct OptimizationRequest {
    #[serde(default)]
    total_investment: Option<f64>,
    savings_goals: Vec<SavingsGoal>,
    #[serde(default)]
    earnings: Option<f64>,
    #[serde(default)]
    isa_allowance_used: f64,
    #[serde(default)]
    other_savings_income: Option<f64>,
}

impl From<OptimizationRequest> for OptimizationInput {
    fn from(request: OptimizationRequest) -> Self {
        let mut input = OptimizationInput::from_goals(request.savings_goals);
        if let Some(total) = request.total_investment {
            input.total_investment = total;
        }
        input.earnings = request.earnings;
        input.isa_allowance_used = request.isa_allowance_used;
        input.other_savings_income = request.other_savings_income;
        input
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let file = File::open(&args.input)
        .with_context(|| format!("Unable to open request {}", args.input.display()))?;
    let request: OptimizationRequest = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Invalid request in {}", args.input.display()))?;
    let input = OptimizationInput::from(request);

    let accounts = match &args.accounts {
        Some(path) => load_accounts(path)
            .with_context(|| format!("Failed to load accounts from {}", path.display()))?,
        None => default_catalog(),
    };

    let config = match &args.config {
        Some(path) => OptimizerConfig::from_json_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => OptimizerConfig::default(),
    };

    let optimizer = Optimizer::new(config)?;
    let result = optimizer.optimize(&input, &accounts)?;

    let output = if args.compact {
        serde_json::to_string(&result)?
    } else {
        serde_json::to_string_pretty(&result)?
    };
    println!("{}", output);

    Ok(())
}
