//! Savings Optimizer - tax-aware allocation of a lump sum across savings accounts
//!
//! This library provides:
//! - UK savings tax policy (PSA, starting rate for savings, band rates)
//! - Account eligibility against savings goal horizons
//! - A linear program over account amounts, ISA allowance and tax-free interest
//! - Pluggable LP solving (microlp by default, optional deadline)
//! - Result interpretation into investments and a return/tax summary
//! - Account catalog loading from CSV or JSON

pub mod account;
pub mod config;
pub mod error;
pub mod input;
pub mod optimizer;
pub mod tax;

// Re-export commonly used types
pub use account::{default_catalog, load_accounts, Account, AccountType};
pub use config::OptimizerConfig;
pub use error::{OptimizerError, Result};
pub use input::{OptimizationInput, SavingsGoal};
pub use optimizer::{optimize_savings, Investment, OptimizationResult, Optimizer, Summary};
pub use tax::{TaxBand, TaxPolicy};
