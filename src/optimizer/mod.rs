//! Allocation optimizer: eligibility, model building, solving, interpretation
//!
//! # Example
//!
//! ```rust,ignore
//! use savings_optimizer::{default_catalog, OptimizationInput, Optimizer, SavingsGoal};
//!
//! let input = OptimizationInput::from_goals(vec![
//!     SavingsGoal::new(10_000.0, 12),
//!     SavingsGoal::new(5_000.0, 24),
//! ])
//! .with_earnings(50_000.0);
//!
//! let result = Optimizer::default().optimize(&input, &default_catalog())?;
//! println!("{}", result.status);
//! ```

mod eligibility;
mod engine;
pub mod model;
mod result;
pub mod solver;

pub use eligibility::{eligible_accounts, investment_term_years, NO_ELIGIBLE_ACCOUNTS_STATUS};
pub use engine::{optimize_savings, Optimizer};
pub use model::{AllocationModel, AllocationModelBuilder};
pub use result::{interpret, round2, Investment, OptimizationResult, Summary, OPTIMAL_STATUS};
pub use solver::{
    Comparison, DeadlineSolver, LinearProgram, LinearProgramSolver, MicroLpSolver, SolveOutcome,
    TerminationStatus,
};
