//! The optimization pipeline
//!
//! input + accounts -> tax policy, eligible accounts -> allocation model
//! -> solver -> result

use super::eligibility::eligible_accounts;
use super::model::AllocationModelBuilder;
use super::result::{interpret, OptimizationResult};
use super::solver::{DeadlineSolver, LinearProgramSolver, MicroLpSolver};
use crate::account::Account;
use crate::config::OptimizerConfig;
use crate::error::Result;
use crate::input::OptimizationInput;
use crate::tax::TaxPolicy;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::fmt;
use std::sync::Arc;

/// Stateless optimizer: every call rebuilds and solves its own model
#[derive(Clone)]
pub struct Optimizer {
    config: OptimizerConfig,
    solver: Arc<dyn LinearProgramSolver + Send + Sync>,
}

impl Optimizer {
    /// Optimizer backed by the microlp simplex solver
    pub fn new(config: OptimizerConfig) -> Result<Self> {
        Self::with_solver(config, MicroLpSolver)
    }

    /// Optimizer backed by any solver; wrapped in a deadline when configured
    pub fn with_solver<S>(config: OptimizerConfig, solver: S) -> Result<Self>
    where
        S: LinearProgramSolver + Send + Sync + 'static,
    {
        config.validate()?;
        let solver: Arc<dyn LinearProgramSolver + Send + Sync> = match config.solve_timeout() {
            Some(timeout) => Arc::new(DeadlineSolver::new(Arc::new(solver), timeout)),
            None => Arc::new(solver),
        };
        Ok(Self { config, solver })
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Allocate `input.total_investment` across `accounts`.
    ///
    /// Returns `Err` only for malformed inputs or account records. An
    /// allocation that cannot be made is reported through the result's
    /// `status`.
    pub fn optimize(
        &self,
        input: &OptimizationInput,
        accounts: &[Account],
    ) -> Result<OptimizationResult> {
        input.validate()?;
        for account in accounts {
            account.validate()?;
        }

        info!(
            "Optimizing £{:.2} across {} goals and {} accounts",
            input.total_investment,
            input.savings_goals.len(),
            accounts.len()
        );

        let tax_policy = TaxPolicy::resolve(input.earnings);
        debug!(
            "Tax policy: {} at {:.0}%, allowance £{:.2}",
            tax_policy.band,
            tax_policy.tax_rate * 100.0,
            tax_policy.tax_free_allowance()
        );

        let eligible = eligible_accounts(accounts, &input.savings_goals);
        if eligible.is_empty() {
            info!("No account fits the investment horizon");
            return Ok(OptimizationResult::no_eligible_accounts());
        }
        debug!("{} of {} accounts eligible", eligible.len(), accounts.len());

        let model = AllocationModelBuilder::new(&self.config).build(eligible, input, &tax_policy);
        debug!(
            "Model has {} variables and {} constraints",
            model.program().num_variables(),
            model.program().num_constraints()
        );

        let outcome = self.solver.solve(model.program());
        if !outcome.is_optimal() {
            warn!("Solver terminated with status: {}", outcome.status);
        }

        let result = interpret(&model, &outcome, self.config.allocation_tolerance);
        info!(
            "Optimization finished: {} ({} investments)",
            result.status,
            result.investments.len()
        );
        Ok(result)
    }

    /// Run independent optimizations in parallel; output order matches input
    pub fn optimize_batch(
        &self,
        inputs: &[OptimizationInput],
        accounts: &[Account],
    ) -> Vec<Result<OptimizationResult>> {
        inputs
            .par_iter()
            .map(|input| self.optimize(input, accounts))
            .collect()
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self {
            config: OptimizerConfig::default(),
            solver: Arc::new(MicroLpSolver),
        }
    }
}

impl fmt::Debug for Optimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Optimizer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Optimize with the default configuration and solver
pub fn optimize_savings(
    input: &OptimizationInput,
    accounts: &[Account],
) -> Result<OptimizationResult> {
    Optimizer::default().optimize(input, accounts)
}
