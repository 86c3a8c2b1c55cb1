//! Allocation model: eligible accounts, goals and tax policy as a linear program
//!
//! Decision variables, in index order:
//! - one amount per eligible account (index `i` is the `i`-th eligible account)
//! - `taxable_interest`: non-ISA interest above the tax-free allowance
//! - `tax_free_interest_non_isa`: non-ISA interest covered by the allowance
//!
//! Objective (maximised):
//! ISA interest + tax-free interest + taxable interest after tax
//! + headroom weight x unused ISA allowance.

use super::solver::{Comparison, LinearProgram, VarId};
use crate::account::Account;
use crate::config::OptimizerConfig;
use crate::input::OptimizationInput;
use crate::tax::TaxPolicy;
use std::collections::BTreeMap;

pub const TOTAL_INVESTMENT_CONSTRAINT: &str = "total_investment";
pub const INTEREST_SPLIT_CONSTRAINT: &str = "non_isa_interest_split";
pub const TAX_FREE_ALLOWANCE_CONSTRAINT: &str = "tax_free_allowance";
pub const ISA_ALLOWANCE_CONSTRAINT: &str = "isa_allowance";

/// Label of the equality tying a goal horizon to accounts of that exact term
pub fn horizon_constraint_label(horizon_months: u32) -> String {
    format!("horizon_{}m", horizon_months)
}

/// A built model plus everything needed to read its solution back
#[derive(Debug, Clone)]
pub struct AllocationModel<'a> {
    accounts: Vec<&'a Account>,
    program: LinearProgram,
    taxable_interest: VarId,
    tax_free_interest: VarId,
    horizon_targets: BTreeMap<u32, f64>,
    tax_policy: TaxPolicy,
    tax_free_allowance: f64,
    isa_allowance_remaining: f64,
    total_investment: f64,
}

impl<'a> AllocationModel<'a> {
    pub fn accounts(&self) -> &[&'a Account] {
        &self.accounts
    }

    pub fn program(&self) -> &LinearProgram {
        &self.program
    }

    /// Variable holding the amount for the `index`-th eligible account
    pub fn amount_var(&self, index: usize) -> VarId {
        index
    }

    pub fn taxable_interest_var(&self) -> VarId {
        self.taxable_interest
    }

    pub fn tax_free_interest_var(&self) -> VarId {
        self.tax_free_interest
    }

    /// Goal totals per horizon, ascending
    pub fn horizon_targets(&self) -> &BTreeMap<u32, f64> {
        &self.horizon_targets
    }

    pub fn tax_policy(&self) -> &TaxPolicy {
        &self.tax_policy
    }

    /// Tax-free allowance left for these savings
    pub fn tax_free_allowance(&self) -> f64 {
        self.tax_free_allowance
    }

    /// ISA allowance available before this allocation
    pub fn isa_allowance_remaining(&self) -> f64 {
        self.isa_allowance_remaining
    }

    pub fn total_investment(&self) -> f64 {
        self.total_investment
    }
}

/// Turns eligible accounts and investor inputs into an [`AllocationModel`]
#[derive(Debug, Clone)]
pub struct AllocationModelBuilder<'c> {
    config: &'c OptimizerConfig,
}

impl<'c> AllocationModelBuilder<'c> {
    pub fn new(config: &'c OptimizerConfig) -> Self {
        Self { config }
    }

    pub fn build<'a>(
        &self,
        accounts: Vec<&'a Account>,
        input: &OptimizationInput,
        tax_policy: &TaxPolicy,
    ) -> AllocationModel<'a> {
        let weight = self.config.isa_headroom_weight;
        let isa_allowance_remaining =
            (self.config.isa_annual_allowance - input.isa_allowance_used).max(0.0);
        let tax_free_allowance = tax_policy.remaining_allowance(input.other_savings_income);

        let mut program = LinearProgram::new();

        // Amount variables first so account index == variable index.
        // Unused ISA allowance = remaining - Σ ISA amounts, so its weight
        // lands on the ISA coefficients plus a constant.
        for account in &accounts {
            let objective = if account.is_isa() {
                account.interest_rate - weight
            } else {
                0.0
            };
            program.add_variable(
                account.name.clone(),
                objective,
                (0.0, account.max_investment_bound()),
            );
        }
        program.set_objective_constant(weight * isa_allowance_remaining);

        let taxable_interest = program.add_variable(
            "taxable_interest",
            1.0 - tax_policy.tax_rate,
            (0.0, f64::INFINITY),
        );
        let tax_free_interest =
            program.add_variable("tax_free_interest_non_isa", 1.0, (0.0, f64::INFINITY));

        // 1. Everything is invested
        program.add_constraint(
            TOTAL_INVESTMENT_CONSTRAINT,
            (0..accounts.len()).map(|i| (i, 1.0)).collect(),
            Comparison::Eq,
            input.total_investment,
        );

        // 2. Each horizon is funded exactly by accounts of that term
        let horizon_targets = input.amounts_by_horizon();
        for (&horizon, &target) in &horizon_targets {
            let terms = accounts
                .iter()
                .enumerate()
                .filter(|(_, a)| a.term_months == horizon)
                .map(|(i, _)| (i, 1.0))
                .collect();
            program.add_constraint(
                horizon_constraint_label(horizon),
                terms,
                Comparison::Eq,
                target,
            );
        }

        // 3. taxable + tax_free - Σ non-ISA interest == 0
        let mut split_terms = vec![(taxable_interest, 1.0), (tax_free_interest, 1.0)];
        split_terms.extend(
            accounts
                .iter()
                .enumerate()
                .filter(|(_, a)| !a.is_isa())
                .map(|(i, a)| (i, -a.interest_rate)),
        );
        program.add_constraint(INTEREST_SPLIT_CONSTRAINT, split_terms, Comparison::Eq, 0.0);

        // 4. Tax-free interest is capped by the allowance
        program.add_constraint(
            TAX_FREE_ALLOWANCE_CONSTRAINT,
            vec![(tax_free_interest, 1.0)],
            Comparison::Le,
            tax_free_allowance,
        );

        // 5. Per-account caps are the amount variables' upper bounds.
        //    Minimum deposits are not modelled.

        // 6. ISA subscriptions stay within what is left of the allowance
        program.add_constraint(
            ISA_ALLOWANCE_CONSTRAINT,
            accounts
                .iter()
                .enumerate()
                .filter(|(_, a)| a.is_isa())
                .map(|(i, _)| (i, 1.0))
                .collect(),
            Comparison::Le,
            isa_allowance_remaining,
        );

        AllocationModel {
            accounts,
            program,
            taxable_interest,
            tax_free_interest,
            horizon_targets,
            tax_policy: *tax_policy,
            tax_free_allowance,
            isa_allowance_remaining,
            total_investment: input.total_investment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountType;
    use crate::input::SavingsGoal;
    use approx::assert_abs_diff_eq;

    fn accounts() -> Vec<Account> {
        vec![
            Account::new("Easy", "Bank", 0.04, AccountType::VariableAccess, 0),
            Account::new("Bond 12", "Bank", 0.05, AccountType::FixedTerm, 12)
                .with_max_investment(50_000.0),
            Account::new("ISA 12", "Bank", 0.045, AccountType::FixedTermIsa, 12),
            Account::new("Bond 24", "Bank", 0.055, AccountType::FixedTerm, 24),
        ]
    }

    fn input() -> OptimizationInput {
        OptimizationInput::from_goals(vec![
            SavingsGoal::new(10_000.0, 12),
            SavingsGoal::new(2_000.0, 12),
            SavingsGoal::new(5_000.0, 24),
        ])
        .with_earnings(60_000.0)
        .with_isa_allowance_used(4_000.0)
    }

    #[test]
    fn test_variables_and_constraints() {
        let config = OptimizerConfig::default();
        let catalog = accounts();
        let tax = TaxPolicy::resolve(Some(60_000.0));
        let model = AllocationModelBuilder::new(&config).build(catalog.iter().collect(), &input(), &tax);
        let program = model.program();

        // 4 amounts + 2 interest splits
        assert_eq!(program.num_variables(), 6);
        assert_eq!(model.taxable_interest_var(), 4);
        assert_eq!(model.tax_free_interest_var(), 5);

        // total, two horizons, split, allowance, ISA
        assert_eq!(program.num_constraints(), 6);

        let bond = &program.variables()[model.amount_var(1)];
        assert_eq!(bond.upper, 50_000.0);
        assert!(program.variables()[0].upper.is_infinite());

        let horizon_12 = program.constraint(&horizon_constraint_label(12)).unwrap();
        assert_eq!(horizon_12.terms, vec![(1, 1.0), (2, 1.0)]);
        assert_eq!(horizon_12.rhs, 12_000.0);

        let isa = program.constraint(ISA_ALLOWANCE_CONSTRAINT).unwrap();
        assert_eq!(isa.terms, vec![(2, 1.0)]);
        assert_eq!(isa.rhs, 16_000.0);

        let allowance = program.constraint(TAX_FREE_ALLOWANCE_CONSTRAINT).unwrap();
        assert_eq!(allowance.rhs, 500.0);
    }

    #[test]
    fn test_objective_coefficients() {
        let config = OptimizerConfig::default();
        let catalog = accounts();
        let tax = TaxPolicy::resolve(Some(60_000.0));
        let model = AllocationModelBuilder::new(&config).build(catalog.iter().collect(), &input(), &tax);
        let vars = model.program().variables();

        assert_eq!(vars[0].objective, 0.0);
        assert_abs_diff_eq!(vars[2].objective, 0.045 - config.isa_headroom_weight);
        assert_abs_diff_eq!(vars[4].objective, 0.60);
        assert_abs_diff_eq!(vars[5].objective, 1.0);
        assert_abs_diff_eq!(
            model.program().objective_constant(),
            config.isa_headroom_weight * 16_000.0
        );
    }

    #[test]
    fn test_unmatched_horizon_gets_empty_row() {
        let config = OptimizerConfig::default();
        let catalog = accounts();
        let goals = OptimizationInput::from_goals(vec![SavingsGoal::new(3_000.0, 18)]);
        let tax = TaxPolicy::resolve(None);
        let model = AllocationModelBuilder::new(&config).build(catalog.iter().collect(), &goals, &tax);

        let horizon_18 = model.program().constraint(&horizon_constraint_label(18)).unwrap();
        assert!(horizon_18.terms.is_empty());
        assert_eq!(horizon_18.rhs, 3_000.0);
    }

    #[test]
    fn test_overused_isa_allowance_clamps_to_zero() {
        let config = OptimizerConfig::default();
        let catalog = accounts();
        let over = input().with_isa_allowance_used(25_000.0);
        let tax = TaxPolicy::resolve(None);
        let model = AllocationModelBuilder::new(&config).build(catalog.iter().collect(), &over, &tax);
        assert_eq!(model.isa_allowance_remaining(), 0.0);
        assert_eq!(model.program().objective_constant(), 0.0);
    }
}
