//! Investor inputs: amount, savings goals and income

use crate::error::{OptimizerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sum of goal amounts has to match the lump sum to within this
const TOTAL_MATCH_TOLERANCE: f64 = 1e-6;

/// Money needed at a given point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub amount: f64,

    /// Months until the money is needed
    #[serde(alias = "horizon")]
    pub horizon_months: u32,
}

impl SavingsGoal {
    pub fn new(amount: f64, horizon_months: u32) -> Self {
        Self { amount, horizon_months }
    }
}

/// Everything the investor tells us for one optimization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationInput {
    /// Lump sum to allocate, equal to the sum of goal amounts
    pub total_investment: f64,

    pub savings_goals: Vec<SavingsGoal>,

    /// Annual income from sources other than these savings
    #[serde(default)]
    pub earnings: Option<f64>,

    /// ISA subscriptions already made this tax year
    #[serde(default)]
    pub isa_allowance_used: f64,

    /// Interest already earned elsewhere, which uses up tax-free allowance first
    #[serde(default)]
    pub other_savings_income: Option<f64>,
}

impl OptimizationInput {
    /// Build an input whose total is the sum of the goals
    pub fn from_goals(savings_goals: Vec<SavingsGoal>) -> Self {
        let total_investment = savings_goals.iter().map(|g| g.amount).sum();
        Self {
            total_investment,
            savings_goals,
            earnings: None,
            isa_allowance_used: 0.0,
            other_savings_income: None,
        }
    }

    pub fn with_earnings(mut self, earnings: f64) -> Self {
        self.earnings = Some(earnings);
        self
    }

    pub fn with_isa_allowance_used(mut self, used: f64) -> Self {
        self.isa_allowance_used = used;
        self
    }

    pub fn with_other_savings_income(mut self, income: f64) -> Self {
        self.other_savings_income = Some(income);
        self
    }

    /// Goal totals keyed by horizon, in ascending horizon order
    pub fn amounts_by_horizon(&self) -> BTreeMap<u32, f64> {
        let mut totals = BTreeMap::new();
        for goal in &self.savings_goals {
            *totals.entry(goal.horizon_months).or_insert(0.0) += goal.amount;
        }
        totals
    }

    /// Check the input contract
    pub fn validate(&self) -> Result<()> {
        if self.savings_goals.is_empty() {
            return Err(invalid("savings_goals must not be empty"));
        }
        for (i, goal) in self.savings_goals.iter().enumerate() {
            if !goal.amount.is_finite() || goal.amount <= 0.0 {
                return Err(invalid(format!(
                    "savings_goals[{}].amount must be > 0, got {}",
                    i, goal.amount
                )));
            }
        }
        if !self.total_investment.is_finite() || self.total_investment <= 0.0 {
            return Err(invalid(format!(
                "total_investment must be > 0, got {}",
                self.total_investment
            )));
        }

        let goal_total: f64 = self.savings_goals.iter().map(|g| g.amount).sum();
        if (self.total_investment - goal_total).abs() > TOTAL_MATCH_TOLERANCE {
            return Err(invalid(format!(
                "total_investment {} does not match the sum of savings goals {}",
                self.total_investment, goal_total
            )));
        }

        check_non_negative("earnings", self.earnings)?;
        check_non_negative("isa_allowance_used", Some(self.isa_allowance_used))?;
        check_non_negative("other_savings_income", self.other_savings_income)?;
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> OptimizerError {
    OptimizerError::InvalidInput(message.into())
}

fn check_non_negative(field: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => {
            Err(invalid(format!("{} must be >= 0, got {}", field, v)))
        }
        _ => Ok(()),
    }
}
