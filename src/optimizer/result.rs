//! Read a solved allocation model back into investments and a tax summary
//!
//! Reported figures are recomputed from the rounded allocation rather than
//! taken from the solver's interest variables, so the summary always agrees
//! with the investment lines it sits next to.

use super::eligibility::NO_ELIGIBLE_ACCOUNTS_STATUS;
use super::model::AllocationModel;
use super::solver::SolveOutcome;
use crate::account::Account;
use serde::{Deserialize, Serialize};

pub const OPTIMAL_STATUS: &str = "Optimal";

/// One line of the recommended allocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    pub account_name: String,
    /// Amount in pounds, to the penny
    pub amount: f64,
    /// Rate as a percentage, 2 dp
    pub aer: f64,
    pub term: String,
    pub is_isa: bool,
    pub platform: String,
    pub url: String,
}

/// Return and tax position of the allocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_investment: f64,
    pub gross_annual_interest: f64,
    pub net_annual_interest: f64,
    /// Net interest as a percentage of the amount invested
    pub net_effective_aer: f64,
    pub tax_due: f64,
    pub tax_band: String,
    pub personal_savings_allowance: f64,
    pub starting_rate_for_savings: f64,
    /// Allowance applied to this allocation's non-ISA interest
    pub tax_free_allowance: f64,
    /// Non-ISA interest covered by the allowance
    pub tax_free_interest: f64,
    /// ISA allowance left after this allocation
    pub isa_allowance_remaining: f64,
}

/// Outcome of one optimization. Callers branch on `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub investments: Vec<Investment>,
    pub summary: Option<Summary>,
    pub status: String,
    /// Solver objective (after-tax interest plus tie-break term)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective_value: Option<f64>,
}

impl OptimizationResult {
    pub fn no_eligible_accounts() -> Self {
        Self::without_allocation(NO_ELIGIBLE_ACCOUNTS_STATUS.to_string())
    }

    pub fn failed(reason: impl std::fmt::Display) -> Self {
        Self::without_allocation(format!("Optimization failed. Status: {}", reason))
    }

    fn without_allocation(status: String) -> Self {
        Self {
            investments: Vec::new(),
            summary: None,
            status,
            objective_value: None,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == OPTIMAL_STATUS
    }

    /// Sum of the allocated amounts
    pub fn total_allocated(&self) -> f64 {
        self.investments.iter().map(|i| i.amount).sum()
    }
}

/// Round to 2 decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn pennies_floor(value: f64) -> i64 {
    (value * 100.0 + 1e-7).floor() as i64
}

/// A solved amount on its way to becoming an investment line
#[derive(Debug, Clone)]
struct Line<'a> {
    account: &'a Account,
    solved: f64,
    pennies: i64,
    cap_pennies: i64,
}

impl Line<'_> {
    /// Rounded amount in pounds
    fn amount(&self) -> f64 {
        self.pennies as f64 / 100.0
    }

    /// Part of the solved amount lost by flooring to pennies
    fn remainder(&self) -> f64 {
        self.solved * 100.0 - self.pennies as f64
    }
}

/// Turn a solve outcome into the caller-facing result
pub fn interpret(
    model: &AllocationModel<'_>,
    outcome: &SolveOutcome,
    allocation_tolerance: f64,
) -> OptimizationResult {
    if !outcome.is_optimal() {
        return OptimizationResult::failed(&outcome.status);
    }

    let mut lines: Vec<Line<'_>> = Vec::new();
    for (index, &account) in model.accounts().iter().enumerate() {
        let solved = outcome
            .values
            .get(model.amount_var(index))
            .copied()
            .unwrap_or(0.0);
        if solved > allocation_tolerance {
            lines.push(Line {
                account,
                solved,
                pennies: pennies_floor(solved),
                cap_pennies: pennies_floor(account.max_investment_bound()),
            });
        } else if solved > 0.0 {
            log::debug!("Dropping {:.3e} in '{}' as solver noise", solved, account.name);
        }
    }

    reconcile_pennies(model, &mut lines);
    lines.retain(|line| line.pennies > 0);

    let investments: Vec<Investment> = lines
        .iter()
        .map(|line| Investment {
            account_name: line.account.name.clone(),
            amount: line.amount(),
            aer: round2(line.account.interest_rate * 100.0),
            term: line.account.term_label(),
            is_isa: line.account.is_isa(),
            platform: line.account.platform.clone(),
            url: line.account.reference_url(),
        })
        .collect();

    let summary = summarize(model, &lines);

    OptimizationResult {
        investments,
        summary: Some(summary),
        status: OPTIMAL_STATUS.to_string(),
        objective_value: outcome.objective,
    }
}

/// Hand out the pennies lost to flooring so every horizon group adds up to
/// its goal total, largest remainder first, without breaking a deposit cap
/// or the ISA allowance.
fn reconcile_pennies(model: &AllocationModel<'_>, lines: &mut [Line<'_>]) {
    let isa_cap = pennies_floor(model.isa_allowance_remaining());
    let mut isa_used: i64 = lines
        .iter()
        .filter(|l| l.account.is_isa())
        .map(|l| l.pennies)
        .sum();

    for (&horizon, &target) in model.horizon_targets() {
        let target = (target * 100.0).round() as i64;
        let mut group: Vec<usize> = (0..lines.len())
            .filter(|&i| lines[i].account.term_months == horizon)
            .collect();
        let allocated: i64 = group.iter().map(|&i| lines[i].pennies).sum();
        let mut shortfall = target - allocated;

        group.sort_by(|&a, &b| {
            lines[b]
                .remainder()
                .total_cmp(&lines[a].remainder())
                .then(lines[b].solved.total_cmp(&lines[a].solved))
        });

        while shortfall > 0 {
            let mut placed = false;
            for &i in &group {
                let line = &lines[i];
                let isa_ok = !line.account.is_isa() || isa_used < isa_cap;
                if line.pennies < line.cap_pennies && isa_ok {
                    lines[i].pennies += 1;
                    if lines[i].account.is_isa() {
                        isa_used += 1;
                    }
                    shortfall -= 1;
                    placed = true;
                    if shortfall == 0 {
                        break;
                    }
                }
            }
            if !placed {
                log::warn!(
                    "Could not place {} pennies for the {}-month horizon",
                    shortfall,
                    horizon
                );
                break;
            }
        }

        // Only reachable when the goal total itself has fractions of a penny
        while shortfall < 0 {
            match group.iter().copied().max_by_key(|&i| lines[i].pennies) {
                Some(i) if lines[i].pennies > 0 => {
                    lines[i].pennies -= 1;
                    if lines[i].account.is_isa() {
                        isa_used -= 1;
                    }
                    shortfall += 1;
                }
                _ => break,
            }
        }
    }
}

fn summarize(model: &AllocationModel<'_>, lines: &[Line<'_>]) -> Summary {
    let tax = model.tax_policy();

    let mut gross = 0.0;
    let mut non_isa_gross = 0.0;
    let mut isa_total = 0.0;
    for line in lines {
        let amount = line.amount();
        let interest = amount * line.account.interest_rate;
        gross += interest;
        if line.account.is_isa() {
            isa_total += amount;
        } else {
            non_isa_gross += interest;
        }
    }

    let allowance = model.tax_free_allowance();
    let taxable = (non_isa_gross - allowance).max(0.0);
    let tax_due = taxable * tax.tax_rate;
    let net = gross - tax_due;
    let total = model.total_investment();
    let net_effective_aer = if total > 0.0 { net / total * 100.0 } else { 0.0 };

    Summary {
        total_investment: round2(total),
        gross_annual_interest: round2(gross),
        net_annual_interest: round2(net),
        net_effective_aer: round2(net_effective_aer),
        tax_due: round2(tax_due),
        tax_band: tax.band.label().to_string(),
        personal_savings_allowance: tax.personal_savings_allowance,
        starting_rate_for_savings: tax.starting_rate_for_savings,
        tax_free_allowance: round2(allowance),
        tax_free_interest: round2(non_isa_gross.min(allowance)),
        isa_allowance_remaining: round2((model.isa_allowance_remaining() - isa_total).max(0.0)),
    }
}
