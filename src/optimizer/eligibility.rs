//! Account eligibility against the investment horizon

use crate::account::Account;
use crate::input::SavingsGoal;

/// Status reported when no account survives the filter
pub const NO_ELIGIBLE_ACCOUNTS_STATUS: &str =
    "No eligible accounts found for the given investment horizon.";

/// Longest goal horizon in years, floored at one year
pub fn investment_term_years(goals: &[SavingsGoal]) -> f64 {
    goals
        .iter()
        .map(|g| g.horizon_months as f64 / 12.0)
        .fold(1.0, f64::max)
}

/// Easy-access accounts plus any fixed account whose term fits the horizon.
///
/// Returns references in catalog order; the position in the returned vector
/// becomes the account's index in the allocation model.
pub fn eligible_accounts<'a>(accounts: &'a [Account], goals: &[SavingsGoal]) -> Vec<&'a Account> {
    let term_years = investment_term_years(goals);
    accounts
        .iter()
        .filter(|a| a.is_easy_access() || a.term_months as f64 / 12.0 <= term_years)
        .collect()
}
