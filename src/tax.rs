//! Tax treatment of savings interest (simplified UK, non-Scottish bands)
//!
//! Interest is tax free up to the Personal Savings Allowance for the
//! investor's income tax band, plus the starting rate for savings band that
//! low earners get on top of it. Anything above that is taxed at the band's
//! marginal rate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper limit of the basic rate band
pub const BASIC_RATE_LIMIT: f64 = 50_270.0;

/// Upper limit of the higher rate band
pub const HIGHER_RATE_LIMIT: f64 = 125_140.0;

/// Income below which no income tax is due
pub const PERSONAL_ALLOWANCE: f64 = 12_570.0;

/// Full starting rate for savings band
pub const STARTING_RATE_MAX_BAND: f64 = 5_000.0;

/// Income tax band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxBand {
    #[serde(rename = "Basic Rate")]
    Basic,
    #[serde(rename = "Higher Rate")]
    Higher,
    #[serde(rename = "Additional Rate")]
    Additional,
}

impl TaxBand {
    /// Band for the given earnings; unknown earnings are treated as basic rate
    pub fn from_earnings(earnings: Option<f64>) -> Self {
        match earnings {
            None => TaxBand::Basic,
            Some(e) if e <= BASIC_RATE_LIMIT => TaxBand::Basic,
            Some(e) if e <= HIGHER_RATE_LIMIT => TaxBand::Higher,
            Some(_) => TaxBand::Additional,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaxBand::Basic => "Basic Rate",
            TaxBand::Higher => "Higher Rate",
            TaxBand::Additional => "Additional Rate",
        }
    }

    /// Marginal rate on taxable interest
    pub fn tax_rate(&self) -> f64 {
        match self {
            TaxBand::Basic => 0.20,
            TaxBand::Higher => 0.40,
            TaxBand::Additional => 0.45,
        }
    }

    pub fn personal_savings_allowance(&self) -> f64 {
        match self {
            TaxBand::Basic => 1_000.0,
            TaxBand::Higher => 500.0,
            TaxBand::Additional => 0.0,
        }
    }
}

impl fmt::Display for TaxBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Tax position derived from earnings, fresh for every optimization
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TaxPolicy {
    pub band: TaxBand,
    pub tax_rate: f64,
    pub personal_savings_allowance: f64,
    pub starting_rate_for_savings: f64,
}

impl TaxPolicy {
    pub fn resolve(earnings: Option<f64>) -> Self {
        let band = TaxBand::from_earnings(earnings);
        Self {
            band,
            tax_rate: band.tax_rate(),
            personal_savings_allowance: band.personal_savings_allowance(),
            starting_rate_for_savings: starting_rate_for_savings(earnings),
        }
    }

    /// PSA plus starting rate band
    pub fn tax_free_allowance(&self) -> f64 {
        self.personal_savings_allowance + self.starting_rate_for_savings
    }

    /// Allowance left after interest the investor already earns elsewhere
    pub fn remaining_allowance(&self, other_savings_income: Option<f64>) -> f64 {
        (self.tax_free_allowance() - other_savings_income.unwrap_or(0.0)).max(0.0)
    }
}

/// Starting rate for savings: up to £5,000, reduced pound for pound by
/// earnings above the personal allowance
pub fn starting_rate_for_savings(earnings: Option<f64>) -> f64 {
    let earnings = match earnings {
        Some(e) => e,
        None => return 0.0,
    };

    if earnings >= PERSONAL_ALLOWANCE + STARTING_RATE_MAX_BAND {
        0.0
    } else if earnings <= PERSONAL_ALLOWANCE {
        STARTING_RATE_MAX_BAND
    } else {
        (STARTING_RATE_MAX_BAND - (earnings - PERSONAL_ALLOWANCE)).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_unknown_earnings_default_to_basic_rate() {
        let policy = TaxPolicy::resolve(None);
        assert_eq!(policy.band, TaxBand::Basic);
        assert_eq!(policy.band.label(), "Basic Rate");
        assert_abs_diff_eq!(policy.tax_rate, 0.20);
        assert_abs_diff_eq!(policy.personal_savings_allowance, 1_000.0);
        assert_abs_diff_eq!(policy.starting_rate_for_savings, 0.0);
    }

    #[test]
    fn test_band_boundaries() {
        assert_eq!(TaxBand::from_earnings(Some(50_270.0)), TaxBand::Basic);
        assert_eq!(TaxBand::from_earnings(Some(50_270.01)), TaxBand::Higher);
        assert_eq!(TaxBand::from_earnings(Some(125_140.0)), TaxBand::Higher);
        assert_eq!(TaxBand::from_earnings(Some(125_140.01)), TaxBand::Additional);

        let additional = TaxPolicy::resolve(Some(200_000.0));
        assert_abs_diff_eq!(additional.tax_rate, 0.45);
        assert_abs_diff_eq!(additional.tax_free_allowance(), 0.0);
    }

    #[test]
    fn test_starting_rate_tapers_above_personal_allowance() {
        assert_abs_diff_eq!(starting_rate_for_savings(None), 0.0);
        assert_abs_diff_eq!(starting_rate_for_savings(Some(0.0)), 5_000.0);
        assert_abs_diff_eq!(starting_rate_for_savings(Some(12_570.0)), 5_000.0);
        assert_abs_diff_eq!(starting_rate_for_savings(Some(15_000.0)), 2_570.0);
        assert_abs_diff_eq!(starting_rate_for_savings(Some(17_570.0)), 0.0);
        assert_abs_diff_eq!(starting_rate_for_savings(Some(40_000.0)), 0.0);
    }

    #[test]
    fn test_low_earner_gets_both_allowances() {
        let policy = TaxPolicy::resolve(Some(14_000.0));
        assert_abs_diff_eq!(policy.tax_free_allowance(), 1_000.0 + 3_570.0);
    }

    #[test]
    fn test_other_savings_income_uses_allowance_first() {
        let policy = TaxPolicy::resolve(Some(60_000.0));
        assert_abs_diff_eq!(policy.remaining_allowance(None), 500.0);
        assert_abs_diff_eq!(policy.remaining_allowance(Some(200.0)), 300.0);
        assert_abs_diff_eq!(policy.remaining_allowance(Some(900.0)), 0.0);
    }
}
