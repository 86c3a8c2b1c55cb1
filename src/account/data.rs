//! Savings account records as supplied by the market-data collaborator

use crate::error::{OptimizerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How money can be withdrawn from an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    /// Withdraw at any time
    EasyAccess,
    /// Locked until the term ends
    FixedTerm,
    /// Withdraw after a notice period
    Notice,
}

/// Account type tag: access type crossed with ISA wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    #[serde(alias = "easy_access")]
    VariableAccess,
    FixedTerm,
    Notice,
    #[serde(alias = "easy_access_isa")]
    VariableAccessIsa,
    FixedTermIsa,
    NoticeIsa,
}

impl AccountType {
    pub fn is_isa(&self) -> bool {
        matches!(
            self,
            AccountType::VariableAccessIsa | AccountType::FixedTermIsa | AccountType::NoticeIsa
        )
    }

    pub fn access(&self) -> AccessType {
        match self {
            AccountType::VariableAccess | AccountType::VariableAccessIsa => AccessType::EasyAccess,
            AccountType::FixedTerm | AccountType::FixedTermIsa => AccessType::FixedTerm,
            AccountType::Notice | AccountType::NoticeIsa => AccessType::Notice,
        }
    }

    /// Tag as written in catalogs
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::VariableAccess => "variable_access",
            AccountType::FixedTerm => "fixed_term",
            AccountType::Notice => "notice",
            AccountType::VariableAccessIsa => "variable_access_isa",
            AccountType::FixedTermIsa => "fixed_term_isa",
            AccountType::NoticeIsa => "notice_isa",
        }
    }
}

impl FromStr for AccountType {
    type Err = OptimizerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "variable_access" | "easy_access" => Ok(AccountType::VariableAccess),
            "fixed_term" => Ok(AccountType::FixedTerm),
            "notice" => Ok(AccountType::Notice),
            "variable_access_isa" | "easy_access_isa" => Ok(AccountType::VariableAccessIsa),
            "fixed_term_isa" => Ok(AccountType::FixedTermIsa),
            "notice_isa" => Ok(AccountType::NoticeIsa),
            other => Err(OptimizerError::UnknownAccountType(other.to_string())),
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate savings account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,

    /// Provider or platform offering the account
    #[serde(default)]
    pub platform: String,

    /// Annual interest rate as a fraction (0.055 = 5.5%)
    pub interest_rate: f64,

    pub account_type: AccountType,

    /// Fixed term in months, 0 for easy access
    #[serde(default)]
    pub term_months: u32,

    /// Published minimum deposit (informational, not enforced)
    #[serde(default)]
    pub min_investment: f64,

    /// Maximum deposit, None when unlimited
    #[serde(default)]
    pub max_investment: Option<f64>,

    #[serde(default)]
    pub url: Option<String>,
}

impl Account {
    pub fn new(
        name: impl Into<String>,
        platform: impl Into<String>,
        interest_rate: f64,
        account_type: AccountType,
        term_months: u32,
    ) -> Self {
        Self {
            name: name.into(),
            platform: platform.into(),
            interest_rate,
            account_type,
            term_months,
            min_investment: 0.0,
            max_investment: None,
            url: None,
        }
    }

    pub fn with_max_investment(mut self, max: f64) -> Self {
        self.max_investment = Some(max);
        self
    }

    pub fn with_min_investment(mut self, min: f64) -> Self {
        self.min_investment = min;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn is_isa(&self) -> bool {
        self.account_type.is_isa()
    }

    pub fn is_easy_access(&self) -> bool {
        self.term_months == 0
    }

    /// Deposit cap as a bound, infinite when the account has none
    pub fn max_investment_bound(&self) -> f64 {
        self.max_investment.unwrap_or(f64::INFINITY)
    }

    /// "Easy access" or "<n> months"
    pub fn term_label(&self) -> String {
        match self.term_months {
            0 => "Easy access".to_string(),
            1 => "1 month".to_string(),
            n => format!("{} months", n),
        }
    }

    /// The account's own link, or a web search for its name
    pub fn reference_url(&self) -> String {
        match &self.url {
            Some(url) if !url.trim().is_empty() => url.clone(),
            _ => format!(
                "https://www.google.com/search?q={}",
                self.name.trim().replace(' ', "+")
            ),
        }
    }

    /// Reject records the model cannot represent
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| OptimizerError::InvalidAccount {
            name: self.name.clone(),
            reason,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name is empty".to_string()));
        }
        if !self.interest_rate.is_finite() {
            return Err(invalid(format!(
                "interest_rate must be finite, got {}",
                self.interest_rate
            )));
        }
        if let Some(max) = self.max_investment {
            if max.is_nan() || max < 0.0 {
                return Err(invalid(format!("max_investment must be >= 0, got {}", max)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isa_flag_follows_tag() {
        assert!(AccountType::FixedTermIsa.is_isa());
        assert!(AccountType::NoticeIsa.is_isa());
        assert!(!AccountType::VariableAccess.is_isa());
        assert_eq!(AccountType::NoticeIsa.access(), AccessType::Notice);
    }

    #[test]
    fn test_parse_account_type() {
        assert_eq!(
            "easy_access".parse::<AccountType>().unwrap(),
            AccountType::VariableAccess
        );
        assert_eq!(
            " Fixed_Term_ISA ".parse::<AccountType>().unwrap(),
            AccountType::FixedTermIsa
        );
        assert!(matches!(
            "bond".parse::<AccountType>(),
            Err(OptimizerError::UnknownAccountType(_))
        ));
    }

    #[test]
    fn test_term_label() {
        let mut account = Account::new("Saver", "Bank", 0.04, AccountType::VariableAccess, 0);
        assert_eq!(account.term_label(), "Easy access");
        account.term_months = 1;
        assert_eq!(account.term_label(), "1 month");
        account.term_months = 24;
        assert_eq!(account.term_label(), "24 months");
    }

    #[test]
    fn test_reference_url_falls_back_to_search() {
        let account = Account::new("Fixed Rate Bond 1 Year", "Bank", 0.05, AccountType::FixedTerm, 12);
        assert_eq!(
            account.reference_url(),
            "https://www.google.com/search?q=Fixed+Rate+Bond+1+Year"
        );

        let linked = account.with_url("https://bank.example/bond");
        assert_eq!(linked.reference_url(), "https://bank.example/bond");
    }

    #[test]
    fn test_validate_rejects_negative_cap() {
        let account = Account::new("Bad", "Bank", 0.05, AccountType::FixedTerm, 12)
            .with_max_investment(-1.0);
        assert!(matches!(
            account.validate(),
            Err(OptimizerError::InvalidAccount { .. })
        ));
    }

    #[test]
    fn test_json_record_defaults() {
        let account: Account = serde_json::from_str(
            r#"{"name": "Easy ISA", "interest_rate": 0.051, "account_type": "easy_access_isa"}"#,
        )
        .unwrap();
        assert_eq!(account.account_type, AccountType::VariableAccessIsa);
        assert_eq!(account.term_months, 0);
        assert_eq!(account.max_investment, None);
        assert!(account.max_investment_bound().is_infinite());
    }
}
