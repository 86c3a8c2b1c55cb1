//! Load account catalogs from CSV or JSON, plus a built-in demo catalog

use super::{Account, AccountType};
use crate::error::Result;
use csv::Reader;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Raw CSV row
///
/// Header: `name,platform,interest_rate,account_type,term_months,min_investment,max_investment,url`
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    name: String,
    #[serde(default)]
    platform: String,
    interest_rate: f64,
    account_type: String,
    #[serde(default)]
    term_months: Option<u32>,
    #[serde(default)]
    min_investment: Option<f64>,
    #[serde(default)]
    max_investment: Option<f64>,
    #[serde(default)]
    url: Option<String>,
}

impl CsvRow {
    fn to_account(self) -> Result<Account> {
        let account = Account {
            name: self.name.trim().to_string(),
            platform: self.platform.trim().to_string(),
            interest_rate: self.interest_rate,
            account_type: self.account_type.parse::<AccountType>()?,
            term_months: self.term_months.unwrap_or(0),
            min_investment: self.min_investment.unwrap_or(0.0),
            max_investment: self.max_investment,
            url: self.url.filter(|u| !u.trim().is_empty()),
        };
        account.validate()?;
        Ok(account)
    }
}

/// Load all accounts from a CSV file
pub fn load_accounts_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Account>> {
    let file = File::open(path)?;
    load_accounts_from_reader(file)
}

/// Load accounts from any CSV reader (e.g., string buffer)
pub fn load_accounts_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<Account>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut accounts = Vec::new();

    for result in csv_reader.deserialize() {
        let row: CsvRow = result?;
        accounts.push(row.to_account()?);
    }

    log::debug!("Loaded {} accounts from CSV", accounts.len());
    Ok(accounts)
}

/// Load accounts from a JSON array of account records
pub fn load_accounts_json<P: AsRef<Path>>(path: P) -> Result<Vec<Account>> {
    let file = File::open(path)?;
    let accounts: Vec<Account> = serde_json::from_reader(BufReader::new(file))?;
    for account in &accounts {
        account.validate()?;
    }
    log::debug!("Loaded {} accounts from JSON", accounts.len());
    Ok(accounts)
}

/// Load a catalog, picking the format from the file extension
pub fn load_accounts<P: AsRef<Path>>(path: P) -> Result<Vec<Account>> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        load_accounts_json(path)
    } else {
        load_accounts_csv(path)
    }
}

/// Demo catalog used when no market data is supplied
pub fn default_catalog() -> Vec<Account> {
    vec![
        Account::new("Easy Access Saver", "Demo Bank", 0.05, AccountType::VariableAccess, 0)
            .with_max_investment(250_000.0),
        Account::new("Fixed Rate Bond 1 Year", "Demo Bank", 0.065, AccountType::FixedTerm, 12)
            .with_max_investment(100_000.0),
        Account::new("Easy Access ISA", "Demo Building Society", 0.055, AccountType::VariableAccessIsa, 0)
            .with_max_investment(20_000.0),
        Account::new("Fixed Rate ISA 2 Year", "Demo Building Society", 0.07, AccountType::FixedTermIsa, 24)
            .with_max_investment(20_000.0),
        Account::new("Super Saver", "Demo Platform", 0.04, AccountType::VariableAccess, 0)
            .with_min_investment(1_000.0)
            .with_max_investment(500_000.0),
        Account::new("Fixed Rate Bond 2 Year", "Demo Platform", 0.06, AccountType::FixedTerm, 24)
            .with_max_investment(100_000.0),
        Account::new("Fixed Rate Bond 3 Year", "Demo Platform", 0.058, AccountType::FixedTerm, 36)
            .with_max_investment(100_000.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OptimizerError;

    const CATALOG: &str = "\
name,platform,interest_rate,account_type,term_months,min_investment,max_investment,url
Easy Saver,Bank A,0.045,variable_access,0,1,,
One Year Bond,Bank B,0.052,fixed_term,12,500,85000,https://bank-b.example/bond
Cash ISA,Bank C,0.049,easy_access_isa,,,20000,
";

    #[test]
    fn test_load_accounts_from_reader() {
        let accounts = load_accounts_from_reader(CATALOG.as_bytes()).expect("Failed to load catalog");
        assert_eq!(accounts.len(), 3);

        let saver = &accounts[0];
        assert_eq!(saver.account_type, AccountType::VariableAccess);
        assert_eq!(saver.max_investment, None);
        assert_eq!(saver.url, None);

        let bond = &accounts[1];
        assert_eq!(bond.term_months, 12);
        assert_eq!(bond.max_investment, Some(85_000.0));
        assert_eq!(bond.url.as_deref(), Some("https://bank-b.example/bond"));

        let isa = &accounts[2];
        assert!(isa.is_isa());
        assert_eq!(isa.term_months, 0);
        assert_eq!(isa.min_investment, 0.0);
    }

    #[test]
    fn test_unknown_account_type_is_rejected() {
        let csv = "\
name,platform,interest_rate,account_type,term_months,min_investment,max_investment,url
Odd,Bank,0.05,premium_bond,0,,,
";
        assert!(matches!(
            load_accounts_from_reader(csv.as_bytes()),
            Err(OptimizerError::UnknownAccountType(_))
        ));
    }

    #[test]
    fn test_load_sample_catalog() {
        let accounts = load_accounts("data/accounts.csv").expect("Failed to load sample catalog");
        assert_eq!(accounts.len(), 7);
        assert_eq!(accounts[3].account_type, AccountType::FixedTermIsa);
        assert_eq!(accounts[3].term_months, 24);
        assert_eq!(accounts[6].max_investment, None);
    }

    #[test]
    fn test_load_sample_json_catalog() {
        let accounts = load_accounts("data/accounts.json").expect("Failed to load JSON catalog");
        assert_eq!(accounts.len(), 3);
        assert_eq!(accounts[0].account_type, AccountType::VariableAccess);
        assert_eq!(accounts[0].max_investment, None);
        assert_eq!(accounts[1].term_months, 12);
        assert_eq!(accounts[1].url.as_deref(), Some("https://bank-b.example/bond"));
        assert_eq!(accounts[2].account_type, AccountType::FixedTermIsa);
        assert_eq!(accounts[2].max_investment, Some(20_000.0));
    }

    #[test]
    fn test_json_catalog_is_validated() {
        let path = std::env::temp_dir().join("savings_optimizer_bad_catalog.json");
        std::fs::write(
            &path,
            r#"[{"name": "Negative Cap", "interest_rate": 0.05, "account_type": "fixed_term", "max_investment": -1}]"#,
        )
        .unwrap();
        let result = load_accounts(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(OptimizerError::InvalidAccount { .. })));
    }

    #[test]
    fn test_default_catalog_is_valid() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), 7);
        assert!(catalog.iter().all(|a| a.validate().is_ok()));
        assert!(catalog.iter().any(|a| a.term_months == 12));
        assert!(catalog.iter().any(|a| a.term_months == 24));
    }
}
