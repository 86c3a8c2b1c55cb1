//! Savings account catalog: records and loading

mod data;
pub mod loader;

pub use data::{AccessType, Account, AccountType};
pub use loader::{
    default_catalog, load_accounts, load_accounts_csv, load_accounts_from_reader,
    load_accounts_json,
};
