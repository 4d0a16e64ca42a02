// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use expense_tracker::{Config, Expense, ExpenseService};
use tempfile::TempDir;

/// Helper to create a test service over a temporary directory
pub fn test_service() -> Result<(ExpenseService, TempDir)> {
    test_service_with(|config| config)
}

/// Helper to create a test service with a customized config
pub fn test_service_with(customize: impl FnOnce(Config) -> Config) -> Result<(ExpenseService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let config = customize(Config::new(temp_dir.path().join("ledger")));
    let service = ExpenseService::open(config)?;
    Ok((service, temp_dir))
}

/// Helper to build an expense from user-style input
pub fn expense(date: &str, category: &str, amount: &str, note: &str) -> Expense {
    Expense::parse(date, category, amount, note).unwrap()
}

/// Helper to parse a `YYYY-MM-DD` date
pub fn date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Helper to build a timestamp on a fixed day, `minutes` after midnight
pub fn timestamp(minutes: u32) -> NaiveDateTime {
    date("2024-06-01")
        .and_hms_opt(minutes / 60, minutes % 60, 0)
        .unwrap()
}

/// Test fixture: a small ledger across two months
pub struct StandardLedger;

impl StandardLedger {
    pub fn populate(service: &ExpenseService) -> Result<()> {
        service.add(expense("10-01-2024", "Food", "120", "groceries"))?;
        service.add(expense("05-01-2024", "Transport", "45.50", "Metro card"))?;
        service.add(expense("31-01-2024", "food", "80", "dinner out"))?;
        service.add(expense("01-02-2024", "Rent", "15000", "february rent"))?;
        Ok(())
    }
}
