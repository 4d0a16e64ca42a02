use chrono::{Local, NaiveDate, NaiveDateTime};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::domain::{
    date_order, summarize, summarize_range, EditWarning, Expense, ExpenseFilter, ExpenseUpdate,
    Summary,
};
use crate::io::export_csv_file;
use crate::storage::{BackupFile, BackupManager, BackupReport, ExpenseStore};

use super::AppError;

/// Application service providing every ledger operation.
/// Each call reads the whole ledger from disk and writes it back after a change.
pub struct ExpenseService {
    config: Config,
    store: ExpenseStore,
    backups: BackupManager,
}

/// An expense together with its 1-based position in the date-sorted ledger.
/// Positions are what `edit` and `delete` accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedExpense {
    pub position: usize,
    pub expense: Expense,
}

/// Result of editing an expense
#[derive(Debug, Clone)]
pub struct EditResult {
    pub before: Expense,
    pub after: Expense,
    /// Fields that could not be parsed and kept their original value
    pub warnings: Vec<EditWarning>,
}

/// Result of clearing the ledger
#[derive(Debug, Clone)]
pub struct ClearResult {
    pub removed: usize,
    /// Safety snapshot taken before clearing, if there was anything to save
    pub backup: Option<BackupReport>,
}

/// Result of restoring a snapshot
#[derive(Debug, Clone)]
pub struct RestoreResult {
    pub name: String,
    pub restored: usize,
}

impl ExpenseService {
    /// Create a service without touching the filesystem.
    pub fn new(config: Config) -> Self {
        let store = ExpenseStore::new(config.data_path());
        let backups = BackupManager::new(&config);
        Self {
            config,
            store,
            backups,
        }
    }

    /// Create a service, making sure the export directory and ledger file exist.
    pub fn open(config: Config) -> Result<Self, AppError> {
        let service = Self::new(config);
        service.store.init()?;
        debug!("Ledger ready at {}", service.store.path().display());
        Ok(service)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The raw ledger in stored order.
    pub fn load(&self) -> Vec<Expense> {
        self.store.load()
    }

    // ========================
    // Record operations
    // ========================

    /// Append an expense unless an identical one is already recorded.
    pub fn add(&self, expense: Expense) -> Result<Expense, AppError> {
        let mut expenses = self.store.load();

        if expenses.contains(&expense) {
            info!("Rejected duplicate expense on {}", expense.date);
            return Err(AppError::DuplicateExpense);
        }

        expenses.push(expense.clone());
        self.store.save(&expenses)?;
        info!("Added expense on {} in '{}'", expense.date, expense.category);
        Ok(expense)
    }

    /// Expenses in ascending date order, optionally filtered.
    pub fn list(&self, filter: Option<&ExpenseFilter>) -> Vec<ListedExpense> {
        let expenses = self.store.load();
        date_order(&expenses)
            .into_iter()
            .enumerate()
            .filter(|(_, index)| filter.is_none_or(|f| f.matches(&expenses[*index])))
            .map(|(i, index)| ListedExpense {
                position: i + 1,
                expense: expenses[index].clone(),
            })
            .collect()
    }

    /// Look up the expense at a listing position.
    pub fn get(&self, position: usize) -> Result<Expense, AppError> {
        let expenses = self.store.load();
        let index = resolve_position(&expenses, position)?;
        Ok(expenses[index].clone())
    }

    /// Replace the fields present in `update` on the expense at `position`.
    pub fn edit(&self, position: usize, update: &ExpenseUpdate) -> Result<EditResult, AppError> {
        self.edit_with_warnings(position, update, Vec::new())
    }

    /// Edit from raw prompt input: blanks keep the current value, unparsable
    /// dates and amounts keep the current value and are reported as warnings.
    pub fn edit_from_input(
        &self,
        position: usize,
        date: &str,
        category: &str,
        amount: &str,
        note: &str,
    ) -> Result<EditResult, AppError> {
        let (update, warnings) = ExpenseUpdate::from_input(date, category, amount, note);
        for warning in &warnings {
            warn!("Edit of expense {position}: {warning}");
        }
        self.edit_with_warnings(position, &update, warnings)
    }

    fn edit_with_warnings(
        &self,
        position: usize,
        update: &ExpenseUpdate,
        warnings: Vec<EditWarning>,
    ) -> Result<EditResult, AppError> {
        let mut expenses = self.store.load();
        let index = resolve_position(&expenses, position)?;

        let before = expenses[index].clone();
        let after = before.apply(update)?;

        if after != before {
            expenses[index] = after.clone();
            self.store.save(&expenses)?;
            info!("Updated expense {position}");
        } else {
            debug!("Edit of expense {position} changed nothing");
        }

        Ok(EditResult {
            before,
            after,
            warnings,
        })
    }

    /// Remove the expense at `position`. Confirmation is the caller's job.
    pub fn delete(&self, position: usize) -> Result<Expense, AppError> {
        let mut expenses = self.store.load();
        let index = resolve_position(&expenses, position)?;

        let removed = expenses.remove(index);
        self.store.save(&expenses)?;
        info!("Deleted expense {position} dated {}", removed.date);
        Ok(removed)
    }

    /// Snapshot the ledger, then empty it.
    pub fn clear_all(&self) -> Result<ClearResult, AppError> {
        let expenses = self.store.load();
        let backup = self.backups.create(&expenses)?;

        self.store.save(&[])?;
        info!("Cleared {} expense(s)", expenses.len());
        Ok(ClearResult {
            removed: expenses.len(),
            backup,
        })
    }

    // ========================
    // Reporting
    // ========================

    /// Total spent and per-category subtotals over the whole ledger.
    pub fn summarize(&self) -> Summary {
        summarize(&self.store.load())
    }

    /// Total spent between `start` and `end`, both inclusive.
    pub fn summarize_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Summary, AppError> {
        Ok(summarize_range(&self.store.load(), start, end)?)
    }

    /// Export the ledger to a timestamped CSV file. `None` when there is nothing to export.
    pub fn export_csv(&self) -> Result<Option<PathBuf>, AppError> {
        self.export_csv_at(Local::now().naive_local())
    }

    pub fn export_csv_at(&self, timestamp: NaiveDateTime) -> Result<Option<PathBuf>, AppError> {
        let expenses = self.store.load();
        if expenses.is_empty() {
            return Ok(None);
        }
        let path = export_csv_file(self.config.export_dir(), &expenses, timestamp)?;
        info!("Exported {} expense(s) to {}", expenses.len(), path.display());
        Ok(Some(path))
    }

    // ========================
    // Backups
    // ========================

    /// Snapshot the ledger and prune old snapshots. `None` when the ledger is empty.
    pub fn backup(&self) -> Result<Option<BackupReport>, AppError> {
        Ok(self.backups.create(&self.store.load())?)
    }

    pub fn backup_at(&self, timestamp: NaiveDateTime) -> Result<Option<BackupReport>, AppError> {
        Ok(self.backups.create_at(&self.store.load(), timestamp)?)
    }

    /// Snapshots available for restore, newest first.
    pub fn backups(&self) -> Result<Vec<BackupFile>, AppError> {
        Ok(self.backups.recent()?)
    }

    /// Overwrite the ledger with the snapshot at 1-based `selection` in [`Self::backups`].
    pub fn restore(&self, selection: usize) -> Result<RestoreResult, AppError> {
        let backups = self.backups()?;
        if backups.is_empty() {
            return Err(AppError::NoBackups);
        }
        let backup = selection
            .checked_sub(1)
            .and_then(|i| backups.get(i))
            .ok_or(AppError::InvalidBackupSelection {
                selection,
                available: backups.len(),
            })?;

        let expenses = self
            .backups
            .read(backup)
            .map_err(|e| AppError::CorruptBackup {
                name: backup.name.clone(),
                reason: format!("{e:#}"),
            })?;

        self.store.save(&expenses)?;
        info!("Restored {} expense(s) from {}", expenses.len(), backup.name);
        Ok(RestoreResult {
            name: backup.name.clone(),
            restored: expenses.len(),
        })
    }
}

/// Map a 1-based listing position to an index into the stored ledger.
fn resolve_position(expenses: &[Expense], position: usize) -> Result<usize, AppError> {
    if expenses.is_empty() {
        return Err(AppError::EmptyLedger);
    }
    position
        .checked_sub(1)
        .and_then(|i| date_order(expenses).get(i).copied())
        .ok_or(AppError::PositionOutOfRange {
            position,
            len: expenses.len(),
        })
}
