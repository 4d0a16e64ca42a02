use thiserror::Error;

use crate::domain::{ExpenseError, RangeError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(#[from] ExpenseError),

    #[error("{0}")]
    InvalidRange(#[from] RangeError),

    #[error("Invalid expense number {position}: choose between 1 and {len}")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("No expenses found")]
    EmptyLedger,

    #[error("Duplicate expense entry detected. Not adding again")]
    DuplicateExpense,

    #[error("No backups available to restore")]
    NoBackups,

    #[error("Invalid backup selection {selection}: choose between 1 and {available}")]
    InvalidBackupSelection { selection: usize, available: usize },

    #[error("Backup '{name}' is corrupted: {reason}")]
    CorruptBackup { name: String, reason: String },

    #[error("Storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl AppError {
    /// Warnings leave the ledger untouched and are not worth an error marker.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            AppError::DuplicateExpense | AppError::EmptyLedger | AppError::NoBackups
        )
    }
}
