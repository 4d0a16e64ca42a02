use std::path::{Path, PathBuf};

/// Directory used when none is given on the command line.
pub const DEFAULT_EXPORT_DIR: &str = "ExpenseTracker_Exports";

/// Name of the live ledger file inside the export directory.
pub const DEFAULT_DATA_FILE: &str = "expenses.json";

pub const DEFAULT_MAX_BACKUPS: usize = 3;

pub const DEFAULT_CURRENCY_SYMBOL: &str = "₹";

/// Runtime settings, fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    export_dir: PathBuf,
    data_file: String,
    max_backups: usize,
    auto_backup_on_exit: bool,
    currency_symbol: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_EXPORT_DIR)
    }
}

impl Config {
    /// Create a config rooted at `export_dir` with every other setting at its default.
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            export_dir: export_dir.into(),
            data_file: DEFAULT_DATA_FILE.to_string(),
            max_backups: DEFAULT_MAX_BACKUPS,
            auto_backup_on_exit: true,
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
        }
    }

    pub fn with_max_backups(mut self, max_backups: usize) -> Self {
        self.max_backups = max_backups;
        self
    }

    pub fn with_auto_backup_on_exit(mut self, enabled: bool) -> Self {
        self.auto_backup_on_exit = enabled;
        self
    }

    pub fn with_currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.currency_symbol = symbol.into();
        self
    }

    /// Directory holding the ledger, its backups and CSV exports.
    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Path of the live ledger file.
    pub fn data_path(&self) -> PathBuf {
        self.export_dir.join(&self.data_file)
    }

    /// Backups live next to the ledger.
    pub fn backup_dir(&self) -> &Path {
        &self.export_dir
    }

    pub fn max_backups(&self) -> usize {
        self.max_backups
    }

    pub fn auto_backup_on_exit(&self) -> bool {
        self.auto_backup_on_exit
    }

    pub fn currency_symbol(&self) -> &str {
        &self.currency_symbol
    }
}
