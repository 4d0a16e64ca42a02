//! Timestamped ledger snapshots and their retention.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

use super::{read_expenses, write_expenses};
use crate::config::Config;
use crate::domain::Expense;

/// File name prefix shared by every snapshot.
pub const BACKUP_PREFIX: &str = "expenses_backup_";

/// Timestamp embedded in snapshot and export file names.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Creates, rotates and reads ledger snapshots.
#[derive(Debug, Clone)]
pub struct BackupManager {
    dir: PathBuf,
    max_backups: usize,
}

/// A snapshot found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupFile {
    pub path: PathBuf,
    pub name: String,
    pub modified: SystemTime,
}

/// Outcome of a successful snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupReport {
    pub path: PathBuf,
    /// Snapshots left on disk after rotation
    pub available: usize,
}

impl BackupManager {
    pub fn new(config: &Config) -> Self {
        Self::with_dir(config.backup_dir(), config.max_backups())
    }

    /// A manager over `dir` that keeps at most `max_backups` snapshots (at least one).
    pub fn with_dir(dir: impl Into<PathBuf>, max_backups: usize) -> Self {
        Self {
            dir: dir.into(),
            max_backups: max_backups.max(1),
        }
    }

    pub fn max_backups(&self) -> usize {
        self.max_backups
    }

    /// Snapshot `expenses` using the current local time.
    pub fn create(&self, expenses: &[Expense]) -> Result<Option<BackupReport>> {
        self.create_at(expenses, Local::now().naive_local())
    }

    /// Snapshot `expenses` under a name stamped with `timestamp`, then rotate.
    /// Nothing is written for an empty ledger.
    pub fn create_at(
        &self,
        expenses: &[Expense],
        timestamp: NaiveDateTime,
    ) -> Result<Option<BackupReport>> {
        if expenses.is_empty() {
            debug!("Ledger is empty, skipping backup");
            return Ok(None);
        }

        let path = self.unique_path(&timestamp.format(TIMESTAMP_FORMAT).to_string());
        write_expenses(&path, expenses)?;
        info!("Backup written to {}", path.display());

        let available = self.rotate()?;
        Ok(Some(BackupReport { path, available }))
    }

    /// All snapshots in the backup directory, newest first.
    pub fn list(&self) -> Result<Vec<BackupFile>> {
        let mut backups = Vec::new();
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Unable to read directory {}", self.dir.display()))?;

        for entry in entries {
            let entry = entry.context("Failed to read directory entry")?;
            let name = entry.file_name().to_string_lossy().to_string();
            if !is_backup_file(&name) {
                continue;
            }
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .with_context(|| format!("Unable to stat {}", entry.path().display()))?;
            backups.push(BackupFile {
                path: entry.path(),
                name,
                modified,
            });
        }

        // Modification time first; the stamp and its sequence number break ties
        backups.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| backup_order(&b.name).cmp(&backup_order(&a.name)))
        });
        Ok(backups)
    }

    /// The snapshots eligible for restore: the newest `max_backups`.
    pub fn recent(&self) -> Result<Vec<BackupFile>> {
        let mut backups = self.list()?;
        backups.truncate(self.max_backups);
        Ok(backups)
    }

    /// Delete all but the newest `max_backups` snapshots. Returns how many remain.
    pub fn rotate(&self) -> Result<usize> {
        let backups = self.list()?;
        let mut remaining = backups.len();

        for old in backups.iter().skip(self.max_backups) {
            match fs::remove_file(&old.path) {
                Ok(()) => {
                    debug!("Removed old backup {}", old.name);
                    remaining -= 1;
                }
                Err(e) => warn!("Unable to remove old backup {}: {e}", old.path.display()),
            }
        }

        Ok(remaining)
    }

    /// Read the expenses stored in a snapshot.
    pub fn read(&self, backup: &BackupFile) -> Result<Vec<Expense>> {
        read_expenses(&backup.path)
    }

    /// `expenses_backup_<stamp>.json`, or `..._<stamp>_N.json` when a snapshot
    /// with the same stamp already exists.
    fn unique_path(&self, stamp: &str) -> PathBuf {
        let mut path = self.dir.join(format!("{BACKUP_PREFIX}{stamp}.json"));
        let mut n = 2;
        while path.exists() {
            path = self.dir.join(format!("{BACKUP_PREFIX}{stamp}_{n}.json"));
            n += 1;
        }
        path
    }
}

/// Checks if a file name looks like a ledger snapshot.
pub fn is_backup_file(name: &str) -> bool {
    name.starts_with(BACKUP_PREFIX) && name.ends_with(".json")
}

/// Sort key of a snapshot name: its timestamp, then its same-second sequence
/// number (1 for the unsuffixed file, then 2, 3, ...).
fn backup_order(name: &str) -> (&str, u32) {
    let stem = name
        .strip_prefix(BACKUP_PREFIX)
        .and_then(|n| n.strip_suffix(".json"))
        .unwrap_or(name);
    match stem.rsplit_once('_') {
        Some((stamp, seq)) if stamp.contains('_') => match seq.parse() {
            Ok(seq) => (stamp, seq),
            Err(_) => (stem, 1),
        },
        _ => (stem, 1),
    }
}

/// Display name of a snapshot path.
pub fn backup_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
