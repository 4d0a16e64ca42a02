use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::domain::Expense;

/// Reads and writes the ledger as a single JSON array file.
#[derive(Debug, Clone)]
pub struct ExpenseStore {
    path: PathBuf,
}

impl ExpenseStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the parent directory and an empty ledger file if missing.
    pub fn init(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Unable to create directory {}", parent.display())
                })?;
            }
        }
        if !self.path.exists() {
            debug!("Creating empty ledger at {}", self.path.display());
            self.save(&[])?;
        }
        Ok(())
    }

    /// Load every expense. A missing or unreadable file yields an empty ledger.
    pub fn load(&self) -> Vec<Expense> {
        match self.try_load() {
            Ok(expenses) => expenses,
            Err(e) => {
                warn!("Could not read ledger, starting fresh: {e:#}");
                Vec::new()
            }
        }
    }

    /// Load every expense, failing on I/O or parse errors. A missing file is empty.
    pub fn try_load(&self) -> Result<Vec<Expense>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        read_expenses(&self.path)
    }

    /// Overwrite the ledger with `expenses`.
    pub fn save(&self, expenses: &[Expense]) -> Result<()> {
        write_expenses(&self.path, expenses)?;
        debug!("Saved {} expense(s) to {}", expenses.len(), self.path.display());
        Ok(())
    }
}

/// Parse a JSON array of expenses from `path`.
pub fn read_expenses(path: &Path) -> Result<Vec<Expense>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Unable to read file {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Unable to parse expenses in {}", path.display()))
}

/// Write `expenses` to `path` through a sibling temp file and a rename, so a
/// failed write never leaves a truncated ledger behind.
pub fn write_expenses(path: &Path, expenses: &[Expense]) -> Result<()> {
    let json = to_json(expenses)?;
    let tmp = tmp_path(path);
    fs::write(&tmp, json).with_context(|| format!("Unable to write file {}", tmp.display()))?;
    if let Err(e) = fs::rename(&tmp, path) {
        if let Err(cleanup) = fs::remove_file(&tmp) {
            warn!("Unable to remove {}: {cleanup}", tmp.display());
        }
        return Err(e).with_context(|| {
            format!(
                "Unable to move {} into place at {}",
                tmp.display(),
                path.display()
            )
        });
    }
    Ok(())
}

fn to_json(expenses: &[Expense]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    expenses
        .serialize(&mut serializer)
        .context("Failed to serialize expenses to JSON")?;
    Ok(buf)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Vec<Expense> {
        vec![
            Expense::parse("01-02-2024", "Food", "250", "lunch").unwrap(),
            Expense::parse("15-01-2024", "travel", "12.75", "Metro card").unwrap(),
        ]
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = ExpenseStore::new(dir.path().join("expenses.json"));

        store.save(&sample()).unwrap();
        assert_eq!(store.load(), sample());
        assert!(!dir.path().join("expenses.json.tmp").exists());
    }

    #[test]
    fn test_init_creates_empty_array() {
        let dir = TempDir::new().unwrap();
        let store = ExpenseStore::new(dir.path().join("nested").join("expenses.json"));

        store.init().unwrap();
        let contents = fs::read_to_string(store.path()).unwrap();
        assert_eq!(contents.trim(), "[]");
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_init_keeps_existing_data() {
        let dir = TempDir::new().unwrap();
        let store = ExpenseStore::new(dir.path().join("expenses.json"));
        store.save(&sample()).unwrap();

        store.init().unwrap();
        assert_eq!(store.load().len(), 2);
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = ExpenseStore::new(dir.path().join("absent.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("expenses.json");
        fs::write(&path, "{ not json").unwrap();

        let store = ExpenseStore::new(&path);
        assert!(store.try_load().is_err());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_failed_save_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("expenses.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "x").unwrap();

        let store = ExpenseStore::new(&path);
        let err = store.save(&sample()).unwrap_err();
        assert!(format!("{err:#}").contains("Unable to move"));
        assert!(!dir.path().join("expenses.json.tmp").exists());
        assert!(path.is_dir());
    }

    #[test]
    fn test_written_json_is_four_space_indented() {
        let dir = TempDir::new().unwrap();
        let store = ExpenseStore::new(dir.path().join("expenses.json"));
        store.save(&sample()[..1]).unwrap();

        let contents = fs::read_to_string(store.path()).unwrap();
        assert!(contents.contains("\n    {\n        \"date\": \"2024-02-01\""));
        assert!(contents.contains("\"amount\": 250.0"));
    }
}
