use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::{format_cents, Expense};
use crate::storage::TIMESTAMP_FORMAT;

/// Header row of every CSV export.
pub const CSV_HEADER: [&str; 4] = ["date", "category", "amount", "note"];

/// Write `expenses` as human-formatted CSV. Returns the number of rows written.
pub fn write_csv<W: Write>(expenses: &[Expense], writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(CSV_HEADER)?;

    for expense in expenses {
        csv_writer.write_record([
            expense.display_date(),
            expense.display_category(),
            format_cents(expense.amount_cents),
            expense.display_note(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(expenses.len())
}

/// File name of an export taken at `timestamp`.
pub fn export_file_name(timestamp: NaiveDateTime) -> String {
    format!("expenses_{}.csv", timestamp.format(TIMESTAMP_FORMAT))
}

/// Write a timestamped CSV snapshot into `dir`.
pub fn export_csv_file(
    dir: &Path,
    expenses: &[Expense],
    timestamp: NaiveDateTime,
) -> Result<PathBuf> {
    let path = dir.join(export_file_name(timestamp));
    let file = File::create(&path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    write_csv(expenses, file).with_context(|| format!("Failed to export CSV to {}", path.display()))?;
    Ok(path)
}
