mod menu;
mod prompt;
mod session;

pub use menu::*;
pub use prompt::*;
pub use session::*;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::application::ExpenseService;
use crate::config::{Config, DEFAULT_EXPORT_DIR, DEFAULT_MAX_BACKUPS};

/// Expense Tracker - record and summarize personal expenses
#[derive(Parser, Debug)]
#[command(name = "expense-tracker")]
#[command(about = "A personal expense tracker backed by a JSON file")]
#[command(version)]
pub struct Cli {
    /// Export all expenses to a timestamped CSV file and exit
    #[arg(long, conflicts_with = "backup")]
    pub export: bool,

    /// Write a timestamped backup of the ledger and exit
    #[arg(long)]
    pub backup: bool,

    /// Directory holding the ledger, its backups and CSV exports
    #[arg(short, long, env = "EXPENSE_TRACKER_DIR", default_value = DEFAULT_EXPORT_DIR)]
    pub dir: PathBuf,

    /// Number of backups to keep
    #[arg(long, default_value_t = DEFAULT_MAX_BACKUPS)]
    pub max_backups: usize,

    /// Skip the automatic backup on exit and on Ctrl+C
    #[arg(long)]
    pub no_auto_backup: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Settings for this run.
    pub fn config(&self) -> Config {
        Config::new(&self.dir)
            .with_max_backups(self.max_backups)
            .with_auto_backup_on_exit(!self.no_auto_backup)
    }

    pub fn run(self) -> Result<()> {
        let config = self.config();
        let service = ExpenseService::open(config.clone())
            .with_context(|| format!("Unable to set up ledger in {}", config.export_dir().display()))?;

        let mut stdout = io::stdout();
        if self.export {
            writeln!(stdout, "{}", export_message(&service)?)?;
            return Ok(());
        }
        if self.backup {
            if let Some(report) = service.backup()? {
                for line in backup_lines(&report) {
                    writeln!(stdout, "{line}")?;
                }
            }
            return Ok(());
        }

        if config.auto_backup_on_exit() {
            install_interrupt_backup(config);
        }

        let stdin = io::stdin();
        Session::new(service, stdin.lock(), stdout).run()
    }
}

/// On Ctrl+C, try one last backup before the process dies. Failures are ignored.
fn install_interrupt_backup(config: Config) {
    let result = ctrlc::set_handler(move || {
        println!("\n📦 Auto-backup triggered by Ctrl+C...");
        match ExpenseService::new(config.clone()).backup() {
            Ok(Some(report)) => {
                for line in backup_lines(&report) {
                    println!("{line}");
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Auto-backup on interrupt failed: {e}"),
        }
        println!("\n👋 Program exited by user.");
        std::process::exit(130);
    });

    match result {
        Ok(()) => debug!("Interrupt handler installed"),
        Err(e) => warn!("Unable to install interrupt handler: {e}"),
    }
}
