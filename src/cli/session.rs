//! The interactive menu loop.

use anyhow::Result;
use std::io::{BufRead, Write};
use tracing::{debug, warn};

use super::menu::MenuCommand;
use super::prompt::{InputClosed, Prompter};
use crate::application::{AppError, ExpenseService, ListedExpense};
use crate::domain::{
    display_date, format_cents, format_money, normalize_text, parse_amount, parse_input_date,
    summarize, title_case, Cents, Expense, ExpenseFilter, Summary,
};
use crate::storage::{backup_name, BackupReport};

/// What the loop does after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// One interactive run of the menu over a ledger.
pub struct Session<R, W> {
    service: ExpenseService,
    prompt: Prompter<R, W>,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(service: ExpenseService, input: R, output: W) -> Self {
        Self {
            service,
            prompt: Prompter::new(input, output),
        }
    }

    /// Show the menu and dispatch choices until the user exits or input ends.
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.print_menu()?;

            let choice = match self.prompt.ask("Choose an option: ") {
                Ok(choice) => choice,
                Err(e) if e.downcast_ref::<InputClosed>().is_some() => break,
                Err(e) => return Err(e),
            };

            let command = match choice.parse::<MenuCommand>() {
                Ok(command) => command,
                Err(_) => {
                    self.prompt.say("❌ Invalid choice. Try again.")?;
                    continue;
                }
            };
            debug!("Menu command: {command:?}");

            match self.dispatch(command) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => return Ok(()),
                Err(e) if e.downcast_ref::<InputClosed>().is_some() => break,
                Err(e) => self.report(&e)?,
            }
        }

        // Input ended without an explicit exit
        self.exit()?;
        Ok(())
    }

    pub fn into_inner(self) -> (ExpenseService, R, W) {
        let (input, output) = self.prompt.into_inner();
        (self.service, input, output)
    }

    fn dispatch(&mut self, command: MenuCommand) -> Result<Flow> {
        match command {
            MenuCommand::Add => self.add()?,
            MenuCommand::View => self.view()?,
            MenuCommand::ViewByCategory => self.view_by_category()?,
            MenuCommand::Delete => self.delete()?,
            MenuCommand::Edit => self.edit()?,
            MenuCommand::Summary => self.summary()?,
            MenuCommand::DateRangeSummary => self.date_range_summary()?,
            MenuCommand::Search => self.search()?,
            MenuCommand::Export => self.export()?,
            MenuCommand::ClearAll => self.clear_all()?,
            MenuCommand::Restore => self.restore()?,
            MenuCommand::Exit => {
                self.exit()?;
                return Ok(Flow::Exit);
            }
        }
        Ok(Flow::Continue)
    }

    fn print_menu(&mut self) -> Result<()> {
        self.prompt.say("\n=== Expense Tracker Menu ===")?;
        for command in MenuCommand::ALL {
            self.prompt.say(command)?;
        }
        Ok(())
    }

    fn report(&mut self, err: &anyhow::Error) -> Result<()> {
        match err.downcast_ref::<AppError>() {
            Some(app) if app.is_warning() => self.prompt.say(format!("⚠️ {app}.")),
            Some(app) => self.prompt.say(format!("❌ {app}.")),
            None => self.prompt.say(format!("❌ {err:#}")),
        }
    }

    fn money(&self, cents: Cents) -> String {
        format_money(self.service.config().currency_symbol(), cents)
    }

    fn line(&self, expense: &Expense) -> String {
        expense_line(self.service.config().currency_symbol(), expense)
    }

    /// Print a numbered listing using ledger positions.
    fn print_listing(&mut self, listing: &[ListedExpense]) -> Result<()> {
        for listed in listing {
            let line = self.line(&listed.expense);
            self.prompt.say(format!("{}. {}", listed.position, line))?;
        }
        Ok(())
    }

    fn print_summary(&mut self, summary: &Summary) -> Result<()> {
        let total = self.money(summary.total);
        self.prompt.say(format!("Total Spent: {total}"))?;
        self.prompt.say("\nSpent by Category:")?;
        for entry in &summary.categories {
            let amount = self.money(entry.total);
            self.prompt
                .say(format!("- {}: {}", title_case(&entry.category), amount))?;
        }
        Ok(())
    }

    fn ledger_is_empty(&mut self, message: &str) -> Result<bool> {
        if self.service.load().is_empty() {
            self.prompt.say(format!("⚠️ {message}"))?;
            return Ok(true);
        }
        Ok(false)
    }

    // ========================
    // Menu commands
    // ========================

    fn add(&mut self) -> Result<()> {
        let Some(raw_date) = self
            .prompt
            .ask_cancelable("Date (DD-MM-YYYY) or 'q' to cancel: ")?
        else {
            return Ok(());
        };
        let date = parse_input_date(&raw_date).map_err(AppError::from)?;

        let category = self.prompt.ask_required("Category (e.g., Food, Transport): ")?;
        let amount = parse_amount(&self.prompt.ask("Amount: ")?).map_err(AppError::from)?;
        let note = self.prompt.ask_required("Note: ")?;

        let expense = Expense::new(date, &category, amount, &note).map_err(AppError::from)?;
        let expense = self.service.add(expense)?;
        let message = format!(
            "✅ Expense added: {}, {} on {}",
            expense.display_category(),
            self.money(expense.amount_cents),
            expense.display_date()
        );
        self.prompt.say(message)
    }

    fn view(&mut self) -> Result<()> {
        let listing = self.service.list(None);
        if listing.is_empty() {
            return self.prompt.say("⚠️ No expenses found.");
        }

        self.prompt.say("\n=== All Expenses ===")?;
        self.print_listing(&listing)?;
        let total = self.money(summarize(listing.iter().map(|l| &l.expense)).total);
        self.prompt.say(format!("\n💰 Total: {total}"))
    }

    fn view_by_category(&mut self) -> Result<()> {
        let Some(raw) = self
            .prompt
            .ask_required_cancelable("Enter category to filter by (or 'q' to cancel): ")?
        else {
            return Ok(());
        };
        let category = normalize_text(&raw);
        let title = title_case(&category);
        let filter = ExpenseFilter::Category(category);

        let listing = self.service.list(Some(&filter));
        if listing.is_empty() {
            return self
                .prompt
                .say(format!("⚠️ No expenses found in category: {title}"));
        }

        self.prompt
            .say(format!("\n=== Expenses in Category: {title} ==="))?;
        for listed in &listing {
            let amount = self.money(listed.expense.amount_cents);
            self.prompt.say(format!(
                "{}. {} | {} | {}",
                listed.position,
                listed.expense.display_date(),
                amount,
                listed.expense.display_note()
            ))?;
        }
        let total = self.money(summarize(listing.iter().map(|l| &l.expense)).total);
        self.prompt.say(format!("\n💰 Total in {title}: {total}"))
    }

    /// Show the ledger and ask for a position. `None` on cancel or bad input.
    fn pick_position(&mut self, action: &str) -> Result<Option<usize>> {
        self.view()?;
        let Some(raw) = self.prompt.ask_cancelable(&format!(
            "Enter the expense number to {action} (or 'q' to cancel): "
        ))?
        else {
            return Ok(None);
        };
        match raw.parse::<usize>() {
            Ok(position) => Ok(Some(position)),
            Err(_) => {
                self.prompt.say("❌ Invalid input. Enter a number.")?;
                Ok(None)
            }
        }
    }

    fn delete(&mut self) -> Result<()> {
        if self.ledger_is_empty("No expenses found.")? {
            return Ok(());
        }
        let Some(position) = self.pick_position("delete")? else {
            return Ok(());
        };

        let expense = self.service.get(position)?;
        let line = self.line(&expense);
        if !self
            .prompt
            .confirm(&format!("Are you sure you want to delete:\n{line} ? (y/n): "))?
        {
            return self.prompt.say("Deletion canceled.");
        }

        let removed = self.service.delete(position)?;
        let line = self.line(&removed);
        self.prompt.say(format!("🗑️ Deleted expense: {line}"))
    }

    fn edit(&mut self) -> Result<()> {
        if self.ledger_is_empty("No expenses found.")? {
            return Ok(());
        }
        let Some(position) = self.pick_position("edit")? else {
            return Ok(());
        };

        let current = self.service.get(position)?;
        self.prompt.say("Leave field blank to keep current value.")?;
        let date = self
            .prompt
            .ask(&format!("New date [{}]: ", current.display_date()))?;
        let category = self
            .prompt
            .ask(&format!("New category [{}]: ", current.display_category()))?;
        let amount = self.prompt.ask(&format!(
            "New amount [{}]: ",
            format_cents(current.amount_cents)
        ))?;
        let note = self
            .prompt
            .ask(&format!("New note [{}]: ", current.display_note()))?;

        let result = self
            .service
            .edit_from_input(position, &date, &category, &amount, &note)?;
        for warning in &result.warnings {
            self.prompt.say(format!("⚠️ {warning}."))?;
        }
        if result.after == result.before {
            return self.prompt.say("No changes made.");
        }
        let line = self.line(&result.after);
        self.prompt.say(format!("✏️ Expense updated: {line}"))
    }

    fn summary(&mut self) -> Result<()> {
        let summary = self.service.summarize();
        if summary.is_empty() {
            return self.prompt.say("⚠️ No expenses to summarize.");
        }
        self.prompt.say("\n=== Expense Summary ===")?;
        self.print_summary(&summary)
    }

    fn date_range_summary(&mut self) -> Result<()> {
        if self.ledger_is_empty("No expenses to summarize.")? {
            return Ok(());
        }
        let Some(raw_start) = self
            .prompt
            .ask_cancelable("Enter start date (DD-MM-YYYY) or 'q' to cancel: ")?
        else {
            return Ok(());
        };
        let Some(raw_end) = self
            .prompt
            .ask_cancelable("Enter end date (DD-MM-YYYY) or 'q' to cancel: ")?
        else {
            return Ok(());
        };
        let start = parse_input_date(&raw_start).map_err(AppError::from)?;
        let end = parse_input_date(&raw_end).map_err(AppError::from)?;

        let summary = self.service.summarize_range(start, end)?;
        self.prompt.say(format!(
            "\n=== Summary from {} to {} ===",
            display_date(start),
            display_date(end)
        ))?;
        if summary.is_empty() {
            return self.prompt.say("No expenses found in this range.");
        }
        self.print_summary(&summary)
    }

    fn search(&mut self) -> Result<()> {
        if self.ledger_is_empty("No expenses found.")? {
            return Ok(());
        }
        let Some(raw) = self
            .prompt
            .ask_required_cancelable("Enter keyword to search (or 'q' to cancel): ")?
        else {
            return Ok(());
        };
        let filter = ExpenseFilter::keyword(&raw);

        let listing = self.service.list(Some(&filter));
        if listing.is_empty() {
            return self.prompt.say("⚠️ No matching expenses found.");
        }
        self.prompt.say(format!(
            "\n=== 🔍 Search Results for '{}' ===",
            raw.to_lowercase()
        ))?;
        self.print_listing(&listing)
    }

    fn export(&mut self) -> Result<()> {
        let message = export_message(&self.service)?;
        self.prompt.say(message)
    }

    fn clear_all(&mut self) -> Result<()> {
        if self.ledger_is_empty("No expenses found.")? {
            return Ok(());
        }
        if !self
            .prompt
            .confirm("Are you sure you want to delete ALL expenses? (y/n): ")?
        {
            return self.prompt.say("❌ Clear operation canceled.");
        }

        self.prompt
            .say("⚠️ Creating a last-minute backup before deletion...")?;
        let result = self.service.clear_all()?;
        if let Some(report) = &result.backup {
            for line in backup_lines(report) {
                self.prompt.say(line)?;
            }
        }
        self.prompt
            .say(format!("🗑️ All expenses cleared ({} removed).", result.removed))
    }

    fn restore(&mut self) -> Result<()> {
        let backups = self.service.backups()?;
        if backups.is_empty() {
            return self.prompt.say("⚠️ No backups available to restore.");
        }

        self.prompt.say("\nAvailable Backups:")?;
        for (i, backup) in backups.iter().enumerate() {
            self.prompt.say(format!("{}. {}", i + 1, backup.name))?;
        }
        self.prompt
            .say("👉 Choose wisely! This will overwrite your current expenses.")?;

        let raw = self
            .prompt
            .ask("Choose backup number to restore (0 to cancel): ")?;
        let Ok(selection) = raw.parse::<usize>() else {
            return self.prompt.say("❌ Invalid input. Enter a number.");
        };
        if selection == 0 {
            return self.prompt.say("Restore cancelled.");
        }

        let result = self.service.restore(selection)?;
        self.prompt.say(format!(
            "✅ Restored {} expense(s) from '{}'.",
            result.restored, result.name
        ))
    }

    fn exit(&mut self) -> Result<()> {
        if self.service.config().auto_backup_on_exit() {
            self.prompt.say("📦 Auto-backup before exit...")?;
            match self.service.backup() {
                Ok(Some(report)) => {
                    for line in backup_lines(&report) {
                        self.prompt.say(line)?;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("Auto-backup failed: {e}");
                    self.prompt.say(format!("❌ Backup failed: {e}"))?;
                }
            }
        }
        self.prompt
            .say("\n👋 Thank you for using Expense Tracker! Goodbye!\n")
    }
}

/// One expense as shown in listings: `01-02-2024 | Food | ₹250.00 | Lunch`.
pub fn expense_line(symbol: &str, expense: &Expense) -> String {
    format!(
        "{} | {} | {} | {}",
        expense.display_date(),
        expense.display_category(),
        format_money(symbol, expense.amount_cents),
        expense.display_note()
    )
}

/// What to tell the user after a backup.
pub fn backup_lines(report: &BackupReport) -> [String; 2] {
    [
        format!("📦 Backup saved as '{}'", backup_name(&report.path)),
        format!("🗃️ {} total backup(s) available.", report.available),
    ]
}

/// Run a CSV export and describe the outcome.
pub fn export_message(service: &ExpenseService) -> Result<String> {
    Ok(match service.export_csv()? {
        Some(path) => format!(
            "📁 Expenses exported successfully to '{}'",
            path.display()
        ),
        None => "⚠️ No data to export.".to_string(),
    })
}
