use std::fmt;
use std::str::FromStr;

/// An entry of the interactive main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    Add,
    View,
    ViewByCategory,
    Delete,
    Edit,
    Summary,
    DateRangeSummary,
    Search,
    Export,
    ClearAll,
    Restore,
    Exit,
}

impl MenuCommand {
    /// Every command in menu order.
    pub const ALL: [MenuCommand; 12] = [
        MenuCommand::Add,
        MenuCommand::View,
        MenuCommand::ViewByCategory,
        MenuCommand::Delete,
        MenuCommand::Edit,
        MenuCommand::Summary,
        MenuCommand::DateRangeSummary,
        MenuCommand::Search,
        MenuCommand::Export,
        MenuCommand::ClearAll,
        MenuCommand::Restore,
        MenuCommand::Exit,
    ];

    /// The number the user types to pick this command.
    pub fn number(self) -> usize {
        Self::ALL
            .iter()
            .position(|c| *c == self)
            .map_or(0, |i| i + 1)
    }

    pub fn label(self) -> &'static str {
        match self {
            MenuCommand::Add => "Add Expense",
            MenuCommand::View => "View Expenses",
            MenuCommand::ViewByCategory => "View Expenses by Category",
            MenuCommand::Delete => "Delete Expense",
            MenuCommand::Edit => "Edit Expense",
            MenuCommand::Summary => "Summary Report",
            MenuCommand::DateRangeSummary => "Summary by Date Range",
            MenuCommand::Search => "Search Expenses",
            MenuCommand::Export => "Export to CSV",
            MenuCommand::ClearAll => "Clear All Expenses",
            MenuCommand::Restore => "Restore from Backup",
            MenuCommand::Exit => "Exit",
        }
    }
}

impl fmt::Display for MenuCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number(), self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidChoice(pub String);

impl fmt::Display for InvalidChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid menu choice '{}'", self.0)
    }
}

impl std::error::Error for InvalidChoice {}

impl FromStr for MenuCommand {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or_else(|| InvalidChoice(s.trim().to_string()))
    }
}
