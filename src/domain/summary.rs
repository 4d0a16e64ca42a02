use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use super::{display_date, normalize_text, Cents, Expense};

/// Totals over a set of expenses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: Cents,
    pub count: usize,
    /// Per-category subtotals, in order of each category's first occurrence
    pub categories: Vec<CategoryTotal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Cents,
}

impl Summary {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Subtotal for a single category, if any expense was recorded under it.
    pub fn category_total(&self, category: &str) -> Option<Cents> {
        self.categories
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.total)
    }

    fn add(&mut self, expense: &Expense) {
        self.total = self.total.saturating_add(expense.amount_cents);
        self.count += 1;
        match self
            .categories
            .iter_mut()
            .find(|c| c.category == expense.category)
        {
            Some(entry) => entry.total = entry.total.saturating_add(expense.amount_cents),
            None => self.categories.push(CategoryTotal {
                category: expense.category.clone(),
                total: expense.amount_cents,
            }),
        }
    }
}

/// Sum all expenses, grouping by category.
pub fn summarize<'a>(expenses: impl IntoIterator<Item = &'a Expense>) -> Summary {
    expenses
        .into_iter()
        .fold(Summary::default(), |mut summary, expense| {
            summary.add(expense);
            summary
        })
}

/// Sum the expenses dated within `[start, end]`, both ends inclusive.
pub fn summarize_range(
    expenses: &[Expense],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Summary, RangeError> {
    if end < start {
        return Err(RangeError::EndBeforeStart { start, end });
    }
    Ok(summarize(
        expenses
            .iter()
            .filter(|e| e.date >= start && e.date <= end),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error(
        "End date {} cannot be earlier than start date {}",
        display_date(*end),
        display_date(*start)
    )]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}

/// Restricts a listing of expenses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpenseFilter {
    /// Exact match on the normalized category
    Category(String),
    /// Case-insensitive substring of the category or the note
    Keyword(String),
}

impl ExpenseFilter {
    pub fn category(category: &str) -> Self {
        ExpenseFilter::Category(normalize_text(category))
    }

    pub fn keyword(keyword: &str) -> Self {
        ExpenseFilter::Keyword(keyword.trim().to_lowercase())
    }

    pub fn matches(&self, expense: &Expense) -> bool {
        match self {
            ExpenseFilter::Category(category) => expense.category == *category,
            ExpenseFilter::Keyword(keyword) => {
                expense.category.contains(keyword.as_str()) || expense.note.contains(keyword.as_str())
            }
        }
    }
}

/// Indices of `expenses` in ascending date order. Expenses sharing a date keep
/// their stored order.
pub fn date_order(expenses: &[Expense]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..expenses.len()).collect();
    order.sort_by_key(|&i| expenses[i].date);
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MAX_AMOUNT_CENTS;

    fn expense(date: &str, category: &str, amount: &str, note: &str) -> Expense {
        Expense::parse(date, category, amount, note).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_summarize_keeps_first_occurrence_order() {
        let expenses = vec![
            expense("03-01-2024", "travel", "10", "bus"),
            expense("01-01-2024", "food", "5.50", "tea"),
            expense("02-01-2024", "travel", "20", "taxi"),
        ];

        let summary = summarize(&expenses);
        assert_eq!(summary.total, 3550);
        assert_eq!(summary.count, 3);
        assert_eq!(
            summary.categories,
            vec![
                CategoryTotal {
                    category: "travel".into(),
                    total: 3000
                },
                CategoryTotal {
                    category: "food".into(),
                    total: 550
                },
            ]
        );
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[] as &[Expense]);
        assert!(summary.is_empty());
        assert_eq!(summary.total, 0);
        assert!(summary.categories.is_empty());
    }

    #[test]
    fn test_summarize_range_is_inclusive() {
        let expenses = vec![
            expense("01-01-2024", "food", "1", "a"),
            expense("15-01-2024", "food", "2", "b"),
            expense("31-01-2024", "rent", "4", "c"),
            expense("01-02-2024", "rent", "8", "d"),
        ];

        let summary = summarize_range(&expenses, date("2024-01-01"), date("2024-01-31")).unwrap();
        assert_eq!(summary.total, 700);
        assert_eq!(summary.category_total("food"), Some(300));
        assert_eq!(summary.category_total("rent"), Some(400));
    }

    #[test]
    fn test_summarize_range_rejects_reversed_bounds() {
        let expenses = vec![expense("01-01-2024", "food", "1", "a")];
        let result = summarize_range(&expenses, date("2024-02-01"), date("2024-01-01"));
        assert!(matches!(result, Err(RangeError::EndBeforeStart { .. })));
        assert_eq!(
            result.unwrap_err().to_string(),
            "End date 01-01-2024 cannot be earlier than start date 01-02-2024"
        );
    }

    #[test]
    fn test_summarize_saturates_instead_of_overflowing() {
        let date = date("2024-01-01");
        let big = Expense::new(date, "rent", MAX_AMOUNT_CENTS, "x").unwrap();
        let expenses = vec![big; 1100];

        let summary = summarize(&expenses);
        assert_eq!(summary.count, 1100);
        assert_eq!(summary.total, Cents::MAX);
        assert_eq!(summary.category_total("rent"), Some(Cents::MAX));
    }

    #[test]
    fn test_filters() {
        let lunch = expense("01-01-2024", "Food", "1", "Lunch with Sam");
        let bus = expense("01-01-2024", "travel", "1", "bus to food court");

        let by_category = ExpenseFilter::category(" FOOD ");
        assert!(by_category.matches(&lunch));
        assert!(!by_category.matches(&bus));

        let by_keyword = ExpenseFilter::keyword("Food");
        assert!(by_keyword.matches(&lunch));
        assert!(by_keyword.matches(&bus));
        assert!(!ExpenseFilter::keyword("sam ").matches(&bus));
        assert!(ExpenseFilter::keyword("sam").matches(&lunch));
    }

    #[test]
    fn test_date_order_is_stable() {
        let expenses = vec![
            expense("05-01-2024", "a", "1", "x"),
            expense("01-01-2024", "b", "1", "x"),
            expense("05-01-2024", "c", "1", "x"),
        ];
        assert_eq!(date_order(&expenses), vec![1, 0, 2]);
    }
}
