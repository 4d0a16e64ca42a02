use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{cents_as_decimal, format_cents, parse_cents, Cents, ParseCentsError};

/// Date format accepted from and shown to the user.
pub const INPUT_DATE_FORMAT: &str = "%d-%m-%Y";

/// Largest amount a single expense may carry: 2^53 cents, the last value a
/// JSON number holds exactly.
pub const MAX_AMOUNT_CENTS: Cents = 1 << 53;

/// A single expense. Always normalized: category and note are trimmed and
/// lowercased, the amount is strictly positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawExpense")]
pub struct Expense {
    /// When the money was spent (stored as ISO 8601 `YYYY-MM-DD`)
    pub date: NaiveDate,
    pub category: String,
    /// Amount in cents, persisted as a decimal number under `amount`
    #[serde(rename = "amount", with = "cents_as_decimal")]
    pub amount_cents: Cents,
    pub note: String,
}

/// Unvalidated shape of a persisted record.
#[derive(Deserialize)]
struct RawExpense {
    date: NaiveDate,
    category: String,
    #[serde(with = "cents_as_decimal")]
    amount: Cents,
    note: String,
}

impl TryFrom<RawExpense> for Expense {
    type Error = ExpenseError;

    fn try_from(raw: RawExpense) -> Result<Self, Self::Error> {
        Expense::new(raw.date, &raw.category, raw.amount, &raw.note)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpenseError {
    #[error("Invalid date format '{0}'. Please use DD-MM-YYYY")]
    InvalidDate(String),

    #[error("Invalid amount '{0}'. Please enter a number")]
    InvalidAmount(String),

    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    #[error("Amount cannot exceed {}", format_cents(MAX_AMOUNT_CENTS))]
    AmountTooLarge,

    #[error("{0} cannot be empty")]
    EmptyField(&'static str),
}

impl Expense {
    /// Build a validated expense, normalizing category and note.
    pub fn new(
        date: NaiveDate,
        category: &str,
        amount_cents: Cents,
        note: &str,
    ) -> Result<Self, ExpenseError> {
        check_amount(amount_cents)?;
        let category = normalize_text(category);
        if category.is_empty() {
            return Err(ExpenseError::EmptyField("Category"));
        }
        let note = normalize_text(note);
        if note.is_empty() {
            return Err(ExpenseError::EmptyField("Note"));
        }

        Ok(Self {
            date,
            category,
            amount_cents,
            note,
        })
    }

    /// Build an expense from raw user input (`DD-MM-YYYY` date, decimal amount).
    pub fn parse(
        date: &str,
        category: &str,
        amount: &str,
        note: &str,
    ) -> Result<Self, ExpenseError> {
        let date = parse_input_date(date)?;
        let amount_cents = parse_amount(amount)?;
        Self::new(date, category, amount_cents, note)
    }

    /// Date as shown to the user, e.g. "05-01-2024".
    pub fn display_date(&self) -> String {
        display_date(self.date)
    }

    pub fn display_category(&self) -> String {
        title_case(&self.category)
    }

    pub fn display_note(&self) -> String {
        capitalize(&self.note)
    }

    /// Produce a new expense with the given fields replaced.
    pub fn apply(&self, update: &ExpenseUpdate) -> Result<Self, ExpenseError> {
        Self::new(
            update.date.unwrap_or(self.date),
            update.category.as_deref().unwrap_or(&self.category),
            update.amount_cents.unwrap_or(self.amount_cents),
            update.note.as_deref().unwrap_or(&self.note),
        )
    }
}

/// Partial replacement of an expense. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseUpdate {
    pub date: Option<NaiveDate>,
    pub category: Option<String>,
    pub amount_cents: Option<Cents>,
    pub note: Option<String>,
}

/// A field that could not be parsed during an edit and was left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditWarning {
    #[error("Invalid date format '{0}'. Keeping original date")]
    InvalidDate(String),

    #[error("Invalid amount '{0}'. Keeping original value")]
    InvalidAmount(String),
}

impl ExpenseUpdate {
    /// Interpret raw edit input. Blank fields keep the current value; a date or
    /// amount that fails to parse is dropped with a warning instead of failing
    /// the whole edit.
    pub fn from_input(
        date: &str,
        category: &str,
        amount: &str,
        note: &str,
    ) -> (Self, Vec<EditWarning>) {
        let mut warnings = Vec::new();

        let date = non_blank(date).and_then(|d| match parse_input_date(d) {
            Ok(date) => Some(date),
            Err(_) => {
                warnings.push(EditWarning::InvalidDate(d.to_string()));
                None
            }
        });

        let amount_cents = non_blank(amount).and_then(|a| match parse_amount(a) {
            Ok(cents) => Some(cents),
            Err(_) => {
                warnings.push(EditWarning::InvalidAmount(a.to_string()));
                None
            }
        });

        let update = Self {
            date,
            category: non_blank(category).map(normalize_text),
            amount_cents,
            note: non_blank(note).map(normalize_text),
        };
        (update, warnings)
    }

    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.category.is_none()
            && self.amount_cents.is_none()
            && self.note.is_none()
    }
}

fn non_blank(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Parse a user-entered `DD-MM-YYYY` date.
pub fn parse_input_date(input: &str) -> Result<NaiveDate, ExpenseError> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, INPUT_DATE_FORMAT)
        .map_err(|_| ExpenseError::InvalidDate(input.to_string()))
}

/// Parse a user-entered amount, which must be strictly positive and at most
/// [`MAX_AMOUNT_CENTS`].
pub fn parse_amount(input: &str) -> Result<Cents, ExpenseError> {
    let cents = parse_cents(input).map_err(|e| match e {
        ParseCentsError::OutOfRange if !input.trim().starts_with('-') => {
            ExpenseError::AmountTooLarge
        }
        _ => ExpenseError::InvalidAmount(input.trim().to_string()),
    })?;
    check_amount(cents)?;
    Ok(cents)
}

fn check_amount(cents: Cents) -> Result<(), ExpenseError> {
    if cents <= 0 {
        return Err(ExpenseError::NonPositiveAmount);
    }
    if cents > MAX_AMOUNT_CENTS {
        return Err(ExpenseError::AmountTooLarge);
    }
    Ok(())
}

pub fn display_date(date: NaiveDate) -> String {
    date.format(INPUT_DATE_FORMAT).to_string()
}

/// Trim and lowercase free text before storage or comparison.
pub fn normalize_text(input: &str) -> String {
    input.trim().to_lowercase()
}

/// Uppercase the first letter of every word, lowercase the rest.
/// Any non-alphabetic character starts a new word ("fast-food" -> "Fast-Food").
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_word = false;
    for c in input.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Uppercase the first character, lowercase the rest.
pub fn capitalize(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_fields() {
        let expense = Expense::parse("01-02-2024", "  Food ", "250", " LUNCH").unwrap();
        assert_eq!(expense.date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(expense.category, "food");
        assert_eq!(expense.amount_cents, 25000);
        assert_eq!(expense.note, "lunch");
    }

    #[test]
    fn test_date_round_trip_through_display() {
        let expense = Expense::parse("05-01-2024", "food", "1", "x").unwrap();
        assert_eq!(expense.date.to_string(), "2024-01-05");
        assert_eq!(expense.display_date(), "05-01-2024");
    }

    #[test]
    fn test_parse_rejects_invalid_input() {
        assert_eq!(
            Expense::parse("2024-01-05", "food", "1", "x"),
            Err(ExpenseError::InvalidDate("2024-01-05".into()))
        );
        assert_eq!(
            Expense::parse("31-02-2024", "food", "1", "x"),
            Err(ExpenseError::InvalidDate("31-02-2024".into()))
        );
        assert_eq!(
            Expense::parse("01-01-2024", "food", "abc", "x"),
            Err(ExpenseError::InvalidAmount("abc".into()))
        );
        assert_eq!(
            Expense::parse("01-01-2024", "food", "0", "x"),
            Err(ExpenseError::NonPositiveAmount)
        );
        assert_eq!(
            Expense::parse("01-01-2024", "food", "-5", "x"),
            Err(ExpenseError::NonPositiveAmount)
        );
        assert_eq!(
            Expense::parse("01-01-2024", "   ", "5", "x"),
            Err(ExpenseError::EmptyField("Category"))
        );
        assert_eq!(
            Expense::parse("01-01-2024", "food", "5", ""),
            Err(ExpenseError::EmptyField("Note"))
        );
    }

    #[test]
    fn test_amount_ceiling() {
        assert_eq!(parse_amount("90071992547409.92"), Ok(MAX_AMOUNT_CENTS));
        assert_eq!(
            parse_amount("90071992547409.93"),
            Err(ExpenseError::AmountTooLarge)
        );
        assert_eq!(
            parse_amount("90000000000000000"),
            Err(ExpenseError::AmountTooLarge)
        );
        assert_eq!(
            ExpenseError::AmountTooLarge.to_string(),
            "Amount cannot exceed 90071992547409.92"
        );

        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert_eq!(
            Expense::new(date, "food", MAX_AMOUNT_CENTS + 1, "x"),
            Err(ExpenseError::AmountTooLarge)
        );
    }

    #[test]
    fn test_sub_cent_amount_is_invalid() {
        assert_eq!(
            parse_amount("0.009"),
            Err(ExpenseError::InvalidAmount("0.009".into()))
        );
    }

    #[test]
    fn test_json_shape() {
        let expense = Expense::parse("01-02-2024", "Food", "250", "lunch").unwrap();
        let json = serde_json::to_value(&expense).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "date": "2024-02-01",
                "category": "food",
                "amount": 250.0,
                "note": "lunch"
            })
        );
    }

    #[test]
    fn test_deserialize_validates_and_normalizes() {
        let expense: Expense = serde_json::from_str(
            r#"{"date": "2024-03-10", "category": " Travel ", "amount": 12.5, "note": "Bus"}"#,
        )
        .unwrap();
        assert_eq!(expense.category, "travel");
        assert_eq!(expense.note, "bus");
        assert_eq!(expense.amount_cents, 1250);

        let negative = serde_json::from_str::<Expense>(
            r#"{"date": "2024-03-10", "category": "travel", "amount": -1, "note": "bus"}"#,
        );
        assert!(negative.is_err());

        let oversized = serde_json::from_str::<Expense>(
            r#"{"date": "2024-03-10", "category": "travel", "amount": 1e15, "note": "bus"}"#,
        );
        assert!(oversized.is_err());
    }

    #[test]
    fn test_title_case_and_capitalize() {
        assert_eq!(title_case("food"), "Food");
        assert_eq!(title_case("eating out"), "Eating Out");
        assert_eq!(title_case("fast-food"), "Fast-Food");
        assert_eq!(title_case("2nd hand"), "2Nd Hand");
        assert_eq!(capitalize("lunch with team"), "Lunch with team");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_blank_update_is_empty() {
        let (update, warnings) = ExpenseUpdate::from_input("", "  ", "", "");
        assert!(update.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_update_falls_back_on_bad_fields() {
        let original = Expense::parse("01-02-2024", "food", "250", "lunch").unwrap();
        let (update, warnings) = ExpenseUpdate::from_input("99-99-2024", "Travel", "-3", "");
        assert_eq!(
            warnings,
            vec![
                EditWarning::InvalidDate("99-99-2024".into()),
                EditWarning::InvalidAmount("-3".into()),
            ]
        );

        let edited = original.apply(&update).unwrap();
        assert_eq!(edited.date, original.date);
        assert_eq!(edited.category, "travel");
        assert_eq!(edited.amount_cents, original.amount_cents);
        assert_eq!(edited.note, "lunch");
    }
}
