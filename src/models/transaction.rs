//! Transaction model
//!
//! A recorded expense: who spent how much on what, and when. The date is kept
//! exactly as it was recorded or imported; it is interpreted only when the
//! record is aggregated, so one malformed date never makes a whole data set
//! unreadable.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::budget::OVERALL_SCOPE;
use super::ids::{GroupId, MemberId, TransactionId};
use super::money::Money;
use crate::error::{TallyError, TallyResult};

/// Category given to expenses recorded without one
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Whether `category` collides with the label of the overall budget scope
pub fn is_reserved_category(category: &str) -> bool {
    category.trim().eq_ignore_ascii_case(OVERALL_SCOPE)
}

/// How often a recurring expense repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurringInterval {
    Weekly,
    Monthly,
}

impl RecurringInterval {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "weekly" | "week" => Some(Self::Weekly),
            "monthly" | "month" => Some(Self::Monthly),
            _ => None,
        }
    }
}

impl fmt::Display for RecurringInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weekly => write!(f, "weekly"),
            Self::Monthly => write!(f, "monthly"),
        }
    }
}

/// A recorded expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: TransactionId,

    /// Transaction date as recorded (ISO-8601 date or datetime)
    pub date: String,

    /// Amount spent (never negative)
    pub amount: Money,

    /// Short category label
    pub category: String,

    /// Whose spend this is
    pub owner: MemberId,

    /// Group the expense is shared with, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,

    /// Free-text description
    #[serde(default)]
    pub description: String,

    /// Repeat interval for recurring expenses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring: Option<RecurringInterval>,

    /// When the record was created
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transaction
    pub fn new(
        date: impl Into<String>,
        amount: Money,
        category: impl Into<String>,
        owner: MemberId,
    ) -> Self {
        let category = category.into();
        let category = if category.trim().is_empty() {
            UNCATEGORIZED.to_string()
        } else {
            category.trim().to_string()
        };

        Self {
            id: TransactionId::new(),
            date: date.into().trim().to_string(),
            amount,
            category,
            owner,
            group_id: None,
            description: String::new(),
            recurring: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }

    pub fn with_recurring(mut self, interval: RecurringInterval) -> Self {
        self.recurring = Some(interval);
        self
    }

    /// Interpret the recorded date as a calendar date
    pub fn parsed_date(&self) -> TallyResult<NaiveDate> {
        parse_record_date(&self.date)
    }

    /// Check if this expense belongs to a group
    pub fn is_group_expense(&self) -> bool {
        self.group_id.is_some()
    }

    /// Validate the transaction
    ///
    /// The date is not checked here; see [`Transaction::parsed_date`].
    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        if self.amount.is_negative() {
            return Err(TransactionValidationError::NegativeAmount(self.amount));
        }

        if self.owner.as_str().is_empty() {
            return Err(TransactionValidationError::MissingOwner);
        }

        if is_reserved_category(&self.category) {
            return Err(TransactionValidationError::ReservedCategory(self.category.clone()));
        }

        Ok(())
    }
}

/// Parse a record date: a plain `YYYY-MM-DD`, or an ISO datetime whose
/// calendar date part is used without timezone conversion
pub fn parse_record_date(raw: &str) -> TallyResult<NaiveDate> {
    let s = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt.date());
        }
    }

    Err(TallyError::UnparseableDate(raw.to_string()))
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} ({})", self.date, self.category, self.amount, self.owner)
    }
}

/// Validation errors for transactions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransactionValidationError {
    #[error("Expense amount cannot be negative: {0}")]
    NegativeAmount(Money),
    #[error("Expense must have an owner")]
    MissingOwner,
    #[error("\"{0}\" is reserved for the overall budget and cannot be a category")]
    ReservedCategory(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_transaction() {
        let txn = Transaction::new("2025-01-15", Money::from_cents(1299), "Food", "alice".into());
        assert_eq!(txn.parsed_date().unwrap(), date(2025, 1, 15));
        assert_eq!(txn.category, "Food");
        assert!(!txn.is_group_expense());
        assert!(txn.validate().is_ok());
    }

    #[test]
    fn test_empty_category_defaults() {
        let txn = Transaction::new("2025-01-15", Money::from_cents(100), "  ", "alice".into());
        assert_eq!(txn.category, UNCATEGORIZED);
    }

    #[test]
    fn test_parse_datetime_forms() {
        assert_eq!(parse_record_date("2024-05-03T14:30:00").unwrap(), date(2024, 5, 3));
        assert_eq!(parse_record_date("2024-05-03 08:00:00").unwrap(), date(2024, 5, 3));
        assert_eq!(
            parse_record_date("2024-05-03T23:30:00+05:30").unwrap(),
            date(2024, 5, 3)
        );
    }

    #[test]
    fn test_unparseable_date() {
        let txn = Transaction::new("yesterday", Money::from_cents(100), "Food", "alice".into());
        assert!(matches!(
            txn.parsed_date(),
            Err(TallyError::UnparseableDate(s)) if s == "yesterday"
        ));
        assert!(parse_record_date("2024-02-30").is_err());
    }

    #[test]
    fn test_negative_amount_rejected() {
        let txn = Transaction::new("2025-01-15", Money::from_cents(-500), "Food", "alice".into());
        assert_eq!(
            txn.validate(),
            Err(TransactionValidationError::NegativeAmount(Money::from_cents(-500)))
        );
    }

    #[test]
    fn test_recurring_parse() {
        assert_eq!(RecurringInterval::parse("Monthly"), Some(RecurringInterval::Monthly));
        assert_eq!(RecurringInterval::parse("weekly"), Some(RecurringInterval::Weekly));
        assert_eq!(RecurringInterval::parse("daily"), None);
    }

    #[test]
    fn test_serialization_skips_empty_options() {
        let txn = Transaction::new("2025-01-15", Money::from_cents(100), "Food", "alice".into());
        let json = serde_json::to_string(&txn).unwrap();
        assert!(!json.contains("group_id"));

        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, txn);
    }

    #[test]
    fn test_overall_is_not_a_category() {
        for label in ["overall", "Overall", " OVERALL "] {
            let txn = Transaction::new("2025-01-15", Money::from_cents(100), label, "alice".into());
            assert!(matches!(
                txn.validate(),
                Err(TransactionValidationError::ReservedCategory(_))
            ));
        }
        assert!(!is_reserved_category("Overalls"));
    }
}
