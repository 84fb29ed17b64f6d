//! Reminders for recurring expenses

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::models::{RecurringInterval, Transaction};

/// A recurring expense that falls due on the reference date
#[derive(Debug, Clone, Serialize)]
pub struct Reminder {
    pub expense: Transaction,
    pub interval: RecurringInterval,
    pub due: NaiveDate,
}

/// Whether an expense first recorded on `recorded` repeats on `on`
pub fn is_due(interval: RecurringInterval, recorded: NaiveDate, on: NaiveDate) -> bool {
    if recorded > on {
        return false;
    }

    match interval {
        RecurringInterval::Monthly => recorded.day() == on.day(),
        RecurringInterval::Weekly => recorded.weekday() == on.weekday(),
    }
}

/// Recurring expenses due on `on`, in record order
///
/// Records with unparseable dates are never due.
pub fn due_reminders<'a, I>(records: I, on: NaiveDate) -> Vec<Reminder>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    records
        .into_iter()
        .filter_map(|txn| {
            let interval = txn.recurring?;
            let recorded = txn.parsed_date().ok()?;
            is_due(interval, recorded, on).then(|| Reminder {
                expense: txn.clone(),
                interval,
                due: on,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn recurring(date: &str, interval: RecurringInterval) -> Transaction {
        Transaction::new(date, Money::from_cents(1500), "Subscriptions", "alice".into())
            .with_recurring(interval)
    }

    #[test]
    fn test_monthly_due_on_same_day() {
        let records = vec![
            recurring("2025-01-15", RecurringInterval::Monthly),
            recurring("2025-01-16", RecurringInterval::Monthly),
            Transaction::new("2025-01-15", Money::from_cents(100), "Food", "alice".into()),
        ];
        let due = due_reminders(&records, date(2025, 3, 15));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].expense.date, "2025-01-15");
    }

    #[test]
    fn test_weekly_due_on_same_weekday() {
        // 2025-01-06 and 2025-02-03 are both Mondays
        assert!(is_due(RecurringInterval::Weekly, date(2025, 1, 6), date(2025, 2, 3)));
        assert!(!is_due(RecurringInterval::Weekly, date(2025, 1, 6), date(2025, 2, 4)));
    }

    #[test]
    fn test_not_due_before_first_occurrence() {
        assert!(!is_due(RecurringInterval::Monthly, date(2025, 5, 10), date(2025, 4, 10)));
        let records = vec![recurring("garbage", RecurringInterval::Monthly)];
        assert!(due_reminders(&records, date(2025, 4, 10)).is_empty());
    }
}
