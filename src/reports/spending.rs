//! Spending report
//!
//! Period totals from the aggregator, monthly or by ISO week, optionally
//! broken down by category.

use serde::Serialize;

use crate::error::TallyResult;
use crate::export::Tabular;
use crate::models::{Granularity, MemberId, Money};
use crate::services::aggregator::{aggregate, Aggregation, ScopeSelector};
use crate::storage::Storage;

/// Spending totals per period
#[derive(Debug, Clone, Serialize)]
pub struct SpendingReport {
    pub granularity: Granularity,
    pub by_category: bool,
    /// Whose expenses; `None` for everyone
    pub member: Option<MemberId>,
    #[serde(flatten)]
    pub aggregation: Aggregation,
    pub grand_total: Money,
}

impl SpendingReport {
    /// Build the report from stored expenses
    pub fn generate(
        storage: &Storage,
        member: Option<&MemberId>,
        granularity: Granularity,
        by_category: bool,
    ) -> TallyResult<Self> {
        let expenses = match member {
            Some(member) => storage.expenses.get_by_owner(member)?,
            None => storage.expenses.get_all()?,
        };

        let selector = if by_category {
            ScopeSelector::ByCategory
        } else {
            ScopeSelector::Overall
        };
        let aggregation = aggregate(&expenses, granularity, selector);

        Ok(Self {
            granularity,
            by_category,
            member: member.cloned(),
            grand_total: aggregation.grand_total(),
            aggregation,
        })
    }

    /// Format the report for terminal display
    pub fn format_terminal(&self, symbol: &str) -> String {
        let title = match self.granularity {
            Granularity::Month => "Monthly Spending",
            Granularity::IsoWeek => "Weekly Spending",
        };

        let mut output = String::new();
        output.push_str(title);
        if let Some(member) = &self.member {
            output.push_str(&format!(" for {}", member));
        }
        output.push('\n');
        output.push_str(&"=".repeat(56));
        output.push('\n');

        if self.aggregation.is_empty() {
            output.push_str("No expenses recorded.\n");
        } else {
            output.push_str(&format!(
                "{:<10} {:<24} {:>12} {:>7}\n",
                "Period", "Scope", "Amount", "Count"
            ));
            output.push_str(&"-".repeat(56));
            output.push('\n');

            for bucket in &self.aggregation.buckets {
                output.push_str(&format!(
                    "{:<10} {:<24} {:>12} {:>7}\n",
                    bucket.bucket_key.to_string(),
                    bucket.scope.name(),
                    bucket.total.format_with_symbol(symbol),
                    bucket.count
                ));
            }

            output.push_str(&"-".repeat(56));
            output.push('\n');
            output.push_str(&format!(
                "{:<35} {:>12}\n",
                "TOTAL",
                self.grand_total.format_with_symbol(symbol)
            ));
        }

        if self.aggregation.skipped > 0 {
            output.push_str(&format!(
                "\n{} expense(s) skipped: unreadable date\n",
                self.aggregation.skipped
            ));
        }

        output
    }
}

impl Tabular for SpendingReport {
    fn headers(&self) -> Vec<&'static str> {
        vec!["period", "scope", "amount", "count"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.aggregation
            .buckets
            .iter()
            .map(|b| {
                vec![
                    b.bucket_key.to_string(),
                    b.scope.name().to_string(),
                    b.total.to_decimal().to_string(),
                    b.count.to_string(),
                ]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::TallyPaths;
    use crate::models::Transaction;
    use tempfile::TempDir;

    fn storage_with_expenses() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();

        for (date, cents, category, owner) in [
            ("2025-01-02", 1250, "Food", "alice"),
            ("2025-01-20", 4000, "Rent", "alice"),
            ("2025-02-01", 300, "Food", "bob"),
            ("someday", 999, "Food", "alice"),
        ] {
            storage
                .expenses
                .upsert(Transaction::new(date, Money::from_cents(cents), category, owner.into()))
                .unwrap();
        }
        (temp_dir, storage)
    }

    #[test]
    fn test_monthly_for_member() {
        let (_temp, storage) = storage_with_expenses();
        let alice = MemberId::new("alice");
        let report = SpendingReport::generate(&storage, Some(&alice), Granularity::Month, false).unwrap();

        assert_eq!(report.grand_total, Money::from_cents(5250));
        assert_eq!(report.aggregation.skipped, 1);

        let text = report.format_terminal("$");
        assert!(text.contains("Monthly Spending for alice"));
        assert!(text.contains("$52.50"));
        assert!(text.contains("1 expense(s) skipped"));
    }

    #[test]
    fn test_csv_rows_by_category() {
        let (_temp, storage) = storage_with_expenses();
        let report = SpendingReport::generate(&storage, None, Granularity::Month, true).unwrap();

        assert_eq!(
            report.rows(),
            vec![
                vec!["2025-01", "Food", "12.50", "1"],
                vec!["2025-01", "Rent", "40.00", "1"],
                vec!["2025-02", "Food", "3.00", "1"],
            ]
        );
    }
}
