//! Month-over-month spending suggestions
//!
//! Compares each category's total in a month with the month before it.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::models::{BucketKey, BudgetScope, Money, Transaction};

use super::aggregator::{aggregate_by_month, ScopeSelector};

/// A single observation about a category's trend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Suggestion {
    /// Spent more than last month; `percent` is 100 when last month was zero
    Increased { category: String, percent: i64 },
    /// Spent less than last month, but not nothing
    Reduced { category: String, amount: Money },
    /// Spent nothing this month after spending last month
    Stopped { category: String, previous: Money },
    /// Nothing above applied to any category
    NoMajorChanges,
}

impl Suggestion {
    /// Render the suggestion for display with a currency symbol
    pub fn message(&self, symbol: &str) -> String {
        match self {
            Self::Increased { category, percent } => {
                format!("You've spent {}% more on {} than last month.", percent, category)
            }
            Self::Reduced { category, amount } => format!(
                "You reduced your {} spending by {} this month.",
                category,
                amount.format_with_symbol(symbol)
            ),
            Self::Stopped { category, previous } => format!(
                "You didn't spend anything on {} this month ({} last month).",
                category,
                previous.format_with_symbol(symbol)
            ),
            Self::NoMajorChanges => "No major changes in your spending trends this month.".into(),
        }
    }
}

/// Whole-number percentage increase from `previous` to `current`
///
/// Ties round to even, so 2.5% reports as 2%.
fn percent_increase(previous: Money, current: Money) -> i64 {
    if !previous.is_positive() {
        return 100;
    }

    let ratio = (current - previous).to_decimal() * Decimal::ONE_HUNDRED / previous.to_decimal();
    ratio
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
        .to_i64()
        .unwrap_or(i64::MAX)
}

/// Suggestions for `month` compared with the month before, ordered by category
///
/// Always returns at least one item.
pub fn suggest<'a, I>(records: I, month: BucketKey) -> Vec<Suggestion>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let previous_month = month.prev();
    let aggregation = aggregate_by_month(records, ScopeSelector::ByCategory);

    let categories: BTreeSet<&BudgetScope> = aggregation
        .for_key(&month)
        .chain(aggregation.for_key(&previous_month))
        .map(|b| &b.scope)
        .collect();

    let mut suggestions: Vec<Suggestion> = categories
        .into_iter()
        .filter_map(|scope| {
            let current = aggregation.total_for(&month, scope);
            let previous = aggregation.total_for(&previous_month, scope);
            let category = scope.name().to_string();

            if current > previous {
                Some(Suggestion::Increased {
                    category,
                    percent: percent_increase(previous, current),
                })
            } else if previous > current && current.is_positive() {
                Some(Suggestion::Reduced {
                    category,
                    amount: previous - current,
                })
            } else if current.is_zero() && previous.is_positive() {
                Some(Suggestion::Stopped { category, previous })
            } else {
                None
            }
        })
        .collect();

    if suggestions.is_empty() {
        suggestions.push(Suggestion::NoMajorChanges);
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn(date: &str, cents: i64, category: &str) -> Transaction {
        Transaction::new(date, Money::from_cents(cents), category, "alice".into())
    }

    #[test]
    fn test_doubling_is_hundred_percent() {
        let records = vec![txn("2025-01-10", 5000, "Food"), txn("2025-02-10", 10000, "Food")];
        let suggestions = suggest(&records, BucketKey::month(2025, 2));
        assert_eq!(
            suggestions,
            vec![Suggestion::Increased { category: "Food".into(), percent: 100 }]
        );
        assert!(suggestions[0].message("$").contains("100% more on Food"));
    }

    #[test]
    fn test_reduced_by_amount() {
        let records = vec![txn("2025-01-10", 10000, "Food"), txn("2025-02-10", 4000, "Food")];
        let suggestions = suggest(&records, BucketKey::month(2025, 2));
        assert_eq!(
            suggestions,
            vec![Suggestion::Reduced { category: "Food".into(), amount: Money::from_cents(6000) }]
        );
        assert_eq!(
            suggestions[0].message("$"),
            "You reduced your Food spending by $60.00 this month."
        );
    }

    #[test]
    fn test_new_and_stopped_categories() {
        let records = vec![
            txn("2024-12-05", 2500, "Gym"),
            txn("2025-01-03", 1200, "Books"),
        ];
        let suggestions = suggest(&records, BucketKey::month(2025, 1));
        assert_eq!(
            suggestions,
            vec![
                Suggestion::Increased { category: "Books".into(), percent: 100 },
                Suggestion::Stopped { category: "Gym".into(), previous: Money::from_cents(2500) },
            ]
        );
    }

    #[test]
    fn test_unchanged_spend_gives_single_item() {
        let records = vec![txn("2025-01-10", 3000, "Rent"), txn("2025-02-10", 3000, "Rent")];
        assert_eq!(
            suggest(&records, BucketKey::month(2025, 2)),
            vec![Suggestion::NoMajorChanges]
        );
        assert_eq!(suggest(&[], BucketKey::month(2025, 2)), vec![Suggestion::NoMajorChanges]);
    }

    #[test]
    fn test_percent_rounds_half_to_even() {
        assert_eq!(percent_increase(Money::from_cents(20000), Money::from_cents(20500)), 2);
        assert_eq!(percent_increase(Money::from_cents(3000), Money::from_cents(4000)), 33);
    }
}
