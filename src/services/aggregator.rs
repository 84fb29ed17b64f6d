//! Period aggregation
//!
//! Groups expenses into time buckets (calendar month or ISO week), optionally
//! split by category, and sums their amounts. Pure functions of their input.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::models::{BucketKey, BudgetScope, Granularity, Money, Transaction};

/// Whether buckets are additionally split by category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeSelector {
    /// One `overall` bucket per period
    Overall,
    /// One bucket per period and category
    ByCategory,
}

/// Summed spend for one period and scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateBucket {
    pub bucket_key: BucketKey,
    pub scope: BudgetScope,
    pub total: Money,
    /// Number of expenses summed into this bucket
    pub count: usize,
}

/// Result of an aggregation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Aggregation {
    /// Buckets in chronological key order, ties by scope
    pub buckets: Vec<AggregateBucket>,
    /// Records excluded because their date could not be parsed
    pub skipped: usize,
}

type BucketTable = BTreeMap<(BucketKey, BudgetScope), (Money, usize)>;

impl Aggregation {
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Sum of every bucket total
    pub fn grand_total(&self) -> Money {
        self.buckets.iter().map(|b| b.total).sum()
    }

    /// Find the bucket for a key and scope
    pub fn bucket(&self, key: &BucketKey, scope: &BudgetScope) -> Option<&AggregateBucket> {
        self.buckets
            .iter()
            .find(|b| &b.bucket_key == key && &b.scope == scope)
    }

    /// Total for a key and scope, zero when absent
    pub fn total_for(&self, key: &BucketKey, scope: &BudgetScope) -> Money {
        self.bucket(key, scope).map(|b| b.total).unwrap_or_default()
    }

    /// Buckets falling in one period
    pub fn for_key<'a>(&'a self, key: &'a BucketKey) -> impl Iterator<Item = &'a AggregateBucket> {
        self.buckets.iter().filter(move |b| &b.bucket_key == key)
    }

    /// Distinct bucket keys, chronological
    pub fn keys(&self) -> Vec<BucketKey> {
        let mut keys: Vec<BucketKey> = self.buckets.iter().map(|b| b.bucket_key).collect();
        keys.dedup();
        keys
    }

    /// Combine two aggregations of disjoint record sets
    ///
    /// Matching buckets are summed. Merging the aggregations of two halves
    /// gives the aggregation of their union.
    pub fn merge(self, other: Aggregation) -> Aggregation {
        let mut table = BucketTable::new();
        for bucket in self.buckets.into_iter().chain(other.buckets) {
            let entry = table
                .entry((bucket.bucket_key, bucket.scope))
                .or_insert((Money::zero(), 0));
            entry.0 += bucket.total;
            entry.1 += bucket.count;
        }

        Self::from_table(table, self.skipped + other.skipped)
    }

    fn from_table(table: BucketTable, skipped: usize) -> Self {
        let buckets = table
            .into_iter()
            .map(|((bucket_key, scope), (total, count))| AggregateBucket {
                bucket_key,
                scope,
                total,
                count,
            })
            .collect();

        Self { buckets, skipped }
    }
}

/// Aggregate expenses into buckets of the given granularity
pub fn aggregate<'a, I>(records: I, granularity: Granularity, selector: ScopeSelector) -> Aggregation
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut table = BucketTable::new();
    let mut skipped = 0;

    for txn in records {
        let date = match txn.parsed_date() {
            Ok(date) => date,
            Err(e) => {
                debug!(id = %txn.id, error = %e, "skipping expense");
                skipped += 1;
                continue;
            }
        };

        let scope = match selector {
            ScopeSelector::Overall => BudgetScope::Overall,
            ScopeSelector::ByCategory => BudgetScope::category(txn.category.clone()),
        };

        let entry = table
            .entry((BucketKey::for_date(date, granularity), scope))
            .or_insert((Money::zero(), 0));
        entry.0 += txn.amount;
        entry.1 += 1;
    }

    Aggregation::from_table(table, skipped)
}

/// Group by calendar month (month and year identity, not a rolling window)
pub fn aggregate_by_month<'a, I>(records: I, selector: ScopeSelector) -> Aggregation
where
    I: IntoIterator<Item = &'a Transaction>,
{
    aggregate(records, Granularity::Month, selector)
}

/// Group by ISO-8601 week and ISO week-year
pub fn aggregate_by_iso_week<'a, I>(records: I, selector: ScopeSelector) -> Aggregation
where
    I: IntoIterator<Item = &'a Transaction>,
{
    aggregate(records, Granularity::IsoWeek, selector)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn(date: &str, cents: i64, category: &str) -> Transaction {
        Transaction::new(date, Money::from_cents(cents), category, "alice".into())
    }

    fn sample() -> Vec<Transaction> {
        vec![
            txn("2024-05-02", 1200, "Food"),
            txn("2024-05-20", 800, "Travel"),
            txn("2024-05-21", 300, "Food"),
            txn("2024-06-01", 5000, "Rent"),
            txn("2024-04-30", 999, "Food"),
        ]
    }

    #[test]
    fn test_empty_input() {
        let agg = aggregate_by_month(&[], ScopeSelector::ByCategory);
        assert!(agg.is_empty());
        assert_eq!(agg.skipped, 0);
    }

    #[test]
    fn test_monthly_overall() {
        let agg = aggregate_by_month(&sample(), ScopeSelector::Overall);
        let keys: Vec<String> = agg.buckets.iter().map(|b| b.bucket_key.to_string()).collect();
        assert_eq!(keys, vec!["2024-04", "2024-05", "2024-06"]);
        assert_eq!(
            agg.total_for(&BucketKey::month(2024, 5), &BudgetScope::Overall),
            Money::from_cents(2300)
        );
        assert_eq!(agg.bucket(&BucketKey::month(2024, 5), &BudgetScope::Overall).unwrap().count, 3);
    }

    #[test]
    fn test_monthly_by_category_ordering() {
        let agg = aggregate_by_month(&sample(), ScopeSelector::ByCategory);
        let rows: Vec<(String, String, i64)> = agg
            .buckets
            .iter()
            .map(|b| (b.bucket_key.to_string(), b.scope.to_string(), b.total.cents()))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("2024-04".into(), "Food".into(), 999),
                ("2024-05".into(), "Food".into(), 1500),
                ("2024-05".into(), "Travel".into(), 800),
                ("2024-06".into(), "Rent".into(), 5000),
            ]
        );
    }

    #[test]
    fn test_grand_total_equals_input_sum() {
        let records = sample();
        let expected: Money = records.iter().map(|t| t.amount).sum();
        for selector in [ScopeSelector::Overall, ScopeSelector::ByCategory] {
            assert_eq!(aggregate_by_month(&records, selector).grand_total(), expected);
            assert_eq!(aggregate_by_iso_week(&records, selector).grand_total(), expected);
        }
    }

    #[test]
    fn test_huge_totals_saturate() {
        let records = vec![
            txn("2024-05-01", i64::MAX, "Food"),
            txn("2024-05-02", i64::MAX, "Food"),
        ];
        let agg = aggregate_by_month(&records, ScopeSelector::Overall);
        let total = agg.total_for(&BucketKey::month(2024, 5), &BudgetScope::Overall);
        assert_eq!(total, Money::from_cents(i64::MAX));
        assert!(!total.is_negative());
    }

    #[test]
    fn test_unparseable_dates_are_counted() {
        let mut records = sample();
        records.push(txn("not-a-date", 10_000, "Food"));
        records.push(txn("2024-13-01", 10_000, "Food"));

        let agg = aggregate_by_month(&records, ScopeSelector::Overall);
        assert_eq!(agg.skipped, 2);
        assert_eq!(agg.grand_total(), Money::from_cents(1200 + 800 + 300 + 5000 + 999));
    }

    #[test]
    fn test_merge_equals_union() {
        let records = sample();
        let (left, right) = records.split_at(2);

        for selector in [ScopeSelector::Overall, ScopeSelector::ByCategory] {
            let whole = aggregate_by_month(&records, selector);
            let merged = aggregate_by_month(left, selector).merge(aggregate_by_month(right, selector));
            assert_eq!(whole, merged);
        }
    }

    #[test]
    fn test_iso_week_year_boundary() {
        // 2024-12-31 is in ISO week 1 of 2025, 2024-12-29 in week 52 of 2024
        let records = vec![txn("2024-12-31", 100, "Food"), txn("2024-12-29", 200, "Food")];
        let agg = aggregate_by_iso_week(&records, ScopeSelector::Overall);

        assert_eq!(
            agg.keys(),
            vec![BucketKey::iso_week(2024, 52), BucketKey::iso_week(2025, 1)]
        );
        assert_eq!(
            agg.total_for(&BucketKey::iso_week(2025, 1), &BudgetScope::Overall),
            Money::from_cents(100)
        );
        assert_eq!(agg.buckets[1].bucket_key.to_string(), "2025-W01");
    }

    #[test]
    fn test_for_key_filters_period() {
        let agg = aggregate_by_month(&sample(), ScopeSelector::ByCategory);
        let may = BucketKey::month(2024, 5);
        let scopes: Vec<&str> = agg.for_key(&may).map(|b| b.scope.name()).collect();
        assert_eq!(scopes, vec!["Food", "Travel"]);
    }
}
