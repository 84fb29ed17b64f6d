//! Month summary: total spent and the category with the most spend

use serde::Serialize;

use crate::export::Tabular;
use crate::models::{BucketKey, Money, Transaction};
use crate::services::aggregator::{aggregate_by_month, AggregateBucket, ScopeSelector};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopCategory {
    pub category: String,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthSummary {
    pub month: BucketKey,
    pub total: Money,
    pub count: usize,
    /// `None` when nothing was spent in the month
    pub top_category: Option<TopCategory>,
}

impl MonthSummary {
    /// Summarise `records` for one month
    ///
    /// On a tie for top category the alphabetically first wins.
    pub fn compute<'a, I>(records: I, month: BucketKey) -> Self
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let aggregation = aggregate_by_month(records, ScopeSelector::ByCategory);
        let buckets: Vec<_> = aggregation.for_key(&month).collect();

        let mut top: Option<&AggregateBucket> = None;
        for &bucket in &buckets {
            if bucket.total.is_positive() && top.map_or(true, |t| bucket.total > t.total) {
                top = Some(bucket);
            }
        }
        let top_category = top.map(|b| TopCategory {
            category: b.scope.name().to_string(),
            total: b.total,
        });

        Self {
            month,
            total: buckets.iter().map(|b| b.total).sum(),
            count: buckets.iter().map(|b| b.count).sum(),
            top_category,
        }
    }

    pub fn format_terminal(&self, symbol: &str) -> String {
        let top = match &self.top_category {
            Some(top) => format!("{} ({})", top.category, top.total.format_with_symbol(symbol)),
            None => "none".to_string(),
        };

        format!(
            "Summary for {}\n  Total spent:  {}\n  Expenses:     {}\n  Top category: {}\n",
            self.month,
            self.total.format_with_symbol(symbol),
            self.count,
            top
        )
    }
}

impl Tabular for MonthSummary {
    fn headers(&self) -> Vec<&'static str> {
        vec!["month", "total", "count", "top_category", "top_category_total"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        let (category, total) = match &self.top_category {
            Some(top) => (top.category.clone(), top.total.to_decimal().to_string()),
            None => (String::new(), String::new()),
        };
        vec![vec![
            self.month.to_string(),
            self.total.to_decimal().to_string(),
            self.count.to_string(),
            category,
            total,
        ]]
    }
}
