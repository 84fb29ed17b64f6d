//! Budget overview report
//!
//! Renders a member's monthly budget check: overall and per-category spend
//! against limits, with alerts for anything over.

use serde::Serialize;

use crate::config::settings::Settings;
use crate::error::TallyResult;
use crate::export::Tabular;
use crate::models::{BucketKey, MemberId, Money};
use crate::services::budget::{BudgetCheck, BudgetService, BudgetStatus, ScopeEvaluation};
use crate::storage::Storage;

#[derive(Debug, Clone, Serialize)]
pub struct BudgetOverviewReport {
    #[serde(flatten)]
    pub check: BudgetCheck,
}

fn format_limit(limit: Option<Money>, symbol: &str) -> String {
    limit
        .map(|l| l.format_with_symbol(symbol))
        .unwrap_or_else(|| "-".to_string())
}

impl BudgetOverviewReport {
    pub fn generate(
        storage: &Storage,
        settings: &Settings,
        member: &MemberId,
        month: BucketKey,
    ) -> TallyResult<Self> {
        let check = BudgetService::new(storage, settings).check(member, month)?;
        Ok(Self { check })
    }

    fn lines(&self) -> impl Iterator<Item = &ScopeEvaluation> {
        std::iter::once(&self.check.overall).chain(self.check.categories.iter())
    }

    /// Format the report for terminal display
    pub fn format_terminal(&self, symbol: &str) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "Budget Check: {} ({})\n",
            self.check.month, self.check.member
        ));
        output.push_str(&"=".repeat(64));
        output.push('\n');
        output.push_str(&format!(
            "{:<24} {:>12} {:>12} {:>12}\n",
            "Scope", "Spent", "Limit", "Status"
        ));
        output.push_str(&"-".repeat(64));
        output.push('\n');

        for line in self.lines() {
            let status = match line.evaluation.status {
                BudgetStatus::Over => "OVER".to_string(),
                other => other.to_string(),
            };
            output.push_str(&format!(
                "{:<24} {:>12} {:>12} {:>12}\n",
                line.scope.name(),
                line.evaluation.spent.format_with_symbol(symbol),
                format_limit(line.evaluation.limit, symbol),
                status
            ));
        }

        let alerts = self.check.alerts();
        if !alerts.is_empty() {
            output.push('\n');
            for alert in alerts {
                let over_by = alert.evaluation.remaining().map(|r| -r).unwrap_or_default();
                output.push_str(&format!(
                    "! {} is over budget by {}\n",
                    alert.scope.name(),
                    over_by.format_with_symbol(symbol)
                ));
            }
        }

        if self.check.skipped > 0 {
            output.push_str(&format!(
                "\n{} expense(s) skipped: unreadable date\n",
                self.check.skipped
            ));
        }

        output
    }
}

impl Tabular for BudgetOverviewReport {
    fn headers(&self) -> Vec<&'static str> {
        vec!["month", "scope", "spent", "limit", "status"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.lines()
            .map(|line| {
                vec![
                    line.bucket_key.to_string(),
                    line.scope.name().to_string(),
                    line.evaluation.spent.to_decimal().to_string(),
                    line.evaluation
                        .limit
                        .map(|l| l.to_decimal().to_string())
                        .unwrap_or_default(),
                    line.evaluation.status.to_string(),
                ]
            })
            .collect()
    }
}
