//! Group settlement report

use rust_decimal::Decimal;
use serde::Serialize;

use crate::export::Tabular;
use crate::services::settlement::GroupSettlement;

#[derive(Debug, Clone, Serialize)]
pub struct SettlementReport {
    #[serde(flatten)]
    pub settlement: GroupSettlement,
}

/// Two decimal places, sign before the symbol
fn money(value: Decimal, symbol: &str) -> String {
    let rounded = value.round_dp(2);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{}{:.2}", symbol, rounded.abs())
    } else {
        format!("{}{:.2}", symbol, rounded.abs())
    }
}

impl SettlementReport {
    pub fn new(settlement: GroupSettlement) -> Self {
        Self { settlement }
    }

    /// Format the report for terminal display
    ///
    /// Balances are positive for members who overpaid.
    pub fn format_terminal(&self, symbol: &str) -> String {
        let s = &self.settlement.settlement;
        let mut output = String::new();

        output.push_str(&format!("Settlement: {}", self.settlement.group_name));
        if let Some(period) = self.settlement.period {
            output.push_str(&format!(" ({})", period));
        }
        output.push('\n');
        output.push_str(&"=".repeat(64));
        output.push('\n');
        output.push_str(&format!(
            "Group total: {}   Members: {}   Share each: {}\n\n",
            money(s.group_total, symbol),
            s.member_count,
            money(s.should_have_spent, symbol)
        ));
        output.push_str(&format!(
            "{:<16} {:>12} {:>12} {:>10}  {}\n",
            "Member", "Spent", "Balance", "Status", "Adjusted"
        ));
        output.push_str(&"-".repeat(64));
        output.push('\n');

        for row in &s.rows {
            let adjusted = self
                .settlement
                .adjustments
                .get(&row.member)
                .map(|b| money(*b, symbol))
                .unwrap_or_default();
            output.push_str(&format!(
                "{:<16} {:>12} {:>12} {:>10}  {}\n",
                row.member.as_str(),
                money(row.spent, symbol),
                money(row.balance, symbol),
                row.status.to_string(),
                adjusted
            ));
        }

        if self.settlement.skipped > 0 {
            output.push_str(&format!(
                "\n{} expense(s) skipped: unreadable date\n",
                self.settlement.skipped
            ));
        }

        output
    }
}

impl Tabular for SettlementReport {
    fn headers(&self) -> Vec<&'static str> {
        vec!["member", "spent", "should_have_spent", "balance", "status", "adjusted_balance"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.settlement
            .settlement
            .rows
            .iter()
            .map(|row| {
                vec![
                    row.member.to_string(),
                    row.spent.round_dp(2).to_string(),
                    row.should_have_spent.round_dp(2).to_string(),
                    row.balance.round_dp(2).to_string(),
                    row.status.to_string(),
                    self.settlement
                        .adjustments
                        .get(&row.member)
                        .map(|b| b.to_string())
                        .unwrap_or_default(),
                ]
            })
            .collect()
    }
}
