//! Reports module for tally
//!
//! Spending totals per period, budget checks, month summaries and group
//! settlements. Every report renders for the terminal and exports through
//! [`crate::export`].

pub mod budget_overview;
pub mod settlement;
pub mod spending;
pub mod summary;

pub use budget_overview::BudgetOverviewReport;
pub use settlement::SettlementReport;
pub use spending::SpendingReport;
pub use summary::{MonthSummary, TopCategory};
