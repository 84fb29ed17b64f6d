//! Service layer for tally
//!
//! `aggregator`, the evaluation functions in `budget` and `settlement`,
//! `suggestions` and `recurring` are pure computations over expense records.
//! The `*Service` types sit on top of the storage layer, handling
//! validation, permissions and persistence.

pub mod aggregator;
pub mod budget;
pub mod expense;
pub mod import;
pub mod recurring;
pub mod rules;
pub mod settlement;
pub mod suggestions;

pub use aggregator::{aggregate, aggregate_by_iso_week, aggregate_by_month, Aggregation, ScopeSelector};
pub use budget::{BudgetService, BudgetStatus};
pub use expense::{CreateExpenseInput, ExpenseFilter, ExpenseService, UpdateExpenseInput};
pub use import::ImportService;
pub use rules::RuleService;
pub use settlement::{compute_settlement, default_epsilon, GroupService, Settlement, SettlementStatus};
pub use suggestions::{suggest, Suggestion};
