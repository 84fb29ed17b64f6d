//! Core data models for tally
//!
//! This module contains the data structures of the expense domain: recorded
//! expenses, budget limits, groups and categorisation rules, plus the
//! money and period value types they are built from.

pub mod budget;
pub mod group;
pub mod ids;
pub mod money;
pub mod period;
pub mod rule;
pub mod transaction;

pub use budget::{BudgetLimit, BudgetScope, LimitPeriod, OVERALL_SCOPE};
pub use group::{Group, Membership, Role};
pub use ids::{GroupId, MemberId, RuleId, TransactionId};
pub use money::Money;
pub use period::{BucketKey, Granularity};
pub use rule::Rule;
pub use transaction::{is_reserved_category, parse_record_date, RecurringInterval, Transaction, UNCATEGORIZED};
