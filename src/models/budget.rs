//! Budget limit model
//!
//! A spending ceiling for one scope (overall or a single category) per month.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::MemberId;
use super::money::Money;

/// Label under which the overall scope is stored and displayed
pub const OVERALL_SCOPE: &str = "overall";

/// What a budget limit or an aggregate bucket covers
///
/// Ordering puts `Overall` first, then categories by name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BudgetScope {
    Overall,
    Category(String),
}

impl BudgetScope {
    pub fn category(name: impl Into<String>) -> Self {
        Self::Category(name.into())
    }

    /// Parse a scope label; "overall" (any case) names the overall scope
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.eq_ignore_ascii_case(OVERALL_SCOPE) {
            Self::Overall
        } else {
            Self::Category(s.to_string())
        }
    }

    pub fn is_overall(&self) -> bool {
        matches!(self, Self::Overall)
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Overall => OVERALL_SCOPE,
            Self::Category(name) => name,
        }
    }
}

impl From<String> for BudgetScope {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<BudgetScope> for String {
    fn from(scope: BudgetScope) -> Self {
        scope.name().to_string()
    }
}

impl fmt::Display for BudgetScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Period a limit applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LimitPeriod {
    #[default]
    Monthly,
}

/// A member's configured spending limit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetLimit {
    /// Member the limit belongs to; each member holds one limit per scope
    pub owner: MemberId,

    pub scope: BudgetScope,

    /// Maximum spend per period
    pub limit: Money,

    #[serde(default)]
    pub period: LimitPeriod,

    /// When this limit was last set
    pub updated_at: DateTime<Utc>,
}

impl BudgetLimit {
    /// Create a new monthly limit
    pub fn new(owner: MemberId, scope: BudgetScope, limit: Money) -> Self {
        Self {
            owner,
            scope,
            limit,
            period: LimitPeriod::Monthly,
            updated_at: Utc::now(),
        }
    }

    pub fn overall(owner: MemberId, limit: Money) -> Self {
        Self::new(owner, BudgetScope::Overall, limit)
    }

    pub fn for_category(owner: MemberId, category: impl Into<String>, limit: Money) -> Self {
        Self::new(owner, BudgetScope::category(category), limit)
    }

    /// Storage key: one limit per member and scope
    pub fn key(&self) -> (MemberId, BudgetScope) {
        (self.owner.clone(), self.scope.clone())
    }

    /// Set the limit amount
    pub fn set_limit(&mut self, limit: Money) {
        self.limit = limit;
        self.updated_at = Utc::now();
    }

    /// Validate the limit
    pub fn validate(&self) -> Result<(), BudgetValidationError> {
        if self.limit.is_negative() {
            return Err(BudgetValidationError::NegativeLimit);
        }

        if self.scope.name().trim().is_empty() {
            return Err(BudgetValidationError::EmptyScope);
        }

        Ok(())
    }
}

impl fmt::Display for BudgetLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {} per month", self.owner, self.scope, self.limit)
    }
}

/// Validation errors for budget limits
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BudgetValidationError {
    #[error("Budget limit cannot be negative")]
    NegativeLimit,
    #[error("Budget limit must name a category or \"overall\"")]
    EmptyScope,
}
