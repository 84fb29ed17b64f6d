//! Budget service
//!
//! Classifies spend against configured monthly limits. `evaluate` and
//! `evaluate_per_category` are pure; `BudgetService` wires them to storage
//! for limit management and the monthly check.

use serde::Serialize;
use std::fmt;
use tracing::info;

use crate::audit::EntityType;
use crate::config::settings::Settings;
use crate::error::{TallyError, TallyResult};
use crate::models::{BucketKey, BudgetLimit, BudgetScope, MemberId, Money};
use crate::services::aggregator::{aggregate_by_month, AggregateBucket, ScopeSelector};
use crate::storage::Storage;

/// Outcome of comparing spend with a limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    Within,
    Over,
    /// No limit is configured for the scope
    Unbounded,
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Within => write!(f, "within"),
            Self::Over => write!(f, "over"),
            Self::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// Spend classified against a limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BudgetEvaluation {
    pub status: BudgetStatus,
    pub spent: Money,
    /// `None` when unbounded
    pub limit: Option<Money>,
}

impl BudgetEvaluation {
    pub fn unbounded(spent: Money) -> Self {
        Self {
            status: BudgetStatus::Unbounded,
            spent,
            limit: None,
        }
    }

    pub fn is_over(&self) -> bool {
        self.status == BudgetStatus::Over
    }

    /// Limit minus spend; negative when over
    pub fn remaining(&self) -> Option<Money> {
        self.limit.map(|limit| limit - self.spent)
    }
}

/// Classify `spent` against `limit`
///
/// Over only when spend strictly exceeds the limit; spending exactly the
/// limit is within. With a zero limit any positive spend is over.
pub fn evaluate(spent: Money, limit: Money) -> BudgetEvaluation {
    let status = if spent > limit {
        BudgetStatus::Over
    } else {
        BudgetStatus::Within
    };

    BudgetEvaluation {
        status,
        spent,
        limit: Some(limit),
    }
}

/// Evaluation of one aggregate bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeEvaluation {
    pub bucket_key: BucketKey,
    pub scope: BudgetScope,
    #[serde(flatten)]
    pub evaluation: BudgetEvaluation,
}

/// Evaluate each bucket independently against the limit for its scope
///
/// Buckets whose scope has no configured limit are reported as unbounded.
pub fn evaluate_per_category(
    buckets: &[AggregateBucket],
    limits: &[BudgetLimit],
) -> Vec<ScopeEvaluation> {
    buckets
        .iter()
        .map(|bucket| {
            let evaluation = match limits.iter().find(|l| l.scope == bucket.scope) {
                Some(limit) => evaluate(bucket.total, limit.limit),
                None => BudgetEvaluation::unbounded(bucket.total),
            };
            ScopeEvaluation {
                bucket_key: bucket.bucket_key,
                scope: bucket.scope.clone(),
                evaluation,
            }
        })
        .collect()
}

/// Evaluations that should raise an alert (over budget); unbounded scopes
/// never alert
pub fn alerts(evaluations: &[ScopeEvaluation]) -> Vec<&ScopeEvaluation> {
    evaluations.iter().filter(|e| e.evaluation.is_over()).collect()
}

/// Result of checking one member's month against their limits
#[derive(Debug, Clone, Serialize)]
pub struct BudgetCheck {
    pub member: MemberId,
    pub month: BucketKey,
    pub overall: ScopeEvaluation,
    pub categories: Vec<ScopeEvaluation>,
    /// Expenses ignored because of unparseable dates
    pub skipped: usize,
}

impl BudgetCheck {
    /// Overall and category evaluations that are over budget
    pub fn alerts(&self) -> Vec<&ScopeEvaluation> {
        std::iter::once(&self.overall)
            .chain(self.categories.iter())
            .filter(|e| e.evaluation.is_over())
            .collect()
    }
}

/// Service for budget limit management
pub struct BudgetService<'a> {
    storage: &'a Storage,
    settings: &'a Settings,
}

impl<'a> BudgetService<'a> {
    /// Create a new budget service
    pub fn new(storage: &'a Storage, settings: &'a Settings) -> Self {
        Self { storage, settings }
    }

    /// Set (or replace) `owner`'s monthly limit for a scope
    pub fn set_limit(
        &self,
        owner: &MemberId,
        scope: BudgetScope,
        amount: Money,
    ) -> TallyResult<BudgetLimit> {
        let existing = self.storage.limits.get(owner, &scope)?;

        let limit = match &existing {
            Some(current) => {
                let mut updated = current.clone();
                updated.set_limit(amount);
                updated
            }
            None => BudgetLimit::new(owner.clone(), scope.clone(), amount),
        };

        limit
            .validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        self.storage.limits.upsert(limit.clone())?;
        self.storage.limits.save()?;

        let audit_id = limit_audit_id(owner, &scope);
        match existing {
            Some(before) => self.storage.log_update(
                EntityType::BudgetLimit,
                audit_id,
                None,
                &before,
                &limit,
                Some(format!("limit: {} -> {}", before.limit, limit.limit)),
            )?,
            None => self
                .storage
                .log_create(EntityType::BudgetLimit, audit_id, None, &limit)?,
        }

        info!(owner = %owner, scope = %scope, limit = %amount, "budget limit set");
        Ok(limit)
    }

    /// Remove `owner`'s limit for a scope, making it unbounded
    pub fn remove_limit(&self, owner: &MemberId, scope: &BudgetScope) -> TallyResult<BudgetLimit> {
        let removed = self
            .storage
            .limits
            .delete(owner, scope)?
            .ok_or_else(|| TallyError::limit_not_found(limit_audit_id(owner, scope)))?;
        self.storage.limits.save()?;

        self.storage.log_delete(
            EntityType::BudgetLimit,
            limit_audit_id(owner, scope),
            None,
            &removed,
        )?;
        info!(owner = %owner, scope = %scope, "budget limit removed");
        Ok(removed)
    }

    /// `owner`'s limits, overall first then categories by name
    pub fn list_limits(&self, owner: &MemberId) -> TallyResult<Vec<BudgetLimit>> {
        self.storage.limits.get_for_owner(owner)
    }

    /// Limits of every member
    pub fn list_all_limits(&self) -> TallyResult<Vec<BudgetLimit>> {
        self.storage.limits.get_all()
    }

    /// `owner`'s overall limit, falling back to the settings default when
    /// none is stored
    pub fn overall_limit(&self, owner: &MemberId) -> TallyResult<Option<Money>> {
        Ok(self
            .storage
            .limits
            .get(owner, &BudgetScope::Overall)?
            .map(|l| l.limit)
            .or(self.settings.default_overall_limit))
    }

    /// Check a member's spend in `month` against their limits
    ///
    /// Categories with a limit but no spend are reported as within with
    /// zero spent.
    pub fn check(&self, member: &MemberId, month: BucketKey) -> TallyResult<BudgetCheck> {
        let expenses = self.storage.expenses.get_by_owner(member)?;
        let mut limits = self.list_limits(member)?;

        let overall_agg = aggregate_by_month(&expenses, ScopeSelector::Overall);
        let spent = overall_agg.total_for(&month, &BudgetScope::Overall);
        let overall = ScopeEvaluation {
            bucket_key: month,
            scope: BudgetScope::Overall,
            evaluation: match self.overall_limit(member)? {
                Some(limit) => evaluate(spent, limit),
                None => BudgetEvaluation::unbounded(spent),
            },
        };

        let category_agg = aggregate_by_month(&expenses, ScopeSelector::ByCategory);
        let mut buckets: Vec<AggregateBucket> = category_agg.for_key(&month).cloned().collect();
        for limit in limits.iter().filter(|l| !l.scope.is_overall()) {
            if !buckets.iter().any(|b| b.scope == limit.scope) {
                buckets.push(AggregateBucket {
                    bucket_key: month,
                    scope: limit.scope.clone(),
                    total: Money::zero(),
                    count: 0,
                });
            }
        }
        buckets.sort_by(|a, b| a.scope.cmp(&b.scope));
        limits.retain(|l| !l.scope.is_overall());

        Ok(BudgetCheck {
            member: member.clone(),
            month,
            overall,
            categories: evaluate_per_category(&buckets, &limits),
            skipped: overall_agg.skipped,
        })
    }
}

/// Audit identifier of a limit, e.g. "alice/Food"
fn limit_audit_id(owner: &MemberId, scope: &BudgetScope) -> String {
    format!("{}/{}", owner, scope)
}
