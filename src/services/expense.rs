//! Expense service
//!
//! Records, lists, edits and removes expenses. New expenses without a
//! category are categorised by keyword rules; group expenses must come from
//! a member. An expense may be changed by its owner, or by an admin of the
//! group it is shared with.

use chrono::Local;
use tracing::{debug, info, warn};

use crate::audit::EntityType;
use crate::error::{TallyError, TallyResult};
use crate::models::{
    BucketKey, GroupId, MemberId, Money, RecurringInterval, Rule, Transaction, UNCATEGORIZED,
};
use crate::storage::Storage;

use super::rules::first_match;

/// Service for expense management
pub struct ExpenseService<'a> {
    storage: &'a Storage,
}

/// Options for filtering expenses
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub owner: Option<MemberId>,
    pub group_id: Option<GroupId>,
    /// Case-insensitive category name
    pub category: Option<String>,
    /// Only expenses dated inside this period; unparseable dates never match
    pub period: Option<BucketKey>,
    /// Keep only the most recent `limit` expenses
    pub limit: Option<usize>,
}

impl ExpenseFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner(mut self, owner: MemberId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn period(mut self, period: BucketKey) -> Self {
        self.period = Some(period);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn accepts(&self, txn: &Transaction) -> bool {
        if self.owner.as_ref().is_some_and(|o| o != &txn.owner) {
            return false;
        }
        if self.group_id.is_some() && self.group_id != txn.group_id {
            return false;
        }
        if let Some(category) = &self.category {
            if !txn.category.eq_ignore_ascii_case(category.trim()) {
                return false;
            }
        }
        match self.period {
            Some(key) => txn.parsed_date().is_ok_and(|d| key.contains(d)),
            None => true,
        }
    }
}

/// Input for recording a new expense
#[derive(Debug, Clone)]
pub struct CreateExpenseInput {
    /// Date text; today when absent
    pub date: Option<String>,
    pub amount: Money,
    /// Category; keyword rules apply when absent
    pub category: Option<String>,
    pub owner: MemberId,
    /// Group name or ID to share the expense with
    pub group: Option<String>,
    pub description: Option<String>,
    pub recurring: Option<RecurringInterval>,
}

impl CreateExpenseInput {
    pub fn new(amount: Money, owner: MemberId) -> Self {
        Self {
            date: None,
            amount,
            category: None,
            owner,
            group: None,
            description: None,
            recurring: None,
        }
    }
}

/// Changes to an existing expense; `None` leaves a field as it is
#[derive(Debug, Clone, Default)]
pub struct UpdateExpenseInput {
    pub date: Option<String>,
    pub amount: Option<Money>,
    pub category: Option<String>,
    pub description: Option<String>,
    /// `Some(None)` stops the expense recurring
    pub recurring: Option<Option<RecurringInterval>>,
}

impl UpdateExpenseInput {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.amount.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.recurring.is_none()
    }
}

impl<'a> ExpenseService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Record a new expense
    ///
    /// The date is kept as given; a date that cannot be parsed is accepted
    /// and later counted as skipped by reports.
    pub fn create(&self, input: CreateExpenseInput) -> TallyResult<Transaction> {
        let txn = self.build(input, &self.storage.rules.get_all()?)?;

        self.storage.expenses.upsert(txn.clone())?;
        self.storage.expenses.save()?;
        self.storage.log_create(
            EntityType::Expense,
            txn.id.to_string(),
            Some(txn.category.clone()),
            &txn,
        )?;

        info!(id = %txn.id, amount = %txn.amount, category = %txn.category, "expense recorded");
        Ok(txn)
    }

    /// Record many expenses with a single save
    pub fn create_many(&self, inputs: Vec<CreateExpenseInput>) -> TallyResult<Vec<Transaction>> {
        let rules = self.storage.rules.get_all()?;
        let expenses = inputs
            .into_iter()
            .map(|input| self.build(input, &rules))
            .collect::<TallyResult<Vec<_>>>()?;

        for txn in &expenses {
            self.storage.expenses.upsert(txn.clone())?;
        }
        self.storage.expenses.save()?;

        for txn in &expenses {
            self.storage.log_create(
                EntityType::Expense,
                txn.id.to_string(),
                Some(txn.category.clone()),
                txn,
            )?;
        }

        info!(count = expenses.len(), "expenses recorded");
        Ok(expenses)
    }

    fn build(&self, input: CreateExpenseInput, rules: &[Rule]) -> TallyResult<Transaction> {
        let date = input
            .date
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| Local::now().date_naive().format("%Y-%m-%d").to_string());
        let description = input.description.unwrap_or_default();

        let category = match input.category.filter(|c| !c.trim().is_empty()) {
            Some(category) => category,
            None => match first_match(
                rules.iter().filter(|r| r.owner == input.owner),
                &description,
            ) {
                Some(rule) => {
                    debug!(keyword = %rule.keyword, category = %rule.category, "rule applied");
                    rule.category.clone()
                }
                None => String::new(),
            },
        };

        let mut txn = Transaction::new(date, input.amount, category, input.owner)
            .with_description(description.trim());

        if let Some(interval) = input.recurring {
            txn = txn.with_recurring(interval);
        }

        if let Some(identifier) = input.group {
            let group = self
                .storage
                .groups
                .find(&identifier)?
                .ok_or_else(|| TallyError::group_not_found(identifier.as_str()))?;
            if !group.is_member(&txn.owner) {
                return Err(TallyError::PermissionDenied(format!(
                    "{} is not a member of '{}'",
                    txn.owner, group.name
                )));
            }
            txn = txn.with_group(group.id);
        }

        txn.validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;
        Ok(txn)
    }

    /// Find an expense by full or short ID
    pub fn get(&self, identifier: &str) -> TallyResult<Transaction> {
        self.storage
            .expenses
            .find(identifier)?
            .ok_or_else(|| TallyError::expense_not_found(identifier))
    }

    /// Expenses matching a filter, oldest first
    pub fn list(&self, filter: &ExpenseFilter) -> TallyResult<Vec<Transaction>> {
        let candidates = match &filter.owner {
            Some(owner) => self.storage.expenses.get_by_owner(owner)?,
            None => self.storage.expenses.get_all()?,
        };

        let mut expenses: Vec<Transaction> =
            candidates.into_iter().filter(|t| filter.accepts(t)).collect();

        if let Some(limit) = filter.limit {
            let start = expenses.len().saturating_sub(limit);
            expenses.drain(..start);
        }

        Ok(expenses)
    }

    /// Apply changes to an expense
    ///
    /// # Errors
    ///
    /// `PermissionDenied` unless `actor` owns the expense or administers its
    /// group; `Validation` for an empty or invalid change.
    pub fn update(
        &self,
        identifier: &str,
        actor: &MemberId,
        input: UpdateExpenseInput,
    ) -> TallyResult<Transaction> {
        if input.is_empty() {
            return Err(TallyError::Validation("Nothing to change".into()));
        }

        let before = self.get(identifier)?;
        self.require_editor(&before, actor, "edit")?;

        let mut txn = before.clone();
        if let Some(date) = input.date.filter(|d| !d.trim().is_empty()) {
            txn.date = date.trim().to_string();
        }
        if let Some(amount) = input.amount {
            txn.amount = amount;
        }
        if let Some(category) = input.category {
            txn.category = match category.trim() {
                "" => UNCATEGORIZED.to_string(),
                name => name.to_string(),
            };
        }
        if let Some(description) = input.description {
            txn.description = description.trim().to_string();
        }
        if let Some(recurring) = input.recurring {
            txn.recurring = recurring;
        }

        txn.validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        self.storage.expenses.upsert(txn.clone())?;
        self.storage.expenses.save()?;
        self.storage.log_update(
            EntityType::Expense,
            txn.id.to_string(),
            Some(txn.category.clone()),
            &before,
            &txn,
            None,
        )?;

        info!(id = %txn.id, actor = %actor, "expense updated");
        Ok(txn)
    }

    /// Delete an expense
    ///
    /// Allowed for its owner, and for admins of the group it is shared with.
    pub fn remove(&self, identifier: &str, actor: &MemberId) -> TallyResult<Transaction> {
        let txn = self.get(identifier)?;
        self.require_editor(&txn, actor, "remove")?;

        self.storage.expenses.delete(txn.id)?;
        self.storage.expenses.save()?;
        self.storage.log_delete(
            EntityType::Expense,
            txn.id.to_string(),
            Some(txn.category.clone()),
            &txn,
        )?;

        info!(id = %txn.id, actor = %actor, "expense removed");
        Ok(txn)
    }

    fn require_editor(&self, txn: &Transaction, actor: &MemberId, action: &str) -> TallyResult<()> {
        if &txn.owner == actor {
            return Ok(());
        }

        if let Some(group_id) = txn.group_id {
            if self
                .storage
                .groups
                .get(group_id)?
                .is_some_and(|group| group.is_admin(actor))
            {
                debug!(id = %txn.id, actor = %actor, action, "group admin override");
                return Ok(());
            }
        }

        warn!(id = %txn.id, actor = %actor, action, "permission denied");
        Err(TallyError::PermissionDenied(format!(
            "{} cannot {} expense {} of {}",
            actor, action, txn.id, txn.owner
        )))
    }
}
