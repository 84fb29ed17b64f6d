//! Audit entry types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::GroupId;

/// Kind of change recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Update => write!(f, "UPDATE"),
            Operation::Delete => write!(f, "DELETE"),
        }
    }
}

/// Kind of entity a change applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Expense,
    BudgetLimit,
    Group,
    SettlementAdjustment,
    Rule,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityType::Expense => write!(f, "Expense"),
            EntityType::BudgetLimit => write!(f, "BudgetLimit"),
            EntityType::Group => write!(f, "Group"),
            EntityType::SettlementAdjustment => write!(f, "SettlementAdjustment"),
            EntityType::Rule => write!(f, "Rule"),
        }
    }
}

/// One line of the audit log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub operation: Operation,
    pub entity_type: EntityType,
    pub entity_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,

    /// Snapshot before the change (updates and deletes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<serde_json::Value>,

    /// Snapshot after the change (creates and updates)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_summary: Option<String>,
}

impl AuditEntry {
    fn new(
        operation: Operation,
        entity_type: EntityType,
        entity_id: String,
        entity_name: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            entity_type,
            entity_id,
            entity_name,
            before: None,
            after: None,
            diff_summary: None,
        }
    }

    pub fn create<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Self {
        Self {
            after: serde_json::to_value(entity).ok(),
            ..Self::new(Operation::Create, entity_type, entity_id.into(), entity_name)
        }
    }

    /// Record an update; without an explicit summary one is derived from the
    /// two snapshots
    pub fn update<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
        diff_summary: Option<String>,
    ) -> Self {
        let before = serde_json::to_value(before).ok();
        let after = serde_json::to_value(after).ok();
        let diff_summary = diff_summary.or_else(|| match (&before, &after) {
            (Some(b), Some(a)) => super::diff::summarize_changes(b, a),
            _ => None,
        });

        Self {
            before,
            after,
            diff_summary,
            ..Self::new(Operation::Update, entity_type, entity_id.into(), entity_name)
        }
    }

    pub fn delete<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Self {
        Self {
            before: serde_json::to_value(entity).ok(),
            ..Self::new(Operation::Delete, entity_type, entity_id.into(), entity_name)
        }
    }

    /// Whether the entry is about `group` itself or an expense shared with it
    pub fn concerns_group(&self, group: &GroupId) -> bool {
        if group.matches(&self.entity_id) {
            return true;
        }

        [&self.before, &self.after]
            .into_iter()
            .flatten()
            .filter_map(|snapshot| snapshot.get("group_id").and_then(|id| id.as_str()))
            .any(|id| group.matches(id))
    }

    /// One-line rendering for terminal output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation,
            self.entity_type,
            self.entity_id
        );

        if let Some(name) = &self.entity_name {
            output.push_str(&format!(" ({})", name));
        }
        if let Some(diff) = &self.diff_summary {
            output.push_str(&format!("\n  Changes: {}", diff));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_has_only_after() {
        let entry = AuditEntry::create(
            EntityType::Expense,
            "exp-12345678",
            None,
            &json!({"amount": 1200}),
        );
        assert_eq!(entry.operation, Operation::Create);
        assert!(entry.before.is_none());
        assert!(entry.after.is_some());
    }

    #[test]
    fn test_update_derives_summary() {
        let entry = AuditEntry::update(
            EntityType::BudgetLimit,
            "Food",
            None,
            &json!({"limit": 100}),
            &json!({"limit": 150}),
            None,
        );
        assert_eq!(entry.diff_summary.as_deref(), Some("limit: 100 -> 150"));
    }

    #[test]
    fn test_delete_has_only_before() {
        let entry = AuditEntry::delete(EntityType::Rule, "rul-1", None, &json!({"keyword": "uber"}));
        assert!(entry.before.is_some());
        assert!(entry.after.is_none());
    }

    #[test]
    fn test_entity_type_serializes_snake_case() {
        let json = serde_json::to_string(&EntityType::SettlementAdjustment).unwrap();
        assert_eq!(json, "\"settlement_adjustment\"");
    }

    #[test]
    fn test_human_readable() {
        let entry = AuditEntry::create(
            EntityType::Group,
            "grp-12345678",
            Some("Flat".to_string()),
            &json!({"name": "Flat"}),
        );
        let text = entry.format_human_readable();
        assert!(text.contains("CREATE Group grp-12345678 (Flat)"));
    }

    #[test]
    fn test_concerns_group() {
        let flat = GroupId::new();
        let other = GroupId::new();

        let group_entry = AuditEntry::create(EntityType::Group, flat.to_string(), None, &json!({}));
        assert!(group_entry.concerns_group(&flat));
        assert!(!group_entry.concerns_group(&other));

        let shared = json!({"amount": 500, "group_id": flat.as_uuid().to_string()});
        let expense = AuditEntry::delete(EntityType::Expense, "exp-12345678", None, &shared);
        assert!(expense.concerns_group(&flat));

        let personal = AuditEntry::create(EntityType::Expense, "exp-87654321", None, &json!({"amount": 1}));
        assert!(!personal.concerns_group(&flat));
    }
}
