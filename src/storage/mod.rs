//! Storage layer for tally
//!
//! JSON file storage with atomic writes. Each entity kind has its own
//! repository and data file; the `Storage` coordinator owns them all along
//! with the audit log.

pub mod expenses;
pub mod file_io;
pub mod groups;
pub mod init;
pub mod limits;
mod lock;
pub mod rules;

pub use expenses::ExpenseRepository;
pub use file_io::{read_json, write_json_atomic};
pub use groups::GroupRepository;
pub use init::initialize_storage;
pub use limits::LimitRepository;
pub use rules::RuleRepository;

use serde::Serialize;

use crate::audit::{AuditEntry, AuditLogger, EntityType};
use crate::config::paths::TallyPaths;
use crate::error::TallyError;

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: TallyPaths,
    audit: AuditLogger,
    pub expenses: ExpenseRepository,
    pub limits: LimitRepository,
    pub groups: GroupRepository,
    pub rules: RuleRepository,
}

impl Storage {
    /// Create a new Storage instance, creating directories as needed
    pub fn new(paths: TallyPaths) -> Result<Self, TallyError> {
        paths.ensure_directories()?;

        Ok(Self {
            audit: AuditLogger::new(paths.audit_log()),
            expenses: ExpenseRepository::new(paths.expenses_file()),
            limits: LimitRepository::new(paths.limits_file()),
            groups: GroupRepository::new(paths.groups_file()),
            rules: RuleRepository::new(paths.rules_file()),
            paths,
        })
    }

    pub fn paths(&self) -> &TallyPaths {
        &self.paths
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Load all data from disk
    pub fn load_all(&mut self) -> Result<(), TallyError> {
        self.expenses.load()?;
        self.limits.load()?;
        self.groups.load()?;
        self.rules.load()?;
        Ok(())
    }

    /// Save all data to disk
    pub fn save_all(&self) -> Result<(), TallyError> {
        self.expenses.save()?;
        self.limits.save()?;
        self.groups.save()?;
        self.rules.save()?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }

    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Result<(), TallyError> {
        self.audit
            .log(&AuditEntry::create(entity_type, entity_id, entity_name, entity))
    }

    pub fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
        diff_summary: Option<String>,
    ) -> Result<(), TallyError> {
        self.audit.log(&AuditEntry::update(
            entity_type,
            entity_id,
            entity_name,
            before,
            after,
            diff_summary,
        ))
    }

    pub fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Result<(), TallyError> {
        self.audit
            .log(&AuditEntry::delete(entity_type, entity_id, entity_name, entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::Operation;
    use crate::models::{Money, Transaction};
    use tempfile::TempDir;

    #[test]
    fn test_storage_creation() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();

        assert!(temp_dir.path().join("data").exists());
        assert!(!storage.is_initialized());
    }

    #[test]
    fn test_round_trip_through_disk_with_audit() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths.clone()).unwrap();

        let txn = Transaction::new("2025-01-01", Money::from_cents(250), "Food", "alice".into());
        storage.expenses.upsert(txn.clone()).unwrap();
        storage.save_all().unwrap();
        storage
            .log_create(EntityType::Expense, txn.id.to_string(), None, &txn)
            .unwrap();

        let mut reopened = Storage::new(paths).unwrap();
        reopened.load_all().unwrap();
        assert_eq!(reopened.expenses.count().unwrap(), 1);

        let entries = reopened.audit().read_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].operation, Operation::Create);
    }
}
