//! Expense repository
//!
//! Stores expenses in `data/expenses.json`, indexed by owner.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::TallyError;
use crate::models::{GroupId, MemberId, Transaction, TransactionId};

use super::file_io::{read_json, write_json_atomic};
use super::lock;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct ExpenseData {
    expenses: Vec<Transaction>,
}

/// Repository for expense persistence
pub struct ExpenseRepository {
    path: PathBuf,
    data: RwLock<HashMap<TransactionId, Transaction>>,
    /// Index: owner -> expense ids
    by_owner: RwLock<HashMap<MemberId, Vec<TransactionId>>>,
}

/// Oldest first; dates compare as text, which orders ISO dates correctly
fn sort_chronological(expenses: &mut [Transaction]) {
    expenses.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
}

impl ExpenseRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            by_owner: RwLock::new(HashMap::new()),
        }
    }

    /// Load expenses from disk and rebuild the owner index
    pub fn load(&self) -> Result<(), TallyError> {
        let file_data: ExpenseData = read_json(&self.path)?;

        let mut data = lock::write(&self.data)?;
        let mut by_owner = lock::write(&self.by_owner)?;
        data.clear();
        by_owner.clear();

        for txn in file_data.expenses {
            by_owner.entry(txn.owner.clone()).or_default().push(txn.id);
            data.insert(txn.id, txn);
        }

        Ok(())
    }

    pub fn save(&self) -> Result<(), TallyError> {
        let data = lock::read(&self.data)?;
        let mut expenses: Vec<_> = data.values().cloned().collect();
        sort_chronological(&mut expenses);

        write_json_atomic(&self.path, &ExpenseData { expenses })
    }

    pub fn get(&self, id: TransactionId) -> Result<Option<Transaction>, TallyError> {
        Ok(lock::read(&self.data)?.get(&id).cloned())
    }

    /// Find an expense by full or short ID
    pub fn find(&self, identifier: &str) -> Result<Option<Transaction>, TallyError> {
        let data = lock::read(&self.data)?;
        Ok(data.values().find(|t| t.id.matches(identifier)).cloned())
    }

    /// All expenses, oldest first
    pub fn get_all(&self) -> Result<Vec<Transaction>, TallyError> {
        let mut expenses: Vec<_> = lock::read(&self.data)?.values().cloned().collect();
        sort_chronological(&mut expenses);
        Ok(expenses)
    }

    /// Expenses owned by a member, oldest first
    pub fn get_by_owner(&self, owner: &MemberId) -> Result<Vec<Transaction>, TallyError> {
        let data = lock::read(&self.data)?;
        let by_owner = lock::read(&self.by_owner)?;

        let ids = by_owner.get(owner).map(|v| v.as_slice()).unwrap_or(&[]);
        let mut expenses: Vec<_> = ids.iter().filter_map(|id| data.get(id).cloned()).collect();
        sort_chronological(&mut expenses);
        Ok(expenses)
    }

    /// Expenses shared with a group, oldest first
    pub fn get_by_group(&self, group_id: GroupId) -> Result<Vec<Transaction>, TallyError> {
        let mut expenses: Vec<_> = lock::read(&self.data)?
            .values()
            .filter(|t| t.group_id == Some(group_id))
            .cloned()
            .collect();
        sort_chronological(&mut expenses);
        Ok(expenses)
    }

    /// Insert or replace an expense
    pub fn upsert(&self, txn: Transaction) -> Result<(), TallyError> {
        let mut data = lock::write(&self.data)?;
        let mut by_owner = lock::write(&self.by_owner)?;

        if let Some(old) = data.get(&txn.id) {
            if let Some(ids) = by_owner.get_mut(&old.owner) {
                ids.retain(|&id| id != txn.id);
            }
        }

        by_owner.entry(txn.owner.clone()).or_default().push(txn.id);
        data.insert(txn.id, txn);
        Ok(())
    }

    pub fn delete(&self, id: TransactionId) -> Result<Option<Transaction>, TallyError> {
        let mut data = lock::write(&self.data)?;
        let mut by_owner = lock::write(&self.by_owner)?;

        let removed = data.remove(&id);
        if let Some(txn) = &removed {
            if let Some(ids) = by_owner.get_mut(&txn.owner) {
                ids.retain(|&other| other != id);
            }
        }
        Ok(removed)
    }

    /// Delete every expense of a group, returning how many were removed
    pub fn delete_by_group(&self, group_id: GroupId) -> Result<usize, TallyError> {
        let mut data = lock::write(&self.data)?;
        let mut by_owner = lock::write(&self.by_owner)?;

        let doomed: Vec<TransactionId> = data
            .values()
            .filter(|t| t.group_id == Some(group_id))
            .map(|t| t.id)
            .collect();

        for id in &doomed {
            data.remove(id);
        }
        for ids in by_owner.values_mut() {
            ids.retain(|id| !doomed.contains(id));
        }

        Ok(doomed.len())
    }

    pub fn count(&self) -> Result<usize, TallyError> {
        Ok(lock::read(&self.data)?.len())
    }
}
