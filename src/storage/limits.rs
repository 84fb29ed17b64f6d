//! Budget limit repository
//!
//! One limit per member and scope, stored in `data/limits.json`.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::TallyError;
use crate::models::{BudgetLimit, BudgetScope, MemberId};

use super::file_io::{read_json, write_json_atomic};
use super::lock;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct LimitData {
    #[serde(default)]
    limits: Vec<BudgetLimit>,
}

pub struct LimitRepository {
    path: PathBuf,
    limits: RwLock<BTreeMap<(MemberId, BudgetScope), BudgetLimit>>,
}

impl LimitRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            limits: RwLock::new(BTreeMap::new()),
        }
    }

    /// Load limits from disk; a later entry for the same member and scope wins
    pub fn load(&self) -> Result<(), TallyError> {
        let file_data: LimitData = read_json(&self.path)?;

        let mut limits = lock::write(&self.limits)?;
        limits.clear();
        for limit in file_data.limits {
            limits.insert(limit.key(), limit);
        }

        Ok(())
    }

    pub fn save(&self) -> Result<(), TallyError> {
        let limits = lock::read(&self.limits)?;
        let file_data = LimitData {
            limits: limits.values().cloned().collect(),
        };
        write_json_atomic(&self.path, &file_data)
    }

    pub fn get(
        &self,
        owner: &MemberId,
        scope: &BudgetScope,
    ) -> Result<Option<BudgetLimit>, TallyError> {
        Ok(lock::read(&self.limits)?
            .get(&(owner.clone(), scope.clone()))
            .cloned())
    }

    /// Every member's limits, grouped by member
    pub fn get_all(&self) -> Result<Vec<BudgetLimit>, TallyError> {
        Ok(lock::read(&self.limits)?.values().cloned().collect())
    }

    /// One member's limits, overall first then categories by name
    pub fn get_for_owner(&self, owner: &MemberId) -> Result<Vec<BudgetLimit>, TallyError> {
        Ok(lock::read(&self.limits)?
            .iter()
            .filter(|((limit_owner, _), _)| limit_owner == owner)
            .map(|(_, limit)| limit.clone())
            .collect())
    }

    pub fn upsert(&self, limit: BudgetLimit) -> Result<(), TallyError> {
        lock::write(&self.limits)?.insert(limit.key(), limit);
        Ok(())
    }

    pub fn delete(
        &self,
        owner: &MemberId,
        scope: &BudgetScope,
    ) -> Result<Option<BudgetLimit>, TallyError> {
        Ok(lock::write(&self.limits)?.remove(&(owner.clone(), scope.clone())))
    }
}
