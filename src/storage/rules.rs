//! Categorisation rule repository, stored in `data/rules.json`
//!
//! Rules keep their insertion order; the first match wins.

use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::TallyError;
use crate::models::{Rule, RuleId};

use super::file_io::{read_json, write_json_atomic};
use super::lock;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct RuleData {
    #[serde(default)]
    rules: Vec<Rule>,
}

pub struct RuleRepository {
    path: PathBuf,
    rules: RwLock<Vec<Rule>>,
}

impl RuleRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            rules: RwLock::new(Vec::new()),
        }
    }

    pub fn load(&self) -> Result<(), TallyError> {
        let file_data: RuleData = read_json(&self.path)?;
        *lock::write(&self.rules)? = file_data.rules;
        Ok(())
    }

    pub fn save(&self) -> Result<(), TallyError> {
        let rules = lock::read(&self.rules)?.clone();
        write_json_atomic(&self.path, &RuleData { rules })
    }

    /// Rules in evaluation order
    pub fn get_all(&self) -> Result<Vec<Rule>, TallyError> {
        Ok(lock::read(&self.rules)?.clone())
    }

    pub fn find(&self, identifier: &str) -> Result<Option<Rule>, TallyError> {
        Ok(lock::read(&self.rules)?
            .iter()
            .find(|r| r.id.matches(identifier))
            .cloned())
    }

    /// Append a rule after all existing ones
    pub fn push(&self, rule: Rule) -> Result<(), TallyError> {
        lock::write(&self.rules)?.push(rule);
        Ok(())
    }

    pub fn delete(&self, id: RuleId) -> Result<Option<Rule>, TallyError> {
        let mut rules = lock::write(&self.rules)?;
        Ok(rules
            .iter()
            .position(|r| r.id == id)
            .map(|index| rules.remove(index)))
    }
}
