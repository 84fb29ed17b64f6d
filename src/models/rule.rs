//! Keyword categorisation rules

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{MemberId, RuleId};
use super::transaction::is_reserved_category;

/// Assigns `category` to `owner`'s expenses whose description contains
/// `keyword`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub owner: MemberId,
    pub keyword: String,
    pub category: String,
}

impl Rule {
    pub fn new(owner: MemberId, keyword: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: RuleId::new(),
            owner,
            keyword: keyword.into().trim().to_string(),
            category: category.into().trim().to_string(),
        }
    }

    /// Case-insensitive substring match against a description
    pub fn matches(&self, description: &str) -> bool {
        !self.keyword.is_empty()
            && description
                .to_lowercase()
                .contains(&self.keyword.to_lowercase())
    }

    pub fn validate(&self) -> Result<(), RuleValidationError> {
        if self.keyword.is_empty() {
            return Err(RuleValidationError::EmptyKeyword);
        }
        if self.category.is_empty() {
            return Err(RuleValidationError::EmptyCategory);
        }
        if is_reserved_category(&self.category) {
            return Err(RuleValidationError::ReservedCategory(self.category.clone()));
        }
        Ok(())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" -> {}", self.keyword, self.category)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleValidationError {
    #[error("Rule keyword cannot be empty")]
    EmptyKeyword,
    #[error("Rule category cannot be empty")]
    EmptyCategory,
    #[error("\"{0}\" is reserved for the overall budget")]
    ReservedCategory(String),
}
