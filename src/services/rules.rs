//! Keyword categorisation rules
//!
//! Each member keeps their own rule list; only the owner's rules apply to
//! their expenses.

use tracing::info;

use crate::audit::EntityType;
use crate::error::{TallyError, TallyResult};
use crate::models::{MemberId, Rule};
use crate::storage::Storage;

/// First rule matching `description`, in rule order
pub fn first_match<'r>(
    rules: impl IntoIterator<Item = &'r Rule>,
    description: &str,
) -> Option<&'r Rule> {
    rules.into_iter().find(|rule| rule.matches(description))
}

/// Service for managing categorisation rules
pub struct RuleService<'a> {
    storage: &'a Storage,
}

impl<'a> RuleService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Add a rule for `owner`; it is tried after their existing ones
    pub fn add(&self, owner: &MemberId, keyword: &str, category: &str) -> TallyResult<Rule> {
        let rule = Rule::new(owner.clone(), keyword, category);
        rule.validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        let duplicate = self
            .list(owner)?
            .into_iter()
            .any(|r| r.keyword.eq_ignore_ascii_case(&rule.keyword));
        if duplicate {
            return Err(TallyError::Duplicate {
                entity_type: "Rule",
                identifier: rule.keyword,
            });
        }

        self.storage.rules.push(rule.clone())?;
        self.storage.rules.save()?;
        self.storage
            .log_create(EntityType::Rule, rule.id.to_string(), Some(rule.keyword.clone()), &rule)?;

        info!(owner = %owner, keyword = %rule.keyword, category = %rule.category, "rule added");
        Ok(rule)
    }

    /// `owner`'s rules in evaluation order
    pub fn list(&self, owner: &MemberId) -> TallyResult<Vec<Rule>> {
        Ok(self
            .storage
            .rules
            .get_all()?
            .into_iter()
            .filter(|r| &r.owner == owner)
            .collect())
    }

    /// Remove one of `owner`'s rules by ID or keyword
    pub fn remove(&self, owner: &MemberId, identifier: &str) -> TallyResult<Rule> {
        let rule = self
            .list(owner)?
            .into_iter()
            .find(|r| r.id.matches(identifier) || r.keyword.eq_ignore_ascii_case(identifier.trim()))
            .ok_or_else(|| TallyError::rule_not_found(identifier))?;

        self.storage.rules.delete(rule.id)?;
        self.storage.rules.save()?;
        self.storage
            .log_delete(EntityType::Rule, rule.id.to_string(), Some(rule.keyword.clone()), &rule)?;

        info!(owner = %owner, keyword = %rule.keyword, "rule removed");
        Ok(rule)
    }

    /// Category `owner`'s rules suggest for a description
    pub fn categorize(&self, owner: &MemberId, description: &str) -> TallyResult<Option<String>> {
        let rules = self.list(owner)?;
        Ok(first_match(&rules, description).map(|r| r.category.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::TallyPaths;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_first_match_wins() {
        let rules = vec![
            Rule::new("me".into(), "coffee", "Food"),
            Rule::new("me".into(), "coffee beans", "Groceries"),
        ];
        assert_eq!(first_match(&rules, "Coffee Beans 1kg").unwrap().category, "Food");
        assert!(first_match(&rules, "Train ticket").is_none());
    }

    #[test]
    fn test_add_categorize_remove() {
        let (_temp, storage) = create_test_storage();
        let service = RuleService::new(&storage);
        let me = MemberId::new("me");

        service.add(&me, "uber", "Transport").unwrap();
        assert!(matches!(
            service.add(&me, "UBER", "Taxi"),
            Err(TallyError::Duplicate { .. })
        ));
        assert!(service.add(&me, "  ", "Food").unwrap_err().is_validation());

        assert_eq!(
            service.categorize(&me, "Uber trip downtown").unwrap().as_deref(),
            Some("Transport")
        );

        service.remove(&me, "uber").unwrap();
        assert!(service.categorize(&me, "Uber trip").unwrap().is_none());
        assert!(service.remove(&me, "uber").unwrap_err().is_not_found());
    }

    #[test]
    fn test_rules_belong_to_their_owner() {
        let (_temp, storage) = create_test_storage();
        let service = RuleService::new(&storage);
        let alice = MemberId::new("alice");
        let bob = MemberId::new("bob");

        service.add(&alice, "uber", "Transport").unwrap();
        service.add(&bob, "uber", "Work").unwrap();

        assert_eq!(service.categorize(&alice, "Uber").unwrap().as_deref(), Some("Transport"));
        assert_eq!(service.categorize(&bob, "Uber").unwrap().as_deref(), Some("Work"));
        assert!(service.categorize(&"carol".into(), "Uber").unwrap().is_none());

        let alice_rule = service.list(&alice).unwrap().remove(0);
        assert!(service
            .remove(&bob, &alice_rule.id.to_string())
            .unwrap_err()
            .is_not_found());
        assert_eq!(service.list(&alice).unwrap().len(), 1);
    }
}
