//! Group repository, stored in `data/groups.json`

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::TallyError;
use crate::models::{Group, GroupId};

use super::file_io::{read_json, write_json_atomic};
use super::lock;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct GroupData {
    #[serde(default)]
    groups: Vec<Group>,
}

pub struct GroupRepository {
    path: PathBuf,
    data: RwLock<HashMap<GroupId, Group>>,
}

impl GroupRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> Result<(), TallyError> {
        let file_data: GroupData = read_json(&self.path)?;

        let mut data = lock::write(&self.data)?;
        data.clear();
        for group in file_data.groups {
            data.insert(group.id, group);
        }

        Ok(())
    }

    pub fn save(&self) -> Result<(), TallyError> {
        let groups = self.get_all()?;
        write_json_atomic(&self.path, &GroupData { groups })
    }

    pub fn get(&self, id: GroupId) -> Result<Option<Group>, TallyError> {
        Ok(lock::read(&self.data)?.get(&id).cloned())
    }

    /// Find a group by ID or by name (case-insensitive)
    pub fn find(&self, identifier: &str) -> Result<Option<Group>, TallyError> {
        let data = lock::read(&self.data)?;
        let wanted = identifier.trim();

        Ok(data
            .values()
            .find(|g| g.id.matches(wanted) || g.name.eq_ignore_ascii_case(wanted))
            .cloned())
    }

    /// All groups sorted by name
    pub fn get_all(&self) -> Result<Vec<Group>, TallyError> {
        let mut groups: Vec<_> = lock::read(&self.data)?.values().cloned().collect();
        groups.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(groups)
    }

    pub fn upsert(&self, group: Group) -> Result<(), TallyError> {
        lock::write(&self.data)?.insert(group.id, group);
        Ok(())
    }

    pub fn delete(&self, id: GroupId) -> Result<Option<Group>, TallyError> {
        Ok(lock::write(&self.data)?.remove(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_by_name_or_id() {
        let temp_dir = TempDir::new().unwrap();
        let repo = GroupRepository::new(temp_dir.path().join("groups.json"));
        let group = Group::new("Flat Share", "alice".into());
        repo.upsert(group.clone()).unwrap();

        assert_eq!(repo.find("flat share").unwrap().map(|g| g.id), Some(group.id));
        assert_eq!(repo.find(&group.id.to_string()).unwrap().map(|g| g.id), Some(group.id));
        assert!(repo.find("Holiday").unwrap().is_none());
    }

    #[test]
    fn test_save_sorted_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("groups.json");
        let repo = GroupRepository::new(path.clone());
        repo.upsert(Group::new("trip", "bob".into())).unwrap();
        repo.upsert(Group::new("Flat", "alice".into())).unwrap();
        repo.save().unwrap();

        let reloaded = GroupRepository::new(path);
        reloaded.load().unwrap();
        let names: Vec<String> = reloaded.get_all().unwrap().into_iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["Flat", "trip"]);
    }
}
