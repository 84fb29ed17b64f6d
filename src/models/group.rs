//! Group and membership models
//!
//! A group shares expenses between members, split equally.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{GroupId, MemberId};

/// Role a member holds within a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Member,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Member => write!(f, "member"),
        }
    }
}

/// A member's place in a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub member: MemberId,

    #[serde(default)]
    pub role: Role,

    /// Balance entered by an admin in place of the computed one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjusted_balance: Option<Decimal>,
}

impl Membership {
    pub fn new(member: MemberId, role: Role) -> Self {
        Self {
            member,
            role,
            adjusted_balance: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// An expense-sharing group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,

    /// Member who created the group; only they may delete it
    pub created_by: MemberId,

    #[serde(default)]
    pub members: Vec<Membership>,

    pub created_at: DateTime<Utc>,
}

impl Group {
    /// Create a group whose creator is its first admin
    pub fn new(name: impl Into<String>, created_by: MemberId) -> Self {
        Self {
            id: GroupId::new(),
            name: name.into().trim().to_string(),
            members: vec![Membership::new(created_by.clone(), Role::Admin)],
            created_by,
            created_at: Utc::now(),
        }
    }

    pub fn membership(&self, member: &MemberId) -> Option<&Membership> {
        self.members.iter().find(|m| &m.member == member)
    }

    pub fn membership_mut(&mut self, member: &MemberId) -> Option<&mut Membership> {
        self.members.iter_mut().find(|m| &m.member == member)
    }

    pub fn is_member(&self, member: &MemberId) -> bool {
        self.membership(member).is_some()
    }

    pub fn is_admin(&self, member: &MemberId) -> bool {
        self.membership(member).is_some_and(Membership::is_admin)
    }

    /// Member ids in ascending order
    pub fn member_ids(&self) -> Vec<MemberId> {
        let mut ids: Vec<MemberId> = self.members.iter().map(|m| m.member.clone()).collect();
        ids.sort();
        ids
    }

    /// Validate the group
    pub fn validate(&self) -> Result<(), GroupValidationError> {
        if self.name.is_empty() {
            return Err(GroupValidationError::EmptyName);
        }

        let ids = self.member_ids();
        if let Some(pair) = ids.windows(2).find(|w| w[0] == w[1]) {
            return Err(GroupValidationError::DuplicateMember(pair[0].clone()));
        }

        Ok(())
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} members)", self.name, self.members.len())
    }
}

/// Validation errors for groups
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GroupValidationError {
    #[error("Group name cannot be empty")]
    EmptyName,
    #[error("Member listed twice: {0}")]
    DuplicateMember(MemberId),
}
