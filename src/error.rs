//! Custom error types for tally
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for tally operations
#[derive(Error, Debug)]
pub enum TallyError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// A record whose date text is not an ISO-8601 calendar date
    #[error("Unparseable date: {0}")]
    UnparseableDate(String),

    /// Equal split requested for a group with no members
    #[error("Cannot split expenses across zero members")]
    DivisionUndefined,

    /// The acting member lacks the role required for an operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Import errors
    #[error("Import error: {0}")]
    Import(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl TallyError {
    /// Create a "not found" error for expenses
    pub fn expense_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Expense",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for groups
    pub fn group_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Group",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for group members
    pub fn member_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Member",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for budget limits
    pub fn limit_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Budget limit",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for categorisation rules
    pub fn rule_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Rule",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<std::io::Error> for TallyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for TallyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<csv::Error> for TallyError {
    fn from(err: csv::Error) -> Self {
        Self::Import(err.to_string())
    }
}

/// Result type alias for tally operations
pub type TallyResult<T> = Result<T, TallyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TallyError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = TallyError::group_not_found("flatmates");
        assert_eq!(err.to_string(), "Group not found: flatmates");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_division_undefined_display() {
        assert_eq!(
            TallyError::DivisionUndefined.to_string(),
            "Cannot split expenses across zero members"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TallyError = io_err.into();
        assert!(matches!(err, TallyError::Io(_)));
    }
}
