//! Audit logging
//!
//! Every create, update and delete of a stored entity is appended to
//! `audit.log` as one JSON line holding before/after snapshots.
//!
//! # Example
//!
//! ```rust,ignore
//! use tally_cli::audit::{AuditEntry, AuditLogger, EntityType};
//!
//! let logger = AuditLogger::new(paths.audit_log());
//! logger.log(&AuditEntry::create(
//!     EntityType::Group,
//!     group.id.to_string(),
//!     Some(group.name.clone()),
//!     &group,
//! ))?;
//! ```

mod diff;
mod entry;
mod logger;

pub use diff::summarize_changes;
pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
