//! tally - terminal expense tracker
//!
//! This library provides the core of the `tally` command: recording
//! expenses, evaluating them against monthly budget limits, reporting
//! spending per month or ISO week, and settling group expenses with an
//! equal split.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Core data models (expenses, limits, groups, rules, periods)
//! - `storage`: JSON file storage layer
//! - `services`: Aggregation, budget and settlement logic plus the service layer
//! - `audit`: Audit logging system
//! - `reports`: Terminal rendering of reports
//! - `export`: CSV, JSON and YAML export
//! - `cli`: Command handlers for the `tally` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use tally_cli::config::{paths::TallyPaths, settings::Settings};
//!
//! let paths = TallyPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod reports;
pub mod services;
pub mod storage;

pub use error::{TallyError, TallyResult};
