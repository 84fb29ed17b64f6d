//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod audit;
pub mod budget;
pub mod expense;
pub mod group;
pub mod report;
pub mod rule;

use std::path::PathBuf;

use serde::Serialize;

use crate::error::{TallyError, TallyResult};
use crate::export::{export_report, export_report_to_file, ExportFormat, Tabular};
use crate::models::{BucketKey, Granularity, Money};

pub use audit::{handle_audit_command, AuditArgs};
pub use budget::{handle_budget_command, BudgetCommands};
pub use expense::{handle_expense_command, ExpenseCommands};
pub use group::{handle_group_command, GroupCommands};
pub use report::{handle_report_command, ReportCommands};
pub use rule::{handle_rule_command, RuleCommands};

/// Parse a user-entered amount such as "12.50" or "$12.50"
pub(crate) fn parse_amount(s: &str) -> TallyResult<Money> {
    Money::parse(s).map_err(|e| TallyError::Validation(e.to_string()))
}

/// Parse a month ("2025-01"), defaulting to the current one
pub(crate) fn parse_month(s: Option<&str>) -> TallyResult<BucketKey> {
    let Some(s) = s else {
        return Ok(BucketKey::current_month());
    };

    let key = BucketKey::parse(s).map_err(|e| {
        TallyError::Validation(format!("Invalid month: {}. Use YYYY-MM (e.g., 2025-01)", e))
    })?;
    if key.granularity() != Granularity::Month {
        return Err(TallyError::Validation(format!(
            "Expected a month (YYYY-MM), got {}",
            s
        )));
    }
    Ok(key)
}

/// Where a report goes: the terminal, stdout in an export format, or a file
#[derive(Debug, Clone, clap::Args)]
pub struct OutputArgs {
    /// Write the report to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Export format; guessed from the output extension, else CSV
    #[arg(short, long, value_enum)]
    pub format: Option<ExportFormat>,
}

impl OutputArgs {
    /// Print `terminal` unless an export was requested
    pub(crate) fn emit<T>(&self, report: &T, terminal: impl FnOnce() -> String) -> TallyResult<()>
    where
        T: Serialize + Tabular,
    {
        match (&self.output, self.format) {
            (Some(path), format) => {
                let format = format
                    .or_else(|| ExportFormat::from_path(path))
                    .unwrap_or(ExportFormat::Csv);
                export_report_to_file(report, format, path)?;
                println!("Report exported to: {}", path.display());
            }
            (None, Some(format)) => {
                let stdout = std::io::stdout();
                export_report(report, format, stdout.lock())?;
            }
            (None, None) => print!("{}", terminal()),
        }
        Ok(())
    }
}
