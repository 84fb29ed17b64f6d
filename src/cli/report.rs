//! CLI commands for reports
//!
//! Provides commands for generating and exporting spending reports,
//! month summaries, trend suggestions and recurring reminders.

use chrono::NaiveDate;
use clap::{Args, Subcommand};

use crate::config::settings::Settings;
use crate::error::{TallyError, TallyResult};
use crate::models::{Granularity, MemberId, Transaction};
use crate::reports::{MonthSummary, SpendingReport};
use crate::services::recurring::due_reminders;
use crate::services::suggest;
use crate::storage::Storage;

use super::{parse_month, OutputArgs};

/// Whose expenses a report covers
#[derive(Debug, Clone, Args)]
pub struct MemberArgs {
    /// Member to report on, defaults to the acting member
    #[arg(long)]
    pub member: Option<String>,

    /// Report on every member's expenses
    #[arg(long, conflicts_with = "member")]
    pub all: bool,
}

impl MemberArgs {
    fn resolve(&self, actor: &MemberId) -> Option<MemberId> {
        if self.all {
            return None;
        }
        Some(self.member.as_deref().map(MemberId::new).unwrap_or_else(|| actor.clone()))
    }
}

/// Report subcommands
#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Spending per calendar month
    Monthly {
        /// Break totals down by category
        #[arg(long)]
        by_category: bool,

        #[command(flatten)]
        members: MemberArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Spending per ISO week
    Weekly {
        /// Break totals down by category
        #[arg(long)]
        by_category: bool,

        #[command(flatten)]
        members: MemberArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Total and top category for one month
    Summary {
        /// Month (e.g., "2025-01"), defaults to the current month
        #[arg(short, long)]
        month: Option<String>,

        #[command(flatten)]
        members: MemberArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Compare a month's categories with the month before
    #[command(alias = "trends")]
    Suggestions {
        /// Month (e.g., "2025-01"), defaults to the current month
        #[arg(short, long)]
        month: Option<String>,

        #[command(flatten)]
        members: MemberArgs,
    },

    /// Recurring expenses due on a date
    Reminders {
        /// Date to check (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,

        #[command(flatten)]
        members: MemberArgs,
    },
}

/// Handle report commands
pub fn handle_report_command(
    storage: &Storage,
    settings: &Settings,
    actor: &MemberId,
    cmd: ReportCommands,
) -> TallyResult<()> {
    let symbol = &settings.currency_symbol;

    match cmd {
        ReportCommands::Monthly {
            by_category,
            members,
            output,
        } => {
            let member = members.resolve(actor);
            let report =
                SpendingReport::generate(storage, member.as_ref(), Granularity::Month, by_category)?;
            output.emit(&report, || report.format_terminal(symbol))
        }

        ReportCommands::Weekly {
            by_category,
            members,
            output,
        } => {
            let member = members.resolve(actor);
            let report =
                SpendingReport::generate(storage, member.as_ref(), Granularity::IsoWeek, by_category)?;
            output.emit(&report, || report.format_terminal(symbol))
        }

        ReportCommands::Summary {
            month,
            members,
            output,
        } => {
            let month = parse_month(month.as_deref())?;
            let expenses = expenses_for(storage, members.resolve(actor).as_ref())?;
            let summary = MonthSummary::compute(&expenses, month);
            output.emit(&summary, || summary.format_terminal(symbol))
        }

        ReportCommands::Suggestions { month, members } => {
            let month = parse_month(month.as_deref())?;
            let expenses = expenses_for(storage, members.resolve(actor).as_ref())?;

            println!("Spending trends for {} (vs {})", month, month.prev());
            for suggestion in suggest(&expenses, month) {
                println!("  - {}", suggestion.message(symbol));
            }
            Ok(())
        }

        ReportCommands::Reminders { date, members } => {
            let on = match date {
                Some(date) => NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|_| {
                    TallyError::Validation(format!("Invalid date: {}. Use YYYY-MM-DD", date))
                })?,
                None => chrono::Local::now().date_naive(),
            };
            let expenses = expenses_for(storage, members.resolve(actor).as_ref())?;
            let reminders = due_reminders(&expenses, on);

            if reminders.is_empty() {
                println!("No recurring expenses due on {}.", on.format(&settings.date_format));
                return Ok(());
            }

            println!("Recurring expenses due on {}:", on.format(&settings.date_format));
            for reminder in &reminders {
                let expense = &reminder.expense;
                let label = if expense.description.is_empty() {
                    expense.category.as_str()
                } else {
                    expense.description.as_str()
                };
                println!(
                    "  - {} {} ({}, {})",
                    label,
                    expense.amount.format_with_symbol(symbol),
                    expense.category,
                    reminder.interval
                );
            }
            Ok(())
        }
    }
}

fn expenses_for(storage: &Storage, member: Option<&MemberId>) -> TallyResult<Vec<Transaction>> {
    match member {
        Some(member) => storage.expenses.get_by_owner(member),
        None => storage.expenses.get_all(),
    }
}
