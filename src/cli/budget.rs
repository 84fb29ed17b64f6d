//! Budget CLI commands
//!
//! Implements CLI commands for monthly limits and budget checks.

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::error::TallyResult;
use crate::models::{BudgetScope, MemberId};
use crate::reports::BudgetOverviewReport;
use crate::services::BudgetService;
use crate::storage::Storage;

use super::{parse_amount, parse_month, OutputArgs};

/// Budget subcommands
#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Set the monthly limit for a category, or "overall"
    Set {
        /// Category name, or "overall"
        scope: String,
        /// Limit amount (e.g., "500" or "500.00")
        amount: String,
    },

    /// Remove a limit, leaving the scope unbounded
    #[command(alias = "rm")]
    Remove {
        /// Category name, or "overall"
        scope: String,
    },

    /// List your configured limits
    List {
        /// Include every member's limits
        #[arg(short, long)]
        all: bool,
    },

    /// Check a month's spending against the limits
    Check {
        /// Budget month (e.g., "2025-01"), defaults to the current month
        #[arg(short, long)]
        month: Option<String>,

        /// Member to check, defaults to the acting member
        #[arg(long)]
        member: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },
}

/// Handle a budget command
pub fn handle_budget_command(
    storage: &Storage,
    settings: &Settings,
    actor: &MemberId,
    cmd: BudgetCommands,
) -> TallyResult<()> {
    let service = BudgetService::new(storage, settings);
    let symbol = &settings.currency_symbol;

    match cmd {
        BudgetCommands::Set { scope, amount } => {
            let limit =
                service.set_limit(actor, BudgetScope::parse(&scope), parse_amount(&amount)?)?;
            println!(
                "Limit for {} set to {} per month",
                limit.scope,
                limit.limit.format_with_symbol(symbol)
            );
        }

        BudgetCommands::Remove { scope } => {
            let removed = service.remove_limit(actor, &BudgetScope::parse(&scope))?;
            println!("Removed limit for {}", removed.scope);
        }

        BudgetCommands::List { all } => {
            let limits = if all {
                service.list_all_limits()?
            } else {
                service.list_limits(actor)?
            };
            if limits.is_empty() {
                println!("No budget limits set.");
                if let Some(default) = settings.default_overall_limit {
                    println!(
                        "Overall limit from settings: {}",
                        default.format_with_symbol(symbol)
                    );
                }
                return Ok(());
            }

            println!("{:<16} {:<24} {:>12}", "Member", "Scope", "Limit");
            println!("{}", "-".repeat(54));
            for limit in &limits {
                println!(
                    "{:<16} {:<24} {:>12}",
                    limit.owner.as_str(),
                    limit.scope.name(),
                    limit.limit.format_with_symbol(symbol)
                );
            }
        }

        BudgetCommands::Check {
            month,
            member,
            output,
        } => {
            let member = member.map(MemberId::new).unwrap_or_else(|| actor.clone());
            let month = parse_month(month.as_deref())?;
            let report = BudgetOverviewReport::generate(storage, settings, &member, month)?;
            output.emit(&report, || report.format_terminal(symbol))?;
        }
    }

    Ok(())
}
