//! Expense CLI commands
//!
//! Recording, listing, editing, removing and importing expenses.

use std::path::PathBuf;

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::error::{TallyError, TallyResult};
use crate::models::{MemberId, RecurringInterval, Transaction};
use crate::services::{
    CreateExpenseInput, ExpenseFilter, ExpenseService, GroupService, ImportService,
    UpdateExpenseInput,
};
use crate::storage::Storage;

use super::{parse_amount, parse_month};

/// Expense subcommands
#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// Record an expense
    Add {
        /// Amount (e.g., "12.50")
        amount: String,
        /// Category; keyword rules are applied when omitted
        #[arg(short, long)]
        category: Option<String>,
        /// Expense date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
        /// Description
        #[arg(short = 'm', long)]
        description: Option<String>,
        /// Share the expense with a group (name or ID)
        #[arg(short, long)]
        group: Option<String>,
        /// Repeat interval: weekly or monthly
        #[arg(short, long)]
        recurring: Option<String>,
    },

    /// List expenses
    List {
        /// Only this member's expenses
        #[arg(long)]
        member: Option<String>,
        /// Only expenses shared with this group
        #[arg(short, long)]
        group: Option<String>,
        /// Only this category
        #[arg(short, long)]
        category: Option<String>,
        /// Only this month (YYYY-MM)
        #[arg(short, long)]
        month: Option<String>,
        /// Show the most recent N
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Change an expense you own, or one shared with a group you administer
    Edit {
        /// Expense ID
        expense: String,
        /// New amount
        #[arg(short, long)]
        amount: Option<String>,
        /// New category
        #[arg(short, long)]
        category: Option<String>,
        /// New date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,
        /// New description
        #[arg(short = 'm', long)]
        description: Option<String>,
        /// Repeat interval: weekly, monthly or none
        #[arg(short, long)]
        recurring: Option<String>,
    },

    /// Remove an expense you own, or one shared with a group you administer
    #[command(alias = "rm")]
    Remove {
        /// Expense ID
        expense: String,
    },

    /// Import expenses from a CSV file
    Import {
        /// Path to CSV file
        file: PathBuf,
        /// Owner for rows without an owner column
        #[arg(long)]
        owner: Option<String>,
    },
}

/// Handle an expense command
pub fn handle_expense_command(
    storage: &Storage,
    settings: &Settings,
    actor: &MemberId,
    cmd: ExpenseCommands,
) -> TallyResult<()> {
    let service = ExpenseService::new(storage);
    let symbol = &settings.currency_symbol;

    match cmd {
        ExpenseCommands::Add {
            amount,
            category,
            date,
            description,
            group,
            recurring,
        } => {
            let recurring = recurring.as_deref().map(parse_interval).transpose()?;

            let input = CreateExpenseInput {
                date,
                category,
                group,
                description,
                recurring,
                ..CreateExpenseInput::new(parse_amount(&amount)?, actor.clone())
            };
            let txn = service.create(input)?;

            println!(
                "Recorded {} {} on {} in {}",
                txn.id,
                txn.amount.format_with_symbol(symbol),
                txn.date,
                txn.category
            );
        }

        ExpenseCommands::List {
            member,
            group,
            category,
            month,
            limit,
        } => {
            let mut filter = ExpenseFilter::new().limit(limit);
            if let Some(member) = member {
                filter = filter.owner(MemberId::new(member));
            }
            if let Some(group) = group {
                filter = filter.group(GroupService::new(storage).get(&group)?.id);
            }
            if let Some(category) = category {
                filter = filter.category(category);
            }
            if month.is_some() {
                filter = filter.period(parse_month(month.as_deref())?);
            }

            let expenses = service.list(&filter)?;
            if expenses.is_empty() {
                println!("No expenses found.");
                return Ok(());
            }

            println!(
                "{:<12} {:<10} {:<12} {:<16} {:>10}  Description",
                "ID", "Date", "Owner", "Category", "Amount"
            );
            println!("{}", "-".repeat(80));
            for txn in &expenses {
                println!("{}", format_expense_row(txn, symbol));
            }
        }

        ExpenseCommands::Edit {
            expense,
            amount,
            category,
            date,
            description,
            recurring,
        } => {
            let recurring = recurring
                .as_deref()
                .map(|r| match r.trim().to_lowercase().as_str() {
                    "none" | "off" | "no" => Ok(None),
                    _ => parse_interval(r).map(Some),
                })
                .transpose()?;

            let input = UpdateExpenseInput {
                date,
                amount: amount.as_deref().map(parse_amount).transpose()?,
                category,
                description,
                recurring,
            };
            let txn = service.update(&expense, actor, input)?;
            println!("Updated {}", format_expense_row(&txn, symbol));
        }

        ExpenseCommands::Remove { expense } => {
            let txn = service.remove(&expense, actor)?;
            println!(
                "Removed {} ({} in {})",
                txn.id,
                txn.amount.format_with_symbol(symbol),
                txn.category
            );
        }

        ExpenseCommands::Import { file, owner } => {
            let owner = owner.map(MemberId::new).unwrap_or_else(|| actor.clone());
            let result = ImportService::new(storage).import_file(&file, &owner)?;

            println!("Imported {} expense(s) from {}", result.imported_count(), file.display());
            if !result.errors.is_empty() {
                println!("Skipped {} row(s):", result.errors.len());
                for (row, message) in &result.errors {
                    println!("  row {}: {}", row, message);
                }
            }
        }
    }

    Ok(())
}

fn parse_interval(s: &str) -> TallyResult<RecurringInterval> {
    RecurringInterval::parse(s).ok_or_else(|| {
        TallyError::Validation(format!("Unknown interval '{}'. Use weekly or monthly", s))
    })
}

fn format_expense_row(txn: &Transaction, symbol: &str) -> String {
    let mut description = txn.description.clone();
    if let Some(interval) = txn.recurring {
        description = format!("{} [{}]", description, interval).trim().to_string();
    }
    format!(
        "{:<12} {:<10} {:<12} {:<16} {:>10}  {}",
        txn.id.to_string(),
        txn.date,
        txn.owner.as_str(),
        txn.category,
        txn.amount.format_with_symbol(symbol),
        description
    )
}
