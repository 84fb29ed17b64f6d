//! Group CLI commands
//!
//! Group membership, equal-split settlement and admin balance edits.

use std::str::FromStr;

use clap::{Subcommand, ValueEnum};
use rust_decimal::Decimal;

use crate::config::settings::Settings;
use crate::error::{TallyError, TallyResult};
use crate::models::{BucketKey, MemberId, Role};
use crate::reports::SettlementReport;
use crate::services::{default_epsilon, GroupService};
use crate::storage::Storage;

use super::OutputArgs;

/// Role given to an invited member
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoleArg {
    Admin,
    Member,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Admin => Role::Admin,
            RoleArg::Member => Role::Member,
        }
    }
}

/// Group subcommands
#[derive(Subcommand)]
pub enum GroupCommands {
    /// Create a group; you become its admin
    Create {
        /// Group name
        name: String,
    },

    /// Invite a member (admins only)
    AddMember {
        /// Group name or ID
        group: String,
        /// Member to add
        member: String,
        /// Role for the new member
        #[arg(short, long, value_enum, default_value_t = RoleArg::Member)]
        role: RoleArg,
    },

    /// Remove a member (group creator only)
    RemoveMember {
        /// Group name or ID
        group: String,
        /// Member to remove
        member: String,
    },

    /// List groups
    List {
        /// Include groups you are not a member of
        #[arg(short, long)]
        all: bool,
    },

    /// Delete a group and its expenses (group creator only)
    Delete {
        /// Group name or ID
        group: String,
    },

    /// Show who owes whom under an equal split
    Settle {
        /// Group name or ID
        group: String,
        /// Only expenses in this period ("2025-01" or "2025-W03")
        #[arg(short, long)]
        period: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Record edited balances, e.g. `alice=-20 bob=20` (admins only)
    Adjust {
        /// Group name or ID
        group: String,
        /// Balances as member=amount
        #[arg(required_unless_present = "clear")]
        balances: Vec<String>,
        /// Drop all edited balances instead
        #[arg(long, conflicts_with = "balances")]
        clear: bool,
    },
}

/// Handle a group command
pub fn handle_group_command(
    storage: &Storage,
    settings: &Settings,
    actor: &MemberId,
    cmd: GroupCommands,
) -> TallyResult<()> {
    let service = GroupService::new(storage);

    match cmd {
        GroupCommands::Create { name } => {
            let group = service.create(&name, actor)?;
            println!("Created group '{}' ({})", group.name, group.id);
        }

        GroupCommands::AddMember {
            group,
            member,
            role,
        } => {
            let member = MemberId::new(member);
            let role = Role::from(role);
            let group = service.add_member(&group, actor, &member, role)?;
            println!("Added {} to '{}' as {}", member, group.name, role);
        }

        GroupCommands::RemoveMember { group, member } => {
            let member = MemberId::new(member);
            let group = service.remove_member(&group, actor, &member)?;
            println!("Removed {} from '{}'", member, group.name);
        }

        GroupCommands::List { all } => {
            let groups = if all {
                service.list()?
            } else {
                service.list_for_member(actor)?
            };
            if groups.is_empty() {
                println!("No groups found.");
                return Ok(());
            }

            for group in &groups {
                let members: Vec<String> = group
                    .members
                    .iter()
                    .map(|m| match m.role {
                        Role::Admin => format!("{} (admin)", m.member),
                        Role::Member => m.member.to_string(),
                    })
                    .collect();
                println!("{} {:<20} {}", group.id, group.name, members.join(", "));
            }
        }

        GroupCommands::Delete { group } => {
            let group = service.delete(&group, actor)?;
            println!("Deleted group '{}'", group.name);
        }

        GroupCommands::Settle {
            group,
            period,
            output,
        } => {
            let period = period
                .map(|p| {
                    BucketKey::parse(&p).map_err(|e| {
                        TallyError::Validation(format!("Invalid period: {}", e))
                    })
                })
                .transpose()?;
            let settlement = service.settle(&group, period, default_epsilon())?;
            let report = SettlementReport::new(settlement);
            output.emit(&report, || report.format_terminal(&settings.currency_symbol))?;
        }

        GroupCommands::Adjust {
            group,
            balances,
            clear,
        } => {
            if clear {
                let group = service.clear_adjustments(&group, actor)?;
                println!("Cleared edited balances for '{}'", group.name);
                return Ok(());
            }

            let edits = balances
                .iter()
                .map(|b| parse_balance(b))
                .collect::<TallyResult<Vec<_>>>()?;
            let group = service.submit_adjustments(&group, actor, &edits)?;
            println!("Recorded {} balance(s) for '{}'", edits.len(), group.name);
        }
    }

    Ok(())
}

/// Parse `member=amount`
fn parse_balance(s: &str) -> TallyResult<(MemberId, Decimal)> {
    let (member, amount) = s.split_once('=').ok_or_else(|| {
        TallyError::Validation(format!("Expected member=amount, got '{}'", s))
    })?;
    let amount = Decimal::from_str(amount.trim())
        .map_err(|_| TallyError::Validation(format!("Invalid balance '{}'", amount)))?;
    Ok((MemberId::new(member), amount))
}
