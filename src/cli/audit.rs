//! Audit log CLI command

use clap::Args;

use crate::error::{TallyError, TallyResult};
use crate::models::MemberId;
use crate::services::GroupService;
use crate::storage::Storage;

/// Options for showing the audit log
#[derive(Debug, Clone, Args)]
pub struct AuditArgs {
    /// Only changes to this group and its shared expenses (members only)
    #[arg(short, long)]
    pub group: Option<String>,

    /// Show the most recent N entries
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
}

/// Print recent audit entries, oldest first
pub fn handle_audit_command(storage: &Storage, actor: &MemberId, args: AuditArgs) -> TallyResult<()> {
    let entries = match &args.group {
        Some(identifier) => {
            let group = GroupService::new(storage).get(identifier)?;
            if !group.is_member(actor) {
                return Err(TallyError::PermissionDenied(format!(
                    "{} is not a member of '{}'",
                    actor, group.name
                )));
            }
            storage
                .audit()
                .read_recent_matching(args.limit, |e| e.concerns_group(&group.id))?
        }
        None => storage.audit().read_recent(args.limit)?,
    };

    if entries.is_empty() {
        println!("No audit entries.");
        return Ok(());
    }

    for entry in &entries {
        println!("{}", entry.format_human_readable());
    }
    Ok(())
}
