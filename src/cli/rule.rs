//! Rule CLI commands

use clap::Subcommand;

use crate::error::TallyResult;
use crate::models::MemberId;
use crate::services::RuleService;
use crate::storage::Storage;

/// Rule subcommands
#[derive(Subcommand)]
pub enum RuleCommands {
    /// Categorise expenses whose description contains a keyword
    Add {
        /// Keyword to look for (case-insensitive)
        keyword: String,
        /// Category to assign
        category: String,
    },

    /// List your rules in the order they are tried
    List,

    /// Remove a rule by ID or keyword
    #[command(alias = "rm")]
    Remove {
        /// Rule ID or keyword
        rule: String,
    },

    /// Show which category a description would get
    Test {
        /// Expense description
        description: String,
    },
}

/// Handle a rule command
pub fn handle_rule_command(
    storage: &Storage,
    actor: &MemberId,
    cmd: RuleCommands,
) -> TallyResult<()> {
    let service = RuleService::new(storage);

    match cmd {
        RuleCommands::Add { keyword, category } => {
            let rule = service.add(actor, &keyword, &category)?;
            println!("Added rule {} ({})", rule, rule.id);
        }
        RuleCommands::List => {
            let rules = service.list(actor)?;
            if rules.is_empty() {
                println!("No rules defined.");
            }
            for (idx, rule) in rules.iter().enumerate() {
                println!("{:>3}. {} {}", idx + 1, rule.id, rule);
            }
        }
        RuleCommands::Remove { rule } => {
            let removed = service.remove(actor, &rule)?;
            println!("Removed rule {}", removed);
        }
        RuleCommands::Test { description } => match service.categorize(actor, &description)? {
            Some(category) => println!("{}", category),
            None => println!("No rule matches."),
        },
    }

    Ok(())
}
