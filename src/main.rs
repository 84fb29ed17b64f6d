use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tally_cli::cli::{
    handle_audit_command, handle_budget_command, handle_expense_command, handle_group_command,
    handle_report_command, handle_rule_command,
};
use tally_cli::config::{paths::TallyPaths, settings::Settings};
use tally_cli::models::MemberId;
use tally_cli::storage::Storage;

#[derive(Parser)]
#[command(
    name = "tally",
    version,
    about = "Terminal expense tracker with budgets and group settlement",
    long_about = "tally records expenses, checks them against monthly limits, \
                  reports spending by month or ISO week and settles shared \
                  group expenses with an equal split."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Act as this member instead of the configured default
    #[arg(long = "as", value_name = "MEMBER", env = "TALLY_MEMBER", global = true)]
    actor: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory
    Init {
        /// Member recorded as the owner of your expenses
        #[arg(long)]
        member: Option<String>,
    },

    /// Show current configuration and paths
    Config,

    /// Expense commands
    #[command(subcommand, alias = "exp")]
    Expense(tally_cli::cli::ExpenseCommands),

    /// Budget limit commands
    #[command(subcommand)]
    Budget(tally_cli::cli::BudgetCommands),

    /// Spending reports
    #[command(subcommand)]
    Report(tally_cli::cli::ReportCommands),

    /// Expense-sharing groups
    #[command(subcommand)]
    Group(tally_cli::cli::GroupCommands),

    /// Keyword categorisation rules
    #[command(subcommand)]
    Rule(tally_cli::cli::RuleCommands),

    /// Show recent changes from the audit log
    Audit(tally_cli::cli::AuditArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let paths = TallyPaths::new()?;
    let mut settings = Settings::load_or_create(&paths)?;

    let mut storage = Storage::new(paths.clone())?;
    storage.load_all()?;

    let actor = cli
        .actor
        .map(MemberId::new)
        .unwrap_or_else(|| settings.default_member.clone());

    match cli.command {
        Some(Commands::Init { member }) => {
            println!("Initializing tally at: {}", paths.base_dir().display());
            tally_cli::storage::init::initialize_storage(&paths)?;
            if let Some(member) = member {
                settings.default_member = MemberId::new(member);
            }
            settings.save(&paths)?;
            println!("Initialization complete!");
            println!("Expenses will be recorded as '{}'.", settings.default_member);
            println!();
            println!("Run 'tally expense add 12.50 -c Food' to record your first expense.");
        }
        Some(Commands::Config) => {
            println!("tally Configuration");
            println!("===================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Data directory:   {}", paths.data_dir().display());
            println!("Settings file:    {}", paths.settings_file().display());
            println!();
            println!("Settings:");
            println!("  Default member:  {}", settings.default_member);
            println!("  Currency symbol: {}", settings.currency_symbol);
            match settings.default_overall_limit {
                Some(limit) => println!(
                    "  Overall limit:   {}",
                    limit.format_with_symbol(&settings.currency_symbol)
                ),
                None => println!("  Overall limit:   none"),
            }
        }
        Some(Commands::Expense(cmd)) => handle_expense_command(&storage, &settings, &actor, cmd)?,
        Some(Commands::Budget(cmd)) => handle_budget_command(&storage, &settings, &actor, cmd)?,
        Some(Commands::Report(cmd)) => handle_report_command(&storage, &settings, &actor, cmd)?,
        Some(Commands::Group(cmd)) => handle_group_command(&storage, &settings, &actor, cmd)?,
        Some(Commands::Rule(cmd)) => handle_rule_command(&storage, &actor, cmd)?,
        Some(Commands::Audit(args)) => handle_audit_command(&storage, &actor, args)?,
        None => {
            println!("tally - terminal expense tracker");
            println!();
            println!("Run 'tally --help' for usage information.");
        }
    }

    Ok(())
}
