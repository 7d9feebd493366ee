pub mod categorise;
pub mod init;
pub mod load;
pub mod report;
pub mod rules;
pub mod status;
pub mod view;

use clap::{Args, Parser, Subcommand};
use rusqlite::Connection;

use crate::db::{get_connection, init_db};
use crate::error::{PennywiseError, Result};
use crate::reports::{CategoryLevel, Direction, EssentialFilter, ViewFilter};
use crate::settings::get_db_path;

/// Open the configured database, refusing to create one implicitly.
pub(crate) fn open_db() -> Result<Connection> {
    let path = get_db_path();
    if !path.exists() {
        return Err(PennywiseError::NoDatabase(path));
    }
    let conn = get_connection(&path)?;
    init_db(&conn)?;
    Ok(conn)
}

#[derive(Parser)]
#[command(
    name = "pennywise",
    version,
    about = "Load bank statement CSVs and sort spending into categories."
)]
pub struct Cli {
    /// Print every rule match decision (same as RUST_LOG=debug).
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and create the database.
    Init {
        /// Path for pennywise data (default: ~/Documents/pennywise)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Default rules CSV for `pennywise rules load`
        #[arg(long = "rules-file")]
        rules_file: Option<String>,
    },
    /// Load a bank statement CSV and categorise its transactions.
    Load {
        /// Statement CSV (Date, Transaction type, Description, Paid out, Paid in, Balance)
        file: String,
        /// Keep previously loaded statements and skip rows already present
        #[arg(long)]
        append: bool,
    },
    /// Manage categorisation rules.
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
    /// Re-apply all rules to every transaction.
    #[command(alias = "categorize")]
    Categorise,
    /// List distinct transactions no rule matched.
    Uncategorised,
    /// Print category reports.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Interactively browse spending by category.
    View {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Show the current database and summary statistics.
    Status,
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// Load rules from a CSV file and re-categorise.
    Load {
        /// Rules CSV (default: rules_file from settings)
        file: Option<String>,
        /// Delete existing rules before loading
        #[arg(long)]
        truncate: bool,
    },
    /// Append a rule; it is tried after all existing rules.
    Add {
        /// Regex searched for in the transaction description
        description_pattern: String,
        /// Regex searched for in the transaction type (default: any)
        #[arg(long = "type-pattern", default_value = "")]
        type_pattern: String,
        /// Category, with sub-categories separated by ';' (e.g. "Food; Groceries")
        #[arg(long)]
        category: String,
        /// Mark matching transactions as essential spending
        #[arg(long)]
        essential: bool,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// List rules in the order they are tried.
    List,
    /// Delete a rule by ID.
    Delete {
        /// Rule ID (shown in `pennywise rules list`)
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Totals per category with their share of the whole.
    Summary {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Transactions in one category.
    Category {
        /// Category label as shown by `report summary`
        name: String,
        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(Args, Clone, Debug, Default)]
pub struct FilterArgs {
    /// Show money paid in instead of money paid out
    #[arg(long = "paid-in")]
    pub paid_in: bool,
    /// Essential filter: all, essential (yes) or non-essential (no)
    #[arg(long, value_enum, default_value_t = EssentialFilter::All)]
    pub essential: EssentialFilter,
    /// Group by main category only, ignoring sub-categories
    #[arg(long = "top-level")]
    pub top_level: bool,
}

impl FilterArgs {
    pub fn to_filter(&self) -> ViewFilter {
        ViewFilter {
            direction: if self.paid_in { Direction::PaidIn } else { Direction::PaidOut },
            essential: self.essential,
            level: if self.top_level { CategoryLevel::TopLevel } else { CategoryLevel::Full },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_filter_args_parse() {
        let cli = Cli::try_parse_from([
            "pennywise", "report", "summary", "--paid-in", "--essential", "no", "--top-level",
        ])
        .unwrap();
        let Commands::Report { command: ReportCommands::Summary { filter } } = cli.command else {
            panic!("expected report summary");
        };
        let f = filter.to_filter();
        assert_eq!(f.direction, Direction::PaidIn);
        assert_eq!(f.essential, EssentialFilter::NonEssential);
        assert_eq!(f.level, CategoryLevel::TopLevel);
    }

    #[test]
    fn test_filter_defaults() {
        assert_eq!(FilterArgs::default().to_filter(), ViewFilter::default());
    }

    #[test]
    fn test_categorize_alias() {
        let cli = Cli::try_parse_from(["pennywise", "categorize"]).unwrap();
        assert!(matches!(cli.command, Commands::Categorise));
    }
}
