pub mod demo;
pub mod init;
pub mod report;

use clap::{Args, Parser, Subcommand, ValueEnum};

use ledgerview::summarize::{BucketBy, GroupBy};

#[derive(Parser)]
#[command(name = "ledgerview", version, about = "Monthly income and expense reports for a categorized ledger.")]
pub struct Cli {
    /// Data directory holding ledgerview.db (overrides settings)
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Save settings and create an empty database.
    Init,
    /// Load a year of sample data into the database.
    Demo {
        /// Last day of the sample year: YYYY-MM-DD (default: today)
        #[arg(long)]
        end: Option<String>,
    },
    /// Generate reports.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
}

#[derive(Copy, Clone, Default, PartialEq, Eq, Debug, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

#[derive(Args, Clone)]
pub struct RangeArgs {
    /// Start date: YYYY-MM-DD
    #[arg(long = "from")]
    pub from_date: String,
    /// End date (inclusive): YYYY-MM-DD
    #[arg(long = "to")]
    pub to_date: String,
    /// Group rows by category or subcategory (default from settings)
    #[arg(long = "group-by", value_enum)]
    pub group_by: Option<GroupBy>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Income or expenses per group and month.
    Transactions {
        #[command(flatten)]
        range: RangeArgs,
        /// Report expenses instead of income
        #[arg(long)]
        expense: bool,
        /// One bucket per month, or one bucket for the whole range
        #[arg(long = "bucket-by", value_enum, default_value_t = BucketBy::Month)]
        bucket_by: BucketBy,
        /// Merge the smallest groups of each month into "Other" (default from settings)
        #[arg(long, conflicts_with = "no_merge")]
        merge: bool,
        /// Keep every group, even when settings enable merging
        #[arg(long = "no-merge")]
        no_merge: bool,
    },
    /// Income against expenses, with savings per month.
    Balance {
        #[command(flatten)]
        range: RangeArgs,
    },
}
