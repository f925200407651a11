use std::path::PathBuf;

use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand, ValueHint};

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}",
    arg_required_else_help = true
)]
pub struct Args {
    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress outputs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output as json
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// SQLite database to open (defaults to `database` from the config)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub db: Option<PathBuf>,

    /// Provide custom config file
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

/// `--where` and `--where-in` flags.
#[derive(ClapArgs, Debug, Default)]
pub struct ConditionArgs {
    /// Filter rows, e.g. `age>=18`, `name=bob` or `name like b%`
    #[arg(required = false, short = 'w', long = "where", value_name = "FILTER")]
    pub filters: Vec<String>,

    /// Restrict a column to a set of values, e.g. `id=1,2,3`
    #[arg(required = false, long = "where-in", value_name = "COLUMN=VALUES")]
    pub set_memberships: Vec<String>,
}

/// Condition flags plus ordering and limit.
#[derive(ClapArgs, Debug, Default)]
pub struct ConstraintArgs {
    #[command(flatten)]
    pub conditions: ConditionArgs,

    /// Order by a column, e.g. `name` or `age:desc`
    #[arg(required = false, short, long = "order", value_name = "COLUMN[:DIR]")]
    pub orderings: Vec<String>,

    /// Maximum number of rows
    #[arg(required = false, short, long)]
    pub limit: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List every row of a table
    #[clap(name = "all", visible_alias = "ls")]
    All {
        /// Table to read
        table: String,

        /// Columns to select (comma separated)
        #[arg(required = false, long, value_delimiter = ',')]
        columns: Vec<String>,
    },

    /// List rows matching the given constraints
    #[command(arg_required_else_help = true)]
    Get {
        /// Table to read
        table: String,

        #[command(flatten)]
        constraints: ConstraintArgs,

        /// Columns to select (comma separated)
        #[arg(required = false, long, value_delimiter = ',')]
        columns: Vec<String>,
    },

    /// Show the first row matching the given constraints
    #[command(arg_required_else_help = true)]
    First {
        /// Table to read
        table: String,

        #[command(flatten)]
        constraints: ConstraintArgs,

        /// Columns to select (comma separated)
        #[arg(required = false, long, value_delimiter = ',')]
        columns: Vec<String>,
    },

    /// Show the row with the given primary key
    #[command(arg_required_else_help = true)]
    Find {
        /// Table to read
        table: String,

        /// Primary key value
        id: String,

        /// Column to match instead of the primary key
        #[arg(required = false, long)]
        by: Option<String>,

        /// Columns to select (comma separated)
        #[arg(required = false, long, value_delimiter = ',')]
        columns: Vec<String>,
    },

    /// Count the rows of a table
    #[command(arg_required_else_help = true)]
    Count {
        /// Table to count
        table: String,
    },

    /// List the values of one column
    #[command(arg_required_else_help = true)]
    Pluck {
        /// Table to read
        table: String,

        /// Column to pluck
        column: String,

        /// Key each value by this column
        #[arg(required = false, short, long)]
        key: Option<String>,
    },

    /// Show one page of rows matching the given conditions
    #[command(arg_required_else_help = true)]
    Paginate {
        /// Table to read
        table: String,

        #[command(flatten)]
        conditions: ConditionArgs,

        /// Order by a column, e.g. `name` or `age:desc`
        #[arg(required = false, short, long = "order", value_name = "COLUMN[:DIR]")]
        orderings: Vec<String>,

        /// Rows per page (defaults to the configured value)
        #[arg(required = false, long)]
        per_page: Option<u64>,

        /// Page number
        #[arg(required = false, short, long)]
        page: Option<u64>,
    },

    /// Insert a row
    #[command(arg_required_else_help = true)]
    Create {
        /// Table to write
        table: String,

        /// Column values, e.g. `name=bob age=30`
        #[arg(required = true, value_name = "COLUMN=VALUE")]
        values: Vec<String>,
    },

    /// Update the row with the given primary key
    #[command(arg_required_else_help = true)]
    Update {
        /// Table to write
        table: String,

        /// Primary key value
        id: String,

        /// Column values, e.g. `name=bob age=30`
        #[arg(required = true, value_name = "COLUMN=VALUE")]
        values: Vec<String>,

        /// Keep `updated_at` unchanged
        #[arg(required = false, long)]
        no_touch: bool,
    },

    /// Delete rows matching the given conditions
    #[command(arg_required_else_help = true)]
    Delete {
        /// Table to write
        table: String,

        #[command(flatten)]
        conditions: ConditionArgs,
    },

    /// Delete rows by primary key
    #[command(arg_required_else_help = true)]
    #[clap(name = "destroy", visible_alias = "rm")]
    Destroy {
        /// Table to write
        table: String,

        /// Primary key values
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Manage the configuration file
    #[command(arg_required_else_help = true)]
    Config {
        #[clap(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Write the default configuration file
    Init,
    /// Print the resolved configuration
    Show,
}
