use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::model::task::Priority;
use crate::ops::views::CompletionFilter;

#[derive(Parser)]
#[command(name = "td", about = concat!("tabdo v", env!("CARGO_PKG_VERSION"), " - tasks in category tabs"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different data directory
    #[arg(short = 'C', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// More log output (repeatable)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Less log output: -q errors only, -qq nothing
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the data directory and a commented config.toml
    Init(InitArgs),
    /// Add a task
    Add(AddArgs),
    /// List tasks in a category (default: the active tab)
    List(ListArgs),
    /// List archived tasks with their restore numbers
    Archived,
    /// Show open tasks whose provisional due date is near
    Alerts(AlertsArgs),
    /// Change fields of a task
    Edit(EditArgs),
    /// Flip a task between open and done
    Toggle(TaskIdArg),
    /// Mark a task done
    Done(TaskIdArg),
    /// Move a task to the archive
    Delete(TaskIdArg),
    /// Bring an archived task back
    Restore(RestoreArgs),
    /// Archive overdue tasks now
    Sweep,
    /// Show or switch the active tab
    Tab(TabArgs),
    /// Category management
    Category(CategoryCmd),
    /// Write all data to a workbook file
    Export(ExportArgs),
    /// Replace all data with a workbook file
    Import(ImportArgs),
    /// Show or change settings
    Config(ConfigCmd),
}

// ---------------------------------------------------------------------------
// Init args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing config.toml
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Task args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Task title
    pub title: String,
    /// Category (default: unsorted)
    #[arg(short, long)]
    pub category: Option<String>,
    /// Provisional due date (YYYY-MM-DDTHH:MM or YYYY-MM-DD)
    #[arg(short, long, value_name = "DATE")]
    pub provisional: Option<String>,
    /// Final due date (YYYY-MM-DDTHH:MM or YYYY-MM-DD)
    #[arg(short, long, value_name = "DATE")]
    pub due: Option<String>,
    /// Priority: high, low or unspecified
    #[arg(short = 'P', long, default_value_t = Priority::Unspecified)]
    pub priority: Priority,
}

#[derive(Args)]
pub struct ListArgs {
    /// Category to list (default: the active tab)
    pub category: Option<String>,
    /// Which tasks to show: open or done
    #[arg(long, default_value_t = CompletionFilter::Open)]
    pub filter: CompletionFilter,
}

#[derive(Args)]
pub struct AlertsArgs {
    /// Look-ahead in days (default: alerts.window_days)
    #[arg(long)]
    pub days: Option<i64>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID
    pub id: String,
    /// New title
    #[arg(long)]
    pub title: Option<String>,
    /// New category
    #[arg(short, long)]
    pub category: Option<String>,
    /// New provisional due date ("" clears it)
    #[arg(short, long, value_name = "DATE")]
    pub provisional: Option<String>,
    /// New final due date ("" clears it)
    #[arg(short, long, value_name = "DATE")]
    pub due: Option<String>,
    /// New priority
    #[arg(short = 'P', long)]
    pub priority: Option<Priority>,
}

#[derive(Args)]
pub struct TaskIdArg {
    /// Task ID
    pub id: String,
}

#[derive(Args)]
pub struct RestoreArgs {
    /// Archive number as shown by `td archived` (1-based)
    pub index: usize,
}

#[derive(Args)]
pub struct TabArgs {
    /// Category name or "archived" (omit to show the current tab)
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Category management
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct CategoryCmd {
    #[command(subcommand)]
    pub action: Option<CategoryAction>,
}

#[derive(Subcommand)]
pub enum CategoryAction {
    /// List categories with open/done counts (default)
    List,
    /// Create a category
    Add(CategoryNameArg),
    /// Rename a category and every task in it
    Rename(CategoryRenameArgs),
    /// Delete a category, moving its tasks to unsorted
    Delete(CategoryDeleteArgs),
}

#[derive(Args)]
pub struct CategoryNameArg {
    /// Category name
    pub name: String,
}

#[derive(Args)]
pub struct CategoryRenameArgs {
    /// Current name
    pub old: String,
    /// New name
    pub new: String,
}

#[derive(Args)]
pub struct CategoryDeleteArgs {
    /// Category name
    pub name: String,
    /// Delete even if tasks still use it
    #[arg(long, short)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Export / import
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ExportArgs {
    /// Output file (default: export.filename in the current directory)
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Workbook file to read
    pub path: PathBuf,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration (default)
    Show,
    /// Set a value, e.g. `td config set alerts.window_days 3`
    Set(ConfigSetArgs),
}

#[derive(Args)]
pub struct ConfigSetArgs {
    /// Dotted key: storage.key, export.filename, alerts.window_days, sweep.grace_days
    pub key: String,
    /// New value
    pub value: String,
}
