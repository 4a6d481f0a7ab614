use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::board::{QuickFilter, SortKey, TaskFilter};
use crate::error::BoardError;
use crate::models::{Priority, TaskStatus};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(
    name = "lectio-board",
    version = VERSION,
    about = "Kanban task board for the Lectio Divina content team",
    after_help = "\
NOTE:
  Requires a git repository. Data lives in <git-root>/.lectio/board/
  Run `lectio-board init` before any other command.

COLUMNS:
  proposed -> in_progress -> testing -> done
  New tasks always start in `proposed`. `task move` is the drag-and-drop
  equivalent: dropping on the task's own column changes nothing.

EXIT CODES:
  0  Success
  1  Error (validation, not found, storage failure)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Act as this user (overrides config and LECTIO_BOARD_USER)
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the board in this repository
    Init,

    /// Show the board, one section per column
    Board {
        #[command(flatten)]
        filters: FilterArgs,

        /// Only show this column
        #[arg(long)]
        column: Option<String>,
    },

    /// Show per-column counts
    Status,

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Board preferences
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args, Debug, Default, Clone)]
pub struct FilterArgs {
    /// Case-insensitive match on title or description
    #[arg(long)]
    pub search: Option<String>,

    /// all | low | medium | high
    #[arg(long)]
    pub priority: Option<String>,

    /// all | <user>
    #[arg(long)]
    pub assignee: Option<String>,

    /// all | proposed | in_progress | testing | done
    #[arg(long)]
    pub status: Option<String>,

    /// all | overdue | this-week | my
    #[arg(long)]
    pub quick: Option<String>,

    /// priority | due | created
    #[arg(long)]
    pub sort: Option<String>,
}

fn not_all(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| *v != "all")
}

impl FilterArgs {
    pub fn to_filter(&self, current_user: Option<String>) -> Result<TaskFilter, BoardError> {
        Ok(TaskFilter {
            search: self.search.clone().unwrap_or_default(),
            priority: not_all(&self.priority).map(Priority::parse).transpose()?,
            assignee: not_all(&self.assignee).map(str::to_string),
            status: not_all(&self.status).map(TaskStatus::parse).transpose()?,
            quick: self
                .quick
                .as_deref()
                .map(QuickFilter::parse)
                .transpose()?
                .unwrap_or_default(),
            current_user,
            sort: self.sort.as_deref().map(SortKey::parse).transpose()?,
        })
    }
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add a task (starts in `proposed`)
    Add {
        /// Task title
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// low | medium | high
        #[arg(long, default_value = "medium")]
        priority: String,
        #[arg(long)]
        assignee: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        /// Image to upload and attach (max 5MB)
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// List tasks matching the filters
    List {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Show task details
    Show {
        /// Task ID or prefix
        id: String,
    },
    /// Edit task fields
    Edit {
        /// Task ID or prefix
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,
        #[arg(long)]
        clear_description: bool,
        /// proposed | in_progress | testing | done
        #[arg(long)]
        status: Option<String>,
        /// low | medium | high
        #[arg(long)]
        priority: Option<String>,
        #[arg(long, conflicts_with = "clear_assignee")]
        assignee: Option<String>,
        #[arg(long)]
        clear_assignee: bool,
        /// Due date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        #[arg(long)]
        clear_due: bool,
        /// Image to upload and attach (max 5MB)
        #[arg(long, conflicts_with = "clear_image")]
        image: Option<PathBuf>,
        #[arg(long)]
        clear_image: bool,
    },
    /// Move a task to another column (drag and drop)
    Move {
        /// Task ID or prefix
        id: String,
        /// Target column
        status: String,
    },
    /// Delete a task
    Delete {
        /// Task ID or prefix
        id: String,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Write all tasks to stdout as JSON
    Export,
    /// Create tasks from a JSON array on stdin
    #[command(after_help = "\
STDIN FORMAT:
  [{\"title\":\"...\", \"description\":\"...\", \"priority\":\"high\",
    \"assignee\":\"...\", \"due_date\":\"YYYY-MM-DD\", \"status\":\"proposed\"}]
  or {\"tasks\": [...]}. Output of `task export` is accepted.

NOTE:
  Atomic: all-or-nothing. Empty titles and unknown statuses reject the import.")]
    Import,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the stored preferences
    Show,
    /// Remember who is using the board (for `--quick my`)
    SetUser {
        user: String,
    },
    /// Forget the stored user
    ClearUser,
}
