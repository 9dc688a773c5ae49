//! CLI argument definitions for Windlass.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Windlass - task lifecycle orchestration for an external issue tracker.
///
/// Start tasks, keep work logs, route completed work through review, and
/// maintain a prioritized development program.
#[derive(Parser, Debug)]
#[command(name = "wl")]
#[command(author, version, about = "Task lifecycle orchestration for an external issue tracker", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Directory holding work logs, the development program, and the
    /// project brief. Can also be set via WINDLASS_DATA_DIR.
    #[arg(short = 'D', long = "data-dir", global = true, env = "WINDLASS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Task management commands
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Add a comment to a task
    Comment {
        /// Task ID (e.g., WL-123)
        id: String,
        /// Comment body
        body: String,
    },

    /// Move one or more tasks to a target status
    ///
    /// Each task is validated independently; a task already in the target
    /// status counts as a success without touching the tracker.
    Move {
        /// Target status name (matched case-insensitively)
        #[arg(short, long)]
        status: String,

        /// Task IDs to move
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Start development on a task (move to In Progress, create work log)
    Start {
        /// Task ID
        id: String,
    },

    /// Complete the development phase (requires a work log)
    ///
    /// Routes the task to Review or Testing based on its summary.
    Complete {
        /// Task ID
        id: String,
    },

    /// Resolve a review: approve, return to development, or discard
    Review {
        /// Task ID
        id: String,

        /// Approve the work and move the task to Done
        #[arg(long, conflicts_with_all = ["return_reason", "discard_reason"])]
        approve: bool,

        /// When approving a sub-task, append a completion entry to the
        /// project brief
        #[arg(long, requires = "approve")]
        update_brief: bool,

        /// Return the task to development with this feedback
        #[arg(long = "return", value_name = "REASON")]
        return_reason: Option<String>,

        /// Discard the task with this reason (moves to Won't Do)
        #[arg(long = "discard", value_name = "REASON", conflicts_with = "return_reason")]
        discard_reason: Option<String>,
    },

    /// Mark a task Done directly, without the work-log precondition
    Done {
        /// Task ID
        id: String,
    },

    /// Scan the project for tasks needing attention
    ///
    /// Read-only: reports ready-to-start tasks and active tasks with
    /// missing or stale work logs. Never mutates anything.
    Scan,

    /// Show dependency state for a task
    Deps {
        /// Task ID
        id: String,
    },

    /// Create sub-tasks under a parent from a JSON spec file
    ///
    /// Specs may reference each other's symbolic keys in `blocks` before
    /// the referenced task exists.
    Subtasks {
        /// Parent task ID
        parent: String,

        /// Path to the JSON array of sub-task specs
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Work log commands
    Log {
        #[command(subcommand)]
        command: LogCommands,
    },

    /// Development program commands
    Program {
        #[command(subcommand)]
        command: ProgramCommands,
    },
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a new task
    Create {
        /// Task summary
        summary: String,

        /// Task description
        #[arg(short, long)]
        description: Option<String>,

        /// Issue type
        #[arg(short = 't', long, default_value = "Task")]
        issue_type: String,

        /// Parent task ID (makes this a sub-task)
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// List tasks in the configured project
    List {
        /// Filter by status name
        #[arg(long)]
        status: Option<String>,
    },

    /// Show task details, including links and available transitions
    Show {
        /// Task ID
        id: String,
    },
}

/// Work log subcommands
#[derive(Subcommand, Debug)]
pub enum LogCommands {
    /// Print a task's work log
    Show {
        /// Task ID
        id: String,
    },

    /// Append a fresh timestamped entry skeleton to a work log
    Entry {
        /// Task ID
        id: String,
    },
}

/// Development program subcommands
#[derive(Subcommand, Debug)]
pub enum ProgramCommands {
    /// Build the program from an ordered task list (first = priority 1)
    Create {
        /// Task IDs in priority order
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Show the program with live tracker status and work-log state
    Status,
}
