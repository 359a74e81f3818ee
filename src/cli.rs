use crate::model::TaskId;
use crate::view::Filter;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "todos", version, about = "Local task list with due dates and an archive")]
pub struct Cli {
    /// Directory holding the task files (overrides config.yml)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    Add {
        /// Task text (at most 100 characters)
        text: String,
        /// Due date in YYYY-MM-DD format
        #[arg(long)]
        date: Option<String>,
        /// Due time in HH:MM format (defaults to 23:59)
        #[arg(long)]
        time: Option<String>,
    },
    /// List active tasks
    List {
        #[arg(long, value_enum, default_value_t = Filter::All)]
        filter: Filter,
    },
    /// Mark a task done, or not done
    Toggle { id: TaskId },
    /// Replace the text of a task
    Edit { id: TaskId, text: String },
    /// Delete an active task
    Delete { id: TaskId },
    /// Move every completed task to the archive
    ClearCompleted,
    /// List archived tasks
    Archived,
    /// Move an archived task back to the active list
    Restore { id: TaskId },
    /// Permanently delete an archived task
    Purge { id: TaskId },
    /// Launch the interactive TUI
    Tui,
}
