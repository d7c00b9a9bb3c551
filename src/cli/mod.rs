//! CLI interface for Taskflow

pub mod commands;
mod output;

pub use output::*;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::tasks::TaskFilter;

#[derive(Parser)]
#[command(name = "taskflow")]
#[command(author = "Krakaw")]
#[command(version)]
#[command(about = "Manage your tasks from the terminal", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new taskflow.toml configuration file
    Init,

    /// Create an account and log in
    Register {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        username: String,

        /// Prompted for when omitted
        #[arg(short, long, env = "TASKFLOW_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Log in with an existing account
    Login {
        #[arg(short, long)]
        email: String,

        /// Prompted for when omitted
        #[arg(short, long, env = "TASKFLOW_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Log out and forget the stored token
    Logout,

    /// Show the current session
    Status {
        /// Also ask the backend to verify the token
        #[arg(long)]
        verify: bool,
    },

    /// Manage your tasks (requires login)
    Tasks {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Show the public demo dashboard
    Demo {
        #[arg(short, long, default_value = "all")]
        filter: TaskFilter,

        #[command(flatten)]
        edits: DemoEdits,
    },
}

/// Local changes applied to the demo board before it is printed
#[derive(Args, Debug, Clone, Default)]
pub struct DemoEdits {
    /// Add a task with this title (repeatable)
    #[arg(long = "add", value_name = "TITLE")]
    pub add: Vec<String>,

    /// Toggle the task with this id (repeatable)
    #[arg(long = "toggle", value_name = "ID")]
    pub toggle: Vec<i64>,

    /// Rename a task, given as ID=TITLE (repeatable)
    #[arg(long = "rename", value_name = "ID=TITLE", value_parser = parse_rename)]
    pub rename: Vec<(i64, String)>,

    /// Delete the task with this id (repeatable)
    #[arg(long = "delete", value_name = "ID")]
    pub delete: Vec<i64>,
}

impl DemoEdits {
    /// Whether no edits were requested
    pub fn is_empty(&self) -> bool {
        self.add.is_empty()
            && self.toggle.is_empty()
            && self.rename.is_empty()
            && self.delete.is_empty()
    }
}

fn parse_rename(value: &str) -> Result<(i64, String), String> {
    let (id, title) = value
        .split_once('=')
        .ok_or_else(|| format!("expected ID=TITLE, got '{}'", value))?;
    let id = id
        .trim()
        .parse()
        .map_err(|_| format!("invalid task id '{}'", id))?;
    let title = title.trim();
    if title.is_empty() {
        return Err("title must not be empty".to_string());
    }
    Ok((id, title.to_string()))
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// List tasks
    List {
        #[arg(short, long, default_value = "all")]
        filter: TaskFilter,

        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show a single task
    Show { id: i64 },

    /// Create a task
    Add {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Edit a task's title or description
    Edit {
        id: i64,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Toggle a task between active and completed
    Toggle { id: i64 },

    /// Delete a task
    Delete {
        id: i64,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}
