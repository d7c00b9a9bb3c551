//! Task list views shared by the protected list and the demo board

mod demo;

pub use demo::DemoBoard;

use clap::ValueEnum;
use serde::Serialize;

use crate::api::Task;

/// Which tasks a list view shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl TaskFilter {
    /// Whether `task` is visible under this filter
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Active => !task.completed,
            TaskFilter::Completed => task.completed,
        }
    }

    /// Tasks visible under this filter, in order
    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        tasks.iter().filter(|task| self.matches(task)).collect()
    }

    /// Shown when the filtered list is empty
    pub fn empty_message(&self) -> &'static str {
        match self {
            TaskFilter::All => "No tasks yet",
            TaskFilter::Active => "No active tasks",
            TaskFilter::Completed => "No completed tasks yet",
        }
    }
}

/// Counters shown above a task list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TaskStats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
}

impl TaskStats {
    /// Count tasks by completion state
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|task| task.completed).count();
        Self {
            total: tasks.len(),
            active: tasks.len() - completed,
            completed,
        }
    }

    /// Share of completed tasks, 0 for an empty list
    pub fn completion_percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed * 100) / self.total) as u8
    }
}
