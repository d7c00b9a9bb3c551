//! Public demo dashboard: an in-memory task list that needs no login

use chrono::Utc;

use super::{TaskFilter, TaskStats};
use crate::api::{NewTask, Task, TaskUpdate};

/// Tasks the demo board starts with: (title, description, completed)
const SAMPLE_TASKS: [(&str, &str, bool); 3] = [
    (
        "Welcome to TaskFlow",
        "This is a sample task to demonstrate the dashboard",
        false,
    ),
    ("Get Started", "Sign up to create your own tasks", true),
    (
        "Explore Features",
        "Try out our advanced task management features",
        false,
    ),
];

#[derive(Debug, Clone)]
pub struct DemoBoard {
    tasks: Vec<Task>,
    next_id: i64,
}

impl DemoBoard {
    /// Board seeded with the sample tasks
    pub fn new() -> Self {
        let now = Utc::now();
        let tasks: Vec<Task> = SAMPLE_TASKS
            .iter()
            .zip(1..)
            .map(|(&(title, description, completed), id)| Task {
                id,
                user_id: String::new(),
                title: title.to_string(),
                description: Some(description.to_string()),
                completed,
                created_at: now,
                updated_at: now,
            })
            .collect();
        let next_id = tasks.len() as i64 + 1;
        Self { tasks, next_id }
    }

    /// All tasks, newest first
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Tasks visible under `filter`
    pub fn filtered(&self, filter: TaskFilter) -> Vec<&Task> {
        filter.apply(&self.tasks)
    }

    /// Counters for the whole board
    pub fn stats(&self) -> TaskStats {
        TaskStats::from_tasks(&self.tasks)
    }

    /// Add a task at the top of the board
    pub fn add(&mut self, new_task: NewTask) -> &Task {
        let now = Utc::now();
        let task = Task {
            id: self.next_id,
            user_id: String::new(),
            title: new_task.title,
            description: new_task.description,
            completed: new_task.completed,
            created_at: now,
            updated_at: now,
        };
        self.next_id += 1;
        self.tasks.insert(0, task);
        &self.tasks[0]
    }

    /// Flip a task's completion flag
    pub fn toggle(&mut self, id: i64) -> Option<&Task> {
        let task = self.tasks.iter_mut().find(|task| task.id == id)?;
        task.completed = !task.completed;
        task.updated_at = Utc::now();
        Some(task)
    }

    /// Apply the fields set in `update`
    pub fn update(&mut self, id: i64, update: TaskUpdate) -> Option<&Task> {
        let task = self.tasks.iter_mut().find(|task| task.id == id)?;
        if let Some(title) = update.title {
            task.title = title;
        }
        if let Some(description) = update.description {
            task.description = Some(description);
        }
        if let Some(completed) = update.completed {
            task.completed = completed;
        }
        task.updated_at = Utc::now();
        Some(task)
    }

    /// Returns whether a task was removed
    pub fn delete(&mut self, id: i64) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        self.tasks.len() != before
    }
}

impl Default for DemoBoard {
    fn default() -> Self {
        Self::new()
    }
}
