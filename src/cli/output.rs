//! CLI output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::api::Task;
use crate::tasks::{TaskFilter, TaskStats};

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn warn(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

/// Spinner shown while a request is in flight
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Colored completion label
pub fn format_completed(completed: bool) -> String {
    if completed {
        "✓ completed".green().to_string()
    } else {
        "○ pending".yellow().to_string()
    }
}

/// Print a table of tasks
pub fn print_task_table(tasks: &[&Task], filter: TaskFilter) {
    if tasks.is_empty() {
        info(filter.empty_message());
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(Color::Cyan),
            Cell::new("Title").fg(Color::Cyan),
            Cell::new("Description").fg(Color::Cyan),
            Cell::new("Status").fg(Color::Cyan),
            Cell::new("Updated").fg(Color::Cyan),
        ]);

    for task in tasks {
        let (status, color) = if task.completed {
            ("completed", Color::Green)
        } else {
            ("pending", Color::Yellow)
        };

        table.add_row(vec![
            Cell::new(task.id),
            Cell::new(&task.title),
            Cell::new(task.description.as_deref().unwrap_or("-")),
            Cell::new(status).fg(color),
            Cell::new(task.updated_at.format("%Y-%m-%d %H:%M").to_string()),
        ]);
    }

    println!("{table}");
}

/// Print the counters line under a task table
pub fn print_task_stats(stats: &TaskStats) {
    println!(
        "  {} {}   {} {}   {} {} ({}%)",
        "Total:".bold(),
        stats.total,
        "Active:".bold(),
        stats.active.to_string().yellow(),
        "Completed:".bold(),
        stats.completed.to_string().green(),
        stats.completion_percent()
    );
}

/// Print detailed task information
pub fn print_task_detail(task: &Task) {
    println!("{}", "Task Details".bold().underline());
    println!();
    println!("  {} {}", "ID:".bold(), task.id);
    println!("  {} {}", "Title:".bold(), task.title);
    if let Some(description) = &task.description {
        println!("  {} {}", "Description:".bold(), description);
    }
    println!("  {} {}", "Status:".bold(), format_completed(task.completed));
    println!(
        "  {} {}",
        "Created:".bold(),
        task.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!(
        "  {} {}",
        "Updated:".bold(),
        task.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
}
