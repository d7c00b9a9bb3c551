//! CLI command implementations

use anyhow::{bail, Result};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Confirm, Password};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::api::{ApiClient, ApiResponse, LoginRequest, NewTask, RegisterRequest, TaskUpdate};
use crate::auth::{decode_claims, mask_token, FileTokenStore, SessionManager, TokenStore};
use crate::cli::{
    error, info, print_task_detail, print_task_stats, print_task_table, spinner, success, warn,
    DemoEdits, OutputFormat,
};
use crate::config::{self, loader::CONFIG_FILENAME};
use crate::tasks::{DemoBoard, TaskFilter, TaskStats};

/// API client and session manager sharing the on-disk token
struct Context {
    api: ApiClient,
    session: SessionManager,
}

fn load_context() -> Result<Context> {
    let config = config::load_config_or_default()?;
    let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(&config.storage.data_dir));
    let api = ApiClient::from_config(&config.api, Arc::clone(&store));
    let session = SessionManager::from_config(&config.session, store, api.clone());
    Ok(Context { api, session })
}

/// Refuse to run protected commands without a usable session
fn require_session(session: &SessionManager) -> Result<()> {
    if !session.is_authenticated() {
        bail!("Not authenticated. Run 'taskflow login' first.");
    }
    if !session.refresh_token_if_needed() {
        warn("Your session expires soon. Run 'taskflow login' to renew it.");
    }
    Ok(())
}

/// Unwrap a successful envelope or turn its message into an error
fn expect_data<T>(response: ApiResponse<T>, action: &str) -> Result<T> {
    let status = response.status;
    match response.into_result() {
        Ok(Some(data)) => Ok(data),
        Ok(None) => bail!("{}: empty response", action),
        Err(message) => {
            error(&format!("{}: {} (HTTP {})", action, message, status));
            bail!(message)
        }
    }
}

fn prompt_password(confirm: bool) -> Result<String> {
    let theme = ColorfulTheme::default();
    let mut prompt = Password::with_theme(&theme).with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
    }
    Ok(prompt.interact()?)
}

/// Initialize a new taskflow.toml configuration file
pub async fn init() -> Result<()> {
    let config_path = Path::new(CONFIG_FILENAME);

    if config_path.exists() {
        warn(&format!("{} already exists", CONFIG_FILENAME));
        return Ok(());
    }

    fs::write(config_path, config::loader::default_config_content())?;

    success(&format!("Created {}", CONFIG_FILENAME));
    info("Run 'taskflow register' or 'taskflow login' to get started");

    Ok(())
}

/// Create an account and log in
pub async fn register(email: &str, username: &str, password: Option<String>) -> Result<()> {
    let ctx = load_context()?;
    let password = match password {
        Some(password) => password,
        None => prompt_password(true)?,
    };

    let pb = spinner("Creating account...");
    let response = ctx
        .api
        .register(&RegisterRequest {
            email: email.to_string(),
            username: username.to_string(),
            password,
        })
        .await;
    pb.finish_and_clear();

    let auth = expect_data(response, "Registration failed")?;
    success(&format!("Welcome, {}! You are now logged in.", auth.user.username));
    Ok(())
}

/// Log in and store the token
pub async fn login(email: &str, password: Option<String>) -> Result<()> {
    let ctx = load_context()?;
    let password = match password {
        Some(password) => password,
        None => prompt_password(false)?,
    };

    let pb = spinner("Logging in...");
    let response = ctx
        .api
        .login(&LoginRequest {
            email: email.to_string(),
            password,
        })
        .await;
    pb.finish_and_clear();

    let auth = expect_data(response, "Login failed")?;
    success(&format!("Logged in as {}", auth.user.username));
    Ok(())
}

/// Log out and forget the stored token
pub async fn logout() -> Result<()> {
    let ctx = load_context()?;

    let pb = spinner("Logging out...");
    ctx.session.logout().await;
    pb.finish_and_clear();

    success("Logged out");
    Ok(())
}

/// Show the current session
pub async fn status(verify: bool) -> Result<()> {
    let ctx = load_context()?;
    let session = ctx.session.current_session();

    println!("{}", "Session".bold().underline());
    println!();
    println!("  {} {}", "Backend:".bold(), ctx.api.base_url());

    let Some(token) = session.token else {
        println!("  {} {}", "Status:".bold(), "logged out".red());
        return Ok(());
    };

    println!("  {} {}", "Status:".bold(), "logged in".green());
    println!(
        "  {} {}",
        "User ID:".bold(),
        ctx.session.current_user_id().as_deref().unwrap_or("unknown")
    );
    println!("  {} {}", "Token:".bold(), mask_token(&token));

    let expires = decode_claims(&token)
        .ok()
        .and_then(|claims| claims.exp)
        .and_then(|exp| chrono::DateTime::from_timestamp(exp, 0));
    match expires {
        Some(at) => println!("  {} {}", "Expires:".bold(), at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("  {} never", "Expires:".bold()),
    }
    if ctx.session.is_token_expiring_soon() {
        warn("Token expires soon");
    }

    if verify {
        let pb = spinner("Verifying token...");
        let response = ctx.api.verify_token().await;
        pb.finish_and_clear();

        let identity = expect_data(response, "Verification failed")?;
        success(&format!(
            "Backend accepted token for {}",
            identity
                .email
                .or(identity.username)
                .or(identity.user_id)
                .unwrap_or_else(|| "unknown user".to_string())
        ));
    }

    Ok(())
}

fn apply_demo_edits(board: &mut DemoBoard, edits: &DemoEdits) {
    for title in &edits.add {
        if title.trim().is_empty() {
            warn("Skipping task with an empty title");
            continue;
        }
        let task = board.add(NewTask::new(title.trim()));
        success(&format!("Added task #{}: {}", task.id, task.title));
    }
    for id in &edits.toggle {
        match board.toggle(*id) {
            Some(task) => success(&format!(
                "Task #{} is now {}",
                task.id,
                if task.completed { "completed" } else { "pending" }
            )),
            None => warn(&format!("No demo task #{}", id)),
        }
    }
    for (id, title) in &edits.rename {
        let update = TaskUpdate {
            title: Some(title.clone()),
            ..Default::default()
        };
        match board.update(*id, update) {
            Some(task) => success(&format!("Renamed task #{} to {}", task.id, task.title)),
            None => warn(&format!("No demo task #{}", id)),
        }
    }
    for id in &edits.delete {
        if board.delete(*id) {
            success(&format!("Deleted task #{}", id));
        } else {
            warn(&format!("No demo task #{}", id));
        }
    }
}

/// List tasks as a table, JSON or YAML
pub async fn list_tasks(filter: TaskFilter, format: OutputFormat) -> Result<()> {
    let ctx = load_context()?;
    require_session(&ctx.session)?;

    let pb = spinner("Fetching tasks...");
    let response = ctx.api.get_tasks().await;
    pb.finish_and_clear();

    let tasks = expect_data(response, "Failed to fetch tasks")?;
    let visible = filter.apply(&tasks);

    match format {
        OutputFormat::Table => {
            print_task_table(&visible, filter);
            print_task_stats(&TaskStats::from_tasks(&tasks));
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&visible)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(&visible)?);
        }
    }

    Ok(())
}

/// Show a single task
pub async fn show_task(id: i64) -> Result<()> {
    let ctx = load_context()?;
    require_session(&ctx.session)?;

    let task = expect_data(ctx.api.get_task(id).await, "Failed to fetch task")?;
    print_task_detail(&task);
    Ok(())
}

/// Create a task
pub async fn add_task(title: &str, description: Option<String>) -> Result<()> {
    let ctx = load_context()?;
    require_session(&ctx.session)?;

    let new_task = NewTask {
        title: title.to_string(),
        description,
        completed: false,
    };

    let pb = spinner("Creating task...");
    let response = ctx.api.create_task(&new_task).await;
    pb.finish_and_clear();

    let task = expect_data(response, "Failed to create task")?;
    success(&format!("Created task #{}: {}", task.id, task.title));
    Ok(())
}

/// Change a task's title or description
pub async fn edit_task(id: i64, title: Option<String>, description: Option<String>) -> Result<()> {
    let update = TaskUpdate {
        title,
        description,
        completed: None,
    };
    if update.is_empty() {
        bail!("Nothing to update. Pass --title and/or --description.");
    }

    let ctx = load_context()?;
    require_session(&ctx.session)?;

    let task = expect_data(ctx.api.update_task(id, &update).await, "Failed to update task")?;
    success(&format!("Updated task #{}: {}", task.id, task.title));
    Ok(())
}

/// Toggle a task between pending and completed
pub async fn toggle_task(id: i64) -> Result<()> {
    let ctx = load_context()?;
    require_session(&ctx.session)?;

    let current = expect_data(ctx.api.get_task(id).await, "Failed to fetch task")?;
    let task = expect_data(
        ctx.api.toggle_task_completion(&current).await,
        "Failed to update task",
    )?;

    if task.completed {
        success(&format!("Completed task #{}: {}", task.id, task.title));
    } else {
        info(&format!("Reopened task #{}: {}", task.id, task.title));
    }
    Ok(())
}

/// Delete a task, asking first unless `force` is set
pub async fn delete_task(id: i64, force: bool) -> Result<()> {
    let ctx = load_context()?;
    delete_with(&ctx, id, force).await
}

/// The session is checked before the confirmation prompt is shown
async fn delete_with(ctx: &Context, id: i64, force: bool) -> Result<()> {
    require_session(&ctx.session)?;

    if !force {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Are you sure you want to delete task #{}?", id))
            .default(false)
            .interact()?;
        if !confirmed {
            info("Cancelled");
            return Ok(());
        }
    }

    let message = expect_data(ctx.api.delete_task(id).await, "Failed to delete task")?;
    success(&message.message);
    Ok(())
}

/// Show the public demo dashboard, after applying any local edits
pub async fn demo(filter: TaskFilter, edits: &DemoEdits) -> Result<()> {
    let mut board = DemoBoard::new();

    println!("{}", "TaskFlow demo dashboard".bold());
    info("Sample data only. Run 'taskflow register' to manage your own tasks.");
    if !edits.is_empty() {
        apply_demo_edits(&mut board, edits);
    }
    println!();

    print_task_table(&board.filtered(filter), filter);
    print_task_stats(&board.stats());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;

    fn offline_context() -> Context {
        let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());
        let api = ApiClient::new("http://127.0.0.1:9", Arc::clone(&store));
        let session = SessionManager::new(store, api.clone());
        Context { api, session }
    }

    #[tokio::test]
    async fn test_delete_without_session_fails_before_prompting() {
        let ctx = offline_context();

        let err = delete_with(&ctx, 1, false).await.expect_err("not logged in");
        assert!(err.to_string().contains("Not authenticated"), "got: {}", err);
    }

    #[test]
    fn test_demo_edits_mutate_board() {
        let mut board = DemoBoard::new();
        let edits = DemoEdits {
            add: vec!["Try the CLI".to_string(), "   ".to_string()],
            toggle: vec![1, 99],
            rename: vec![(3, "Explore more".to_string())],
            delete: vec![2],
        };

        apply_demo_edits(&mut board, &edits);

        let titles: Vec<&str> = board.tasks().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["Try the CLI", "Welcome to TaskFlow", "Explore more"]);
        assert!(board.tasks()[1].completed);
        assert_eq!(board.stats().completed, 1);
    }
}
