use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskflow::cli::{self, Cli, Commands, TaskAction};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskflow=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => cli::commands::init().await,
        Commands::Register {
            email,
            username,
            password,
        } => cli::commands::register(&email, &username, password).await,
        Commands::Login { email, password } => cli::commands::login(&email, password).await,
        Commands::Logout => cli::commands::logout().await,
        Commands::Status { verify } => cli::commands::status(verify).await,
        Commands::Tasks { action } => match action {
            TaskAction::List { filter, format } => cli::commands::list_tasks(filter, format).await,
            TaskAction::Show { id } => cli::commands::show_task(id).await,
            TaskAction::Add { title, description } => {
                cli::commands::add_task(&title, description).await
            }
            TaskAction::Edit {
                id,
                title,
                description,
            } => cli::commands::edit_task(id, title, description).await,
            TaskAction::Toggle { id } => cli::commands::toggle_task(id).await,
            TaskAction::Delete { id, force } => cli::commands::delete_task(id, force).await,
        },
        Commands::Demo { filter, edits } => cli::commands::demo(filter, &edits).await,
    }
}
