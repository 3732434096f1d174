//! Docmate CLI entry point.

use anyhow::Result;
use clap::Parser;
use docmate::cli::{commands, Cli, Commands};
use docmate::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // stdout carries MCP traffic, so logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("docmate={}", log_level)),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Load configuration
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&Settings::expand_path(path)))?,
        None => Settings::load()?,
    };

    if let Some(user) = &cli.user {
        settings.general.user_id = Some(user.clone());
    }

    // Ensure data directory exists
    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match &cli.command {
        Commands::Init => {
            commands::run_init(&settings)?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings).await?;
        }

        Commands::Chat { thread, model } => {
            commands::run_chat(thread.clone(), model.clone(), settings).await?;
        }

        Commands::Ask {
            message,
            agent,
            model,
        } => {
            commands::run_ask(message, *agent, model.clone(), settings).await?;
        }

        Commands::Docs { action } => {
            commands::run_docs(action, settings).await?;
        }

        Commands::Movies { action } => {
            commands::run_movies(action, settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host, *port, settings).await?;
        }

        Commands::Mcp => {
            commands::run_mcp(settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings, cli.config.as_deref())?;
        }
    }

    Ok(())
}
