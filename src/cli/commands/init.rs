//! Init command - interactive first-run setup.

use crate::cli::Output;
use crate::config::{Settings, StoreProvider};
use crate::store::SqliteDocumentStore;
use console::style;
use std::io::{self, Write};

/// Run the init command for first-time setup.
pub fn run_init(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Docmate Setup");
    println!();
    println!("Welcome to Docmate! Let's make sure everything is configured correctly.\n");

    // Step 1: API keys
    println!("{}", style("Step 1: Checking API configuration").bold().cyan());
    println!();

    let llm_var = &settings.llm.api_key_env;
    if settings.llm.api_key().is_none() {
        Output::warning(&format!("{} environment variable is not set.", llm_var));
        println!();
        println!("  Docmate needs an API key for the chat model at {}.", settings.llm.base_url);
        println!("  Set it in your shell configuration (~/.bashrc, ~/.zshrc, etc.):");
        println!("  {}", style(format!("export {}='...'", llm_var)).green());
        println!();

        if !prompt_continue("Continue without API key?")? {
            println!();
            Output::info("Setup cancelled. Set your API key and run 'docmate init' again.");
            return Ok(());
        }
    } else {
        Output::success(&format!("{} is configured!", llm_var));
    }

    if settings.tmdb.token().is_none() {
        Output::warning(&format!(
            "No TMDB token found; movie tools stay disabled until {} is set.",
            settings.tmdb.api_key_env
        ));
        println!(
            "  Get a read access token from: {}",
            style("https://www.themoviedb.org/settings/api").underlined()
        );
    } else {
        Output::success("TMDB token is configured!");
    }

    println!();

    // Step 2: Data directory and database
    println!("{}", style("Step 2: Setting up storage").bold().cyan());
    println!();

    let data_dir = settings.data_dir();
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        Output::success(&format!("Created data directory: {}", data_dir.display()));
    } else {
        Output::info(&format!("Data directory exists: {}", data_dir.display()));
    }

    match settings.database.provider {
        StoreProvider::Sqlite => {
            let db_path = settings.sqlite_path();
            let existed = db_path.exists();
            SqliteDocumentStore::new(&db_path)?;
            if existed {
                Output::info(&format!("Database exists: {}", db_path.display()));
            } else {
                Output::success(&format!("Created database: {}", db_path.display()));
            }
        }
        StoreProvider::Memory => {
            Output::info("Using the in-memory store; documents are lost on exit.");
        }
    }

    println!();

    // Step 3: Config file
    println!("{}", style("Step 3: Configuration file").bold().cyan());
    println!();

    let config_path = Settings::default_config_path();
    if config_path.exists() {
        Output::info(&format!("Config file exists: {}", config_path.display()));
    } else if prompt_continue("Create default configuration file?")? {
        settings.save_to(&config_path)?;
        Output::success(&format!("Created config file: {}", config_path.display()));
        println!();
        println!("  Edit your config with: {}", style("docmate config edit").green());
    } else {
        Output::info("Skipped config file creation. Using defaults.");
    }

    if settings.general.user_id.is_none() {
        println!();
        Output::warning("No user id configured. Set general.user_id or pass --user <id>.");
    }

    println!();

    // Summary
    println!("{}", style("Setup Complete!").bold().green());
    println!();
    println!("Next steps:");
    println!("  {} Check system status", style("docmate doctor").cyan());
    println!("  {} Save your first document", style("docmate docs create \"<title>\"").cyan());
    println!("  {} Chat with the assistant", style("docmate chat").cyan());
    println!();
    println!("For more help: {}", style("docmate --help").cyan());

    Ok(())
}

/// Prompt user for yes/no confirmation.
fn prompt_continue(message: &str) -> io::Result<bool> {
    print!("{} {} ", style("?").cyan(), message);
    print!("{} ", style("[y/N]").dim());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(is_yes(&input))
}

fn is_yes(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}
