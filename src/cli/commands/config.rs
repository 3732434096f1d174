//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::Path;

/// Run the config command against `path`, or the default config file.
pub fn run_config(action: &ConfigAction, settings: Settings, path: Option<&str>) -> Result<()> {
    let config_path = path
        .map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path);

    match action {
        ConfigAction::Show => {
            println!("{}", render(&settings)?);
        }

        ConfigAction::Edit => {
            if !config_path.exists() {
                settings.save_to(&config_path)?;
                Output::info(&format!("Created default config at {}", config_path.display()));
            }

            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());
            Output::info(&format!("Opening config in {}...", editor));

            edit(&editor, &config_path);
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Settings as TOML. Secrets from the config file are masked.
fn render(settings: &Settings) -> Result<String> {
    let mut shown = settings.clone();
    if shown.tmdb.api_key.is_some() {
        shown.tmdb.api_key = Some("********".to_string());
    }
    toml::to_string_pretty(&shown).map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))
}

fn edit(editor: &str, config_path: &Path) {
    match std::process::Command::new(editor).arg(config_path).status() {
        Ok(s) if s.success() => Output::success("Config saved."),
        Ok(_) => Output::warning("Editor exited with non-zero status."),
        Err(e) => {
            Output::error(&format!("Failed to open editor: {}", e));
            Output::info(&format!("Config file is at: {}", config_path.display()));
        }
    }
}
