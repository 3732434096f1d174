//! Doctor command - verify credentials, storage and configuration.

use crate::cli::Output;
use crate::config::{Settings, StoreProvider};
use crate::store::{DocumentStore, SqliteDocumentStore};
use crate::tools::RequestConfig;
use console::style;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Docmate Doctor");
    println!();
    println!("Checking credentials, storage and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("API Configuration").bold());
    let api_checks = vec![check_llm_api_key(settings), check_tmdb_token(settings)];
    for check in &api_checks {
        check.print();
    }
    checks.extend(api_checks);

    println!();

    println!("{}", style("Storage").bold());
    let storage_checks = check_storage(settings).await;
    for check in &storage_checks {
        check.print();
    }
    checks.extend(storage_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_checks = vec![check_config_file(), check_user(settings)];
    for check in &config_checks {
        check.print();
    }
    checks.extend(config_checks);

    println!();

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Docmate.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Docmate is ready to use.");
    }

    Ok(())
}

/// Check that the chat model API key is present.
fn check_llm_api_key(settings: &Settings) -> CheckResult {
    let var = &settings.llm.api_key_env;
    match settings.llm.api_key() {
        Some(key) => CheckResult::ok(var, &format!("configured ({})", mask(&key))),
        None => CheckResult::error(var, "not set", &format!("Set with: export {}='...'", var)),
    }
}

/// Check that a TMDB token is present. Movies are optional.
fn check_tmdb_token(settings: &Settings) -> CheckResult {
    match settings.tmdb.token() {
        Some(token) => CheckResult::ok("TMDB token", &format!("configured ({})", mask(&token))),
        None => CheckResult::warning(
            "TMDB token",
            "not set, movie tools disabled",
            &format!(
                "Set tmdb.api_key or export {}='...'",
                settings.tmdb.api_key_env
            ),
        ),
    }
}

/// Check the data directory and that the database opens.
async fn check_storage(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let data_dir = settings.data_dir();
    if data_dir.exists() {
        results.push(CheckResult::ok("Data directory", &data_dir.display().to_string()));
    } else {
        results.push(CheckResult::warning(
            "Data directory",
            &format!("{} (will be created)", data_dir.display()),
            "Directory will be created on first use",
        ));
    }

    if settings.database.provider == StoreProvider::Memory {
        results.push(CheckResult::warning(
            "Database",
            "in-memory store",
            "Documents are lost on exit; set database.provider = \"sqlite\" to keep them",
        ));
        return results;
    }

    let db_path = settings.sqlite_path();
    if !db_path.exists() {
        results.push(CheckResult::warning(
            "Database",
            &format!("{} (not created yet)", db_path.display()),
            "Create it with: docmate init",
        ));
        return results;
    }

    let size = std::fs::metadata(&db_path)
        .map(|m| format_size(m.len()))
        .unwrap_or_else(|_| "unknown size".to_string());

    let owner = RequestConfig::new(settings.general.user_id.clone()).owner_id().ok();
    let opened = match SqliteDocumentStore::new(&db_path) {
        Ok(store) => match owner {
            Some(owner_id) => store
                .count(owner_id)
                .await
                .map(|n| format!("{} ({}, {} document(s) for user {})", db_path.display(), size, n, owner_id)),
            None => Ok(format!("{} ({})", db_path.display(), size)),
        },
        Err(e) => Err(e),
    };

    match opened {
        Ok(message) => results.push(CheckResult::ok("Database", &message)),
        Err(e) => results.push(CheckResult::error(
            "Database",
            &format!("cannot open: {}", e),
            "Check file permissions or remove the corrupted file",
        )),
    }

    results
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &config_path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: docmate init (or docmate config edit)",
        )
    }
}

/// Check that document commands have a usable user id.
fn check_user(settings: &Settings) -> CheckResult {
    match RequestConfig::new(settings.general.user_id.clone()).owner_id() {
        Ok(id) => CheckResult::ok("User id", &id.to_string()),
        Err(e) => CheckResult::warning(
            "User id",
            &e.to_string(),
            "Set general.user_id in the config or pass --user <id>",
        ),
    }
}

/// Show only the edges of a secret.
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 12 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("short"), "****");
        assert_eq!(mask("gsk_abcdefghijklmnop"), "gsk_...mnop");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1.0 GB");
    }

    #[test]
    fn test_missing_user_is_a_warning() {
        let settings = Settings::default();
        assert_eq!(check_user(&settings).status, CheckStatus::Warning);
    }

    #[tokio::test]
    async fn test_storage_reports_existing_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.general.data_dir = dir.path().display().to_string();
        settings.database.sqlite_path = dir.path().join("docs.db").display().to_string();
        settings.general.user_id = Some("1".to_string());

        let missing = check_storage(&settings).await;
        assert_eq!(missing[1].status, CheckStatus::Warning);

        SqliteDocumentStore::new(&settings.sqlite_path()).unwrap();
        let found = check_storage(&settings).await;
        assert_eq!(found[0].status, CheckStatus::Ok);
        assert_eq!(found[1].status, CheckStatus::Ok);
        assert!(found[1].message.contains("0 document(s) for user 1"));
    }
}
