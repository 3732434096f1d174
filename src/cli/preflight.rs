//! Pre-flight checks before commands that need credentials.
//!
//! Validates that API keys and a user id are available before starting
//! operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{DocmateError, Result};
use crate::tools::RequestConfig;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Talking to an agent requires the LLM API key.
    Agent,
    /// Document access requires a user id.
    Documents,
    /// Movie lookups require a TMDB token.
    Movies,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Agent => check_api_key(settings),
        Operation::Documents => check_user(settings),
        Operation::Movies => check_tmdb_token(settings),
    }
}

/// Check that the LLM API key is configured.
fn check_api_key(settings: &Settings) -> Result<()> {
    let var = &settings.llm.api_key_env;
    match settings.llm.api_key() {
        Some(_) => Ok(()),
        None => Err(DocmateError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            var, var
        ))),
    }
}

/// Check that a numeric user id is configured.
fn check_user(settings: &Settings) -> Result<()> {
    RequestConfig::new(settings.general.user_id.clone())
        .owner_id()
        .map(|_| ())
}

/// Check that a TMDB token is configured.
fn check_tmdb_token(settings: &Settings) -> Result<()> {
    match settings.tmdb.token() {
        Some(_) => Ok(()),
        None => Err(DocmateError::Config(format!(
            "No TMDB token. Set tmdb.api_key or export {}='...'",
            settings.tmdb.api_key_env
        ))),
    }
}
