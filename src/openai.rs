//! OpenAI-compatible client configuration with sensible defaults.

use crate::config::LlmSettings;
use crate::error::{DocmateError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create a chat client for the configured endpoint.
///
/// The API key is read from the environment variable named in the settings.
pub fn create_client(settings: &LlmSettings) -> Result<Client<OpenAIConfig>> {
    let api_key = settings.api_key().ok_or_else(|| {
        DocmateError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            settings.api_key_env, settings.api_key_env
        ))
    })?;

    create_client_with(
        &settings.base_url,
        &api_key,
        Duration::from_secs(settings.timeout_secs),
    )
}

/// Create a chat client with an explicit endpoint, key and timeout.
pub fn create_client_with(
    base_url: &str,
    api_key: &str,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    let config = OpenAIConfig::new()
        .with_api_base(base_url.trim_end_matches('/'))
        .with_api_key(api_key);

    Ok(Client::with_config(config).with_http_client(http_client))
}
