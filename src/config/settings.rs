//! Configuration settings for Docmate.

use crate::error::{DocmateError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub agent: AgentSettings,
    pub database: DatabaseSettings,
    pub tmdb: TmdbSettings,
    pub prompts: PromptSettings,
}


/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// User id used when a command does not pass `--user`.
    pub user_id: Option<String>,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.docmate".to_string(),
            log_level: "info".to_string(),
            user_id: None,
        }
    }
}

/// Chat-completion model settings.
///
/// Any OpenAI-compatible endpoint works; the defaults target Groq.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Model used by agents and the supervisor.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            model: "llama3-8b-8192".to_string(),
            temperature: 0.0,
            timeout_secs: 300,
        }
    }
}

impl LlmSettings {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty())
    }
}

/// Agent loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Maximum LLM round-trips per agent run.
    pub max_iterations: usize,
    /// Maximum messages kept per conversation thread.
    pub history_limit: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            history_limit: 30,
        }
    }
}

/// Document store backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StoreProvider {
    /// SQLite database file (default).
    #[default]
    Sqlite,
    /// Process-local store, lost on exit.
    Memory,
}

impl std::str::FromStr for StoreProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(StoreProvider::Sqlite),
            "memory" => Ok(StoreProvider::Memory),
            _ => Err(format!("Unknown store provider: {}", s)),
        }
    }
}

impl std::fmt::Display for StoreProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreProvider::Sqlite => write!(f, "sqlite"),
            StoreProvider::Memory => write!(f, "memory"),
        }
    }
}

/// Document database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Store backend (sqlite, memory).
    pub provider: StoreProvider,
    /// Path to the SQLite database (for sqlite provider).
    pub sqlite_path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            provider: StoreProvider::Sqlite,
            sqlite_path: "~/.docmate/documents.db".to_string(),
        }
    }
}

/// The Movie Database (TMDB) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TmdbSettings {
    /// API base URL.
    pub base_url: String,
    /// Read access token. Falls back to `api_key_env` when unset.
    pub api_key: Option<String>,
    /// Environment variable holding the read access token.
    pub api_key_env: String,
    /// Response language.
    pub language: String,
    /// Include adult titles in search results.
    pub include_adult: bool,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for TmdbSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.themoviedb.org/3".to_string(),
            api_key: None,
            api_key_env: "TMDB_API_KEY".to_string(),
            language: "en-US".to_string(),
            include_adult: false,
            timeout_secs: 30,
        }
    }
}

impl TmdbSettings {
    /// Resolve the token from config, then from the environment.
    pub fn token(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty()))
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}


impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| DocmateError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("docmate")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.database.sqlite_path)
    }
}
