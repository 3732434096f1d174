//! Error types for Docmate.

use thiserror::Error;

/// Library-level error type for Docmate operations.
#[derive(Error, Debug)]
pub enum DocmateError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Document store error: {0}")]
    Store(String),

    /// Raised for unknown, deleted, and foreign documents alike.
    #[error("Document not found or access denied.")]
    DocumentNotFound,

    #[error("Missing user_id in config")]
    MissingUser,

    #[error("Invalid user_id: {0}")]
    InvalidUser(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("TMDB API error: {0}")]
    Tmdb(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("LLM API error: {0}")]
    Llm(String),

    #[error("Agent error: {0}")]
    Agent(String),
}

impl DocmateError {
    /// Whether the error stems from caller input rather than a backend failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DocmateError::MissingUser
                | DocmateError::InvalidUser(_)
                | DocmateError::InvalidArguments(_)
                | DocmateError::UnknownTool(_)
        )
    }
}

/// Result type alias for Docmate operations.
pub type Result<T> = std::result::Result<T, DocmateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_is_generic() {
        assert_eq!(
            DocmateError::DocumentNotFound.to_string(),
            "Document not found or access denied."
        );
        assert_eq!(DocmateError::MissingUser.to_string(), "Missing user_id in config");
    }

    #[test]
    fn test_client_errors() {
        assert!(DocmateError::MissingUser.is_client_error());
        assert!(DocmateError::InvalidArguments("x".into()).is_client_error());
        assert!(!DocmateError::DocumentNotFound.is_client_error());
        assert!(!DocmateError::Store("boom".into()).is_client_error());
    }
}
