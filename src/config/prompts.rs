//! Prompt templates for Docmate.
//!
//! Prompts can be customized by placing an `agents.toml` file in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub agents: AgentPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}


/// System prompts for the agents and the supervisor that routes between them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPrompts {
    pub documents: String,
    pub movies: String,
    pub supervisor: String,
}

impl Default for AgentPrompts {
    fn default() -> Self {
        Self {
            documents: r#"You are a helpful assistant in managing a user's documents within this app.

Use the document tools to answer:
- 'list_documents' shows the user's most recent documents (up to 25)
- 'search_documents' finds documents by keyword in title or content
- 'get_document' opens a single document by its ID
- 'create_document' saves a new document, only when the user explicitly asks for one
- 'update_document' renames or revises an existing document
- 'delete_document' removes a document

Refer to documents by title and ID. Never invent document IDs; look them up first."#
                .to_string(),

            movies: r#"You are a helpful movie discovery assistant.

Use 'search_movies' to find movies on The Movie Database (TMDB) matching what the user is
looking for, and 'movie_detail' to fetch full information about a movie by its TMDB ID.
Keep answers short and mention release years so titles are easy to tell apart."#
                .to_string(),

            supervisor: "You manage a document management assistant and a \
                movie discovery assistant. Assign work to them."
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let agents_path = custom_path.join("agents.toml");
            if agents_path.exists() {
                let content = std::fs::read_to_string(&agents_path)?;
                prompts.agents = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// Document agent prompt with custom variables applied.
    pub fn documents(&self) -> String {
        Self::render(&self.agents.documents, &self.variables)
    }

    /// Movie agent prompt with custom variables applied.
    pub fn movies(&self) -> String {
        Self::render(&self.agents.movies, &self.variables)
    }

    /// Supervisor prompt with custom variables applied.
    pub fn supervisor(&self) -> String {
        Self::render(&self.agents.supervisor, &self.variables)
    }
}
