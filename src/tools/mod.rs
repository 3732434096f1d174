//! Tools exposed to the LLM agents.
//!
//! A tool is a named function with a JSON Schema for its parameters. The
//! model emits a tool name and a raw argument string; a [`Toolset`] validates
//! the arguments, runs one scoped operation and answers with a JSON string
//! the model can read back.

mod args;
mod documents;
mod movies;

pub use args::{resolve_limit, ToolArgs, DEFAULT_LIMIT};
pub use documents::{parse_document_tool_call, DocumentToolCall, DocumentTools};
pub use movies::{parse_movie_tool_call, MovieToolCall, MovieTools};

use crate::error::{DocmateError, Result};
use crate::store::DocumentStore;
use crate::tmdb::MovieCatalog;
use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Per-request configuration handed to every tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Id of the user on whose behalf tools act.
    pub user_id: Option<String>,
    /// Conversation thread, used to look up checkpointed history.
    pub thread_id: String,
}

impl RequestConfig {
    /// A config for `user_id` on a fresh thread.
    pub fn new(user_id: Option<String>) -> Self {
        Self {
            user_id,
            thread_id: Uuid::new_v4().to_string(),
        }
    }

    /// Continue an existing thread.
    pub fn with_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = thread_id.into();
        self
    }

    /// Key of this user's thread in a checkpointer.
    pub fn checkpoint_key(&self) -> String {
        format!("{}:{}", self.user_id.as_deref().unwrap_or(""), self.thread_id)
    }

    /// The numeric owner id every document query is scoped to.
    pub fn owner_id(&self) -> Result<i64> {
        let raw = self
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(DocmateError::MissingUser)?;

        raw.parse::<i64>()
            .map_err(|_| DocmateError::InvalidUser(raw.to_string()))
    }
}

/// Declaration of a single tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// JSON Schema of the parameters object.
    pub parameters: Value,
}

impl ToolSpec {
    /// Convert to the chat-completions function tool format.
    pub fn to_openai(&self) -> ChatCompletionTool {
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: self.name.to_string(),
                description: Some(self.description.to_string()),
                parameters: Some(self.parameters.clone()),
                strict: None,
            },
        }
    }
}

/// A group of tools sharing one backend.
#[async_trait]
pub trait Toolset: Send + Sync {
    /// Declarations of every tool in the set.
    fn specs(&self) -> Vec<ToolSpec>;

    /// Execute `name` with the model's raw argument string.
    async fn call(&self, name: &str, arguments: &str) -> Result<String>;

    /// Whether this set provides `name`.
    fn provides(&self, name: &str) -> bool {
        self.specs().iter().any(|s| s.name == name)
    }
}

/// Several toolsets behind one dispatch point.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    sets: Vec<Arc<dyn Toolset>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a toolset. Later sets never shadow tools of earlier ones.
    pub fn with(mut self, set: Arc<dyn Toolset>) -> Self {
        self.sets.push(set);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Document tools, plus movie tools when a catalog is available.
    pub fn for_request(
        store: Arc<dyn DocumentStore>,
        catalog: Option<Arc<dyn MovieCatalog>>,
        config: RequestConfig,
    ) -> Self {
        let registry = Self::new().with(Arc::new(DocumentTools::new(store, config.clone())));
        match catalog {
            Some(catalog) => registry.with(Arc::new(MovieTools::new(catalog, config))),
            None => registry,
        }
    }
}

#[async_trait]
impl Toolset for ToolRegistry {
    fn specs(&self) -> Vec<ToolSpec> {
        self.sets.iter().flat_map(|s| s.specs()).collect()
    }

    async fn call(&self, name: &str, arguments: &str) -> Result<String> {
        match self.sets.iter().find(|s| s.provides(name)) {
            Some(set) => set.call(name, arguments).await,
            None => Err(DocmateError::UnknownTool(name.to_string())),
        }
    }
}

/// Serialize a tool result for the model.
pub(crate) fn to_output<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDocumentStore;

    #[test]
    fn test_owner_id_parsing() {
        assert_eq!(RequestConfig::new(Some("3".into())).owner_id().unwrap(), 3);
        assert_eq!(RequestConfig::new(Some(" 42 ".into())).owner_id().unwrap(), 42);
        assert!(matches!(
            RequestConfig::new(None).owner_id(),
            Err(DocmateError::MissingUser)
        ));
        assert!(matches!(
            RequestConfig::new(Some("".into())).owner_id(),
            Err(DocmateError::MissingUser)
        ));
        assert!(matches!(
            RequestConfig::new(Some("alice".into())).owner_id(),
            Err(DocmateError::InvalidUser(_))
        ));
    }

    #[test]
    fn test_fresh_threads_differ() {
        let a = RequestConfig::new(None);
        let b = RequestConfig::new(None);
        assert_ne!(a.thread_id, b.thread_id);
        assert_eq!(a.clone().with_thread("t-1").thread_id, "t-1");
    }

    #[test]
    fn test_checkpoint_key_separates_users() {
        let alice = RequestConfig::new(Some("1".to_string())).with_thread("t");
        let bob = RequestConfig::new(Some("2".to_string())).with_thread("t");
        assert_eq!(alice.checkpoint_key(), "1:t");
        assert_ne!(alice.checkpoint_key(), bob.checkpoint_key());
    }

    #[test]
    fn test_spec_to_openai() {
        let tools = DocumentTools::new(
            Arc::new(MemoryDocumentStore::new()),
            RequestConfig::new(Some("1".into())),
        );
        let spec = &tools.specs()[0];
        let tool = spec.to_openai();
        assert_eq!(tool.function.name, spec.name);
        assert_eq!(tool.function.parameters.as_ref(), Some(&spec.parameters));
    }

    #[tokio::test]
    async fn test_registry_dispatch() {
        let docs = Arc::new(DocumentTools::new(
            Arc::new(MemoryDocumentStore::new()),
            RequestConfig::new(Some("1".into())),
        ));
        let registry = ToolRegistry::new().with(docs);

        assert!(registry.provides("list_documents"));
        assert!(!registry.provides("search_movies"));

        let out = registry.call("list_documents", "{}").await.unwrap();
        assert_eq!(out, "[]");

        assert!(matches!(
            registry.call("launch_rockets", "{}").await,
            Err(DocmateError::UnknownTool(_))
        ));
    }

    #[test]
    fn test_for_request_without_catalog() {
        let registry = ToolRegistry::for_request(
            Arc::new(MemoryDocumentStore::new()),
            None,
            RequestConfig::new(Some("1".into())),
        );
        let names: Vec<_> = registry.specs().iter().map(|s| s.name).collect();
        assert_eq!(names.len(), 6);
        assert!(!names.contains(&"movie_detail"));
    }
}
