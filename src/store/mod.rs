//! Document store abstraction for Docmate.
//!
//! Provides a trait-based interface over the document table. Every operation
//! is scoped to an owner: documents belonging to someone else, or already
//! deleted, behave exactly as if they did not exist.

mod memory;
mod sqlite;

pub use memory::MemoryDocumentStore;
pub use sqlite::SqliteDocumentStore;

use crate::config::{Settings, StoreProvider};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

/// Hard cap on rows returned by `list` and `search`.
pub const MAX_LIMIT: usize = 25;

/// Title given to documents created without one.
pub const DEFAULT_TITLE: &str = "Title";

/// A user's document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub content: Option<String>,
    /// Cleared on delete; inactive documents are invisible to every query.
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewDocument {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl NewDocument {
    pub fn new(title: impl Into<String>, content: Option<String>) -> Self {
        Self {
            title: Some(title.into()),
            content,
        }
    }

    /// The title to store, falling back to [`DEFAULT_TITLE`].
    pub fn resolved_title(&self) -> String {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE)
            .to_string()
    }
}

/// A partial update. `None` leaves the field untouched; blank strings
/// deserialize as `None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentPatch {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub content: Option<String>,
}

impl DocumentPatch {
    /// Build a patch, treating blank values as not supplied.
    pub fn new(title: Option<String>, content: Option<String>) -> Self {
        Self {
            title: non_blank(title),
            content: non_blank(content),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }

    /// Apply the patch in memory. Returns whether anything was supplied.
    pub fn apply(&self, doc: &mut Document) -> bool {
        if let Some(title) = &self.title {
            doc.title = title.clone();
        }
        if let Some(content) = &self.content {
            doc.content = Some(content.clone());
        }
        !self.is_empty()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn blank_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(non_blank(Option::<String>::deserialize(deserializer)?))
}

/// Clamp a requested row count to `1..=MAX_LIMIT`.
pub fn clamp_limit(limit: usize) -> usize {
    limit.clamp(1, MAX_LIMIT)
}

/// Trait for document store implementations.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Most recent active documents of an owner, newest first.
    async fn list(&self, owner_id: i64, limit: usize) -> Result<Vec<Document>>;

    /// Fetch one active document of an owner.
    async fn get(&self, owner_id: i64, id: i64) -> Result<Document>;

    /// Insert a document and return it with its assigned id.
    async fn create(&self, owner_id: i64, doc: NewDocument) -> Result<Document>;

    /// Apply a partial update. An empty patch writes nothing.
    async fn update(&self, owner_id: i64, id: i64, patch: DocumentPatch) -> Result<Document>;

    /// Soft-delete a document and return its final state.
    async fn delete(&self, owner_id: i64, id: i64) -> Result<Document>;

    /// Case-insensitive substring search over title and content.
    async fn search(&self, owner_id: i64, query: &str, limit: usize) -> Result<Vec<Document>>;

    /// Number of active documents of an owner.
    async fn count(&self, owner_id: i64) -> Result<usize>;
}

/// Open the store configured in `settings`.
pub fn open_store(settings: &Settings) -> Result<Arc<dyn DocumentStore>> {
    match settings.database.provider {
        StoreProvider::Sqlite => Ok(Arc::new(SqliteDocumentStore::new(&settings.sqlite_path())?)),
        StoreProvider::Memory => Ok(Arc::new(MemoryDocumentStore::new())),
    }
}

/// Whether `doc` matches a search query (case-insensitive, title or content).
pub(crate) fn matches_query(doc: &Document, query: &str) -> bool {
    let needle = query.to_lowercase();
    doc.title.to_lowercase().contains(&needle)
        || doc
            .content
            .as_deref()
            .is_some_and(|c| c.to_lowercase().contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let now = Utc::now();
        Document {
            id: 1,
            owner_id: 3,
            title: "Quarterly Report".to_string(),
            content: Some("Revenue grew in Q3".to_string()),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(5), 5);
        assert_eq!(clamp_limit(100), MAX_LIMIT);
        assert_eq!(clamp_limit(0), 1);
    }

    #[test]
    fn test_resolved_title() {
        assert_eq!(NewDocument::new("  Notes ", None).resolved_title(), "Notes");
        assert_eq!(NewDocument::default().resolved_title(), DEFAULT_TITLE);
        assert_eq!(NewDocument::new("   ", None).resolved_title(), DEFAULT_TITLE);
    }

    #[test]
    fn test_patch_apply() {
        let mut doc = sample();
        assert!(!DocumentPatch::default().apply(&mut doc));
        assert_eq!(doc.title, "Quarterly Report");

        let patch = DocumentPatch {
            title: None,
            content: Some("Revenue fell".to_string()),
        };
        assert!(patch.apply(&mut doc));
        assert_eq!(doc.title, "Quarterly Report");
        assert_eq!(doc.content.as_deref(), Some("Revenue fell"));
    }

    #[test]
    fn test_patch_treats_blank_as_missing() {
        let patch: DocumentPatch =
            serde_json::from_str(r#"{"title": "   ", "content": ""}"#).unwrap();
        assert!(patch.is_empty());

        let patch: DocumentPatch = serde_json::from_str(r#"{"title": null}"#).unwrap();
        assert!(patch.is_empty());

        let patch = DocumentPatch::new(Some(" ".to_string()), Some("body".to_string()));
        assert_eq!(patch.title, None);
        assert_eq!(patch.content.as_deref(), Some("body"));
    }

    #[test]
    fn test_matches_query() {
        let doc = sample();
        assert!(matches_query(&doc, "quarterly"));
        assert!(matches_query(&doc, "REVENUE"));
        assert!(!matches_query(&doc, "budget"));

        let mut untitled = sample();
        untitled.content = None;
        assert!(!matches_query(&untitled, "revenue"));
    }
}
