//! SQLite-backed document store.

use super::{clamp_limit, Document, DocumentPatch, DocumentStore, NewDocument};
use crate::error::{DocmateError, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL,
        title TEXT NOT NULL DEFAULT 'Title',
        content TEXT,
        active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_documents_owner
        ON documents(owner_id, active, created_at);
"#;

const COLUMNS: &str = "id, owner_id, title, content, active, created_at, updated_at";

/// SQLite-based document store.
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

impl SqliteDocumentStore {
    /// Open (or create) the database at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let store = Self::initialize(conn)?;

        info!("Initialized SQLite document store at {:?}", path);
        Ok(store)
    }

    /// Create an in-memory SQLite store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;

        // SQLite's lower() only folds ASCII, so matching is done in Rust.
        conn.create_scalar_function(
            "docmate_contains",
            2,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let haystack: Option<String> = ctx.get(0)?;
                let needle: String = ctx.get(1)?;
                let needle = needle.to_lowercase();
                Ok(haystack.is_some_and(|h| h.to_lowercase().contains(&needle)))
            },
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DocmateError::Store(format!("Failed to acquire lock: {}", e)))
    }

    fn fetch_active(conn: &Connection, owner_id: i64, id: i64) -> Result<Document> {
        conn.query_row(
            &format!(
                "SELECT {} FROM documents WHERE id = ?1 AND owner_id = ?2 AND active = 1",
                COLUMNS
            ),
            params![id, owner_id],
            row_to_document,
        )
        .optional()?
        .ok_or(DocmateError::DocumentNotFound)
    }
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_document(row: &Row<'_>) -> rusqlite::Result<Document> {
    Ok(Document {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        active: row.get(4)?,
        created_at: parse_timestamp(row, 5)?,
        updated_at: parse_timestamp(row, 6)?,
    })
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    #[instrument(skip(self))]
    async fn list(&self, owner_id: i64, limit: usize) -> Result<Vec<Document>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {}
            FROM documents
            WHERE owner_id = ?1 AND active = 1
            ORDER BY created_at DESC, id DESC
            LIMIT ?2
            "#,
            COLUMNS
        ))?;

        let docs = stmt
            .query_map(params![owner_id, clamp_limit(limit) as i64], row_to_document)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        debug!("Listed {} documents for owner {}", docs.len(), owner_id);
        Ok(docs)
    }

    #[instrument(skip(self))]
    async fn get(&self, owner_id: i64, id: i64) -> Result<Document> {
        let conn = self.lock()?;
        Self::fetch_active(&conn, owner_id, id)
    }

    #[instrument(skip(self, doc))]
    async fn create(&self, owner_id: i64, doc: NewDocument) -> Result<Document> {
        let conn = self.lock()?;
        let now = format_timestamp(&Utc::now());

        conn.execute(
            r#"
            INSERT INTO documents (owner_id, title, content, active, created_at, updated_at)
            VALUES (?1, ?2, ?3, 1, ?4, ?4)
            "#,
            params![owner_id, doc.resolved_title(), doc.content, now],
        )?;

        let id = conn.last_insert_rowid();
        info!("Created document {} for owner {}", id, owner_id);
        Self::fetch_active(&conn, owner_id, id)
    }

    #[instrument(skip(self, patch))]
    async fn update(&self, owner_id: i64, id: i64, patch: DocumentPatch) -> Result<Document> {
        let conn = self.lock()?;
        let mut doc = Self::fetch_active(&conn, owner_id, id)?;

        if !patch.apply(&mut doc) {
            debug!("Empty patch for document {}, nothing written", id);
            return Ok(doc);
        }

        doc.updated_at = Utc::now();
        conn.execute(
            r#"
            UPDATE documents
            SET title = ?1, content = ?2, updated_at = ?3
            WHERE id = ?4 AND owner_id = ?5 AND active = 1
            "#,
            params![
                doc.title,
                doc.content,
                format_timestamp(&doc.updated_at),
                id,
                owner_id
            ],
        )?;

        info!("Updated document {}", id);
        Self::fetch_active(&conn, owner_id, id)
    }

    #[instrument(skip(self))]
    async fn delete(&self, owner_id: i64, id: i64) -> Result<Document> {
        let conn = self.lock()?;
        let mut doc = Self::fetch_active(&conn, owner_id, id)?;

        doc.active = false;
        doc.updated_at = Utc::now();
        conn.execute(
            "UPDATE documents SET active = 0, updated_at = ?1 WHERE id = ?2 AND owner_id = ?3",
            params![format_timestamp(&doc.updated_at), id, owner_id],
        )?;

        info!("Deleted document {}", id);
        Ok(doc)
    }

    #[instrument(skip(self))]
    async fn search(&self, owner_id: i64, query: &str, limit: usize) -> Result<Vec<Document>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {}
            FROM documents
            WHERE owner_id = ?1 AND active = 1
              AND (docmate_contains(title, ?2) OR docmate_contains(content, ?2))
            ORDER BY created_at DESC, id DESC
            LIMIT ?3
            "#,
            COLUMNS
        ))?;

        let docs = stmt
            .query_map(
                params![owner_id, query, clamp_limit(limit) as i64],
                row_to_document,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        debug!("Search {:?} matched {} documents", query, docs.len());
        Ok(docs)
    }

    async fn count(&self, owner_id: i64) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE owner_id = ?1 AND active = 1",
            params![owner_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MAX_LIMIT;

    #[tokio::test]
    async fn test_owner_scoping() {
        let store = SqliteDocumentStore::in_memory().unwrap();
        let doc = store
            .create(3, NewDocument::new("Plan", Some("Ship it".to_string())))
            .await
            .unwrap();

        assert_eq!(store.get(3, doc.id).await.unwrap().title, "Plan");

        for result in [
            store.get(4, doc.id).await.map(|_| ()),
            store
                .update(4, doc.id, DocumentPatch {
                    title: Some("Hijacked".to_string()),
                    content: None,
                })
                .await
                .map(|_| ()),
            store.delete(4, doc.id).await.map(|_| ()),
        ] {
            assert!(matches!(result, Err(DocmateError::DocumentNotFound)));
        }

        // Still intact for the owner.
        assert_eq!(store.get(3, doc.id).await.unwrap().title, "Plan");
    }

    #[tokio::test]
    async fn test_create_assigns_distinct_ids() {
        let store = SqliteDocumentStore::in_memory().unwrap();
        let a = store.create(1, NewDocument::new("A", None)).await.unwrap();
        store.delete(1, a.id).await.unwrap();
        let b = store.create(1, NewDocument::new("B", None)).await.unwrap();
        let c = store.create(2, NewDocument::new("C", None)).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_ne!(b.id, c.id);
        assert_ne!(a.id, c.id);
        assert!(b.active);
    }

    #[tokio::test]
    async fn test_empty_patch_is_noop() {
        let store = SqliteDocumentStore::in_memory().unwrap();
        let doc = store.create(1, NewDocument::new("Draft", None)).await.unwrap();

        let same = store.update(1, doc.id, DocumentPatch::default()).await.unwrap();
        assert_eq!(same, doc);

        let changed = store
            .update(1, doc.id, DocumentPatch {
                title: None,
                content: Some("Body".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(changed.title, "Draft");
        assert_eq!(changed.content.as_deref(), Some("Body"));
        assert!(changed.updated_at >= doc.updated_at);
        assert_eq!(changed.created_at, doc.created_at);
    }

    #[tokio::test]
    async fn test_soft_delete() {
        let store = SqliteDocumentStore::in_memory().unwrap();
        let doc = store.create(1, NewDocument::new("Old", None)).await.unwrap();

        let deleted = store.delete(1, doc.id).await.unwrap();
        assert!(!deleted.active);

        assert!(matches!(store.get(1, doc.id).await, Err(DocmateError::DocumentNotFound)));
        assert!(matches!(store.delete(1, doc.id).await, Err(DocmateError::DocumentNotFound)));
        assert!(store.list(1, 10).await.unwrap().is_empty());
        assert!(store.search(1, "old", 10).await.unwrap().is_empty());
        assert_eq!(store.count(1).await.unwrap(), 0);

        // The row itself is kept.
        let conn = store.lock().unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_corrupt_timestamp_is_an_error() {
        let store = SqliteDocumentStore::in_memory().unwrap();
        let doc = store.create(1, NewDocument::new("Broken", None)).await.unwrap();
        store
            .lock()
            .unwrap()
            .execute(
                "UPDATE documents SET updated_at = 'yesterday' WHERE id = ?1",
                params![doc.id],
            )
            .unwrap();

        let err = store.list(1, 10).await.unwrap_err();
        assert!(matches!(err, DocmateError::Database(_)));
        assert!(store.get(1, doc.id).await.is_err());
    }

    #[tokio::test]
    async fn test_list_is_capped_and_newest_first() {
        let store = SqliteDocumentStore::in_memory().unwrap();
        for i in 0..30 {
            store
                .create(1, NewDocument::new(format!("Doc {}", i), None))
                .await
                .unwrap();
        }

        let docs = store.list(1, 100).await.unwrap();
        assert_eq!(docs.len(), MAX_LIMIT);
        assert_eq!(docs[0].title, "Doc 29");

        assert_eq!(store.list(1, 5).await.unwrap().len(), 5);
        assert_eq!(store.count(1).await.unwrap(), 30);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_over_title_or_content() {
        let store = SqliteDocumentStore::in_memory().unwrap();
        store
            .create(1, NewDocument::new("Grocery List", Some("eggs, milk".to_string())))
            .await
            .unwrap();
        store
            .create(1, NewDocument::new("Trip", Some("Pack the MILK frother".to_string())))
            .await
            .unwrap();
        store
            .create(1, NewDocument::new("Ünïcode Notes", None))
            .await
            .unwrap();
        store
            .create(2, NewDocument::new("Milk prices", None))
            .await
            .unwrap();

        let hits = store.search(1, "Milk", 10).await.unwrap();
        let titles: Vec<_> = hits.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["Trip", "Grocery List"]);

        assert_eq!(store.search(1, "grocery", 10).await.unwrap().len(), 1);
        assert_eq!(store.search(1, "ünïcode", 10).await.unwrap().len(), 1);
        assert!(store.search(1, "100%", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("documents.db");

        let id = {
            let store = SqliteDocumentStore::new(&path).unwrap();
            store.create(7, NewDocument::new("Kept", None)).await.unwrap().id
        };

        let store = SqliteDocumentStore::new(&path).unwrap();
        assert_eq!(store.get(7, id).await.unwrap().title, "Kept");
    }
}
