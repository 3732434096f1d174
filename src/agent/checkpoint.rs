//! Per-thread conversation state.

use crate::config::{Settings, StoreProvider};
use crate::error::{DocmateError, Result};
use async_openai::types::ChatCompletionRequestMessage;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS checkpoints (
        thread_id TEXT PRIMARY KEY,
        messages TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
"#;

/// Persistence for conversation history across turns.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// History of a thread; empty for an unknown thread.
    async fn load(&self, thread_id: &str) -> Result<Vec<ChatCompletionRequestMessage>>;

    /// Replace the history of a thread.
    async fn save(&self, thread_id: &str, messages: Vec<ChatCompletionRequestMessage>) -> Result<()>;
}

/// Keeps thread histories in process memory.
#[derive(Default)]
pub struct MemoryCheckpointer {
    threads: Mutex<HashMap<String, Vec<ChatCompletionRequestMessage>>>,
}

impl MemoryCheckpointer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn thread_count(&self) -> usize {
        self.threads.lock().await.len()
    }
}

#[async_trait]
impl Checkpointer for MemoryCheckpointer {
    async fn load(&self, thread_id: &str) -> Result<Vec<ChatCompletionRequestMessage>> {
        Ok(self
            .threads
            .lock()
            .await
            .get(thread_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, thread_id: &str, messages: Vec<ChatCompletionRequestMessage>) -> Result<()> {
        self.threads.lock().await.insert(thread_id.to_string(), messages);
        Ok(())
    }
}

/// Keeps thread histories as JSON rows next to the documents, so a thread
/// can be resumed by a later process.
pub struct SqliteCheckpointer {
    conn: std::sync::Mutex<Connection>,
}

impl SqliteCheckpointer {
    /// Open (or create) the checkpoint table in the database at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let checkpointer = Self::initialize(conn)?;

        info!("Initialized SQLite checkpointer at {:?}", path);
        Ok(checkpointer)
    }

    pub fn in_memory() -> Result<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: std::sync::Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DocmateError::Store(format!("Failed to acquire lock: {}", e)))
    }
}

#[async_trait]
impl Checkpointer for SqliteCheckpointer {
    async fn load(&self, thread_id: &str) -> Result<Vec<ChatCompletionRequestMessage>> {
        let raw: Option<String> = self
            .lock()?
            .query_row(
                "SELECT messages FROM checkpoints WHERE thread_id = ?1",
                params![thread_id],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, thread_id: &str, messages: Vec<ChatCompletionRequestMessage>) -> Result<()> {
        let raw = serde_json::to_string(&messages)?;
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        self.lock()?.execute(
            r#"
            INSERT INTO checkpoints (thread_id, messages, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(thread_id) DO UPDATE SET
                messages = excluded.messages,
                updated_at = excluded.updated_at
            "#,
            params![thread_id, raw, now],
        )?;

        debug!("Saved {} messages for thread {}", messages.len(), thread_id);
        Ok(())
    }
}

/// The checkpointer matching the configured store: SQLite threads survive
/// restarts, memory threads last for the process.
pub fn open_checkpointer(settings: &Settings) -> Result<Arc<dyn Checkpointer>> {
    match settings.database.provider {
        StoreProvider::Sqlite => Ok(Arc::new(SqliteCheckpointer::new(&settings.sqlite_path())?)),
        StoreProvider::Memory => Ok(Arc::new(MemoryCheckpointer::new())),
    }
}

/// Drop the oldest messages so at most `limit` remain.
pub fn trim_history(messages: &mut Vec<ChatCompletionRequestMessage>, limit: usize) {
    if messages.len() > limit {
        let excess = messages.len() - limit;
        messages.drain(..excess);
    }
}
