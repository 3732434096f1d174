//! In-memory document store implementation.
//!
//! Useful for testing and throwaway sessions.

use super::{clamp_limit, matches_query, Document, DocumentPatch, DocumentStore, NewDocument};
use crate::error::{DocmateError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Table {
    next_id: i64,
    rows: BTreeMap<i64, Document>,
}

/// In-memory document store.
pub struct MemoryDocumentStore {
    table: RwLock<Table>,
}

impl MemoryDocumentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            table: RwLock::new(Table {
                next_id: 1,
                rows: BTreeMap::new(),
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Table>> {
        self.table
            .read()
            .map_err(|e| DocmateError::Store(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Table>> {
        self.table
            .write()
            .map_err(|e| DocmateError::Store(format!("Failed to acquire lock: {}", e)))
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Table {
    fn active_mut(&mut self, owner_id: i64, id: i64) -> Result<&mut Document> {
        self.rows
            .get_mut(&id)
            .filter(|d| d.owner_id == owner_id && d.active)
            .ok_or(DocmateError::DocumentNotFound)
    }

    /// Active documents of an owner, newest first.
    fn newest_first(&self, owner_id: i64) -> impl Iterator<Item = &Document> {
        let mut docs: Vec<_> = self
            .rows
            .values()
            .filter(|d| d.owner_id == owner_id && d.active)
            .collect();
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        docs.into_iter()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list(&self, owner_id: i64, limit: usize) -> Result<Vec<Document>> {
        let table = self.read()?;
        Ok(table
            .newest_first(owner_id)
            .take(clamp_limit(limit))
            .cloned()
            .collect())
    }

    async fn get(&self, owner_id: i64, id: i64) -> Result<Document> {
        let table = self.read()?;
        table
            .rows
            .get(&id)
            .filter(|d| d.owner_id == owner_id && d.active)
            .cloned()
            .ok_or(DocmateError::DocumentNotFound)
    }

    async fn create(&self, owner_id: i64, doc: NewDocument) -> Result<Document> {
        let mut table = self.write()?;
        let id = table.next_id;
        table.next_id += 1;

        let now = Utc::now();
        let document = Document {
            id,
            owner_id,
            title: doc.resolved_title(),
            content: doc.content,
            active: true,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(id, document.clone());
        Ok(document)
    }

    async fn update(&self, owner_id: i64, id: i64, patch: DocumentPatch) -> Result<Document> {
        let mut table = self.write()?;
        let doc = table.active_mut(owner_id, id)?;
        if patch.apply(doc) {
            doc.updated_at = Utc::now();
        }
        Ok(doc.clone())
    }

    async fn delete(&self, owner_id: i64, id: i64) -> Result<Document> {
        let mut table = self.write()?;
        let doc = table.active_mut(owner_id, id)?;
        doc.active = false;
        doc.updated_at = Utc::now();
        Ok(doc.clone())
    }

    async fn search(&self, owner_id: i64, query: &str, limit: usize) -> Result<Vec<Document>> {
        let table = self.read()?;
        Ok(table
            .newest_first(owner_id)
            .filter(|d| matches_query(d, query))
            .take(clamp_limit(limit))
            .cloned()
            .collect())
    }

    async fn count(&self, owner_id: i64) -> Result<usize> {
        let table = self.read()?;
        Ok(table
            .rows
            .values()
            .filter(|d| d.owner_id == owner_id && d.active)
            .count())
    }
}
