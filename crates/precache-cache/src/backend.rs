//! Storage backend trait and the in-memory backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use precache_core::Response;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{CacheError, CacheResult};
use crate::key::RequestKey;

/// A stored request/response pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Request identity.
    pub key: RequestKey,
    /// Stored response.
    pub response: Response,
    /// When the entry was written.
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create an entry stamped with the current time.
    pub fn new(key: RequestKey, response: Response) -> Self {
        Self {
            key,
            response,
            stored_at: Utc::now(),
        }
    }
}

/// Contents of one named cache, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheTable {
    pub name: String,
    pub entries: Vec<CacheEntry>,
}

impl CacheTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn get(&self, key: &RequestKey) -> Option<&CacheEntry> {
        self.entries.iter().find(|e| &e.key == key)
    }

    /// Insert or replace in place, keeping its position.
    pub fn upsert(&mut self, entry: CacheEntry) {
        match self.entries.iter_mut().find(|e| e.key == entry.key) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn remove(&mut self, key: &RequestKey) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| &e.key != key);
        self.entries.len() != before
    }

    /// Total body bytes held by the table.
    pub fn body_bytes(&self) -> u64 {
        self.entries
            .iter()
            .map(|e| e.response.body.len() as u64)
            .sum()
    }
}

/// Cache storage backend trait.
///
/// Cache names are kept in creation order; entries within a cache in
/// insertion order.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Names of all caches, oldest first.
    async fn cache_names(&self) -> CacheResult<Vec<String>>;

    /// Create the cache if absent. Returns `true` if it was created.
    async fn open(&self, name: &str) -> CacheResult<bool>;

    /// Whether the cache exists.
    async fn has(&self, name: &str) -> CacheResult<bool>;

    /// Delete the cache. Returns `true` if it existed.
    async fn delete(&self, name: &str) -> CacheResult<bool>;

    /// Look up one entry by exact key.
    async fn get(&self, name: &str, key: &RequestKey) -> CacheResult<Option<CacheEntry>>;

    /// All entries of the cache.
    async fn entries(&self, name: &str) -> CacheResult<Vec<CacheEntry>>;

    /// Store every entry, or none of them.
    async fn put_batch(&self, name: &str, entries: Vec<CacheEntry>) -> CacheResult<()>;

    /// Remove one entry. Returns `true` if it existed.
    async fn remove(&self, name: &str, key: &RequestKey) -> CacheResult<bool>;
}

/// In-memory backend (for development/testing).
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: RwLock<Vec<CacheTable>>,
}

impl MemoryBackend {
    /// Create a new in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }
}

fn find<'a>(tables: &'a [CacheTable], name: &str) -> CacheResult<&'a CacheTable> {
    tables
        .iter()
        .find(|t| t.name == name)
        .ok_or_else(|| CacheError::NoSuchCache(name.to_string()))
}

fn find_mut<'a>(tables: &'a mut [CacheTable], name: &str) -> CacheResult<&'a mut CacheTable> {
    tables
        .iter_mut()
        .find(|t| t.name == name)
        .ok_or_else(|| CacheError::NoSuchCache(name.to_string()))
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn cache_names(&self) -> CacheResult<Vec<String>> {
        let tables = self.tables.read().await;
        Ok(tables.iter().map(|t| t.name.clone()).collect())
    }

    async fn open(&self, name: &str) -> CacheResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.iter().any(|t| t.name == name) {
            return Ok(false);
        }
        tables.push(CacheTable::new(name));
        Ok(true)
    }

    async fn has(&self, name: &str) -> CacheResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.iter().any(|t| t.name == name))
    }

    async fn delete(&self, name: &str) -> CacheResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.len();
        tables.retain(|t| t.name != name);
        Ok(tables.len() != before)
    }

    async fn get(&self, name: &str, key: &RequestKey) -> CacheResult<Option<CacheEntry>> {
        let tables = self.tables.read().await;
        Ok(find(&tables, name)?.get(key).cloned())
    }

    async fn entries(&self, name: &str) -> CacheResult<Vec<CacheEntry>> {
        let tables = self.tables.read().await;
        Ok(find(&tables, name)?.entries.clone())
    }

    async fn put_batch(&self, name: &str, entries: Vec<CacheEntry>) -> CacheResult<()> {
        let mut tables = self.tables.write().await;
        let table = find_mut(&mut tables, name)?;
        for entry in entries {
            table.upsert(entry);
        }
        Ok(())
    }

    async fn remove(&self, name: &str, key: &RequestKey) -> CacheResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(find_mut(&mut tables, name)?.remove(key))
    }
}
