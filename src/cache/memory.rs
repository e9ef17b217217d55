//! In-memory [`CacheStore`] implementation.
//!
//! A mutex-guarded map, suitable for embedded single-process use and for
//! tests. Expiry is logical: old rows sit in the map until
//! [`delete_older_than`](CacheStore::delete_older_than) removes them,
//! matching the filtered-read semantics of a database-backed store.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::store::{CacheEntry, CacheStore};
use crate::error::Result;

/// Process-local cache store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently held, expired rows included.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn fetch(&self, key: &str) -> Result<Option<CacheEntry>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    async fn upsert(&self, entry: CacheEntry) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(entry.cache_key.clone(), entry);
        Ok(())
    }

    async fn record_hit(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get_mut(key) {
            entry.hits += 1;
        }
        Ok(())
    }

    async fn most_hit_since(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<CacheEntry>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut recent: Vec<CacheEntry> = entries
            .values()
            .filter(|e| e.timestamp >= since)
            .cloned()
            .collect();
        recent.sort_by(|a, b| b.hits.cmp(&a.hits));
        recent.truncate(limit);
        Ok(recent)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, e| e.timestamp >= cutoff);
        Ok((before - entries.len()) as u64)
    }
}
