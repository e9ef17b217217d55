//! Backing-store seam for the response cache.
//!
//! [`CacheStore`] is the narrow interface the cache needs from any row
//! store: keyed fetch, upsert, best-effort hit counting, a bounded
//! most-hit sample for fuzzy matching, and age-based deletion. Production
//! deployments implement it over their database; [`MemoryStore`]
//! (crate-provided) covers embedded use and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// One cached response row.
///
/// Owned by the backing store; concurrent readers and writers coordinate
/// only through the store's own atomicity. Upserts are keyed on
/// `cache_key`, so concurrent writes for one canonical query race
/// harmlessly to the same row (last write wins).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Stable hash of the canonical entities — the upsert key.
    pub cache_key: String,
    /// Original query text, truncated to bound storage.
    pub query: String,
    pub response: String,
    /// JSON array of citation objects, opaque to the cache.
    pub citations: Value,
    /// Answer confidence in `[0, 1]`; entries below the acceptance
    /// threshold are never served.
    pub confidence: f32,
    pub timestamp: DateTime<Utc>,
    pub hits: u32,
}

/// Row-store operations the response cache requires.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch the entry with the given key, if present.
    async fn fetch(&self, key: &str) -> Result<Option<CacheEntry>>;

    /// Insert or replace the entry keyed on `entry.cache_key`.
    async fn upsert(&self, entry: CacheEntry) -> Result<()>;

    /// Increment the hit counter for `key`. Best-effort: a lost increment
    /// under concurrency is tolerable and not a correctness bug.
    async fn record_hit(&self, key: &str) -> Result<()>;

    /// The `limit` most-hit entries no older than `since`, for fuzzy
    /// matching. Ordering among equal hit counts is unspecified.
    async fn most_hit_since(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<CacheEntry>>;

    /// Delete entries older than `cutoff`, returning how many went.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}
