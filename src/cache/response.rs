//! Canonicalizing response cache with exact and fuzzy lookup.
//!
//! [`ResponseCache`] short-circuits expensive calls entirely: handlers
//! check it before invoking the AI wrapper and populate it on success.
//! Lookup is two-stage — an exact match on the canonical-entity key, then
//! a keyword-overlap fuzzy match over the most-hit recent entries.
//!
//! Caching is strictly best-effort. Any store failure during `get` is a
//! logged miss; any failure during `set` is logged and swallowed. The
//! caller's primary operation must never fail because of the cache.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::canonical::{QueryContext, cache_key};
use super::store::{CacheEntry, CacheStore};
use crate::telemetry;

/// Words too generic to count toward keyword overlap.
const STOP_WORDS: &[&str] = &[
    "what", "which", "size", "cable", "need", "needed", "away", "from", "with", "that", "this",
    "does", "will", "should", "would", "have",
];

/// Configuration for the response cache.
///
/// ```rust
/// # use holdfast::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_age(Duration::from_secs(24 * 3600))
///     .min_confidence(0.8);
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Entries older than this are never served and are eligible for
    /// cleanup. Default: 7 days.
    pub max_age: Duration,
    /// Acceptance threshold — entries below it are never served.
    /// Default: 0.7.
    pub min_confidence: f32,
    /// Keyword-overlap score a fuzzy candidate must exceed. Default: 0.7.
    pub similarity_threshold: f32,
    /// How many most-hit entries to consider for fuzzy matching.
    /// Default: 10.
    pub fuzzy_candidates: usize,
    /// Stored queries are truncated to this many characters. Default: 500.
    pub max_query_len: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(7 * 24 * 3600),
            min_confidence: 0.7,
            similarity_threshold: 0.7,
            fuzzy_candidates: 10,
            max_query_len: 500,
        }
    }
}

impl CacheConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum entry age.
    pub fn max_age(mut self, age: Duration) -> Self {
        self.max_age = age;
        self
    }

    /// Set the confidence acceptance threshold.
    pub fn min_confidence(mut self, threshold: f32) -> Self {
        self.min_confidence = threshold;
        self
    }

    /// Set the fuzzy-match similarity threshold.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Set the fuzzy candidate sample size.
    pub fn fuzzy_candidates(mut self, n: usize) -> Self {
        self.fuzzy_candidates = n;
        self
    }

    /// Set the stored-query truncation length.
    pub fn max_query_len(mut self, len: usize) -> Self {
        self.max_query_len = len;
        self
    }
}

/// Keyed store over `(query, context)` with exact and fuzzy lookup.
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    config: CacheConfig,
}

impl ResponseCache {
    /// Create a cache over the given backing store.
    pub fn new(store: Arc<dyn CacheStore>, config: CacheConfig) -> Self {
        Self { store, config }
    }

    /// Oldest timestamp still considered live.
    fn freshness_cutoff(&self) -> chrono::DateTime<Utc> {
        let age = TimeDelta::from_std(self.config.max_age)
            .unwrap_or_else(|_| TimeDelta::days(7));
        Utc::now() - age
    }

    /// Whether an entry is fresh and confident enough to serve.
    fn servable(&self, entry: &CacheEntry) -> bool {
        entry.timestamp >= self.freshness_cutoff()
            && entry.confidence >= self.config.min_confidence
    }

    /// Look up a cached response.
    ///
    /// Exact canonical-key match first; on miss, a fuzzy keyword-overlap
    /// pass over the most-hit recent entries. The returned entry reflects
    /// the hit just recorded. Store failures are logged misses.
    pub async fn get(&self, query: &str, context: Option<&QueryContext>) -> Option<CacheEntry> {
        let key = cache_key(query, context);

        match self.store.fetch(&key).await {
            Ok(Some(entry)) if self.servable(&entry) => {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL, "kind" => "exact").increment(1);
                debug!(cache_key = %key, hits = entry.hits + 1, "exact cache hit");
                return Some(self.touch(entry).await);
            }
            Ok(_) => {}
            Err(e) => {
                metrics::counter!(telemetry::CACHE_ERRORS_TOTAL, "operation" => "get")
                    .increment(1);
                warn!(error = %e, "cache fetch failed, treating as miss");
                return None;
            }
        }

        match self.fuzzy_lookup(query).await {
            Some(entry) => {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL, "kind" => "fuzzy").increment(1);
                debug!(cache_key = %entry.cache_key, "fuzzy cache hit");
                Some(self.touch(entry).await)
            }
            None => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                None
            }
        }
    }

    /// Store a response under the query's canonical key.
    ///
    /// Upserts with `hits = 1`, truncating the stored query to bound
    /// storage. Failures are logged and swallowed.
    pub async fn set(
        &self,
        query: &str,
        response: &str,
        citations: Value,
        confidence: f32,
        context: Option<&QueryContext>,
    ) {
        let entry = CacheEntry {
            cache_key: cache_key(query, context),
            query: query.chars().take(self.config.max_query_len).collect(),
            response: response.to_string(),
            citations,
            confidence,
            timestamp: Utc::now(),
            hits: 1,
        };

        if let Err(e) = self.store.upsert(entry).await {
            metrics::counter!(telemetry::CACHE_ERRORS_TOTAL, "operation" => "set").increment(1);
            warn!(error = %e, "cache write failed, continuing without caching");
        }
    }

    /// Delete entries older than the max-age window.
    ///
    /// Intended for a schedule, not per-request. Returns how many rows
    /// were removed (0 when the store call failed).
    pub async fn cleanup(&self) -> u64 {
        match self.store.delete_older_than(self.freshness_cutoff()).await {
            Ok(deleted) => {
                info!(deleted, "cache cleanup complete");
                deleted
            }
            Err(e) => {
                metrics::counter!(telemetry::CACHE_ERRORS_TOTAL, "operation" => "cleanup")
                    .increment(1);
                warn!(error = %e, "cache cleanup failed");
                0
            }
        }
    }

    /// Record a hit and return the entry with its updated count.
    ///
    /// The increment is best-effort; a failure is logged and the stale
    /// count returned.
    async fn touch(&self, mut entry: CacheEntry) -> CacheEntry {
        match self.store.record_hit(&entry.cache_key).await {
            Ok(()) => entry.hits += 1,
            Err(e) => warn!(error = %e, "hit counter update failed"),
        }
        entry
    }

    /// Keyword-overlap pass over the most-hit recent entries.
    async fn fuzzy_lookup(&self, query: &str) -> Option<CacheEntry> {
        let candidates = match self
            .store
            .most_hit_since(self.freshness_cutoff(), self.config.fuzzy_candidates)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                metrics::counter!(telemetry::CACHE_ERRORS_TOTAL, "operation" => "get")
                    .increment(1);
                warn!(error = %e, "fuzzy candidate fetch failed, treating as miss");
                return None;
            }
        };

        let query_keywords = keywords(query);
        candidates
            .into_iter()
            .filter(|c| c.confidence >= self.config.min_confidence)
            .map(|c| (keyword_overlap(&query_keywords, &keywords(&c.query)), c))
            .filter(|(score, _)| *score >= self.config.similarity_threshold)
            .max_by(|(a, _), (b, _)| a.total_cmp(b))
            .map(|(_, entry)| entry)
    }
}

/// Tokenize a query into a keyword set, dropping short and stop words.
fn keywords(text: &str) -> Vec<String> {
    let mut words: Vec<String> = text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 3 && !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect();
    words.sort();
    words.dedup();
    words
}

/// Jaccard-style overlap: `|intersection| / max(|a|, |b|)`.
///
/// The max denominator (rather than union) penalizes a short query
/// matching a much longer stored one.
fn keyword_overlap(a: &[String], b: &[String]) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.iter().filter(|w| b.contains(w)).count();
    intersection as f32 / a.len().max(b.len()) as f32
}
