//! Outcome cache keyed by normalized URL

use crate::types::Outcome;
use moka::future::Cache;
use std::time::Duration;

/// Bounded, TTL-expiring cache of successful outcomes
///
/// Cloning shares the underlying store. Expired entries read as misses.
#[derive(Clone)]
pub struct OutcomeCache {
    inner: Cache<String, Outcome>,
}

impl OutcomeCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Outcome> {
        self.inner.get(key).await
    }

    pub async fn insert(&self, key: String, outcome: Outcome) {
        self.inner.insert(key, outcome).await;
    }

    /// Approximate number of live entries
    pub async fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks().await;
        self.inner.entry_count()
    }

    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

impl std::fmt::Debug for OutcomeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutcomeCache")
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}
