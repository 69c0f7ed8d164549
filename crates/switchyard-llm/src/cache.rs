//! Cache - memoizing decorator for LLM providers
//!
//! [`CachedProvider`] wraps any [`LlmProvider`] and keeps successful responses
//! in a time-bounded cache keyed by the exact prompt text.
//!
//! - Hits inside the TTL never reach the wrapped provider
//! - Failures are returned untouched and are never stored
//! - Concurrent misses for the same prompt may both call the provider; the
//!   last completed call wins the cache slot
//! - Expired entries are dropped when looked up, and every
//!   [`PURGE_INTERVAL`] stores the whole map is swept

use crate::error::{Error, Result};
use crate::provider::{LlmProvider, SharedProvider};
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Default time-to-live for cached responses (10 minutes)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

/// Number of stores between sweeps of expired entries
pub const PURGE_INTERVAL: usize = 64;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Provider decorator with a TTL response cache
pub struct CachedProvider {
    inner: SharedProvider,
    entries: Arc<DashMap<String, CacheEntry>>,
    ttl: Duration,
    name: String,
    stores: AtomicUsize,
}

impl CachedProvider {
    /// Wrap a provider using the default TTL
    #[must_use]
    pub fn new(inner: SharedProvider) -> Self {
        Self::with_ttl(inner, DEFAULT_CACHE_TTL)
    }

    /// Wrap a provider with a custom TTL
    #[must_use]
    pub fn with_ttl(inner: SharedProvider, ttl: Duration) -> Self {
        let name = format!("cached:{}", inner.name());
        Self {
            inner,
            entries: Arc::new(DashMap::new()),
            ttl,
            name,
            stores: AtomicUsize::new(0),
        }
    }

    /// Configured TTL
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of stored entries, including expired ones not yet evicted
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop a single prompt from the cache
    pub fn invalidate(&self, prompt: &str) -> bool {
        self.entries.remove(prompt).is_some()
    }

    /// Drop every cached entry
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Evict expired entries, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(now));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(removed, "Purged expired cache entries");
        }
        removed
    }

    fn lookup(&self, prompt: &str) -> Option<String> {
        let now = Instant::now();
        let hit = self.entries.get(prompt).and_then(|entry| {
            if entry.is_fresh(now) {
                Some(entry.value.clone())
            } else {
                None
            }
        });

        if hit.is_none() {
            // drop the stale slot so len() reflects live entries
            self.entries.remove_if(prompt, |_, entry| !entry.is_fresh(now));
        }
        hit
    }

    fn store(&self, prompt: &str, value: &str) {
        self.entries.insert(
            prompt.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at: Instant::now() + self.ttl,
            },
        );

        if (self.stores.fetch_add(1, Ordering::Relaxed) + 1) % PURGE_INTERVAL == 0 {
            self.purge_expired();
        }
    }

    /// Same as [`LlmProvider::get_response`], but abandons the provider call
    /// when `cancel` fires. Nothing is cached for a cancelled call.
    pub async fn get_response_cancellable(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        if let Some(value) = self.lookup(prompt) {
            debug!(provider = %self.inner.name(), "Cache hit");
            return Ok(value);
        }

        let outcome = tokio::select! {
            result = self.inner.get_response(prompt) => result,
            _ = cancel.cancelled() => {
                debug!(provider = %self.inner.name(), "Provider call cancelled");
                return Err(Error::Cancelled);
            }
        };

        match outcome {
            Ok(value) => {
                self.store(prompt, &value);
                Ok(value)
            }
            Err(e) => {
                warn!(provider = %self.inner.name(), error = %e, "Provider call failed, not caching");
                Err(e)
            }
        }
    }
}

#[async_trait::async_trait]
impl LlmProvider for CachedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_response(&self, prompt: &str) -> Result<String> {
        if let Some(value) = self.lookup(prompt) {
            debug!(provider = %self.inner.name(), "Cache hit");
            return Ok(value);
        }

        debug!(provider = %self.inner.name(), "Cache miss");
        match self.inner.get_response(prompt).await {
            Ok(value) => {
                self.store(prompt, &value);
                Ok(value)
            }
            Err(e) => {
                warn!(provider = %self.inner.name(), error = %e, "Provider call failed, not caching");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockProvider;

    fn cached(mock: &Arc<MockProvider>, ttl: Duration) -> CachedProvider {
        CachedProvider::with_ttl(mock.clone(), ttl)
    }

    #[tokio::test]
    async fn test_identical_prompt_hits_cache() {
        let mock = Arc::new(MockProvider::with_default("answer"));
        let provider = cached(&mock, DEFAULT_CACHE_TTL);

        let first = provider.get_response("explain traits").await.unwrap();
        let second = provider.get_response("explain traits").await.unwrap();

        assert_eq!(first, "answer");
        assert_eq!(second, "answer");
        assert_eq!(mock.call_count(), 1);
        assert_eq!(provider.len(), 1);
    }

    #[tokio::test]
    async fn test_exact_match_without_normalization() {
        let mock = Arc::new(MockProvider::with_default("answer"));
        let provider = cached(&mock, DEFAULT_CACHE_TTL);

        provider.get_response("explain traits").await.unwrap();
        provider.get_response("Explain traits").await.unwrap();
        provider.get_response("explain traits ").await.unwrap();

        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_expired_entry_calls_provider_again() {
        let mock = Arc::new(MockProvider::with_default("answer"));
        let provider = cached(&mock, Duration::from_millis(40));

        provider.get_response("prompt").await.unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;
        provider.get_response("prompt").await.unwrap();

        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let mock = Arc::new(MockProvider::new());
        mock.push_error(Error::Timeout(100));
        mock.push_response("recovered");
        let provider = cached(&mock, DEFAULT_CACHE_TTL);

        let err = provider.get_response("prompt").await.unwrap_err();
        assert!(err.is_transient());
        assert!(provider.is_empty());

        let ok = provider.get_response("prompt").await.unwrap();
        assert_eq!(ok, "recovered");
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_call_writes_nothing() {
        let mock = Arc::new(MockProvider::with_default("late").with_delay(Duration::from_millis(500)));
        let provider = cached(&mock, DEFAULT_CACHE_TTL);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = provider.get_response_cancellable("prompt", &cancel).await;
        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(provider.is_empty());
    }

    #[tokio::test]
    async fn test_purge_and_invalidate() {
        let mock = Arc::new(MockProvider::with_default("answer"));
        let provider = cached(&mock, Duration::from_millis(30));

        provider.get_response("a").await.unwrap();
        provider.get_response("b").await.unwrap();
        assert!(provider.invalidate("a"));
        assert!(!provider.invalidate("a"));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(provider.purge_expired(), 1);
        assert!(provider.is_empty());
    }

    #[tokio::test]
    async fn test_stores_sweep_expired_entries_of_other_prompts() {
        let mock = Arc::new(MockProvider::with_default("answer"));
        let provider = cached(&mock, Duration::from_millis(20));

        for i in 0..200 {
            provider.get_response(&format!("old {i}")).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(60)).await;

        for i in 0..PURGE_INTERVAL {
            provider.get_response(&format!("new {i}")).await.unwrap();
        }

        // none of the stale prompts were looked up again, yet they are gone
        assert!(provider.len() <= PURGE_INTERVAL, "len = {}", provider.len());
        assert!(provider.len() > 0);
    }
}
