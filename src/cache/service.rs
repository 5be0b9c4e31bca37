//! Cache Service Module
//!
//! Wraps a [`CacheStore`] with hit/miss accounting, trace events and typed
//! JSON helpers.

use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::cache::{store::short_key, CacheStore};
use crate::error::CacheError;
use crate::metrics::MetricsCollector;

/// Default time-to-live for read-through entries (5 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

// == Cache Service ==
#[derive(Clone)]
pub struct CacheService {
    store: Arc<dyn CacheStore>,
    metrics: MetricsCollector,
    default_ttl: Duration,
}

impl CacheService {
    // == Constructor ==
    /// A zero `default_ttl` falls back to [`DEFAULT_TTL`].
    pub fn new(store: Arc<dyn CacheStore>, metrics: MetricsCollector, default_ttl: Duration) -> Self {
        Self {
            store,
            metrics,
            default_ttl: if default_ttl.is_zero() {
                DEFAULT_TTL
            } else {
                default_ttl
            },
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    // == Get ==
    /// Returns the cached value, recording a hit or a miss.
    pub async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let value = self.store.get(key).await?;

        if value.is_some() {
            self.metrics.record_cache_hit().await;
            debug!(op = "get", key = %short_key(key), hit = true, "cache access");
        } else {
            self.metrics.record_cache_miss().await;
            debug!(op = "get", key = %short_key(key), hit = false, "cache access");
        }

        Ok(value)
    }

    // == Set ==
    /// Stores a value for `ttl`, overwriting any previous entry.
    pub async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidTtl);
        }

        self.store.set(key, value, ttl).await?;
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        debug!(op = "set", key = %short_key(key), ttl_ms, "cache access");
        Ok(())
    }

    // == Delete ==
    /// Removes an entry. Absent keys are not an error.
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let existed = self.store.delete(key).await?;
        debug!(op = "delete", key = %short_key(key), existed, "cache access");
        Ok(())
    }

    // == Reset ==
    /// Drops every entry. Admin and test use only.
    pub async fn reset_all(&self) -> Result<(), CacheError> {
        self.store.clear().await?;
        debug!(op = "reset_all", "cache cleared");
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.store.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.store.is_empty().await
    }

    // == Typed Helpers ==
    /// [`get`](Self::get) followed by JSON decoding.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// JSON encoding followed by [`set`](Self::set) with the default TTL.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let raw = serde_json::to_string(value)?;
        self.set(key, raw, self.default_ttl).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use serde::Deserialize;

    fn service() -> (CacheService, MetricsCollector) {
        let metrics = MetricsCollector::new();
        let service = CacheService::new(
            Arc::new(MemoryStore::new(100)),
            metrics.clone(),
            DEFAULT_TTL,
        );
        (service, metrics)
    }

    #[tokio::test]
    async fn test_get_records_hit_and_miss() {
        let (cache, metrics) = service();

        assert_eq!(cache.get("k").await.unwrap(), None);
        cache.set("k", "v".to_string(), DEFAULT_TTL).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));

        let snap = metrics.snapshot().await;
        assert_eq!(snap.cache.hits, 1);
        assert_eq!(snap.cache.misses, 1);
    }

    #[tokio::test]
    async fn test_set_and_delete_do_not_touch_counters() {
        let (cache, metrics) = service();

        cache.set("k", "v".to_string(), DEFAULT_TTL).await.unwrap();
        cache.delete("k").await.unwrap();

        let snap = metrics.snapshot().await;
        assert_eq!(snap.cache.hits + snap.cache.misses, 0);
    }

    #[tokio::test]
    async fn test_delete_absent_key_is_ok() {
        let (cache, _) = service();
        assert!(cache.delete("missing").await.is_ok());
        assert!(cache.delete("missing").await.is_ok());
    }

    #[tokio::test]
    async fn test_zero_ttl_rejected() {
        let (cache, _) = service();
        let result = cache.set("k", "v".to_string(), Duration::ZERO).await;
        assert!(matches!(result, Err(CacheError::InvalidTtl)));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_huge_ttl_is_accepted() {
        let (cache, _) = service();
        cache.set("k", "v".to_string(), Duration::MAX).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_zero_default_ttl_falls_back() {
        let cache = CacheService::new(
            Arc::new(MemoryStore::new(10)),
            MetricsCollector::new(),
            Duration::ZERO,
        );
        assert_eq!(cache.default_ttl(), DEFAULT_TTL);
    }

    #[tokio::test]
    async fn test_reset_all() {
        let (cache, _) = service();
        cache.set("a", "1".to_string(), DEFAULT_TTL).await.unwrap();
        cache.set("b", "2".to_string(), DEFAULT_TTL).await.unwrap();

        cache.reset_all().await.unwrap();

        assert_eq!(cache.len().await, 0);
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Snapshot {
        name: String,
        age: u8,
    }

    #[tokio::test]
    async fn test_json_helpers() {
        let (cache, _) = service();
        let value = Snapshot {
            name: "Ana".into(),
            age: 30,
        };

        cache.set_json("k", &value).await.unwrap();
        let back: Option<Snapshot> = cache.get_json("k").await.unwrap();

        assert_eq!(back, Some(value));
    }

    #[tokio::test]
    async fn test_get_json_corrupted_payload() {
        let (cache, _) = service();
        cache.set("k", "not json".to_string(), DEFAULT_TTL).await.unwrap();

        let result: Result<Option<Snapshot>, _> = cache.get_json("k").await;
        assert!(matches!(result, Err(CacheError::Payload(_))));
    }
}
