//! Cache Store Module
//!
//! The storage seam behind the cache service, and the default bounded
//! in-memory implementation combining a HashMap with LRU tracking and TTL
//! expiration.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{entry::current_timestamp_ms, CacheEntry, LruTracker, MAX_VALUE_SIZE};
use crate::error::CacheError;

// == Cache Store Trait ==
/// Key/value storage with per-entry expiry.
///
/// Implementations never serve an expired entry, and treat deleting an
/// absent key as success.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the live value under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` under `key` until now + `ttl`, replacing any previous value.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Removes `key`. Returns whether an entry was present.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Drops every entry.
    async fn clear(&self) -> Result<(), CacheError>;

    /// Number of entries currently held (expired ones may still be counted).
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

// == Bounded Map ==
#[derive(Debug)]
struct BoundedMap {
    entries: HashMap<String, CacheEntry>,
    lru: LruTracker,
    capacity: usize,
    evictions: u64,
}

impl BoundedMap {
    fn remove(&mut self, key: &str) -> bool {
        self.lru.remove(key);
        self.entries.remove(key).is_some()
    }

    fn evict_if_full(&mut self) {
        while self.entries.len() >= self.capacity {
            match self.lru.evict_oldest() {
                Some(evicted) => {
                    self.entries.remove(&evicted);
                    self.evictions += 1;
                    debug!(key = %short_key(&evicted), "cache entry evicted");
                }
                None => break,
            }
        }
    }
}

// == Memory Store ==
/// In-memory store with LRU eviction at a fixed capacity.
#[derive(Debug)]
pub struct MemoryStore {
    inner: RwLock<BoundedMap>,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates a store holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(BoundedMap {
                entries: HashMap::new(),
                lru: LruTracker::new(),
                capacity: capacity.max(1),
                evictions: 0,
            }),
        }
    }

    // == Purge Expired ==
    /// Removes all expired entries and returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let mut map = self.inner.write().await;
        let now = current_timestamp_ms();

        let expired: Vec<String> = map
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            map.remove(key);
        }

        expired.len()
    }

    /// Total entries dropped by capacity pressure since construction.
    pub async fn evictions(&self) -> u64 {
        self.inner.read().await.evictions
    }

    pub async fn capacity(&self) -> usize {
        self.inner.read().await.capacity
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        // Write lock: a hit refreshes LRU order, an expired entry is dropped.
        let mut map = self.inner.write().await;

        let expired = match map.entries.get(key) {
            None => return Ok(None),
            Some(entry) => entry.is_expired(),
        };

        if expired {
            map.remove(key);
            return Ok(None);
        }

        map.lru.touch(key);
        Ok(map.entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidTtl);
        }
        if value.len() > MAX_VALUE_SIZE {
            return Err(CacheError::ValueTooLarge {
                size: value.len(),
                limit: MAX_VALUE_SIZE,
            });
        }

        let mut map = self.inner.write().await;

        if !map.entries.contains_key(key) {
            map.evict_if_full();
        }

        map.entries
            .insert(key.to_string(), CacheEntry::new(value, ttl));
        map.lru.touch(key);

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.inner.write().await.remove(key))
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut map = self.inner.write().await;
        map.entries.clear();
        map.lru.clear();
        Ok(())
    }

    async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }
}

/// First 12 hex chars of a digest key, enough to correlate log lines.
pub(crate) fn short_key(key: &str) -> &str {
    key.get(..12).unwrap_or(key)
}
