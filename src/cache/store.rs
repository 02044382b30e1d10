//! Recency-ordered entry store.

use super::entry::CacheEntry;
use super::key::CacheKey;
use crate::{Error, ErrorContext, Result};
use lru::LruCache;
use std::time::{Duration, Instant};
use tracing::debug;

/// Key → entry map ordered from least to most recently used.
///
/// The underlying [`LruCache`] is unbounded; capacity is enforced here so that
/// eviction happens exactly once per insert and only for new keys.
pub struct EntryStore {
    entries: LruCache<CacheKey, CacheEntry>,
    capacity: usize,
    ttl: Duration,
}

impl EntryStore {
    /// Fails on a zero capacity, which could never hold the entry being inserted.
    pub fn new(capacity: usize, ttl: Duration) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::validation_with_context(
                "Entry store capacity must be greater than zero",
                ErrorContext::new()
                    .with_field_path("max_entries")
                    .with_source("entry_store"),
            ));
        }
        Ok(Self {
            entries: LruCache::unbounded(),
            capacity,
            ttl,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains(key)
    }

    pub fn is_expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        entry.age(now) > self.ttl
    }

    /// Read without changing recency.
    pub fn peek(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.peek(key)
    }

    /// Mark an entry as used at `now` and move it to the most-recently-used end.
    pub fn touch(&mut self, key: &CacheKey, now: Instant) -> Option<&CacheEntry> {
        let entry = self.entries.get_mut(key)?;
        entry.touch(now);
        Some(entry)
    }

    pub fn remove(&mut self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries.pop(key)
    }

    /// Insert at the most-recently-used end.
    ///
    /// A new key arriving at a full store first evicts the least recently used
    /// entry, which is returned. Re-inserting an existing key replaces it in place.
    pub fn insert(&mut self, key: CacheKey, entry: CacheEntry) -> Option<(CacheKey, CacheEntry)> {
        let evicted = if !self.entries.contains(&key) && self.entries.len() >= self.capacity {
            self.entries.pop_lru()
        } else {
            None
        };
        if let Some((ref evicted_key, _)) = evicted {
            debug!(key = %evicted_key, "evicted least recently used entry");
        }
        self.entries.put(key, entry);
        evicted
    }

    /// Entries from least to most recently used, without promoting any.
    pub fn iter_by_recency(&self) -> impl Iterator<Item = (&CacheKey, &CacheEntry)> {
        self.entries.iter().rev()
    }

    /// Keys from least to most recently used.
    pub fn keys_by_recency(&self) -> Vec<CacheKey> {
        self.iter_by_recency().map(|(k, _)| k.clone()).collect()
    }
}
