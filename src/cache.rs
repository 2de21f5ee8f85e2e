//! Time-bounded key-value store owned by whoever needs it.
//!
//! Entries are stamped with the caller's clock on insert and are invisible
//! once older than the TTL.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;
use time::OffsetDateTime;

#[derive(Debug)]
pub struct ExpiringCache<K, V> {
    ttl: Duration,
    entries: HashMap<K, CacheEntry<V>>,
}

#[derive(Debug)]
struct CacheEntry<V> {
    inserted_at: OffsetDateTime,
    value: V,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, now: OffsetDateTime, ttl: Duration) -> bool {
        let age = now - self.inserted_at;
        !age.is_negative() && age.whole_milliseconds() < ttl.as_millis() as i128
    }
}

impl<K: Eq + Hash, V> ExpiringCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, key: &K, now: OffsetDateTime) -> Option<&V> {
        self.entries
            .get(key)
            .filter(|entry| entry.is_fresh(now, self.ttl))
            .map(|entry| &entry.value)
    }

    pub fn insert(&mut self, key: K, value: V, now: OffsetDateTime) {
        self.entries.insert(
            key,
            CacheEntry {
                inserted_at: now,
                value,
            },
        );
    }

    /// Drop expired entries, returning how many were removed.
    pub fn purge_expired(&mut self, now: OffsetDateTime) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.is_fresh(now, ttl));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
