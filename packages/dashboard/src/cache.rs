//! Time-boxed memoization of upstream payloads.
//!
//! Entries expire a fixed time after insertion and are only evicted on
//! expiry. The clock is [`tokio::time::Instant`] so tests can advance it
//! with a paused runtime.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::time::Instant;

/// Lifetime of cached indicator payloads.
pub const INDICATOR_TTL: Duration = Duration::from_secs(5 * 60);

/// Lifetime of cached boundary datasets. Boundaries change far less often
/// than indicator values.
pub const BOUNDARY_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// A map whose entries expire `ttl` after insertion.
#[derive(Debug, Clone)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: BTreeMap<K, Entry<V>>,
}

impl<K: Ord, V: Clone> TtlCache<K, V> {
    #[must_use]
    pub const fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the value for `key` if present and unexpired. Expired
    /// entries are removed.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Inserts or replaces `key`, restarting its lifetime.
    pub fn insert(&mut self, key: K, value: V) {
        let expires_at = Instant::now() + self.ttl;
        self.entries.insert(key, Entry { value, expires_at });
    }

    /// Drops every expired entry and returns how many were dropped.
    pub fn purge_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before - self.entries.len()
    }

    /// Number of stored entries, including expired ones not yet purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
