//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with a fixed deadline.

use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// A single cached value and the instant it stops being valid.
///
/// Entries are never mutated after creation; an update replaces the whole
/// entry with a fresh one for the same key.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// Key this entry was stored under
    pub key: String,
    /// The stored value
    pub value: V,
    /// Deadline after which the entry is logically gone
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry that expires `ttl` after `now`.
    pub fn new(key: String, value: V, now: Instant, ttl: Duration) -> Self {
        Self {
            key,
            value,
            expires_at: now + ttl,
        }
    }

    // == Is Expired ==
    /// Checks the entry against a given instant.
    ///
    /// Boundary condition: an entry whose deadline equals `now` is expired.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}
