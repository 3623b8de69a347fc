//! Eviction Queue Module
//!
//! Insertion-ordered queue of entries used by the cleaner to find expired
//! entries without scanning the whole index.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::time::Instant;

use crate::cache::CacheEntry;

// == Eviction Queue ==
/// Entries ordered by insertion time.
///
/// Every entry shares the cache's single TTL, so insertion order is also
/// expiration order:
/// - Front = oldest, next to expire
/// - Back = most recently set
#[derive(Debug)]
pub struct EvictionQueue<V> {
    order: VecDeque<Arc<CacheEntry<V>>>,
}

impl<V> Default for EvictionQueue<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> EvictionQueue<V> {
    // == Constructor ==
    /// Creates a new empty queue.
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Push ==
    /// Appends an entry at the tail.
    ///
    /// Callers must not push an entry expiring before the current tail.
    pub fn push_back(&mut self, entry: Arc<CacheEntry<V>>) {
        debug_assert!(
            self.order
                .back()
                .map_or(true, |tail| tail.expires_at <= entry.expires_at),
            "eviction queue must stay ordered by expiration"
        );
        self.order.push_back(entry);
    }

    // == Remove ==
    /// Removes the entry stored under `key`.
    ///
    /// The queue is not keyed, so this is a linear scan.
    pub fn remove(&mut self, key: &str) -> Option<Arc<CacheEntry<V>>> {
        let position = self.order.iter().position(|entry| entry.key == key)?;
        self.order.remove(position)
    }

    // == Pop Expired ==
    /// Pops the head entry if it expired at or before `now`.
    ///
    /// Returns None as soon as the head is still live, which by the ordering
    /// invariant means every entry behind it is live too.
    pub fn pop_expired(&mut self, now: Instant) -> Option<Arc<CacheEntry<V>>> {
        if self.order.front()?.is_expired_at(now) {
            self.order.pop_front()
        } else {
            None
        }
    }

    // == Newest Deadline ==
    /// Deadline of the tail entry, the latest in the queue.
    pub fn newest_deadline(&self) -> Option<Instant> {
        self.order.back().map(|entry| entry.expires_at)
    }

    // == Length ==
    /// Returns the number of queued entries.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Iterates from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<CacheEntry<V>>> {
        self.order.iter()
    }

    // == Is Ordered ==
    /// Checks that deadlines never decrease from front to back.
    pub fn is_ordered(&self) -> bool {
        self.order
            .iter()
            .zip(self.order.iter().skip(1))
            .all(|(a, b)| a.expires_at <= b.expires_at)
    }
}
