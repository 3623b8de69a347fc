//! Cache Store Module
//!
//! Index and eviction queue kept in lockstep, plus the closed flag. The store
//! itself is single-threaded; `TtlCache` puts it behind a reader/writer lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::cache::{CacheEntry, EvictionQueue};
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Key index paired with an expiration-ordered queue.
///
/// Both structures point at the same `Arc<CacheEntry>`, and every key in the
/// index has exactly one entry in the queue.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key lookup
    index: HashMap<String, Arc<CacheEntry<V>>>,
    /// Entries ordered by expiration
    queue: EvictionQueue<V>,
    /// Lifetime applied to every entry
    ttl: Duration,
    /// Set once by `close`, never cleared
    closed: bool,
}

impl<V> CacheStore<V> {
    // == Constructor ==
    /// Creates an empty, open store.
    pub fn new(ttl: Duration) -> Self {
        Self {
            index: HashMap::new(),
            queue: EvictionQueue::new(),
            ttl,
            closed: false,
        }
    }

    // == Ensure Open ==
    /// Fails with `CacheError::Closed` once the store has been closed.
    pub fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(CacheError::Closed)
        } else {
            Ok(())
        }
    }

    // == Set ==
    /// Stores `value` under `key` with a fresh deadline of now + ttl.
    ///
    /// An existing entry for the key is dropped from the queue first, and the
    /// replacement goes to the tail. The deadline never falls before the
    /// current tail's, so the queue stays ordered even when callers read the
    /// clock from different contexts (a paused runtime clock vs. a plain
    /// thread).
    pub fn set(&mut self, key: String, value: V) -> Result<()> {
        self.ensure_open()?;

        if self.index.contains_key(&key) {
            self.queue.remove(&key);
        }

        let mut entry = CacheEntry::new(key, value, Instant::now(), self.ttl);
        if let Some(tail) = self.queue.newest_deadline() {
            entry.expires_at = entry.expires_at.max(tail);
        }

        let entry = Arc::new(entry);
        self.queue.push_back(Arc::clone(&entry));
        self.index.insert(entry.key.clone(), entry);

        Ok(())
    }

    // == Lookup ==
    /// Finds the live entry for `key` as of `now`.
    ///
    /// Expired entries are reported but left in place for the cleaner.
    pub fn lookup(&self, key: &str, now: Instant) -> Result<&CacheEntry<V>> {
        self.ensure_open()?;

        match self.index.get(key) {
            Some(entry) if entry.is_expired_at(now) => Err(CacheError::Expired(key.to_string())),
            Some(entry) => Ok(entry.as_ref()),
            None => Err(CacheError::NotFound(key.to_string())),
        }
    }

    // == Contains Key ==
    /// Returns true if `key` holds an unexpired entry.
    pub fn contains_key(&self, key: &str) -> Result<bool> {
        match self.lookup(key, Instant::now()) {
            Ok(_) => Ok(true),
            Err(err) if err.is_miss() => Ok(false),
            Err(err) => Err(err),
        }
    }

    // == Remove Expired ==
    /// Pops expired entries off the head of the queue and drops their keys
    /// from the index.
    ///
    /// Stops at the first live entry. Returns the number removed.
    pub fn remove_expired(&mut self, now: Instant) -> usize {
        if self.closed {
            return 0;
        }

        let mut removed = 0;
        while let Some(entry) = self.queue.pop_expired(now) {
            if self
                .index
                .get(&entry.key)
                .is_some_and(|current| Arc::ptr_eq(current, &entry))
            {
                self.index.remove(&entry.key);
            }
            removed += 1;
        }
        removed
    }

    // == Close ==
    /// Marks the store closed. Closing twice fails with `CacheError::Closed`.
    pub fn close(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.closed = true;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // == Length ==
    /// Returns the number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    // == Check Invariants ==
    /// Verifies the index/queue bijection and the queue ordering.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        if self.index.len() != self.queue.len() {
            return Err(format!(
                "index holds {} entries but queue holds {}",
                self.index.len(),
                self.queue.len()
            ));
        }

        for entry in self.queue.iter() {
            match self.index.get(&entry.key) {
                Some(indexed) if Arc::ptr_eq(indexed, entry) => {}
                Some(_) => {
                    return Err(format!("queue entry for '{}' is stale", entry.key));
                }
                None => {
                    return Err(format!("queue entry for '{}' missing from index", entry.key));
                }
            }
        }

        if !self.queue.is_ordered() {
            return Err("queue is not ordered by expiration".to_string());
        }

        Ok(())
    }

    /// Keys from next-to-expire to most recently set.
    pub fn queued_keys(&self) -> Vec<String> {
        self.queue.iter().map(|entry| entry.key.clone()).collect()
    }
}
