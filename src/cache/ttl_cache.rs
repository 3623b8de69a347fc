//! TTL Cache Module
//!
//! Public cache handle: owns the locked store, the statistics and the
//! background cleaner, and enforces the closed-cache contract.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::info;

use crate::cache::{CacheStats, CacheStore, StatsRecorder};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::tasks::{spawn_cleanup_task, CleanupTask};

// == TTL Cache ==
/// In-process key-value cache whose entries live for a fixed TTL.
///
/// Lookups take a shared lock; `set`, `close` and the background sweep take
/// the exclusive lock. Share across threads with `Arc<TtlCache<V>>`.
///
/// Using a cache after `close` is a programmer error: every operation except
/// `is_closed` panics with "cache is closed".
#[derive(Debug)]
pub struct TtlCache<V> {
    store: Arc<RwLock<CacheStore<V>>>,
    stats: Arc<StatsRecorder>,
    cleaner: Mutex<Option<CleanupTask>>,
    sweep_interval: Duration,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a cache and starts its cleaner on the current tokio runtime.
    ///
    /// # Errors
    /// - `CacheError::InvalidConfig` if either duration is zero
    /// - `CacheError::NoRuntime` if called outside a tokio runtime
    pub fn new(ttl: Duration, sweep_interval: Duration) -> Result<Self> {
        Self::from_config(&CacheConfig::new(ttl, sweep_interval))
    }

    /// Creates a cache from a `CacheConfig`.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(RwLock::new(CacheStore::new(config.ttl)));
        let stats = Arc::new(StatsRecorder::new());
        let cleaner = spawn_cleanup_task(store.clone(), stats.clone(), config.sweep_interval)?;

        info!(
            ttl = ?config.ttl,
            sweep_interval = ?config.sweep_interval,
            "TTL cache created"
        );

        Ok(Self {
            store,
            stats,
            cleaner: Mutex::new(Some(cleaner)),
            sweep_interval: config.sweep_interval,
        })
    }

    // == Set ==
    /// Stores `value` under `key`, replacing any previous entry and resetting
    /// its deadline to now + ttl.
    ///
    /// # Panics
    /// If the cache is closed.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let mut store = self.store.write();
        fatal_if_closed(store.set(key.into(), value));
    }

    // == Get ==
    /// Returns a clone of the value stored under `key`.
    ///
    /// Misses come back as `CacheError::NotFound` or, for an entry past its
    /// deadline that the cleaner has not removed yet, `CacheError::Expired`.
    /// The lookup never removes anything.
    ///
    /// # Panics
    /// If the cache is closed.
    pub fn get(&self, key: &str) -> Result<V> {
        let store = self.store.read();
        match store.lookup(key, Instant::now()) {
            Ok(entry) => {
                self.stats.record_hit();
                Ok(entry.value.clone())
            }
            Err(err @ CacheError::Expired(_)) => {
                self.stats.record_expired_read();
                Err(err)
            }
            Err(err @ CacheError::NotFound(_)) => {
                self.stats.record_miss();
                Err(err)
            }
            Err(err) => fatal(err),
        }
    }

    // == Close ==
    /// Stops the cleaner and marks the cache closed. Entries are discarded
    /// with the cache.
    ///
    /// # Panics
    /// If the cache is already closed.
    pub fn close(&self) {
        let mut store = self.store.write();
        fatal_if_closed(store.close());

        if let Some(mut cleaner) = self.cleaner.lock().take() {
            cleaner.stop();
        }

        info!(entries = store.len(), "TTL cache closed");
    }
}

impl<V> TtlCache<V> {
    // == Contains Key ==
    /// Returns true if `key` holds an unexpired entry.
    ///
    /// # Panics
    /// If the cache is closed.
    pub fn contains_key(&self, key: &str) -> bool {
        fatal_if_closed(self.store.read().contains_key(key))
    }

    // == Length ==
    /// Number of stored entries, including expired ones not yet swept.
    ///
    /// # Panics
    /// If the cache is closed.
    pub fn len(&self) -> usize {
        let store = self.store.read();
        fatal_if_closed(store.ensure_open());
        store.len()
    }

    /// # Panics
    /// If the cache is closed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// # Panics
    /// If the cache is closed.
    pub fn ttl(&self) -> Duration {
        let store = self.store.read();
        fatal_if_closed(store.ensure_open());
        store.ttl()
    }

    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    pub fn is_closed(&self) -> bool {
        self.store.read().is_closed()
    }

    // == Stats ==
    /// Returns a snapshot of the cache counters.
    ///
    /// # Panics
    /// If the cache is closed.
    pub fn stats(&self) -> CacheStats {
        let store = self.store.read();
        fatal_if_closed(store.ensure_open());
        self.stats.snapshot(store.len())
    }

    /// Verifies the index/queue bijection and queue ordering.
    #[doc(hidden)]
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        self.store.read().check_invariants()
    }

    /// Keys in eviction order, oldest first.
    #[doc(hidden)]
    pub fn queued_keys(&self) -> Vec<String> {
        self.store.read().queued_keys()
    }
}

/// Turns a lifecycle violation into a panic.
fn fatal_if_closed<T>(result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => fatal(err),
    }
}

#[cold]
#[track_caller]
fn fatal(err: CacheError) -> ! {
    panic!("{err}")
}
