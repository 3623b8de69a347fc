//! Cache Module
//!
//! Provides an in-memory cache with fixed-TTL expiration and a background
//! sweep over an expiration-ordered queue.

mod entry;
mod queue;
mod stats;
mod store;
mod ttl_cache;


// Re-export public types
pub use entry::CacheEntry;
pub use queue::EvictionQueue;
pub use stats::{CacheStats, StatsRecorder};
pub use store::CacheStore;
pub use ttl_cache::TtlCache;
