//! Expiring Cache - an in-process key-value cache with fixed TTL expiration
//!
//! Entries live for one TTL chosen at construction. A background task sweeps
//! expired entries off the head of an expiration-ordered queue.
//!
//! ```ignore
//! let cache = TtlCache::new(Duration::from_secs(60), Duration::from_secs(1))?;
//! cache.set("user:1", profile);
//! let profile = cache.get("user:1")?;
//! cache.close();
//! ```

mod cache;
mod config;
mod error;
mod tasks;

pub use cache::{CacheStats, TtlCache};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
