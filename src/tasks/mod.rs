//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of a cache.
//!
//! # Tasks
//! - TTL Cleanup: Removes expired entries at the configured sweep interval

mod cleanup;

pub use cleanup::{spawn_cleanup_task, CleanupTask};
