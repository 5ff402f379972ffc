//! Cache module for storing API responses in a local key-value store
//!
//! This module provides a cache manager that keeps daily consumption responses
//! with an expiry that depends on the day they describe: today's data is still
//! accumulating upstream and expires quickly, past days are immutable and are
//! kept for a day. Storage and time are injected through the [`KeyValueStore`]
//! and [`Clock`] traits so the manager can be exercised without a filesystem
//! or a real clock.

mod clock;
mod manager;
mod store;

use thiserror::Error;

pub use clock::{Clock, ManualClock, SystemClock};
pub use manager::{CacheEntry, CacheManager, ExpiryPolicy, DEFAULT_MAX_ENTRIES};
pub use store::{FileStore, KeyValueStore, MemoryStore};

/// Errors that can occur when writing to the cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading or writing a backing file failed
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Payload could not be serialized to JSON
    #[error("Failed to serialize cache payload: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Key cannot be mapped onto the backing store
    #[error("Invalid cache key: '{0}'")]
    InvalidKey(String),
}
