//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and LRU eviction.

mod engine;
mod entry;
mod recency;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use engine::Cache;
pub use entry::CacheEntry;
pub use recency::{NodeId, RecencyIndex};
pub use stats::CacheStats;
pub use store::{Slot, StoreMap};
