//! Mini Cache - A lightweight in-process key-value cache
//!
//! Combines TTL expiration, LRU eviction and best-effort snapshot
//! persistence to a pluggable blob store.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod persist;

pub use cache::{Cache, CacheStats};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, PersistTarget, DEFAULT_PERSIST_NAME};
pub use error::{CacheError, Result, StoreError};
pub use persist::{BlobStore, FileStore, Key, KeyCodec, MemoryStore};
