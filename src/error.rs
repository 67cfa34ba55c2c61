//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Store Error Enum ==
/// Failure reported by a blob store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying filesystem or device error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Store cannot serve requests right now
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

// == Cache Error Enum ==
/// Unified error type for the cache.
///
/// Only `InvalidConfig` ever reaches callers of the cache operations.
/// The persistence variants are caught at the adapter boundary, logged
/// and counted in the stats.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Configuration rejected at construction
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Blob store read or write failed
    #[error("Blob store error: {0}")]
    Store(#[from] StoreError),

    /// Snapshot could not be encoded or decoded
    #[error("Malformed snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// Snapshot key does not decode into the cache's key type
    #[error("Undecodable key in snapshot: {0}")]
    KeyDecode(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
