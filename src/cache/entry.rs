//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
///
/// Recency is not stored here; it is the entry's position in the
/// recency index. `created_at` and `last_used` are diagnostics only.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<i64>,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,
    /// Last write or promoting read (Unix milliseconds)
    pub last_used: i64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry stamped at `now_ms`.
    pub fn new(value: V, expires_at: Option<i64>, now_ms: i64) -> Self {
        Self {
            value,
            expires_at,
            created_at: now_ms,
            last_used: now_ms,
        }
    }

    // == Replace ==
    /// Overwrites value and expiry in place, keeping `created_at`.
    pub fn replace(&mut self, value: V, expires_at: Option<i64>, now_ms: i64) {
        self.value = value;
        self.expires_at = expires_at;
        self.last_used = now_ms;
    }

    pub fn touch(&mut self, now_ms: i64) {
        self.last_used = now_ms;
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// An entry expires once the clock is strictly past `expires_at`.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        match self.expires_at {
            Some(expires) => now_ms > expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the TTL has elapsed
    /// - `Some(remaining)` if the entry has TTL and hasn't expired
    /// - `None` if the entry never expires
    pub fn ttl_remaining(&self, now_ms: i64) -> Option<Duration> {
        self.expires_at.map(|expires| {
            let remaining = expires.saturating_sub(now_ms).max(0);
            Duration::from_millis(remaining as u64)
        })
    }
}

// == Utility Functions ==
/// Computes an absolute expiry from a TTL. A zero TTL never expires.
pub fn expiry_from_ttl(now_ms: i64, ttl: Option<Duration>) -> Option<i64> {
    ttl.filter(|ttl| !ttl.is_zero()).map(|ttl| {
        let ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        now_ms.saturating_add(ms)
    })
}
