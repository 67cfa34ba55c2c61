//! Cache Engine Module
//!
//! Main cache engine combining the store map with recency tracking, TTL
//! expiration and snapshot persistence.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::entry::expiry_from_ttl;
use crate::cache::{CacheEntry, CacheStats, RecencyIndex, Slot, StoreMap};
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::persist::{BlobStore, KeyCodec, PersistenceAdapter};

// == Cache ==
/// In-process key-value cache with TTL expiration, LRU eviction and
/// optional snapshot persistence.
///
/// Reads take `&mut self`: `get` promotes the key, and `get`, `has` and
/// `size` delete entries whose TTL has elapsed.
pub struct Cache<K, V> {
    /// Key -> entry + recency handle
    store: StoreMap<K, V>,
    /// MRU -> LRU order
    recency: RecencyIndex<K>,
    stats: CacheStats,
    max_size: Option<usize>,
    default_ttl: Option<Duration>,
    persistence: Option<PersistenceAdapter>,
    clock: Arc<dyn Clock>,
}

impl<K, V> std::fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("len", &self.recency.len())
            .field("max_size", &self.max_size)
            .field("default_ttl", &self.default_ttl)
            .field("persistence", &self.persistence)
            .field("stats", &self.stats)
            .finish()
    }
}

impl<K, V> Cache<K, V>
where
    K: KeyCodec,
    V: Serialize + DeserializeOwned,
{
    // == Constructors ==
    /// Creates a cache without persistence.
    ///
    /// Fails if the config asks for persistence, since there is no store
    /// to persist to.
    pub fn new(config: CacheConfig) -> Result<Self> {
        Self::with_parts(config, None, Arc::new(SystemClock))
    }

    /// Creates a cache persisting to `store` under the configured name,
    /// restoring any live entries already stored there.
    pub fn with_store(config: CacheConfig, store: impl BlobStore + 'static) -> Result<Self> {
        Self::with_parts(config, Some(Box::new(store)), Arc::new(SystemClock))
    }

    /// Creates a cache from all of its collaborators.
    pub fn with_parts(
        config: CacheConfig,
        store: Option<Box<dyn BlobStore>>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let persistence = match (config.persist.name(), store) {
            (Some(name), Some(store)) => Some(PersistenceAdapter::new(name, store)),
            (Some(name), None) => {
                return Err(CacheError::InvalidConfig(format!(
                    "persistence to '{name}' requested without a blob store"
                )));
            }
            (None, Some(_)) => {
                debug!("Blob store supplied but persistence is off; ignoring it");
                None
            }
            (None, None) => None,
        };

        let mut cache = Self {
            store: StoreMap::new(),
            recency: RecencyIndex::new(),
            stats: CacheStats::new(),
            max_size: config.max_size,
            default_ttl: config.default_ttl,
            persistence,
            clock,
        };
        cache.restore();
        Ok(cache)
    }

    // == Set ==
    /// Stores a value, replacing any existing value for the key.
    ///
    /// An existing key keeps its slot and is promoted to most recently
    /// used. A new key arriving at capacity triggers eviction first.
    ///
    /// # Arguments
    /// * `ttl` - Lifetime of the entry; falls back to the default TTL when
    ///   None. A zero TTL never expires.
    pub fn set(&mut self, key: K, value: V, ttl: Option<Duration>) {
        let now = self.clock.now_ms();
        let expires_at = expiry_from_ttl(now, ttl.or(self.default_ttl));

        if let Some(slot) = self.store.get_mut(&key) {
            slot.entry.replace(value, expires_at, now);
            let node = slot.node;
            self.recency.promote_to_front(node);
        } else {
            self.make_room(now);
            self.insert_new(key, CacheEntry::new(value, expires_at, now));
        }

        self.sync();
    }

    // == Get ==
    /// Returns the value for `key` and marks it most recently used.
    ///
    /// An expired entry is deleted on discovery and reads as absent.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let now = self.clock.now_ms();
        if !self.check_live(key, now) {
            self.stats.record_miss();
            return None;
        }

        let slot = self.store.get_mut(key)?;
        slot.entry.touch(now);
        let node = slot.node;
        self.recency.promote_to_front(node);
        self.stats.record_hit();

        self.store.get(key).map(|slot| &slot.entry.value)
    }

    // == Has ==
    /// Reports whether `key` holds a live entry without changing recency.
    ///
    /// Like `get`, an expired entry is deleted on discovery.
    pub fn has(&mut self, key: &K) -> bool {
        let now = self.clock.now_ms();
        self.check_live(key, now)
    }

    // == Delete ==
    /// Removes `key` if present and returns whether anything was removed.
    pub fn delete(&mut self, key: &K) -> bool {
        let removed = self.remove_entry(key).is_some();
        self.sync();
        removed
    }

    // == Clear ==
    /// Removes every entry and persists the empty cache.
    pub fn clear(&mut self) {
        self.store.clear();
        self.recency.clear();
        self.sync();
    }

    // == Size ==
    /// Purges expired entries, then returns the number of live entries.
    pub fn size(&mut self) -> usize {
        self.purge_expired();
        self.store.len()
    }

    // == Purge Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed. The persisted snapshot is
    /// left alone since it never contains expired entries.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        self.purge_expired_at(now)
    }

    // == Peek ==
    /// Reads a live value without promoting it or deleting expired entries.
    pub fn peek(&self, key: &K) -> Option<&V> {
        let now = self.clock.now_ms();
        self.store
            .get(key)
            .filter(|slot| !slot.entry.is_expired_at(now))
            .map(|slot| &slot.entry.value)
    }

    /// Remaining lifetime of a live entry.
    ///
    /// Outer None = no live entry, inner None = never expires.
    pub fn ttl_remaining(&self, key: &K) -> Option<Option<Duration>> {
        let now = self.clock.now_ms();
        self.store
            .get(key)
            .filter(|slot| !slot.entry.is_expired_at(now))
            .map(|slot| slot.entry.ttl_remaining(now))
    }

    /// Keys from most to least recently used, expired ones included.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.recency.iter()
    }

    /// Number of stored entries, without purging expired ones.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.max_size
    }

    /// Blob name this cache persists under, if persistence is on.
    pub fn persist_name(&self) -> Option<&str> {
        self.persistence.as_ref().map(PersistenceAdapter::name)
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.store.len());
        stats
    }

    // == Internal Helpers ==

    /// Returns true if `key` is live, deleting it first if it has expired.
    fn check_live(&mut self, key: &K, now: i64) -> bool {
        let expired = match self.store.get(key) {
            Some(slot) => slot.entry.is_expired_at(now),
            None => return false,
        };

        if expired {
            self.remove_entry(key);
            self.stats.record_expirations(1);
            debug!(key = ?key, "Expired entry removed on access");
            self.sync();
            return false;
        }
        true
    }

    /// Frees a slot for a new key when the cache is at capacity.
    ///
    /// Expired entries go first; only if that is not enough is the least
    /// recently used entry evicted.
    fn make_room(&mut self, now: i64) {
        let Some(max_size) = self.max_size else {
            return;
        };
        if self.store.len() < max_size {
            return;
        }

        self.purge_expired_at(now);

        while self.store.len() >= max_size {
            let Some(evicted) = self.recency.remove_tail() else {
                break;
            };
            self.store.remove(&evicted);
            self.stats.record_eviction();
            debug!(key = ?evicted, "Evicted least recently used entry");
        }
    }

    fn insert_new(&mut self, key: K, entry: CacheEntry<V>) {
        let node = self.recency.insert_front(key.clone());
        self.store.insert(key, Slot { entry, node });
    }

    fn remove_entry(&mut self, key: &K) -> Option<CacheEntry<V>> {
        let slot = self.store.remove(key)?;
        self.recency.remove(slot.node);
        Some(slot.entry)
    }

    fn purge_expired_at(&mut self, now: i64) -> usize {
        let expired = self.store.expired_keys(now);
        for key in &expired {
            self.remove_entry(key);
        }
        if !expired.is_empty() {
            self.stats.record_expirations(expired.len());
            debug!(count = expired.len(), "Purged expired entries");
        }
        expired.len()
    }

    /// Loads the persisted snapshot. Failures leave the cache empty.
    fn restore(&mut self) {
        let Some(adapter) = &self.persistence else {
            return;
        };
        let name = adapter.name().to_string();
        let now = self.clock.now_ms();

        match adapter.restore::<K, V>(now) {
            Ok(entries) => {
                let found = entries.len();
                for (key, persisted) in entries {
                    // Later duplicates win
                    self.remove_entry(&key);
                    self.make_room(now);
                    self.insert_new(
                        key,
                        CacheEntry::new(persisted.value, persisted.expires_at, now),
                    );
                }
                if found > 0 {
                    info!(
                        name = %name,
                        restored = self.store.len(),
                        "Restored cache from snapshot"
                    );
                }
            }
            Err(err) => {
                warn!(name = %name, error = %err, "Failed to restore cache snapshot");
                self.stats.record_persist_failure();
            }
        }
    }

    /// Writes every live entry, LRU first, to the blob store.
    fn sync(&mut self) {
        let Some(adapter) = &self.persistence else {
            return;
        };
        let now = self.clock.now_ms();
        let store = &self.store;

        let live = self.recency.iter_lru().filter_map(|key| {
            let slot = store.get(key)?;
            (!slot.entry.is_expired_at(now))
                .then_some((key, &slot.entry.value, slot.entry.expires_at))
        });

        match adapter.sync(live) {
            Ok(_) => self.stats.record_persist_write(),
            Err(err) => {
                warn!(name = adapter.name(), error = %err, "Failed to persist cache snapshot");
                self.stats.record_persist_failure();
            }
        }
    }
}
