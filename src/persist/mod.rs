//! Persistence Module
//!
//! Mirrors the live contents of a cache into a named blob and restores
//! them on construction.

mod blob;
mod key;
mod snapshot;

pub use blob::{BlobStore, FileStore, MemoryStore};
pub use key::{Key, KeyCodec};
pub use snapshot::{PersistedEntry, Snapshot};

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{CacheError, Result};

// == Persistence Adapter ==
/// Binds a blob store to the name a cache persists under.
pub struct PersistenceAdapter {
    name: String,
    store: Box<dyn BlobStore>,
}

impl std::fmt::Debug for PersistenceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceAdapter")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl PersistenceAdapter {
    pub fn new(name: impl Into<String>, store: Box<dyn BlobStore>) -> Self {
        Self {
            name: name.into(),
            store,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // == Restore ==
    /// Loads the persisted entries that are still live at `now_ms`.
    ///
    /// A missing blob restores nothing. Any malformed value or key fails
    /// the whole restore, so callers never apply a partial snapshot.
    pub fn restore<K, V>(&self, now_ms: i64) -> Result<Vec<(K, PersistedEntry<V>)>>
    where
        K: KeyCodec,
        V: DeserializeOwned,
    {
        let Some(bytes) = self.store.read(&self.name)? else {
            debug!(name = %self.name, "No snapshot to restore");
            return Ok(Vec::new());
        };

        let snapshot = Snapshot::<V>::from_bytes(&bytes)?;
        let mut restored = Vec::with_capacity(snapshot.len());
        for (raw_key, entry) in snapshot.entries {
            let key = K::decode_key(&raw_key).ok_or(CacheError::KeyDecode(raw_key))?;
            if entry.expires_at.is_some_and(|expires| now_ms > expires) {
                continue;
            }
            restored.push((key, entry));
        }
        Ok(restored)
    }

    // == Sync ==
    /// Replaces the persisted blob with the given entries, in order.
    ///
    /// Keys that encode to the same string are written once, keeping the
    /// last occurrence. Returns the number of entries written.
    pub fn sync<'a, K, V, I>(&self, entries: I) -> Result<usize>
    where
        K: KeyCodec + 'a,
        V: Serialize + 'a,
        I: IntoIterator<Item = (&'a K, &'a V, Option<i64>)>,
    {
        let encoded: Vec<_> = entries
            .into_iter()
            .map(|(key, value, expires_at)| (key.encode_key(), value, expires_at))
            .collect();

        let mut seen = HashSet::with_capacity(encoded.len());
        let mut snapshot = Snapshot::default();
        for (key, value, expires_at) in encoded.into_iter().rev() {
            if seen.insert(key.clone()) {
                snapshot.push(key, value, expires_at);
            }
        }
        snapshot.entries.reverse();

        let bytes = snapshot.to_bytes()?;
        self.store.write(&self.name, &bytes)?;
        debug!(name = %self.name, entries = snapshot.len(), "Snapshot written");
        Ok(snapshot.len())
    }
}
