//! Store Map Module
//!
//! Primary key lookup: maps each key to its entry and recency handle.

use std::collections::HashMap;
use std::hash::Hash;

use crate::cache::{CacheEntry, NodeId};

// == Slot ==
/// A stored entry together with its node in the recency index.
#[derive(Debug)]
pub struct Slot<V> {
    pub entry: CacheEntry<V>,
    pub node: NodeId,
}

// == Store Map ==
/// Key-value storage owning every cache entry.
#[derive(Debug)]
pub struct StoreMap<K, V> {
    slots: HashMap<K, Slot<V>>,
}

impl<K, V> Default for StoreMap<K, V> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }
}

impl<K: Hash + Eq + Clone, V> StoreMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<&Slot<V>> {
        self.slots.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut Slot<V>> {
        self.slots.get_mut(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.slots.contains_key(key)
    }

    /// Inserts a slot, returning the one it replaced.
    pub fn insert(&mut self, key: K, slot: Slot<V>) -> Option<Slot<V>> {
        self.slots.insert(key, slot)
    }

    pub fn remove(&mut self, key: &K) -> Option<Slot<V>> {
        self.slots.remove(key)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    // == Expired Keys ==
    /// Collects every key whose entry has expired at `now_ms`, in map order.
    pub fn expired_keys(&self, now_ms: i64) -> Vec<K> {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.entry.is_expired_at(now_ms))
            .map(|(key, _)| key.clone())
            .collect()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RecencyIndex;

    const NOW: i64 = 1_000;

    fn slot(index: &mut RecencyIndex<String>, key: &str, expires_at: Option<i64>) -> Slot<u32> {
        Slot {
            entry: CacheEntry::new(7, expires_at, NOW),
            node: index.insert_front(key.to_string()),
        }
    }

    #[test]
    fn test_store_insert_and_get() {
        let mut index = RecencyIndex::new();
        let mut store = StoreMap::new();
        let s = slot(&mut index, "k", None);
        let node = s.node;

        assert!(store.insert("k".to_string(), s).is_none());
        assert!(store.contains(&"k".to_string()));
        assert_eq!(store.get(&"k".to_string()).map(|s| s.node), Some(node));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_remove() {
        let mut index = RecencyIndex::new();
        let mut store = StoreMap::new();
        let s = slot(&mut index, "k", None);
        store.insert("k".to_string(), s);

        assert!(store.remove(&"k".to_string()).is_some());
        assert!(store.remove(&"k".to_string()).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_expired_keys() {
        let mut index = RecencyIndex::new();
        let mut store = StoreMap::new();
        for (key, expiry) in [("live", None), ("soon", Some(NOW + 10)), ("gone", Some(NOW - 1))] {
            let s = slot(&mut index, key, expiry);
            store.insert(key.to_string(), s);
        }

        assert_eq!(store.expired_keys(NOW), vec!["gone".to_string()]);

        let mut later = store.expired_keys(NOW + 11);
        later.sort();
        assert_eq!(later, vec!["gone".to_string(), "soon".to_string()]);
    }

    #[test]
    fn test_store_get_mut_replaces_in_place() {
        let mut index = RecencyIndex::new();
        let mut store = StoreMap::new();
        let s = slot(&mut index, "k", None);
        store.insert("k".to_string(), s);

        if let Some(slot) = store.get_mut(&"k".to_string()) {
            slot.entry.replace(9, Some(NOW + 5), NOW + 1);
        }

        let entry = &store.get(&"k".to_string()).unwrap().entry;
        assert_eq!(entry.value, 9);
        assert_eq!(entry.expires_at, Some(NOW + 5));
    }
}
