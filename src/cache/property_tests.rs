//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the cache against a simple reference model.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::Cache;
use crate::clock::ManualClock;
use crate::config::{CacheConfig, PersistTarget};
use crate::persist::{Key, MemoryStore};

// == Test Configuration ==
const START: i64 = 1_700_000_000_000;

// == Strategies ==
/// Small key space so operations collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-f]{1,2}"
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: u32, ttl_ms: Option<u64> },
    Get { key: String },
    Has { key: String },
    Delete { key: String },
    Advance { ms: u64 },
    Size,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        4 => (key_strategy(), any::<u32>(), prop::option::of(0u64..50))
            .prop_map(|(key, value, ttl_ms)| CacheOp::Set { key, value, ttl_ms }),
        2 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        1 => key_strategy().prop_map(|key| CacheOp::Has { key }),
        1 => key_strategy().prop_map(|key| CacheOp::Delete { key }),
        1 => (0u64..40).prop_map(|ms| CacheOp::Advance { ms }),
        1 => Just(CacheOp::Size),
    ]
}

fn no_ttl_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        3 => (key_strategy(), any::<u32>())
            .prop_map(|(key, value)| CacheOp::Set { key, value, ttl_ms: None }),
        2 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        1 => key_strategy().prop_map(|key| CacheOp::Has { key }),
        1 => key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

fn new_cache(max_size: usize) -> (Cache<String, u32>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(START));
    let config = CacheConfig::default().with_max_size(max_size);
    let cache = Cache::with_parts(config, None, clock.clone()).unwrap();
    (cache, clock)
}

fn apply(cache: &mut Cache<String, u32>, clock: &ManualClock, op: &CacheOp) {
    match op {
        CacheOp::Set { key, value, ttl_ms } => {
            cache.set(key.clone(), *value, ttl_ms.map(Duration::from_millis))
        }
        CacheOp::Get { key } => {
            cache.get(key);
        }
        CacheOp::Has { key } => {
            cache.has(key);
        }
        CacheOp::Delete { key } => {
            cache.delete(key);
        }
        CacheOp::Advance { ms } => clock.advance(Duration::from_millis(*ms)),
        CacheOp::Size => {
            cache.size();
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // For any sequence of operations on a cache with capacity N,
    // the number of stored entries never exceeds N.
    #[test]
    fn prop_capacity_enforcement(
        max_size in 1usize..6,
        ops in prop::collection::vec(cache_op_strategy(), 1..80)
    ) {
        let (mut cache, clock) = new_cache(max_size);

        for op in &ops {
            apply(&mut cache, &clock, op);
            prop_assert!(
                cache.len() <= max_size,
                "Cache size {} exceeds max {}",
                cache.len(),
                max_size
            );
            prop_assert!(cache.size() <= max_size);
        }
    }

    // The store map and the recency index always hold the same keys.
    #[test]
    fn prop_structures_stay_in_lockstep(
        max_size in 1usize..6,
        ops in prop::collection::vec(cache_op_strategy(), 1..80)
    ) {
        let (mut cache, clock) = new_cache(max_size);

        for op in &ops {
            apply(&mut cache, &clock, op);
            let keys: Vec<String> = cache.keys().cloned().collect();
            let unique: HashSet<&String> = keys.iter().collect();
            prop_assert_eq!(keys.len(), cache.len());
            prop_assert_eq!(unique.len(), keys.len(), "Duplicate key in recency order");
        }
    }

    // Without TTLs the cache behaves exactly like a textbook LRU list.
    #[test]
    fn prop_matches_reference_lru(
        max_size in 1usize..5,
        ops in prop::collection::vec(no_ttl_op_strategy(), 1..80)
    ) {
        let (mut cache, clock) = new_cache(max_size);
        // Front = most recently used
        let mut model: Vec<(String, u32)> = Vec::new();

        for op in &ops {
            match op {
                CacheOp::Set { key, value, .. } => {
                    if let Some(pos) = model.iter().position(|(k, _)| k == key) {
                        model.remove(pos);
                    } else if model.len() >= max_size {
                        model.pop();
                    }
                    model.insert(0, (key.clone(), *value));
                }
                CacheOp::Get { key } => {
                    let expected = model.iter().position(|(k, _)| k == key).map(|pos| {
                        let item = model.remove(pos);
                        let value = item.1;
                        model.insert(0, item);
                        value
                    });
                    prop_assert_eq!(cache.get(key).copied(), expected);
                    continue;
                }
                CacheOp::Has { key } => {
                    let expected = model.iter().any(|(k, _)| k == key);
                    prop_assert_eq!(cache.has(key), expected);
                    continue;
                }
                CacheOp::Delete { key } => {
                    model.retain(|(k, _)| k != key);
                }
                _ => {}
            }
            apply(&mut cache, &clock, op);

            let order: Vec<String> = cache.keys().cloned().collect();
            let expected: Vec<String> = model.iter().map(|(k, _)| k.clone()).collect();
            prop_assert_eq!(order, expected);
        }
    }

    // Once an entry's expiry has passed it is never observed again.
    #[test]
    fn prop_expired_entries_are_absent(
        entries in prop::collection::hash_map(key_strategy(), (any::<u32>(), 1u64..100), 1..10),
        elapsed in 0u64..120
    ) {
        let (mut cache, clock) = new_cache(64);
        for (key, (value, ttl)) in &entries {
            cache.set(key.clone(), *value, Some(Duration::from_millis(*ttl)));
        }

        clock.advance(Duration::from_millis(elapsed));

        let live = entries.values().filter(|(_, ttl)| elapsed <= *ttl).count();
        prop_assert_eq!(cache.size(), live);
        for (key, (value, ttl)) in &entries {
            if elapsed > *ttl {
                prop_assert!(!cache.has(key));
                prop_assert_eq!(cache.get(key), None);
            } else {
                prop_assert_eq!(cache.get(key), Some(value));
            }
        }
    }

    // Persisting and restoring keeps every live value under the same key.
    #[test]
    fn prop_persistence_roundtrip(
        entries in prop::collection::hash_map("[a-z]{1,8}", any::<i64>(), 0..20)
    ) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(START));
        let config = CacheConfig::default().with_persist(PersistTarget::Named("prop".into()));

        let mut original: Cache<Key, i64> =
            Cache::with_parts(config.clone(), Some(Box::new(store.clone())), clock.clone())
                .unwrap();
        for (key, value) in &entries {
            original.set(Key::from(key.as_str()), *value, None);
        }

        let mut restored: Cache<Key, i64> =
            Cache::with_parts(config, Some(Box::new(store.clone())), clock.clone()).unwrap();

        let expected: HashMap<Key, i64> = entries
            .iter()
            .map(|(k, v)| (Key::infer(k), *v))
            .collect();
        prop_assert_eq!(restored.size(), original.size());
        for (key, value) in &expected {
            prop_assert_eq!(restored.get(key), Some(value));
        }
    }
}
