//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the LRU, capacity and statistics guarantees.

use proptest::prelude::*;
use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

use crate::cache::store::{Expiration, Store};

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 100;

// == Strategies ==
/// Generates keys from a small alphabet so that operations collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-h]{1,2}".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = u32> {
    any::<u32>()
}

/// Generates a sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: u32 },
    SetWithExpire { key: String, value: u32, ttl_ms: u64 },
    Get { key: String },
    Remove { key: String },
    RemoveOldest,
    Sweep { advance_ms: u64 },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        (key_strategy(), value_strategy(), 0u64..20).prop_map(|(key, value, ttl_ms)| {
            CacheOp::SetWithExpire { key, value, ttl_ms }
        }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Remove { key }),
        Just(CacheOp::RemoveOldest),
        (0u64..20).prop_map(|advance_ms| CacheOp::Sweep { advance_ms }),
    ]
}

// Reference model: keys most recently used first.
fn touch(model: &mut VecDeque<String>, key: &str) {
    model.retain(|k| k != key);
    model.push_front(key.to_string());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any sequence of operations, the index and the recency list stay in
    // sync and the size never exceeds capacity.
    #[test]
    fn prop_index_and_list_agree(
        capacity in 0usize..8,
        ops in prop::collection::vec(cache_op_strategy(), 1..80)
    ) {
        let mut store: Store<String, u32> = Store::new(capacity);
        let mut now = Instant::now();

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    store.insert(key, value, Expiration::Retain, now);
                }
                CacheOp::SetWithExpire { key, value, ttl_ms } => {
                    store.insert(key, value, Expiration::After(Duration::from_millis(ttl_ms)), now);
                }
                CacheOp::Get { key } => {
                    store.get(key.as_str());
                }
                CacheOp::Remove { key } => {
                    store.remove(key.as_str());
                }
                CacheOp::RemoveOldest => {
                    store.remove_oldest();
                }
                CacheOp::Sweep { advance_ms } => {
                    now += Duration::from_millis(advance_ms);
                    store.remove_expired(now);
                }
            }

            prop_assert!(store.is_consistent(), "Index and recency list diverged");
            if capacity > 0 {
                prop_assert!(store.len() <= capacity, "Size {} exceeds capacity {}", store.len(), capacity);
            }
        }
    }

    // For any sequence of set/get/remove, the recency order matches a simple
    // move-to-front model and evictions always take the model's back element.
    #[test]
    fn prop_recency_matches_model(
        capacity in 1usize..6,
        ops in prop::collection::vec(cache_op_strategy(), 1..80)
    ) {
        let mut store: Store<String, u32> = Store::new(capacity);
        let mut model: VecDeque<String> = VecDeque::new();
        let now = Instant::now();

        for op in ops {
            match op {
                CacheOp::Set { key, value } | CacheOp::SetWithExpire { key, value, .. } => {
                    touch(&mut model, &key);
                    let expected = if model.len() > capacity { model.pop_back() } else { None };
                    let evicted: Vec<String> = store
                        .insert(key, value, Expiration::Retain, now)
                        .into_iter()
                        .map(|(k, _)| k)
                        .collect();
                    prop_assert_eq!(evicted, expected.into_iter().collect::<Vec<_>>());
                }
                CacheOp::Get { key } => {
                    let hit = store.get(key.as_str()).is_some();
                    prop_assert_eq!(hit, model.contains(&key));
                    if hit {
                        touch(&mut model, &key);
                    }
                }
                CacheOp::Remove { key } => {
                    store.remove(key.as_str());
                    model.retain(|k| k != &key);
                }
                CacheOp::RemoveOldest => {
                    let removed = store.remove_oldest().map(|(k, _)| k);
                    prop_assert_eq!(removed, model.pop_back());
                }
                CacheOp::Sweep { .. } => {}
            }

            prop_assert_eq!(store.keys_mru_first(), model.iter().cloned().collect::<Vec<_>>());
        }
    }

    // For any sequence of operations, the statistics reflect the hits, misses,
    // removals and entry count that occurred.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let mut store: Store<String, u32> = Store::new(TEST_MAX_ENTRIES);
        let now = Instant::now();
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;
        let mut expected_removals: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Set { key, value } | CacheOp::SetWithExpire { key, value, .. } => {
                    store.insert(key, value, Expiration::Retain, now);
                }
                CacheOp::Get { key } => match store.get(key.as_str()) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
                CacheOp::Remove { key } => {
                    if store.remove(key.as_str()).is_some() {
                        expected_removals += 1;
                    }
                }
                CacheOp::RemoveOldest | CacheOp::Sweep { .. } => {}
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.removals, expected_removals, "Removals mismatch");
        prop_assert_eq!(stats.evictions, 0, "Nothing should be evicted below capacity");
        prop_assert_eq!(stats.total_entries, store.len(), "Total entries mismatch");
    }

    // Storing V1 then V2 under the same key returns V2 and keeps one entry.
    #[test]
    fn prop_overwrite_semantics(
        key in key_strategy(),
        value1 in value_strategy(),
        value2 in value_strategy()
    ) {
        let mut store: Store<String, u32> = Store::new(TEST_MAX_ENTRIES);
        let now = Instant::now();

        store.insert(key.clone(), value1, Expiration::Retain, now);
        store.insert(key.clone(), value2, Expiration::Retain, now);

        prop_assert_eq!(store.get(key.as_str()), Some(&value2), "Overwrite should return new value");
        prop_assert_eq!(store.len(), 1, "Should have exactly one entry after overwrite");
    }

    // Once more distinct keys than capacity are inserted, the size stays at
    // capacity and the evicted key is always the oldest one.
    #[test]
    fn prop_capacity_enforcement(
        keys in prop::collection::vec(key_strategy(), 1..60),
        capacity in 1usize..10
    ) {
        let unique_keys: Vec<String> = {
            let mut seen = HashSet::new();
            keys.into_iter().filter(|k| seen.insert(k.clone())).collect()
        };
        let mut store: Store<String, u32> = Store::new(capacity);
        let now = Instant::now();

        for (i, key) in unique_keys.iter().enumerate() {
            let evicted = store.insert(key.clone(), i as u32, Expiration::Retain, now);
            if i >= capacity {
                prop_assert_eq!(store.len(), capacity);
                prop_assert_eq!(evicted.len(), 1);
                prop_assert_eq!(&evicted[0].0, &unique_keys[i - capacity]);
            } else {
                prop_assert!(evicted.is_empty());
            }
        }
    }

    // After a sweep no remaining entry is stale, and every entry without a
    // TTL survives.
    #[test]
    fn prop_sweep_removes_exactly_stale(
        entries in prop::collection::vec((key_strategy(), prop::option::of(0u64..50)), 1..40),
        advance_ms in 0u64..60
    ) {
        let mut store: Store<String, u32> = Store::new(0);
        let now = Instant::now();

        for (key, ttl_ms) in &entries {
            let expiration = match ttl_ms {
                Some(ms) => Expiration::After(Duration::from_millis(*ms)),
                None => Expiration::Retain,
            };
            store.insert(key.clone(), 0, expiration, now);
        }

        let later = now + Duration::from_millis(advance_ms);
        let before = store.len();
        let removed = store.remove_expired(later);

        prop_assert_eq!(store.len() + removed.len(), before);
        for key in store.keys_mru_first() {
            let remaining = store.ttl(key.as_str(), later);
            prop_assert!(remaining.map_or(true, |d| d > Duration::ZERO), "Stale key {} survived", key);
        }
        prop_assert!(store.is_consistent());
    }
}
