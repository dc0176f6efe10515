//! Property-Based Tests for Cache Module

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use crate::cache::TtlCache;

// == Test Configuration ==
const TEST_TTL: Duration = Duration::from_secs(300);

// == Strategies ==
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,8}(:[a-z0-9]{1,4})?"
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: u32 },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), any::<u32>()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // A fresh set is immediately readable with the same value.
    #[test]
    fn prop_set_then_get_returns_value(key in key_strategy(), value in any::<u32>()) {
        let mut cache = TtlCache::new(100, TEST_TTL);

        cache.set(key.clone(), value);

        prop_assert_eq!(cache.get(&key), Some(value));
    }

    // Any read after the TTL has elapsed is a miss and removes the entry.
    #[test]
    fn prop_read_after_ttl_is_miss(
        key in key_strategy(),
        ttl_secs in 1u64..600,
        overshoot_ms in 1u64..10_000,
    ) {
        let mut cache = TtlCache::new(100, TEST_TTL);
        let start = Instant::now();
        let ttl = Duration::from_secs(ttl_secs);

        cache.set_at(key.clone(), 1u8, ttl, start);

        prop_assert_eq!(cache.get_at(&key, start + ttl), Some(1));
        prop_assert_eq!(cache.get_at(&key, start + ttl + Duration::from_millis(overshoot_ms)), None);
        prop_assert!(cache.is_empty());
    }

    // Each insert of a new key past capacity evicts exactly the oldest
    // inserted key, and size never exceeds capacity.
    #[test]
    fn prop_overflow_evicts_oldest_insertion(
        capacity in 1usize..20,
        extra in 1usize..20,
    ) {
        let mut cache = TtlCache::new(capacity, TEST_TTL);
        let keys: Vec<String> = (0..capacity + extra).map(|i| format!("key{i}")).collect();

        for (i, key) in keys.iter().enumerate() {
            cache.set(key.clone(), i);
            prop_assert!(cache.len() <= capacity);
        }

        prop_assert_eq!(cache.len(), capacity);
        prop_assert_eq!(cache.stats().evictions, extra as u64);
        for (i, key) in keys.iter().enumerate() {
            prop_assert_eq!(cache.contains_key(key), i >= extra, "key {} presence", key);
        }
    }

    // Reads never change which key is evicted next.
    #[test]
    fn prop_reads_do_not_reorder(reads in prop::collection::vec(0usize..5, 0..20)) {
        let mut cache = TtlCache::new(5, TEST_TTL);
        for i in 0..5 {
            cache.set(format!("k{i}"), i);
        }
        for i in reads {
            let _ = cache.get(&format!("k{i}"));
        }

        cache.set("new", 99);

        prop_assert!(!cache.contains_key("k0"));
        prop_assert!(cache.contains_key("k1"));
    }

    // The cache agrees with a reference map (ignoring evictions) and the
    // counters match what happened.
    #[test]
    fn prop_matches_reference_model(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let mut cache = TtlCache::new(1000, TEST_TTL);
        let mut model: HashMap<String, u32> = HashMap::new();
        let mut hits = 0u64;
        let mut misses = 0u64;

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    cache.set(key.clone(), value);
                    model.insert(key, value);
                }
                CacheOp::Get { key } => {
                    let got = cache.get(&key);
                    prop_assert_eq!(got, model.get(&key).copied());
                    if got.is_some() { hits += 1 } else { misses += 1 }
                }
                CacheOp::Delete { key } => {
                    prop_assert_eq!(cache.delete(&key), model.remove(&key).is_some());
                }
            }
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.hits, hits);
        prop_assert_eq!(stats.misses, misses);
        prop_assert_eq!(stats.size, model.len());
        let keys: HashSet<_> = model.keys().cloned().collect();
        for key in keys {
            prop_assert!(cache.contains_key(&key));
        }
    }
}
