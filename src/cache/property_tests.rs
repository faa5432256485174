//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the cache against a plain HashMap model.

use proptest::prelude::*;
use std::collections::HashMap;
use std::time::Duration;

use crate::cache::BoundedTtlCache;

// == Test Configuration ==
const TEST_MAX_SIZE: usize = 8;
const TEST_MAX_AGE: Duration = Duration::from_secs(60);

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .unwrap()
}

// == Strategies ==
/// Small key space so puts, gets and removes collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-l]"
}

#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: String, value: u32 },
    Get { key: String },
    Remove { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), any::<u32>()).prop_map(|(key, value)| CacheOp::Put { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Remove { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Before any lifetime elapses the cache behaves like a map that refuses
    // inserts once it holds TEST_MAX_SIZE keys.
    #[test]
    fn prop_matches_reject_on_full_model(ops in prop::collection::vec(cache_op_strategy(), 1..80)) {
        let rt = paused_runtime();
        let _guard = rt.enter();
        let cache = BoundedTtlCache::new(TEST_MAX_AGE, TEST_MAX_SIZE).unwrap();
        let mut model: HashMap<String, u32> = HashMap::new();

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    let admitted = model.len() < TEST_MAX_SIZE;
                    if admitted {
                        model.insert(key.clone(), value);
                    }
                    prop_assert_eq!(cache.put(key, value), admitted);
                }
                CacheOp::Get { key } => {
                    prop_assert_eq!(cache.get(&key), model.get(&key).copied());
                }
                CacheOp::Remove { key } => {
                    cache.remove(&key);
                    model.remove(&key);
                }
            }
            prop_assert!(cache.size() <= TEST_MAX_SIZE, "Capacity exceeded");
            prop_assert_eq!(cache.size(), model.len());
        }
    }

    // Once max_age has passed with no further puts, nothing is left.
    #[test]
    fn prop_everything_expires(
        keys in prop::collection::hash_set(key_strategy(), 1..TEST_MAX_SIZE)
    ) {
        let rt = paused_runtime();
        let outcome = rt.block_on(async {
            let cache = BoundedTtlCache::new(Duration::from_millis(100), TEST_MAX_SIZE).unwrap();
            for (i, key) in keys.iter().enumerate() {
                cache.put(key.clone(), i);
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            tokio::time::sleep(Duration::from_millis(101)).await;

            let all_absent = keys.iter().all(|key| cache.get(key).is_none());
            (all_absent, cache.size(), cache.stats().expirations)
        });

        prop_assert!(outcome.0, "Some key outlived max_age");
        prop_assert_eq!(outcome.1, 0);
        prop_assert_eq!(outcome.2, keys.len() as u64);
    }

    // Removing a key twice leaves the same state as removing it once.
    #[test]
    fn prop_remove_idempotent(
        entries in prop::collection::vec((key_strategy(), any::<u32>()), 0..TEST_MAX_SIZE),
        target in key_strategy()
    ) {
        let rt = paused_runtime();
        let _guard = rt.enter();
        let cache = BoundedTtlCache::new(TEST_MAX_AGE, TEST_MAX_SIZE).unwrap();
        for (key, value) in entries.iter().cloned() {
            cache.put(key, value);
        }

        cache.remove(&target);
        let once: Vec<_> = entries.iter().map(|(k, _)| cache.get(k)).collect();
        let size_once = cache.size();

        cache.remove(&target);
        let twice: Vec<_> = entries.iter().map(|(k, _)| cache.get(k)).collect();

        prop_assert_eq!(once, twice);
        prop_assert_eq!(size_once, cache.size());
        prop_assert_eq!(cache.get(&target), None);
    }
}
