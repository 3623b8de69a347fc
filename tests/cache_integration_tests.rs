//! Integration Tests for the public cache API
//!
//! Exercises the full lifecycle: construction, set/get, expiration,
//! background sweeping, close, and concurrent access.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use expiring_cache::{CacheConfig, CacheError, TtlCache};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

const HOUR: Duration = Duration::from_secs(3600);

// == Helper Functions ==

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "expiring_cache=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

// == Lookup Tests ==

#[tokio::test]
async fn test_miss_on_fresh_cache() {
    init_tracing();
    let cache: TtlCache<String> = TtlCache::new(HOUR, HOUR).unwrap();

    for key in ["a", "b", "", "key with spaces"] {
        let err = cache.get(key).unwrap_err();
        assert!(err.is_miss());
        assert_eq!(err, CacheError::NotFound(key.to_string()));
    }

    cache.close();
}

#[tokio::test]
async fn test_hit_after_set() {
    init_tracing();
    let cache = TtlCache::new(HOUR, HOUR).unwrap();

    cache.set("key", vec![1u8, 2, 3]);

    assert_eq!(cache.get("key").unwrap(), vec![1, 2, 3]);
    cache.close();
}

#[tokio::test]
async fn test_update_overwrites() {
    init_tracing();
    let cache = TtlCache::new(HOUR, HOUR).unwrap();

    cache.set("key", "v1".to_string());
    cache.set("other", "x".to_string());
    cache.set("key", "v2".to_string());

    assert_eq!(cache.get("key").unwrap(), "v2");
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.queued_keys(), vec!["other", "key"]);
    assert!(cache.check_invariants().is_ok());
    cache.close();
}

// == Expiration Tests ==

#[tokio::test]
async fn test_expiration_without_sweep() {
    init_tracing();
    let cache = TtlCache::new(Duration::from_millis(1), HOUR).unwrap();

    cache.set("key", "value".to_string());
    tokio::time::sleep(Duration::from_millis(10)).await;

    // Miss observed before physical removal
    assert!(matches!(cache.get("key"), Err(CacheError::Expired(_))));
    assert_eq!(cache.len(), 1);

    let stats = cache.stats();
    assert_eq!(stats.expired_reads, 1);
    assert_eq!(stats.swept, 0);
    cache.close();
}

#[tokio::test]
async fn test_sweep_reclaims_expired_entries() {
    init_tracing();
    let cache = TtlCache::new(Duration::from_millis(1), Duration::from_millis(1)).unwrap();

    cache.set("key", "value".to_string());
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(matches!(cache.get("key"), Err(CacheError::NotFound(_))));
    assert!(cache.is_empty());
    assert!(cache.queued_keys().is_empty());
    assert!(cache.check_invariants().is_ok());

    let stats = cache.stats();
    assert_eq!(stats.swept, 1);
    assert!(stats.sweeps >= 1);
    cache.close();
}

#[tokio::test(start_paused = true)]
async fn test_sweep_keeps_live_entries() {
    init_tracing();
    let cache = TtlCache::new(Duration::from_millis(100), Duration::from_millis(10)).unwrap();

    cache.set("old", 1u32);
    tokio::time::sleep(Duration::from_millis(60)).await;
    cache.set("new", 2u32);
    tokio::time::sleep(Duration::from_millis(60)).await;

    // "old" expired at 100ms and was swept, "new" lives until 160ms
    assert!(matches!(cache.get("old"), Err(CacheError::NotFound(_))));
    assert_eq!(cache.get("new").unwrap(), 2);
    assert_eq!(cache.len(), 1);
    cache.close();
}

#[tokio::test(start_paused = true)]
async fn test_update_extends_lifetime() {
    init_tracing();
    let cache = TtlCache::new(Duration::from_millis(100), Duration::from_millis(10)).unwrap();

    cache.set("key", 1u32);
    tokio::time::sleep(Duration::from_millis(80)).await;
    cache.set("key", 2u32);
    tokio::time::sleep(Duration::from_millis(80)).await;

    assert_eq!(cache.get("key").unwrap(), 2);
    cache.close();
}

// == Lifecycle Tests ==

#[tokio::test]
async fn test_from_config() {
    init_tracing();
    let config = CacheConfig::default().with_ttl(Duration::from_secs(30));
    let cache: TtlCache<u32> = TtlCache::from_config(&config).unwrap();

    assert_eq!(cache.ttl(), Duration::from_secs(30));
    assert_eq!(cache.sweep_interval(), config.sweep_interval);
    cache.close();
}

#[tokio::test]
async fn test_invalid_config_rejected() {
    let config = CacheConfig::default().with_sweep_interval(Duration::ZERO);
    let result = TtlCache::<u32>::from_config(&config);
    assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
}

#[tokio::test]
async fn test_closed_cache_contract() {
    init_tracing();
    let cache: TtlCache<String> = TtlCache::new(HOUR, HOUR).unwrap();
    cache.close();

    assert!(cache.is_closed());

    let set = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        cache.set("key", "value".to_string())
    }));
    let get = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| cache.get("key")));
    let close = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| cache.close()));

    for outcome in [set.err(), get.err(), close.err()] {
        let payload = outcome.expect("closed cache must panic");
        let message = payload
            .downcast_ref::<String>()
            .map(String::as_str)
            .unwrap_or_default();
        assert_eq!(message, "cache is closed");
    }
}

#[tokio::test]
async fn test_independent_caches() {
    init_tracing();
    let first = TtlCache::new(HOUR, HOUR).unwrap();
    let second = TtlCache::new(HOUR, HOUR).unwrap();

    first.set("key", 1u32);
    first.close();

    assert!(second.get("key").unwrap_err().is_miss());
    second.set("key", 2u32);
    assert_eq!(second.get("key").unwrap(), 2);
    second.close();
}

#[tokio::test(start_paused = true)]
async fn test_set_from_runtime_and_plain_threads() {
    init_tracing();
    let cache = Arc::new(TtlCache::new(Duration::from_secs(1), HOUR).unwrap());

    // Runtime clock is paused and pushed a minute past the real clock
    tokio::time::sleep(Duration::from_secs(60)).await;
    cache.set("runtime", 1u32);

    let plain = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || cache.set("plain_thread", 2u32))
    };
    plain.join().unwrap();

    assert_eq!(cache.check_invariants(), Ok(()));
    assert_eq!(cache.queued_keys(), vec!["runtime", "plain_thread"]);
    assert_eq!(cache.get("plain_thread").unwrap(), 2);
    cache.close();
}

// == Concurrency Tests ==

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_get_set_preserves_invariants() {
    init_tracing();
    let cache = Arc::new(TtlCache::new(Duration::from_millis(5), Duration::from_millis(1)).unwrap());

    let workers: Vec<_> = (0..8u64)
        .map(|thread_id| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                // Seeded per thread; all threads draw from the same key set
                let mut rng = Pcg64::seed_from_u64(thread_id);
                for i in 0..2_000u64 {
                    let key = format!("key{}", rng.random_range(0..32u32));
                    if rng.random_bool(1.0 / 3.0) {
                        let _ = cache.get(&key);
                    } else {
                        cache.set(key, thread_id * 10_000 + i);
                    }
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(cache.check_invariants(), Ok(()));
    assert!(cache.len() <= 32);

    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(cache.is_empty(), "all entries should have been swept");
    assert_eq!(cache.check_invariants(), Ok(()));
    cache.close();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_readers_see_latest_value() {
    init_tracing();
    let cache = Arc::new(TtlCache::new(HOUR, Duration::from_millis(1)).unwrap());
    cache.set("shared", 0u64);

    let writer = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || {
            for i in 1..=1_000u64 {
                cache.set("shared", i);
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                let mut last = 0;
                for _ in 0..1_000 {
                    let value = cache.get("shared").unwrap();
                    assert!(value >= last, "values must never go backwards");
                    last = value;
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(cache.get("shared").unwrap(), 1_000);
    assert_eq!(cache.len(), 1);
    cache.close();
}
