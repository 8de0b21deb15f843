//! QueryDedupCache coalescing, staleness, and error propagation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use filing_core::cache::{EntryStatus, QueryDedupCache};
use filing_core::error::{FetchResult, QueryError};
use tokio::sync::oneshot;

fn key(s: &str) -> String {
    s.to_string()
}

// ============================================================================
// Basic reads
// ============================================================================

#[tokio::test]
async fn first_read_fetches_and_caches() {
    let cache: QueryDedupCache<String, u32> = QueryDedupCache::new(None);
    let calls = AtomicUsize::new(0);

    let k = key("bc0871427");
    let value = cache
        .get_or_fetch(
            &k,
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            },
            false,
        )
        .await
        .unwrap();

    assert_eq!(value, 7);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.status(&k), EntryStatus::Fresh);
    assert_eq!(cache.peek(&k), Some(7));
}

#[tokio::test]
async fn fresh_value_is_served_without_refetching() {
    let cache: QueryDedupCache<String, u32> = QueryDedupCache::new(None);
    let calls = AtomicUsize::new(0);
    let k = key("k");

    for _ in 0..3 {
        let value = cache
            .get_or_fetch(
                &k,
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                },
                false,
            )
            .await
            .unwrap();
        assert_eq!(value, 7);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn zero_stale_time_refetches_every_read() {
    let cache: QueryDedupCache<String, u32> = QueryDedupCache::new(Some(Duration::ZERO));
    let calls = AtomicUsize::new(0);
    let k = key("k");

    for _ in 0..2 {
        cache
            .get_or_fetch(
                &k,
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(1)
                },
                false,
            )
            .await
            .unwrap();
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.status(&k), EntryStatus::Stale);
}

#[tokio::test]
async fn force_bypasses_a_fresh_cache() {
    let cache: QueryDedupCache<String, u32> = QueryDedupCache::new(None);
    let calls = AtomicUsize::new(0);
    let k = key("k");

    for (force, expected) in [(false, 1), (true, 2)] {
        let value = cache
            .get_or_fetch(
                &k,
                || async {
                    Ok(calls.fetch_add(1, Ordering::SeqCst) as u32 + 1)
                },
                force,
            )
            .await
            .unwrap();
        assert_eq!(value, expected);
    }
    assert_eq!(cache.peek(&k), Some(2));
}

// ============================================================================
// Coalescing
// ============================================================================

#[tokio::test]
async fn concurrent_non_forced_reads_fetch_once() {
    let cache: QueryDedupCache<String, u32> = QueryDedupCache::new(None);
    let calls = AtomicUsize::new(0);
    let k = key("k");

    let fetch = || async {
        calls.fetch_add(1, Ordering::SeqCst);
        // suspend so the second caller arrives while we are in flight
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(42)
    };

    let (a, b) = tokio::join!(
        cache.get_or_fetch(&k, fetch, false),
        cache.get_or_fetch(&k, fetch, false),
    );

    assert_eq!(a.unwrap(), 42);
    assert_eq!(b.unwrap(), 42);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_forced_reads_coalesce_with_each_other() {
    let cache: QueryDedupCache<String, u32> = QueryDedupCache::new(None);
    let calls = AtomicUsize::new(0);
    let k = key("k");

    let fetch = || async {
        calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(42)
    };

    let (a, b) = tokio::join!(
        cache.get_or_fetch(&k, fetch, true),
        cache.get_or_fetch(&k, fetch, true),
    );

    assert_eq!(a.unwrap(), 42);
    assert_eq!(b.unwrap(), 42);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn forced_call_does_not_coalesce_with_non_forced_and_last_writer_wins() {
    let cache: Arc<QueryDedupCache<String, u32>> = Arc::new(QueryDedupCache::new(None));
    let calls = Arc::new(AtomicUsize::new(0));
    let k = key("k");

    // Non-forced call, gated so it stays in flight.
    let (release_slow, gate_slow) = oneshot::channel::<()>();
    let slow = tokio::spawn({
        let cache = cache.clone();
        let calls = calls.clone();
        let k = k.clone();
        async move {
            cache
                .get_or_fetch(
                    &k,
                    move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        gate_slow.await.ok();
                        Ok(1)
                    },
                    false,
                )
                .await
        }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;

    // Forced call while the non-forced one is in flight: a second fetch.
    let (release_forced, gate_forced) = oneshot::channel::<()>();
    let forced = tokio::spawn({
        let cache = cache.clone();
        let calls = calls.clone();
        let k = k.clone();
        async move {
            cache
                .get_or_fetch(
                    &k,
                    move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        gate_forced.await.ok();
                        Ok(2)
                    },
                    true,
                )
                .await
        }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2, "no coalescing across force");

    // Forced resolves first, non-forced resolves last: last writer wins.
    release_forced.send(()).unwrap();
    assert_eq!(forced.await.unwrap().unwrap(), 2);
    release_slow.send(()).unwrap();
    assert_eq!(slow.await.unwrap().unwrap(), 1);

    assert_eq!(cache.peek(&k), Some(1));
}

#[tokio::test]
async fn non_forced_call_joins_an_in_flight_forced_call() {
    let cache: Arc<QueryDedupCache<String, u32>> = Arc::new(QueryDedupCache::new(None));
    let calls = Arc::new(AtomicUsize::new(0));
    let k = key("k");

    let (release, gate) = oneshot::channel::<()>();
    let forced = tokio::spawn({
        let cache = cache.clone();
        let calls = calls.clone();
        let k = k.clone();
        async move {
            cache
                .get_or_fetch(
                    &k,
                    move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        gate.await.ok();
                        Ok(9)
                    },
                    true,
                )
                .await
        }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;

    let joined = tokio::spawn({
        let cache = cache.clone();
        let k = k.clone();
        async move {
            cache
                .get_or_fetch(&k, || async { unreachable!("must coalesce") }, false)
                .await
        }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;

    release.send(()).unwrap();
    assert_eq!(forced.await.unwrap().unwrap(), 9);
    assert_eq!(joined.await.unwrap().unwrap(), 9);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn dropped_runner_releases_the_key_for_the_next_read() {
    let cache: QueryDedupCache<String, u32> = QueryDedupCache::new(None);
    let calls = AtomicUsize::new(0);
    let k = key("k");

    // The caller driving the fetch gives up; its future is dropped mid-fetch.
    let abandoned = tokio::time::timeout(
        Duration::from_millis(20),
        cache.get_or_fetch(
            &k,
            || async { std::future::pending::<FetchResult<u32>>().await },
            false,
        ),
    )
    .await;
    assert!(abandoned.is_err(), "the fetch never resolves");
    assert_eq!(cache.status(&k), EntryStatus::Empty);

    // The key is not wedged: the next read runs its own fetch and completes.
    let value = tokio::time::timeout(
        Duration::from_millis(500),
        cache.get_or_fetch(
            &k,
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(4)
            },
            false,
        ),
    )
    .await
    .expect("read after an abandoned fetch must not hang")
    .unwrap();
    assert_eq!(value, 4);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.peek(&k), Some(4));
}

#[tokio::test]
async fn waiters_on_a_dropped_runner_are_told_and_can_retry() {
    let cache: Arc<QueryDedupCache<String, u32>> = Arc::new(QueryDedupCache::new(None));
    let k = key("k");

    let runner = tokio::spawn({
        let cache = cache.clone();
        let k = k.clone();
        async move {
            cache
                .get_or_fetch(
                    &k,
                    || async { std::future::pending::<FetchResult<u32>>().await },
                    false,
                )
                .await
        }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;

    let joined = tokio::spawn({
        let cache = cache.clone();
        let k = k.clone();
        async move {
            cache
                .get_or_fetch(&k, || async { unreachable!("must coalesce") }, false)
                .await
        }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;

    // Killing the runner must settle its waiters rather than strand them.
    runner.abort();
    let outcome = tokio::time::timeout(Duration::from_millis(500), joined)
        .await
        .expect("waiter must settle once the runner is gone")
        .unwrap();
    assert!(matches!(outcome, Err(QueryError::Dropped)));

    // And the key is free again.
    let value = cache.get_or_fetch(&k, || async { Ok(8) }, false).await.unwrap();
    assert_eq!(value, 8);
}

// ============================================================================
// Errors
// ============================================================================

#[tokio::test]
async fn fetch_errors_propagate_and_are_not_cached() {
    let cache: QueryDedupCache<String, u32> = QueryDedupCache::new(None);
    let calls = AtomicUsize::new(0);
    let k = key("k");

    let err = cache
        .get_or_fetch(
            &k,
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("registry unavailable".into())
            },
            false,
        )
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "registry unavailable");
    assert_eq!(cache.status(&k), EntryStatus::Error);

    // next access re-invokes the fetch rather than replaying the rejection
    let value = cache
        .get_or_fetch(
            &k,
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(5)
            },
            false,
        )
        .await
        .unwrap();
    assert_eq!(value, 5);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.status(&k), EntryStatus::Fresh);
}

#[tokio::test]
async fn coalesced_waiters_observe_the_same_error() {
    let cache: QueryDedupCache<String, u32> = QueryDedupCache::new(None);
    let k = key("k");

    let fetch = || async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        Err("boom".into())
    };

    let (a, b) = tokio::join!(
        cache.get_or_fetch(&k, fetch, false),
        cache.get_or_fetch(&k, fetch, false),
    );
    assert_eq!(a.unwrap_err().to_string(), "boom");
    assert_eq!(b.unwrap_err().to_string(), "boom");
}

// ============================================================================
// Invalidation and inspection
// ============================================================================

#[tokio::test]
async fn invalidate_marks_fresh_entries_stale() {
    let cache: QueryDedupCache<String, u32> = QueryDedupCache::new(None);
    let calls = AtomicUsize::new(0);
    let k = key("k");

    let fetch = || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(3)
    };
    cache.get_or_fetch(&k, fetch, false).await.unwrap();
    assert_eq!(cache.status(&k), EntryStatus::Fresh);

    cache.invalidate(&k);
    assert_eq!(cache.status(&k), EntryStatus::Stale);

    cache.get_or_fetch(&k, fetch, false).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn peek_and_status_never_trigger_fetches() {
    let cache: QueryDedupCache<String, u32> = QueryDedupCache::new(None);
    let k = key("never-fetched");

    assert_eq!(cache.peek(&k), None);
    assert_eq!(cache.status(&k), EntryStatus::Empty);
}

#[tokio::test]
async fn clear_drops_cached_values() {
    let cache: QueryDedupCache<String, u32> = QueryDedupCache::new(None);
    let k = key("k");

    cache.get_or_fetch(&k, || async { Ok(1) }, false).await.unwrap();
    cache.clear();
    assert_eq!(cache.peek(&k), None);
    assert_eq!(cache.status(&k), EntryStatus::Empty);
}

#[tokio::test]
async fn operation_in_flight_across_clear_settles_into_a_fresh_slot() {
    let cache: Arc<QueryDedupCache<String, u32>> = Arc::new(QueryDedupCache::new(None));
    let k = key("k");

    let (release, gate) = oneshot::channel::<()>();
    let runner = tokio::spawn({
        let cache = cache.clone();
        let k = k.clone();
        async move {
            cache
                .get_or_fetch(
                    &k,
                    move || async move {
                        gate.await.ok();
                        Ok(6)
                    },
                    false,
                )
                .await
        }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;

    cache.clear();
    assert_eq!(cache.peek(&k), None);

    // The outstanding fetch is not cancelled; its result lands in a new slot.
    release.send(()).unwrap();
    assert_eq!(runner.await.unwrap().unwrap(), 6);
    assert_eq!(cache.peek(&k), Some(6));
    assert_eq!(cache.status(&k), EntryStatus::Fresh);
}
