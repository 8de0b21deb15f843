use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::{FetchError, FetchResult, QueryError};

use super::entry::{CacheSlot, EntryStatus};

/// Matches the registry API's default staleness window.
const DEFAULT_STALE_TIME: Duration = Duration::from_secs(60);

// ============================================================================
// In-flight marker
// ============================================================================

/// One outstanding fetch for a key. Callers that arrive while it runs
/// register a waiter and receive the same result; the marker's identity
/// (`Arc` pointer) is what lets completion clear only its own entry.
struct InFlightOp<V> {
    forced: bool,
    waiters: Mutex<Vec<oneshot::Sender<Result<V, QueryError>>>>,
}

/// Keeps the Run path honest under cancellation. If the future driving the
/// fetch is dropped before it settles (a `timeout` wrapper, an aborted
/// task), the marker must not be left pointing at a dead operation — that
/// would wedge the key, with every later non-forced read joining a waiter
/// queue nobody will ever drain. On drop without settling: release the
/// marker and the `Loading` status if still ours, and tell registered
/// waiters the operation was dropped so their callers can refetch.
struct RunGuard<'a, K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    inner: &'a Mutex<CacheInner<K, V>>,
    key: K,
    op: Arc<InFlightOp<V>>,
    settled: bool,
}

impl<K, V> Drop for RunGuard<'_, K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let waiters = {
            let mut inner = self.inner.lock();
            let still_ours = inner
                .in_flight
                .get(&self.key)
                .is_some_and(|current| Arc::ptr_eq(current, &self.op));
            if still_ours {
                inner.in_flight.remove(&self.key);
                // A replaced marker means another operation owns the slot
                // now; only reset Loading when the slot is ours to reset.
                if let Some(slot) = inner.slots.get_mut(&self.key) {
                    if slot.status == EntryStatus::Loading {
                        slot.status = if slot.value.is_some() {
                            EntryStatus::Stale
                        } else {
                            EntryStatus::Empty
                        };
                    }
                }
            }
            self.op.waiters.lock().drain(..).collect::<Vec<_>>()
        };
        for tx in waiters {
            let _ = tx.send(Err(QueryError::Dropped));
        }
    }
}

/// What a caller should do, decided in one critical section.
enum Decision<V> {
    /// Slot is fresh and nothing is in flight — use the cached value.
    Cached(V),
    /// An operation is already in flight — await its result.
    Join(oneshot::Receiver<Result<V, QueryError>>),
    /// This caller runs the fetch, publishing results through the marker.
    Run(Arc<InFlightOp<V>>),
}

// ============================================================================
// QueryDedupCache
// ============================================================================

/// Get-or-fetch layer over a keyed, TTL-aware cache.
///
/// All bookkeeping — slot creation, staleness check, marker check and marker
/// write — happens inside a single mutex critical section with no suspension
/// point, so a second caller in the same scheduling window always observes
/// the first caller's marker. That ordering carries the at-most-one-fetch
/// guarantee; the awaits happen strictly outside the lock.
///
/// Fetch functions are opaque collaborators: their errors propagate to the
/// caller unchanged and are never retried or logged by the cache itself.
pub struct QueryDedupCache<K, V> {
    stale_time: Duration,
    inner: Mutex<CacheInner<K, V>>,
}

struct CacheInner<K, V> {
    slots: HashMap<K, CacheSlot<V>>,
    in_flight: HashMap<K, Arc<InFlightOp<V>>>,
}

impl<K, V> Default for QueryDedupCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new(None)
    }
}

impl<K, V> QueryDedupCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// `stale_time` governs how long a successful fetch is served without
    /// hitting the network again (default 60 s). Zero means every non-forced
    /// read refetches.
    pub fn new(stale_time: Option<Duration>) -> Self {
        Self {
            stale_time: stale_time.unwrap_or(DEFAULT_STALE_TIME),
            inner: Mutex::new(CacheInner {
                slots: HashMap::new(),
                in_flight: HashMap::new(),
            }),
        }
    }

    /// Return the value for `key`, fetching if the staleness policy or
    /// `force` requires it.
    ///
    /// `force = true` always invokes `fetch`, discarding any non-forced
    /// in-flight marker (both operations complete; last writer wins on the
    /// cached value) but coalescing with an in-flight forced call.
    /// `force = false` serves a fresh cached value, joins any in-flight
    /// operation, and otherwise fetches (status `Empty`, `Stale` or `Error`).
    pub async fn get_or_fetch<F, Fut>(&self, key: &K, fetch: F, force: bool) -> Result<V, QueryError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchResult<V>>,
    {
        let decision = self.inner.lock().decide(key, force, self.stale_time);

        let op = match decision {
            Decision::Cached(value) => return Ok(value),
            Decision::Join(rx) => {
                return rx.await.unwrap_or(Err(QueryError::Dropped));
            }
            Decision::Run(op) => op,
        };

        // From here to publication this future owns the key's marker; the
        // guard releases it if the caller stops awaiting before the fetch
        // settles, so a cancelled runner never wedges the key.
        let mut run = RunGuard {
            inner: &self.inner,
            key: key.clone(),
            op,
            settled: false,
        };

        let result = fetch()
            .await
            .map_err(|e| QueryError::Fetch(FetchError::new(e)));
        run.settled = true;

        // Publish under the same lock that guards joins: a waiter either
        // registered before this section (and is drained here) or finds the
        // marker gone and starts its own operation. The slot may have been
        // dropped by `clear()` mid-flight; the result lands in a fresh one.
        let waiters = {
            let mut inner = self.inner.lock();
            let slot = inner.slots.entry(key.clone()).or_insert_with(CacheSlot::new);
            match &result {
                Ok(value) => slot.store_success(value.clone()),
                Err(_) => slot.store_error(),
            }
            // Clear the marker only if it is still ours — a newer forced
            // call may have replaced it.
            let still_ours = inner
                .in_flight
                .get(key)
                .is_some_and(|current| Arc::ptr_eq(current, &run.op));
            if still_ours {
                inner.in_flight.remove(key);
            }
            run.op.waiters.lock().drain(..).collect::<Vec<_>>()
        };

        for tx in waiters {
            let _ = tx.send(result.clone());
        }
        result
    }

    /// Cached value for `key`, if any, regardless of staleness. Never
    /// triggers a fetch or changes status.
    pub fn peek(&self, key: &K) -> Option<V> {
        self.inner
            .lock()
            .slots
            .get(key)
            .and_then(|slot| slot.value.clone())
    }

    /// Effective status for `key`, staleness applied. `Empty` for keys never
    /// accessed.
    pub fn status(&self, key: &K) -> EntryStatus {
        self.inner
            .lock()
            .slots
            .get(key)
            .map(|slot| slot.effective_status(self.stale_time))
            .unwrap_or(EntryStatus::Empty)
    }

    /// Mark a fresh entry stale so the next non-forced read refetches.
    pub fn invalidate(&self, key: &K) {
        if let Some(slot) = self.inner.lock().slots.get_mut(key) {
            if slot.status == EntryStatus::Fresh {
                slot.status = EntryStatus::Stale;
            }
        }
    }

    /// Drop every cached value and status. In-flight operations are not
    /// cancelled; they settle into fresh slots.
    pub fn clear(&self) {
        self.inner.lock().slots.clear();
    }
}

impl<K, V> CacheInner<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// The decision step. Runs entirely under the cache lock; must not block.
    fn decide(&mut self, key: &K, force: bool, stale_time: Duration) -> Decision<V> {
        let slot = self.slots.entry(key.clone()).or_insert_with(CacheSlot::new);
        let status = slot.effective_status(stale_time);

        let replacing = match self.in_flight.get(key) {
            // Non-forced calls join anything in flight; forced calls join
            // only an already-forced operation.
            Some(existing) if !force || existing.forced => {
                let (tx, rx) = oneshot::channel();
                existing.waiters.lock().push(tx);
                return Decision::Join(rx);
            }
            // Forced call with a non-forced operation in flight: the old
            // operation keeps running for its own callers, but the marker
            // now belongs to the forced one.
            Some(_) => true,
            None => false,
        };

        if !force && status == EntryStatus::Fresh {
            if let Some(value) = self.slots.get(key).and_then(|s| s.value.clone()) {
                return Decision::Cached(value);
            }
        }

        if replacing {
            tracing::warn!("forced refresh is replacing a non-forced in-flight fetch");
        }
        tracing::debug!(force, ?status, "starting fetch");

        let op = Arc::new(InFlightOp {
            forced: force,
            waiters: Mutex::new(Vec::new()),
        });
        self.in_flight.insert(key.clone(), op.clone());
        if let Some(slot) = self.slots.get_mut(key) {
            slot.status = EntryStatus::Loading;
        }
        Decision::Run(op)
    }
}
