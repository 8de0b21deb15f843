use std::time::{Duration, Instant};

/// Per-key cache state machine:
/// `Empty → Loading → {Fresh, Error}`, `Fresh → Stale` after the TTL,
/// `Stale`/`Error` → `Loading` on next access. Errors are never terminal —
/// the next read retries instead of replaying the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Empty,
    Loading,
    Fresh,
    Stale,
    Error,
}

/// The cached value and status for one key. Survives across operations;
/// in-flight coalescing markers live separately and are cleared when an
/// operation settles.
#[derive(Debug, Clone)]
pub(crate) struct CacheSlot<V> {
    pub value: Option<V>,
    pub status: EntryStatus,
    pub fetched_at: Option<Instant>,
}

impl<V> CacheSlot<V> {
    pub fn new() -> Self {
        Self {
            value: None,
            status: EntryStatus::Empty,
            fetched_at: None,
        }
    }

    /// Status with staleness applied: `Fresh` degrades to `Stale` once
    /// `stale_time` has elapsed since the last successful fetch. Computed on
    /// read — no timers.
    pub fn effective_status(&self, stale_time: Duration) -> EntryStatus {
        match self.status {
            EntryStatus::Fresh => match self.fetched_at {
                Some(at) if at.elapsed() >= stale_time => EntryStatus::Stale,
                _ => EntryStatus::Fresh,
            },
            other => other,
        }
    }

    pub fn store_success(&mut self, value: V) {
        self.value = Some(value);
        self.status = EntryStatus::Fresh;
        self.fetched_at = Some(Instant::now());
    }

    /// A failed fetch keeps any previously cached value but marks the slot
    /// so the next access refetches rather than serving a stale success.
    pub fn store_error(&mut self) {
        self.status = EntryStatus::Error;
    }
}
