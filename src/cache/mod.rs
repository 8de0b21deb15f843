//! Keyed, TTL-aware get-or-fetch with per-key request coalescing.
//!
//! Two logically simultaneous readers of the same key must never cause two
//! network calls; a forced refresh bypasses staleness but still coalesces
//! with another forced refresh already in flight.

pub mod dedup;
pub mod entry;

pub use dedup::QueryDedupCache;
pub use entry::EntryStatus;
