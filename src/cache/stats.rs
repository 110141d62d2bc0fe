//! Cache Statistics Module
//!
//! Per-kind counters for reads, writes and deletions. Counters are atomic so
//! facades can record from concurrent tasks without a lock.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::cache::{EntityKind, LookupReason};

// == Cache Stats ==
/// Snapshot of the counters for one entity kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Fresh hits
    pub hits: u64,
    /// Expired entries returned as stale data
    pub stale_hits: u64,
    /// Lookups with no entry (including reads while storage is unavailable)
    pub misses: u64,
    /// Entries that failed to decode
    pub corrupted: u64,
    /// Successful saves (one per logical save, not per alias)
    pub writes: u64,
    /// Saves dropped because the store rejected them
    pub write_failures: u64,
    /// Entries removed by owner invalidation
    pub invalidated: u64,
    /// Entries removed by the expiry sweeper
    pub swept: u64,
}

impl CacheStats {
    // == Hit Rate ==
    /// Fresh hits over all lookups, or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.stale_hits + self.misses + self.corrupted;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
struct KindCounters {
    hits: AtomicU64,
    stale_hits: AtomicU64,
    misses: AtomicU64,
    corrupted: AtomicU64,
    writes: AtomicU64,
    write_failures: AtomicU64,
    invalidated: AtomicU64,
    swept: AtomicU64,
}

impl KindCounters {
    fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            stale_hits: self.stale_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            corrupted: self.corrupted.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            invalidated: self.invalidated.load(Ordering::Relaxed),
            swept: self.swept.load(Ordering::Relaxed),
        }
    }
}

// == Stats Recorder ==
/// Shared counters for every entity kind.
#[derive(Debug, Default)]
pub struct StatsRecorder {
    kinds: [KindCounters; 4],
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn counters(&self, kind: EntityKind) -> &KindCounters {
        &self.kinds[kind.index()]
    }

    /// Records the outcome of one lookup; `None` is a fresh hit.
    pub fn record_lookup(&self, kind: EntityKind, reason: Option<LookupReason>) {
        let counters = self.counters(kind);
        let counter = match reason {
            None => &counters.hits,
            Some(LookupReason::Expired) => &counters.stale_hits,
            Some(LookupReason::NotFound) => &counters.misses,
            Some(LookupReason::Corrupted) => &counters.corrupted,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self, kind: EntityKind) {
        self.counters(kind).writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write_failure(&self, kind: EntityKind) {
        self.counters(kind)
            .write_failures
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalidated(&self, kind: EntityKind, count: u64) {
        self.counters(kind)
            .invalidated
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_swept(&self, kind: EntityKind, count: u64) {
        self.counters(kind).swept.fetch_add(count, Ordering::Relaxed);
    }

    /// Current counters for one kind.
    pub fn kind(&self, kind: EntityKind) -> CacheStats {
        self.counters(kind).snapshot()
    }

    /// Current counters for every kind.
    pub fn snapshot(&self) -> BTreeMap<EntityKind, CacheStats> {
        EntityKind::ALL
            .iter()
            .map(|kind| (*kind, self.kind(*kind)))
            .collect()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let recorder = StatsRecorder::new();
        let stats = recorder.kind(EntityKind::Profile);
        assert_eq!(stats, CacheStats::default());
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let recorder = StatsRecorder::new();
        recorder.record_lookup(EntityKind::Products, None);
        recorder.record_lookup(EntityKind::Products, Some(LookupReason::Expired));
        recorder.record_lookup(EntityKind::Products, Some(LookupReason::NotFound));
        recorder.record_lookup(EntityKind::Products, Some(LookupReason::Corrupted));

        let stats = recorder.kind(EntityKind::Products);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.stale_hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.corrupted, 1);
        assert_eq!(stats.hit_rate(), 0.25);
    }

    #[test]
    fn test_kinds_are_counted_separately() {
        let recorder = StatsRecorder::new();
        recorder.record_write(EntityKind::Reviews);
        recorder.record_swept(EntityKind::Categories, 3);
        recorder.record_invalidated(EntityKind::Categories, 2);

        let snapshot = recorder.snapshot();
        assert_eq!(snapshot.len(), 4);
        assert_eq!(snapshot[&EntityKind::Reviews].writes, 1);
        assert_eq!(snapshot[&EntityKind::Categories].swept, 3);
        assert_eq!(snapshot[&EntityKind::Categories].invalidated, 2);
        assert_eq!(snapshot[&EntityKind::Profile], CacheStats::default());
    }
}
