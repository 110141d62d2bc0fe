//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cache::{CacheStats, EntityKind, InvalidationReport};
use crate::tasks::SweepReport;

/// Counters and entry count for one entity kind
#[derive(Debug, Clone, Serialize)]
pub struct KindStatsResponse {
    #[serde(flatten)]
    pub counters: CacheStats,
    /// Entries currently stored
    pub entries: u64,
    /// Fresh hits over all lookups
    pub hit_rate: f64,
}

impl KindStatsResponse {
    pub fn new(counters: CacheStats, entries: u64) -> Self {
        let hit_rate = counters.hit_rate();
        Self {
            counters,
            entries,
            hit_rate,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Whether the storage engine is open
    pub storage_available: bool,
    /// Sum of stored entries over every kind
    pub total_entries: u64,
    pub kinds: BTreeMap<EntityKind, KindStatsResponse>,
}

impl StatsResponse {
    pub fn new(storage_available: bool, kinds: BTreeMap<EntityKind, KindStatsResponse>) -> Self {
        let total_entries = kinds.values().map(|kind| kind.entries).sum();
        Self {
            storage_available,
            total_entries,
            kinds,
        }
    }
}

/// Response body for owner invalidation (DELETE /owners/:owner_id)
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub owner_id: String,
    pub removed: InvalidationReport,
    pub total: u64,
}

impl InvalidateResponse {
    pub fn new(owner_id: impl Into<String>, removed: InvalidationReport) -> Self {
        let total = removed.total();
        Self {
            owner_id: owner_id.into(),
            removed,
            total,
        }
    }
}

/// Response body for a manual sweep (POST /sweep)
#[derive(Debug, Clone, Serialize)]
pub struct SweepResponse {
    pub removed: SweepReport,
    pub total: u64,
}

impl SweepResponse {
    pub fn new(removed: SweepReport) -> Self {
        let total = removed.total();
        Self { removed, total }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// "available" or "unavailable"; an unavailable store means every read misses
    pub storage: String,
    pub sweeper_running: bool,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp. The service stays
    /// healthy without storage since callers fall back to the network.
    pub fn healthy(storage_available: bool, sweeper_running: bool) -> Self {
        let storage = if storage_available {
            "available"
        } else {
            "unavailable"
        };
        Self {
            status: "healthy".to_string(),
            storage: storage.to_string(),
            sweeper_running,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
