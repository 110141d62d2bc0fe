//! API Handlers
//!
//! HTTP request handlers for the cache admin endpoints.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::{EntityKind, StorefrontCache};
use crate::error::{CacheError, Result};
use crate::models::{
    HealthResponse, InvalidateResponse, KindStatsResponse, StatsResponse, SweepResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The process-wide cache component
    pub cache: Arc<StorefrontCache>,
}

impl AppState {
    /// Creates a new AppState around an initialized cache.
    pub fn new(cache: Arc<StorefrontCache>) -> Self {
        Self { cache }
    }
}

/// Handler for DELETE /owners/:owner_id
///
/// Drops every cached entry of every kind for the owner, so the next read
/// goes to the network.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
) -> Result<Json<InvalidateResponse>> {
    if owner_id.trim().is_empty() {
        return Err(CacheError::InvalidRequest(
            "Owner id cannot be empty".to_string(),
        ));
    }

    let removed = state.cache.invalidate_all_for_owner(&owner_id).await;

    Ok(Json(InvalidateResponse::new(owner_id, removed)))
}

/// Handler for POST /sweep
///
/// Runs one expiry sweep right away.
pub async fn sweep_handler(State(state): State<AppState>) -> Result<Json<SweepResponse>> {
    if !state.cache.is_available() {
        return Err(CacheError::Unavailable);
    }

    let removed = state.cache.sweep_now().await;

    Ok(Json(SweepResponse::new(removed)))
}

/// Handler for GET /stats
///
/// Returns per-kind counters and stored entry counts.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let counters = state.cache.stats();
    let mut kinds = BTreeMap::new();

    for kind in EntityKind::ALL {
        let entries = state.cache.entry_count(kind).await;
        let kind_counters = counters.get(&kind).cloned().unwrap_or_default();
        kinds.insert(kind, KindStatsResponse::new(kind_counters, entries));
    }

    Json(StatsResponse::new(state.cache.is_available(), kinds))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(
        state.cache.is_available(),
        state.cache.sweeper_running().await,
    ))
}
