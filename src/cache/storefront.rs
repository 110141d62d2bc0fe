//! Storefront Cache Module
//!
//! The cache component handed to UI and data-loading callers: owns the
//! storage engine, the four entity facades and the expiry sweeper, and
//! carries the cross-entity invalidation.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::cache::facade::CacheContext;
use crate::cache::{
    CacheStats, CategoryCache, Clock, EntityKind, ProductPageCache, ProfileCache,
    ReviewPageCache, StatsRecorder, StorageEngine, SystemClock, TtlPolicy,
};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::tasks::{spawn_sweeper, sweep_once, SweepReport, SweeperHandle};

// == Invalidation Report ==
/// Entries removed per kind by one owner invalidation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvalidationReport {
    pub profile: u64,
    pub products: u64,
    pub categories: u64,
    pub reviews: u64,
}

impl InvalidationReport {
    pub fn total(&self) -> u64 {
        self.profile + self.products + self.categories + self.reviews
    }
}

// == Storefront Cache ==
/// Local cache for store-facing data.
///
/// Construct one per process (or per test) and pass it to callers; there is
/// no global instance. `init` opens storage and starts the sweeper,
/// `teardown` stops the sweeper and flushes storage.
pub struct StorefrontCache {
    pub profiles: ProfileCache,
    pub products: ProductPageCache,
    pub categories: CategoryCache,
    pub reviews: ReviewPageCache,
    ctx: CacheContext,
    sweep_interval: std::time::Duration,
    sweeper: Mutex<Option<SweeperHandle>>,
}

impl std::fmt::Debug for StorefrontCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontCache")
            .field("engine", &self.ctx.engine)
            .field("ttl", &self.ctx.ttl)
            .field("sweep_interval", &self.sweep_interval)
            .finish()
    }
}

impl StorefrontCache {
    // == Constructors ==
    /// Opens storage without starting the sweeper.
    ///
    /// If the storage engine cannot be opened the cache still comes up, in
    /// always-miss mode.
    pub fn open(config: &Config) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Like [`StorefrontCache::open`] with an injected clock.
    pub fn with_clock(config: &Config, clock: Arc<dyn Clock>) -> Self {
        let engine = match StorageEngine::open(&config.cache_dir, config.map_size_mb) {
            Ok(engine) => engine,
            Err(e) => {
                warn!(
                    "Failed to open cache storage at {}: {}; caching disabled",
                    config.cache_dir.display(),
                    e
                );
                StorageEngine::disabled()
            }
        };
        Self::from_parts(engine, clock, config.ttl_policy(), config.sweep_interval())
    }

    /// Assembles a cache around an already opened engine.
    pub fn from_parts(
        engine: StorageEngine,
        clock: Arc<dyn Clock>,
        ttl: TtlPolicy,
        sweep_interval: std::time::Duration,
    ) -> Self {
        let ctx = CacheContext {
            engine,
            clock,
            ttl,
            stats: Arc::new(StatsRecorder::new()),
        };

        Self {
            profiles: ProfileCache::new(EntityKind::Profile, ctx.clone()),
            products: ProductPageCache::new(EntityKind::Products, ctx.clone()),
            categories: CategoryCache::new(EntityKind::Categories, ctx.clone()),
            reviews: ReviewPageCache::new(EntityKind::Reviews, ctx.clone()),
            ctx,
            sweep_interval,
            sweeper: Mutex::new(None),
        }
    }

    /// Opens storage and starts the expiry sweeper.
    pub async fn init(config: &Config) -> Self {
        let cache = Self::open(config);
        if let Err(e) = cache.start_sweeper().await {
            warn!("Expiry sweeper not started: {}", e);
        }
        cache
    }

    // == Sweeper Lifecycle ==
    /// Starts the background sweeper. Fails if it is already running.
    pub async fn start_sweeper(&self) -> Result<()> {
        let mut sweeper = self.sweeper.lock().await;
        if sweeper.is_some() {
            return Err(CacheError::SweeperAlreadyRunning);
        }
        if !self.ctx.engine.is_available() {
            return Err(CacheError::Unavailable);
        }

        *sweeper = Some(spawn_sweeper(
            self.ctx.engine.clone(),
            self.ctx.clock.clone(),
            self.ctx.stats.clone(),
            self.sweep_interval,
        ));
        Ok(())
    }

    pub async fn sweeper_running(&self) -> bool {
        self.sweeper.lock().await.is_some()
    }

    /// Runs one sweep cycle immediately, independent of the background task.
    pub async fn sweep_now(&self) -> SweepReport {
        sweep_once(&self.ctx.engine, self.ctx.clock.as_ref(), &self.ctx.stats).await
    }

    /// Stops the sweeper and flushes storage to disk.
    pub async fn teardown(self) {
        if let Some(handle) = self.sweeper.into_inner() {
            handle.shutdown().await;
        }
        if self.ctx.engine.is_available() {
            if let Err(e) = self.ctx.engine.sync().await {
                warn!("Failed to sync cache storage on teardown: {}", e);
            }
        }
        info!("Storefront cache torn down");
    }

    // == Cross-Entity Invalidation ==
    /// Removes every cached entry of every kind owned by `owner_id`, so the
    /// next read of any of them misses.
    pub async fn invalidate_all_for_owner(&self, owner_id: &str) -> InvalidationReport {
        let (profile, products, categories, reviews) = tokio::join!(
            self.profiles.invalidate_owner(owner_id),
            self.products.invalidate_owner(owner_id),
            self.categories.invalidate_owner(owner_id),
            self.reviews.invalidate_owner(owner_id),
        );

        let report = InvalidationReport {
            profile,
            products,
            categories,
            reviews,
        };
        info!(
            "Invalidated {} cached entries for owner {}",
            report.total(),
            owner_id
        );
        report
    }

    // == Introspection ==
    pub fn is_available(&self) -> bool {
        self.ctx.engine.is_available()
    }

    pub fn ttl_policy(&self) -> TtlPolicy {
        self.ctx.ttl
    }

    /// Counters per kind.
    pub fn stats(&self) -> BTreeMap<EntityKind, CacheStats> {
        self.ctx.stats.snapshot()
    }

    /// Stored entries of `kind`; 0 when storage is unavailable.
    pub async fn entry_count(&self, kind: EntityKind) -> u64 {
        self.ctx.engine.len(kind).await.unwrap_or(0)
    }
}
