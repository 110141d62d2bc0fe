//! Expiry Sweeper Task
//!
//! Background task that deletes expired entries from every entity store.
//! Reads never depend on it having run: `get` checks expiry itself. The
//! sweeper only bounds storage growth from entries nobody reads again.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cache::{Clock, EntityKind, StatsRecorder, StorageEngine};

// == Sweep Report ==
/// Entries removed per kind by one sweep cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub profile: u64,
    pub products: u64,
    pub categories: u64,
    pub reviews: u64,
}

impl SweepReport {
    pub fn total(&self) -> u64 {
        self.profile + self.products + self.categories + self.reviews
    }

    fn set(&mut self, kind: EntityKind, removed: u64) {
        match kind {
            EntityKind::Profile => self.profile = removed,
            EntityKind::Products => self.products = removed,
            EntityKind::Categories => self.categories = removed,
            EntityKind::Reviews => self.reviews = removed,
        }
    }
}

// == Sweep Once ==
/// Runs one sweep over every kind. A failing kind is logged and skipped.
pub async fn sweep_once(
    engine: &StorageEngine,
    clock: &dyn Clock,
    stats: &StatsRecorder,
) -> SweepReport {
    let now_ms = clock.now_ms();
    let mut report = SweepReport::default();

    for kind in EntityKind::ALL {
        match engine.sweep_expired(kind, now_ms).await {
            Ok(removed) => {
                stats.record_swept(kind, removed);
                report.set(kind, removed);
            }
            Err(e) => warn!("Expiry sweep failed for {}: {}", kind, e),
        }
    }

    report
}

// == Sweeper Handle ==
/// Owned handle to the running sweeper.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signals the task to stop and waits for it to finish. An in-flight
    /// sweep completes first.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!("Expiry sweeper ended abnormally: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawns the sweeper.
///
/// The first cycle runs immediately, cleaning up entries left over from a
/// previous session, then one cycle per `interval`.
///
/// # Example
/// ```ignore
/// let handle = spawn_sweeper(engine, Arc::new(SystemClock), stats, Duration::from_secs(300));
/// // Later, during shutdown:
/// handle.shutdown().await;
/// ```
pub fn spawn_sweeper(
    engine: StorageEngine,
    clock: Arc<dyn Clock>,
    stats: Arc<StatsRecorder>,
    interval: Duration,
) -> SweeperHandle {
    let (shutdown, mut shutdown_rx) = watch::channel(false);
    // tokio's interval panics on a zero period
    let period = interval.max(Duration::from_millis(1));

    let task = tokio::spawn(async move {
        info!(
            "Starting expiry sweeper with interval of {} seconds",
            period.as_secs()
        );

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown_rx.changed() => break,
            }

            let report = sweep_once(&engine, clock.as_ref(), &stats).await;
            if report.total() > 0 {
                info!(
                    "Expiry sweep: removed {} entries (profile={}, products={}, categories={}, reviews={})",
                    report.total(),
                    report.profile,
                    report.products,
                    report.categories,
                    report.reviews
                );
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }

        info!("Expiry sweeper stopped");
    });

    SweeperHandle { shutdown, task }
}
