//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of the cache.
//!
//! # Tasks
//! - Expiry Sweeper: Deletes expired cache entries at configured intervals

mod sweeper;

pub use sweeper::{spawn_sweeper, sweep_once, SweepReport, SweeperHandle};
