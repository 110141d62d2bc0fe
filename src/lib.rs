//! Storefront Cache - local TTL cache for store-facing data
//!
//! Caches store profiles, product pages, category lists and review pages in
//! an embedded LMDB store, with per-kind TTLs, cross-entity invalidation and
//! a background expiry sweeper.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::StorefrontCache;
pub use config::Config;
pub use tasks::spawn_sweeper;
