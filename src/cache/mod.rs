//! Cache Module
//!
//! Local TTL cache for store-facing data: key builder, TTL policy, entry
//! codec, storage engine and the per-entity facades built on them.

mod clock;
mod entry;
mod facade;
mod kind;
pub mod keys;
mod stats;
mod storage;
mod storefront;
mod ttl;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{unwrap_entry, CacheEntry, CacheLookup, Cached, EntryMeta, LookupReason};
pub use facade::{CategoryCache, EntityCache, ProductPageCache, ProfileCache, ReviewPageCache};
pub use kind::EntityKind;
pub use keys::build_key;
pub use stats::{CacheStats, StatsRecorder};
pub use storage::StorageEngine;
pub use storefront::{InvalidationReport, StorefrontCache};
pub use ttl::TtlPolicy;
