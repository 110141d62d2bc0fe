//! Data models
//!
//! Storefront payloads held by the cache, and the DTOs returned by the
//! admin API.

pub mod responses;
pub mod store;

// Re-export commonly used types
pub use responses::{
    HealthResponse, InvalidateResponse, KindStatsResponse, StatsResponse,
    SweepResponse,
};
pub use store::{
    Category, CategoryList, Product, ProductPage, Review, ReviewPage, ReviewStats, StoreProfile,
};
