//! API Module
//!
//! HTTP handlers and routing for the cache admin API. Out-of-process
//! mutation flows use it to invalidate an owner's cached data.
//!
//! # Endpoints
//! - `DELETE /owners/:owner_id` - Invalidate all cached data of an owner
//! - `POST /sweep` - Run one expiry sweep
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
