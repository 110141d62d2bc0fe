//! Key Builder Module
//!
//! Deterministic string keys for every cached entity. Keys are hit targets
//! for data written by earlier processes, so nothing here may depend on
//! time, randomness or process state.

use crate::cache::EntityKind;

/// Page used when a paginated key is built without an explicit page.
pub const FIRST_PAGE: u32 = 1;

// == Build Key ==
/// Builds the storage key for `kind`.
///
/// `id` is the alias for profiles and the store id for every other kind.
/// `page` only applies to paginated kinds and defaults to [`FIRST_PAGE`].
pub fn build_key(kind: EntityKind, id: &str, page: Option<u32>) -> String {
    if kind.is_paginated() {
        format!("{}:{}:{}", kind, id, page.unwrap_or(FIRST_PAGE))
    } else {
        format!("{}:{}", kind, id)
    }
}

/// `profile:{alias}`
pub fn profile_key(alias: &str) -> String {
    build_key(EntityKind::Profile, alias, None)
}

/// `products:{storeId}:{page}`
pub fn products_key(store_id: &str, page: u32) -> String {
    build_key(EntityKind::Products, store_id, Some(page))
}

/// `categories:{storeId}`
pub fn categories_key(store_id: &str) -> String {
    build_key(EntityKind::Categories, store_id, None)
}

/// `reviews:{storeId}:{page}`
pub fn reviews_key(store_id: &str, page: u32) -> String {
    build_key(EntityKind::Reviews, store_id, Some(page))
}
