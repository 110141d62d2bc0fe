//! Entity Cache Module
//!
//! Per-kind save/get/invalidate facades. A facade composes the key builder,
//! the TTL policy, the entry codec and the storage engine.
//!
//! Facades are fail-open: a storage failure is logged and counted, never
//! returned. A failed read is a miss and a failed write is skipped, since
//! every caller can fall back to the network.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::keys::{categories_key, products_key, profile_key, reviews_key};
use crate::cache::{
    unwrap_entry, CacheEntry, CacheLookup, Clock, EntityKind, LookupReason, StatsRecorder,
    StorageEngine, TtlPolicy,
};
use crate::error::{CacheError, Result};
use crate::models::{CategoryList, ProductPage, ReviewPage, StoreProfile};

// == Cache Context ==
/// Collaborators shared by every facade of one cache instance.
#[derive(Clone)]
pub(crate) struct CacheContext {
    pub engine: StorageEngine,
    pub clock: Arc<dyn Clock>,
    pub ttl: TtlPolicy,
    pub stats: Arc<StatsRecorder>,
}

// == Entity Cache ==
/// Cache facade for one entity kind holding payloads of type `P`.
pub struct EntityCache<P> {
    kind: EntityKind,
    ctx: CacheContext,
    _payload: PhantomData<fn() -> P>,
}

/// Store profiles, one entry per alias.
pub type ProfileCache = EntityCache<StoreProfile>;
/// Product listing pages.
pub type ProductPageCache = EntityCache<ProductPage>;
/// Category lists, one entry per store.
pub type CategoryCache = EntityCache<CategoryList>;
/// Review pages with their rating stats.
pub type ReviewPageCache = EntityCache<ReviewPage>;

impl<P> Clone for EntityCache<P> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            ctx: self.ctx.clone(),
            _payload: PhantomData,
        }
    }
}

impl<P> std::fmt::Debug for EntityCache<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityCache")
            .field("kind", &self.kind)
            .field("ttl", &self.ctx.ttl.ttl(self.kind))
            .field("engine", &self.ctx.engine)
            .finish()
    }
}

impl<P> EntityCache<P>
where
    P: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub(crate) fn new(kind: EntityKind, ctx: CacheContext) -> Self {
        Self {
            kind,
            ctx,
            _payload: PhantomData,
        }
    }

    // == Write ==
    /// Wraps `payload` once and writes that snapshot under every key in one
    /// transaction. `keys` must not be empty.
    ///
    /// With `replace_owner` set, the owner's existing entries of this kind
    /// are dropped in the same transaction, so keys missing from `keys` do
    /// not keep an older snapshot.
    async fn write(&self, owner_id: &str, keys: Vec<String>, payload: &P, replace_owner: bool) {
        if owner_id.is_empty() || keys.is_empty() {
            warn!("Skipping {} cache write with empty owner id", self.kind);
            return;
        }

        let entry = CacheEntry::wrap(
            keys[0].clone(),
            owner_id,
            payload,
            self.ctx.ttl.ttl_ms(self.kind),
            self.ctx.clock.now_ms(),
        );
        let meta = entry.meta();
        let records: Result<Vec<(String, Vec<u8>)>> = keys
            .into_iter()
            .map(|key| entry.encode_as(&key).map(|bytes| (key, bytes)))
            .collect();
        let records = match records {
            Ok(records) => records,
            Err(e) => {
                warn!("Failed to encode {} entry for {}: {}", self.kind, owner_id, e);
                self.ctx.stats.record_write_failure(self.kind);
                return;
            }
        };

        let key_count = records.len();
        let written = if replace_owner {
            self.ctx
                .engine
                .replace_owner_entries(self.kind, records, meta)
                .await
        } else {
            self.ctx.engine.put_many(self.kind, records, meta).await
        };
        match written {
            Ok(()) => {
                self.ctx.stats.record_write(self.kind);
                debug!("Cached {} for {} under {} key(s)", self.kind, owner_id, key_count);
            }
            Err(CacheError::Unavailable) => {
                self.ctx.stats.record_write_failure(self.kind);
                debug!("Storage unavailable, {} write for {} skipped", self.kind, owner_id);
            }
            Err(e) => {
                self.ctx.stats.record_write_failure(self.kind);
                warn!("Cache write failed for {} {}: {}", self.kind, owner_id, e);
            }
        }
    }

    // == Read ==
    /// Reads and classifies the entry stored under `key`. Never fails.
    async fn read(&self, key: String) -> CacheLookup<P> {
        let lookup = match self.ctx.engine.get(self.kind, key.clone()).await {
            Ok(Some(bytes)) => unwrap_entry(&key, &bytes, self.ctx.clock.now_ms()),
            Ok(None) => CacheLookup::Miss(LookupReason::NotFound),
            Err(CacheError::Unavailable) => CacheLookup::Miss(LookupReason::NotFound),
            Err(e) => {
                warn!("Cache read failed for {}: {}", key, e);
                CacheLookup::Miss(LookupReason::NotFound)
            }
        };

        if lookup.reason() == Some(LookupReason::Corrupted) {
            debug!("Corrupted cache entry at {}, treating as miss", key);
        }
        self.ctx.stats.record_lookup(self.kind, lookup.reason());
        lookup
    }

    // == Invalidate Owner ==
    /// Removes every entry of this kind (all pages, all aliases) owned by
    /// `owner_id`. Returns how many entries were removed; 0 on failure.
    pub async fn invalidate_owner(&self, owner_id: &str) -> u64 {
        match self
            .ctx
            .engine
            .delete_owner(self.kind, owner_id.to_string())
            .await
        {
            Ok(removed) => {
                self.ctx.stats.record_invalidated(self.kind, removed);
                if removed > 0 {
                    debug!("Invalidated {} {} entries for {}", removed, self.kind, owner_id);
                }
                removed
            }
            Err(CacheError::Unavailable) => 0,
            Err(e) => {
                warn!("Cache invalidation failed for {} {}: {}", self.kind, owner_id, e);
                0
            }
        }
    }

    /// Number of entries of this kind currently stored; 0 when unavailable.
    pub async fn entry_count(&self) -> u64 {
        self.ctx.engine.len(self.kind).await.unwrap_or(0)
    }
}

// == Profile ==
impl EntityCache<StoreProfile> {
    /// Saves `profile` under the owner id and every alias in one transaction.
    /// Empty and repeated aliases are ignored. Aliases of an earlier save
    /// that are not in `aliases` are removed.
    pub async fn save(&self, owner_id: &str, aliases: &[&str], profile: &StoreProfile) {
        let mut keys = vec![profile_key(owner_id)];
        for alias in aliases.iter().filter(|alias| !alias.is_empty()) {
            let key = profile_key(alias);
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        self.write(owner_id, keys, profile, true).await
    }

    /// Saves `profile` under its id, subdomain and username.
    pub async fn save_profile(&self, profile: &StoreProfile) {
        let aliases = profile.aliases();
        self.save(&profile.id, &aliases, profile).await
    }

    /// Looks a profile up by store id or any alias.
    pub async fn get(&self, alias: &str) -> CacheLookup<StoreProfile> {
        self.read(profile_key(alias)).await
    }
}

// == Product Pages ==
impl EntityCache<ProductPage> {
    /// Saves one product page of `store_id`. Other pages are untouched.
    pub async fn save(&self, store_id: &str, page: u32, products: &ProductPage) {
        self.write(store_id, vec![products_key(store_id, page)], products, false)
            .await
    }

    /// Looks up one product page of `store_id`.
    pub async fn get(&self, store_id: &str, page: u32) -> CacheLookup<ProductPage> {
        self.read(products_key(store_id, page)).await
    }
}

// == Categories ==
impl EntityCache<CategoryList> {
    /// Saves the category list of `store_id`.
    pub async fn save(&self, store_id: &str, categories: &CategoryList) {
        self.write(store_id, vec![categories_key(store_id)], categories, false)
            .await
    }

    /// Looks up the category list of `store_id`.
    pub async fn get(&self, store_id: &str) -> CacheLookup<CategoryList> {
        self.read(categories_key(store_id)).await
    }
}

// == Review Pages ==
impl EntityCache<ReviewPage> {
    /// Saves one review page of `store_id`, rating stats included.
    pub async fn save(&self, store_id: &str, page: u32, reviews: &ReviewPage) {
        self.write(store_id, vec![reviews_key(store_id, page)], reviews, false)
            .await
    }

    /// Looks up one review page of `store_id`.
    pub async fn get(&self, store_id: &str, page: u32) -> CacheLookup<ReviewPage> {
        self.read(reviews_key(store_id, page)).await
    }
}
