//! Cache Entry Module
//!
//! Wraps payloads with cache metadata before storage and validates that
//! metadata on the way back out.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;

// == Cache Entry ==
/// A payload stamped with its cache metadata. Entries are never mutated in
/// storage; an update is a full overwrite with a new `cached_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// Storage key this entry was written under
    pub key: String,
    /// Store that owns this entry
    pub owner_id: String,
    /// Write timestamp (Unix milliseconds)
    pub cached_at: u64,
    /// `cached_at + ttl(kind)` (Unix milliseconds)
    pub expires_at: u64,
    /// The entity data
    pub payload: T,
}

/// Borrowed view used to encode one snapshot under several keys.
#[derive(Serialize)]
struct EncodedEntry<'a, T> {
    key: &'a str,
    owner_id: &'a str,
    cached_at: u64,
    expires_at: u64,
    payload: &'a T,
}

/// Index metadata kept next to every stored entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMeta {
    pub owner_id: String,
    pub cached_at: u64,
    pub expires_at: u64,
}

impl<T> CacheEntry<T> {
    // == Wrap ==
    /// Stamps `payload` with `cached_at = now_ms` and `expires_at = now_ms + ttl_ms`.
    pub fn wrap(
        key: impl Into<String>,
        owner_id: impl Into<String>,
        payload: T,
        ttl_ms: u64,
        now_ms: u64,
    ) -> Self {
        Self {
            key: key.into(),
            owner_id: owner_id.into(),
            cached_at: now_ms,
            expires_at: now_ms.saturating_add(ttl_ms),
            payload,
        }
    }

    // == Freshness ==
    /// An entry stays fresh up to and including its expiry instant.
    pub fn is_fresh_at(&self, now_ms: u64) -> bool {
        now_ms <= self.expires_at
    }

    /// Remaining lifetime in milliseconds, 0 once expired.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at.saturating_sub(now_ms)
    }

    /// Metadata row for the storage indexes.
    pub fn meta(&self) -> EntryMeta {
        EntryMeta {
            owner_id: self.owner_id.clone(),
            cached_at: self.cached_at,
            expires_at: self.expires_at,
        }
    }
}

impl<T: Serialize> CacheEntry<T> {
    /// Encodes this entry for storage under its own key.
    pub fn encode(&self) -> Result<Vec<u8>> {
        self.encode_as(&self.key)
    }

    /// Encodes this snapshot under another key. Payload and timestamps are
    /// carried over unchanged, so every alias of a profile stores the same
    /// payload bytes and the same `cached_at`/`expires_at`.
    pub fn encode_as(&self, key: &str) -> Result<Vec<u8>> {
        let encoded = EncodedEntry {
            key,
            owner_id: &self.owner_id,
            cached_at: self.cached_at,
            expires_at: self.expires_at,
            payload: &self.payload,
        };
        Ok(serde_json::to_vec(&encoded)?)
    }
}

// == Lookup Result ==
/// Why a lookup did not produce fresh data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupReason {
    NotFound,
    Expired,
    Corrupted,
}

/// Payload returned from the cache together with its timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub data: T,
    pub cached_at: u64,
    pub expires_at: u64,
}

/// Tri-state read result: valid hit, stale hit or miss.
///
/// A stale hit still carries its data so callers can render it while a
/// fresh fetch is in flight. Corrupted and unavailable entries read as a
/// miss and are never returned as data.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<T> {
    Fresh(Cached<T>),
    Stale(Cached<T>),
    Miss(LookupReason),
}

impl<T> CacheLookup<T> {
    /// True only for a fresh hit.
    pub fn is_valid(&self) -> bool {
        matches!(self, CacheLookup::Fresh(_))
    }

    /// Data of a fresh or stale hit.
    pub fn data(&self) -> Option<&T> {
        match self {
            CacheLookup::Fresh(cached) | CacheLookup::Stale(cached) => Some(&cached.data),
            CacheLookup::Miss(_) => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            CacheLookup::Fresh(cached) | CacheLookup::Stale(cached) => Some(cached.data),
            CacheLookup::Miss(_) => None,
        }
    }

    /// Full hit including timestamps.
    pub fn cached(&self) -> Option<&Cached<T>> {
        match self {
            CacheLookup::Fresh(cached) | CacheLookup::Stale(cached) => Some(cached),
            CacheLookup::Miss(_) => None,
        }
    }

    /// `None` for a fresh hit, otherwise why the read is not valid.
    pub fn reason(&self) -> Option<LookupReason> {
        match self {
            CacheLookup::Fresh(_) => None,
            CacheLookup::Stale(_) => Some(LookupReason::Expired),
            CacheLookup::Miss(reason) => Some(*reason),
        }
    }
}

// == Unwrap ==
/// Decodes stored bytes for `key` and classifies them at `now_ms`.
///
/// Bytes that do not decode into the expected shape, or that were written
/// under a different key, are reported as corrupted rather than as an error.
pub fn unwrap_entry<T: DeserializeOwned>(key: &str, bytes: &[u8], now_ms: u64) -> CacheLookup<T> {
    let entry: CacheEntry<T> = match serde_json::from_slice(bytes) {
        Ok(entry) => entry,
        Err(_) => return CacheLookup::Miss(LookupReason::Corrupted),
    };

    if entry.key != key || entry.expires_at < entry.cached_at {
        return CacheLookup::Miss(LookupReason::Corrupted);
    }

    let fresh = entry.is_fresh_at(now_ms);
    let cached = Cached {
        data: entry.payload,
        cached_at: entry.cached_at,
        expires_at: entry.expires_at,
    };

    if fresh {
        CacheLookup::Fresh(cached)
    } else {
        CacheLookup::Stale(cached)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000_000;

    #[test]
    fn test_wrap_stamps_timestamps() {
        let entry = CacheEntry::wrap("profile:acme", "s1", "payload", 60_000, NOW);

        assert_eq!(entry.cached_at, NOW);
        assert_eq!(entry.expires_at, NOW + 60_000);
        assert_eq!(entry.meta().owner_id, "s1");
    }

    #[test]
    fn test_fresh_until_expiry_boundary() {
        let entry = CacheEntry::wrap("k", "s1", 1u32, 1_000, NOW);

        assert!(entry.is_fresh_at(NOW));
        assert!(entry.is_fresh_at(NOW + 1_000), "Entry should be fresh at its expiry instant");
        assert!(!entry.is_fresh_at(NOW + 1_001));
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = CacheEntry::wrap("k", "s1", 1u32, 10_000, NOW);

        assert_eq!(entry.ttl_remaining_ms(NOW + 4_000), 6_000);
        assert_eq!(entry.ttl_remaining_ms(NOW + 20_000), 0);
    }

    #[test]
    fn test_unwrap_fresh() {
        let entry = CacheEntry::wrap("k", "s1", vec![1, 2, 3], 1_000, NOW);
        let bytes = entry.encode().unwrap();

        let lookup: CacheLookup<Vec<u32>> = unwrap_entry("k", &bytes, NOW + 10);
        assert!(lookup.is_valid());
        assert_eq!(lookup.reason(), None);
        assert_eq!(lookup.data(), Some(&vec![1, 2, 3]));
    }

    #[test]
    fn test_unwrap_stale_keeps_data() {
        let entry = CacheEntry::wrap("k", "s1", "old".to_string(), 1_000, NOW);
        let bytes = entry.encode().unwrap();

        let lookup: CacheLookup<String> = unwrap_entry("k", &bytes, NOW + 5_000);
        assert!(!lookup.is_valid());
        assert_eq!(lookup.reason(), Some(LookupReason::Expired));
        assert_eq!(lookup.into_data(), Some("old".to_string()));
    }

    #[test]
    fn test_unwrap_garbage_is_corrupted() {
        let lookup: CacheLookup<String> = unwrap_entry("k", b"\x00not json", NOW);
        assert_eq!(lookup, CacheLookup::Miss(LookupReason::Corrupted));
        assert!(lookup.data().is_none());
    }

    #[test]
    fn test_unwrap_wrong_shape_is_corrupted() {
        let entry = CacheEntry::wrap("k", "s1", "text".to_string(), 1_000, NOW);
        let bytes = entry.encode().unwrap();

        let lookup: CacheLookup<Vec<u32>> = unwrap_entry("k", &bytes, NOW);
        assert_eq!(lookup.reason(), Some(LookupReason::Corrupted));
    }

    #[test]
    fn test_unwrap_foreign_key_is_corrupted() {
        let entry = CacheEntry::wrap("a", "s1", 5u8, 1_000, NOW);
        let bytes = entry.encode().unwrap();

        let lookup: CacheLookup<u8> = unwrap_entry("b", &bytes, NOW);
        assert_eq!(lookup.reason(), Some(LookupReason::Corrupted));
    }

    #[test]
    fn test_encode_as_keeps_snapshot() {
        let entry = CacheEntry::wrap("profile:s1", "s1", "same".to_string(), 1_000, NOW);
        let alias_bytes = entry.encode_as("profile:acme").unwrap();

        let alias: CacheEntry<String> = serde_json::from_slice(&alias_bytes).unwrap();
        assert_eq!(alias.key, "profile:acme");
        assert_eq!(alias.cached_at, entry.cached_at);
        assert_eq!(alias.expires_at, entry.expires_at);
        assert_eq!(alias.payload, entry.payload);
    }
}
