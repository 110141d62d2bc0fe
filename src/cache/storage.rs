//! Storage Engine Module
//!
//! Persistent key-value storage over an LMDB environment (heed).
//!
//! Each entity kind owns four named databases:
//! - `{kind}`: key -> encoded entry bytes
//! - `{kind}.meta`: key -> owner and timestamps
//! - `{kind}.expiry`: big-endian `expires_at` ++ key -> (), ascending expiry order
//! - `{kind}.owner`: big-endian owner length ++ owner id ++ key -> ()
//!
//! LMDB calls block, so every operation runs on the blocking pool. Writes that
//! touch several keys share one write transaction.

use std::path::Path;
use std::sync::Arc;

use heed::types::{Bytes, SerdeJson, Str, Unit};
use heed::{Database, Env, EnvOpenOptions, RwTxn};
use tracing::{debug, info};

use crate::cache::{EntityKind, EntryMeta};
use crate::error::{CacheError, Result};

/// Named databases per kind, plus headroom.
const MAX_DBS: u32 = 16;

// == Kind Tables ==
struct KindTables {
    entries: Database<Str, Bytes>,
    meta: Database<Str, SerdeJson<EntryMeta>>,
    expiry: Database<Bytes, Unit>,
    owners: Database<Bytes, Unit>,
}

impl KindTables {
    /// Removes the index rows that point at `key` for the given metadata.
    fn unindex(&self, wtxn: &mut RwTxn, key: &str, meta: &EntryMeta) -> Result<()> {
        self.expiry
            .delete(wtxn, &expiry_index_key(meta.expires_at, key))?;
        self.owners
            .delete(wtxn, &owner_index_key(&meta.owner_id, key))?;
        Ok(())
    }

    /// Deletes `key` and its index rows. Returns whether an entry was removed.
    fn remove(&self, wtxn: &mut RwTxn, key: &str) -> Result<bool> {
        if let Some(meta) = self.meta.get(wtxn, key).ok().flatten() {
            self.unindex(wtxn, key, &meta)?;
        }
        self.meta.delete(wtxn, key)?;
        Ok(self.entries.delete(wtxn, key)?)
    }

    /// Writes one record with its metadata and index rows, replacing any
    /// entry already stored under `key`.
    fn insert(&self, wtxn: &mut RwTxn, key: &str, bytes: &[u8], meta: &EntryMeta) -> Result<()> {
        if let Some(old) = self.meta.get(wtxn, key).ok().flatten() {
            self.unindex(wtxn, key, &old)?;
        }

        self.entries.put(wtxn, key, bytes)?;
        self.meta.put(wtxn, key, meta)?;
        self.expiry
            .put(wtxn, &expiry_index_key(meta.expires_at, key), &())?;
        self.owners
            .put(wtxn, &owner_index_key(&meta.owner_id, key), &())?;
        Ok(())
    }

    /// Deletes every entry indexed under `owner_id`. Returns the count.
    fn remove_owner(&self, wtxn: &mut RwTxn, owner_id: &str) -> Result<u64> {
        let prefix = owner_prefix(owner_id);

        let keys: Vec<String> = {
            let mut keys = Vec::new();
            for item in self.owners.prefix_iter(wtxn, &prefix)? {
                let (index_key, _) = item?;
                if let Ok(key) = std::str::from_utf8(&index_key[prefix.len()..]) {
                    keys.push(key.to_string());
                }
            }
            keys
        };

        let mut removed = 0;
        for key in &keys {
            // Another owner may have taken the key over since it was indexed
            let owned = match self.meta.get(wtxn, key).ok().flatten() {
                Some(meta) => meta.owner_id == owner_id,
                None => true,
            };
            if owned && self.remove(wtxn, key)? {
                removed += 1;
            }
            self.owners.delete(wtxn, &owner_index_key(owner_id, key))?;
        }
        Ok(removed)
    }
}

struct EngineInner {
    env: Env,
    tables: Vec<KindTables>,
}

impl EngineInner {
    fn tables(&self, kind: EntityKind) -> &KindTables {
        &self.tables[kind.index()]
    }
}

// == Storage Engine ==
/// Handle to the embedded store. Cheap to clone.
///
/// A disabled engine stands in when the environment cannot be opened: every
/// call returns [`CacheError::Unavailable`] and the facades turn that into a
/// miss or a skipped write.
#[derive(Clone)]
pub struct StorageEngine {
    inner: Option<Arc<EngineInner>>,
}

impl std::fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEngine")
            .field("available", &self.is_available())
            .finish()
    }
}

impl StorageEngine {
    // == Constructors ==
    /// Opens (creating if needed) the LMDB environment at `path`.
    pub fn open<P: AsRef<Path>>(path: P, map_size_mb: usize) -> Result<Self> {
        let map_size = map_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| {
                CacheError::Config(format!("map size of {} MB is too large", map_size_mb))
            })?;
        std::fs::create_dir_all(&path)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path.as_ref())?
        };

        let mut wtxn = env.write_txn()?;
        let mut tables = Vec::with_capacity(EntityKind::ALL.len());
        for kind in EntityKind::ALL {
            let name = kind.as_str();
            let meta_name = format!("{}.meta", name);
            let expiry_name = format!("{}.expiry", name);
            let owner_name = format!("{}.owner", name);
            tables.push(KindTables {
                entries: env.create_database(&mut wtxn, Some(name))?,
                meta: env.create_database(&mut wtxn, Some(meta_name.as_str()))?,
                expiry: env.create_database(&mut wtxn, Some(expiry_name.as_str()))?,
                owners: env.create_database(&mut wtxn, Some(owner_name.as_str()))?,
            });
        }
        wtxn.commit()?;

        info!(
            "Storage engine opened at {} ({} MB map)",
            path.as_ref().display(),
            map_size_mb
        );

        Ok(Self {
            inner: Some(Arc::new(EngineInner { env, tables })),
        })
    }

    /// An engine with no backing store.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn is_available(&self) -> bool {
        self.inner.is_some()
    }

    /// Runs `op` against the environment on the blocking pool.
    async fn run<R, F>(&self, op: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&EngineInner) -> Result<R> + Send + 'static,
    {
        let inner = self.inner.clone().ok_or(CacheError::Unavailable)?;
        tokio::task::spawn_blocking(move || op(&inner))
            .await
            .map_err(|e| CacheError::Internal(format!("storage task failed: {}", e)))?
    }

    // == Get ==
    /// Reads the raw entry bytes stored under `key`.
    pub async fn get(&self, kind: EntityKind, key: String) -> Result<Option<Vec<u8>>> {
        self.run(move |inner| {
            let tables = inner.tables(kind);
            let rtxn = inner.env.read_txn()?;
            let bytes = tables.entries.get(&rtxn, &key)?.map(|b| b.to_vec());
            Ok(bytes)
        })
        .await
    }

    // == Put Many ==
    /// Writes every `(key, bytes)` record with the same metadata in a single
    /// transaction: either all keys are written or none are.
    pub async fn put_many(
        &self,
        kind: EntityKind,
        records: Vec<(String, Vec<u8>)>,
        meta: EntryMeta,
    ) -> Result<()> {
        self.run(move |inner| {
            let tables = inner.tables(kind);
            let mut wtxn = inner.env.write_txn()?;

            for (key, bytes) in &records {
                tables.insert(&mut wtxn, key, bytes, &meta)?;
            }

            wtxn.commit()?;
            Ok(())
        })
        .await
    }

    // == Replace Owner Entries ==
    /// Drops every entry of `kind` owned by `meta.owner_id`, then writes
    /// `records`, all in one transaction. Keys of the previous set that are
    /// missing from the new one are gone afterwards.
    pub async fn replace_owner_entries(
        &self,
        kind: EntityKind,
        records: Vec<(String, Vec<u8>)>,
        meta: EntryMeta,
    ) -> Result<()> {
        self.run(move |inner| {
            let tables = inner.tables(kind);
            let mut wtxn = inner.env.write_txn()?;

            tables.remove_owner(&mut wtxn, &meta.owner_id)?;
            for (key, bytes) in &records {
                tables.insert(&mut wtxn, key, bytes, &meta)?;
            }

            wtxn.commit()?;
            Ok(())
        })
        .await
    }

    // == Delete Owner ==
    /// Removes every entry of `kind` owned by `owner_id`. Returns the count.
    pub async fn delete_owner(&self, kind: EntityKind, owner_id: String) -> Result<u64> {
        self.run(move |inner| {
            let tables = inner.tables(kind);
            let mut wtxn = inner.env.write_txn()?;
            let removed = tables.remove_owner(&mut wtxn, &owner_id)?;
            wtxn.commit()?;
            Ok(removed)
        })
        .await
    }

    // == Sweep Expired ==
    /// Deletes entries of `kind` whose `expires_at` is strictly before `now_ms`.
    ///
    /// Walks the expiry index in ascending order and stops at the first live
    /// row. An entry is only deleted when its current metadata still carries
    /// the swept expiry; a newer overwrite keeps it alive.
    pub async fn sweep_expired(&self, kind: EntityKind, now_ms: u64) -> Result<u64> {
        self.run(move |inner| {
            let tables = inner.tables(kind);
            let mut wtxn = inner.env.write_txn()?;

            let expired: Vec<(Vec<u8>, u64, Option<String>)> = {
                let mut expired = Vec::new();
                for item in tables.expiry.iter(&wtxn)? {
                    let (index_key, _) = item?;
                    let (expires_at, key) = parse_expiry_index_key(index_key);
                    if expires_at >= now_ms {
                        break;
                    }
                    expired.push((index_key.to_vec(), expires_at, key));
                }
                expired
            };

            let mut removed = 0;
            for (index_key, expires_at, key) in expired {
                tables.expiry.delete(&mut wtxn, &index_key)?;

                let Some(key) = key else { continue };
                match tables.meta.get(&wtxn, &key).ok().flatten() {
                    Some(meta) if meta.expires_at == expires_at => {
                        if tables.remove(&mut wtxn, &key)? {
                            removed += 1;
                        }
                    }
                    Some(_) => {}
                    None => {
                        tables.meta.delete(&mut wtxn, &key)?;
                        if tables.entries.delete(&mut wtxn, &key)? {
                            removed += 1;
                        }
                    }
                }
            }

            wtxn.commit()?;
            debug!("Swept {} expired {} entries", removed, kind);
            Ok(removed)
        })
        .await
    }

    // == Length ==
    /// Number of stored entries of `kind`.
    pub async fn len(&self, kind: EntityKind) -> Result<u64> {
        self.run(move |inner| {
            let rtxn = inner.env.read_txn()?;
            Ok(inner.tables(kind).entries.len(&rtxn)?)
        })
        .await
    }

    /// Flushes the environment to disk.
    pub async fn sync(&self) -> Result<()> {
        self.run(|inner| Ok(inner.env.force_sync()?)).await
    }

    /// Stores raw bytes without metadata or index rows.
    #[cfg(test)]
    pub(crate) async fn put_raw(&self, kind: EntityKind, key: String, bytes: Vec<u8>) -> Result<()> {
        self.run(move |inner| {
            let mut wtxn = inner.env.write_txn()?;
            inner.tables(kind).entries.put(&mut wtxn, &key, &bytes)?;
            wtxn.commit()?;
            Ok(())
        })
        .await
    }
}

// == Index Keys ==
fn expiry_index_key(expires_at: u64, key: &str) -> Vec<u8> {
    let mut index_key = Vec::with_capacity(8 + key.len());
    index_key.extend_from_slice(&expires_at.to_be_bytes());
    index_key.extend_from_slice(key.as_bytes());
    index_key
}

fn parse_expiry_index_key(index_key: &[u8]) -> (u64, Option<String>) {
    if index_key.len() < 8 {
        return (0, None);
    }
    let mut ts = [0u8; 8];
    ts.copy_from_slice(&index_key[..8]);
    let key = std::str::from_utf8(&index_key[8..]).ok().map(str::to_string);
    (u64::from_be_bytes(ts), key)
}

/// Length-prefixed so no owner's prefix is a prefix of another owner's rows.
fn owner_prefix(owner_id: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(4 + owner_id.len());
    prefix.extend_from_slice(&(owner_id.len() as u32).to_be_bytes());
    prefix.extend_from_slice(owner_id.as_bytes());
    prefix
}

fn owner_index_key(owner_id: &str, key: &str) -> Vec<u8> {
    let mut index_key = owner_prefix(owner_id);
    index_key.extend_from_slice(key.as_bytes());
    index_key
}
