//! Read/create/delete flows over one cache and one remote store.

use super::merge::merge_by_id;
use crate::cache::{load_list, save_list, try_load_list, CacheResult, CacheStore};
use crate::model::entity::Entity;
use crate::remote::{RemoteError, RemoteResult, RemoteStore};
use log::{info, warn};
use serde_json::Value;
use std::collections::HashSet;

/// Where the items of a [`SyncRead`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadSource {
    /// Remote fetch succeeded. `cache_saved` is false when the cache could
    /// not be read, in which case the merged view was not written back.
    Merged {
        remote_count: usize,
        local_only_count: usize,
        cache_saved: bool,
    },
    /// Remote fetch failed; items are the cached snapshot, untouched.
    CacheFallback(RemoteError),
}

#[derive(Debug)]
pub struct SyncRead<E> {
    pub items: Vec<E>,
    pub source: ReadSource,
}

impl<E> SyncRead<E> {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, ReadSource::CacheFallback(_))
    }
}

/// Result of a write-through operation.
///
/// `local` is the synchronous cache write; `remote` is the single
/// best-effort propagation attempt. Neither failure undoes the other.
#[derive(Debug)]
pub struct WriteOutcome<T> {
    pub value: T,
    pub local: CacheResult<()>,
    pub remote: RemoteResult<()>,
}

impl<T> WriteOutcome<T> {
    /// True when both the cache write and the remote propagation succeeded.
    pub fn is_confirmed(&self) -> bool {
        self.local.is_ok() && self.remote.is_ok()
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Reconciles entity collections between a [`CacheStore`] and a [`RemoteStore`].
pub struct Synchronizer<C, R> {
    cache: C,
    remote: R,
}

impl<C: CacheStore, R: RemoteStore> Synchronizer<C, R> {
    pub fn new(cache: C, remote: R) -> Self {
        Self { cache, remote }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Returns the cached snapshot without touching the network.
    pub fn cached<E: Entity>(&self) -> Vec<E> {
        load_list(&self.cache, E::CACHE_KEY)
    }

    /// Fetches the remote collection and merges it with the cache by id.
    ///
    /// On success the merged view replaces the cached snapshot, unless the
    /// cache itself could not be read. On failure the cached snapshot is
    /// returned unchanged.
    pub fn read<E: Entity>(&self) -> SyncRead<E> {
        let snapshot = try_load_list::<E, _>(&self.cache, E::CACHE_KEY);
        let cache_readable = snapshot.is_ok();
        let local = snapshot.unwrap_or_default();

        let rows = match self.remote.fetch_all(E::COLLECTION) {
            Ok(rows) => rows,
            Err(err) => {
                warn!(
                    "event=sync_read module=sync status=fallback collection={} cached_count={} error_code={}",
                    E::COLLECTION,
                    local.len(),
                    err.code()
                );
                return SyncRead {
                    items: local,
                    source: ReadSource::CacheFallback(err),
                };
            }
        };

        let remote = decode_rows::<E>(rows);
        let remote_count = remote
            .iter()
            .map(|entity| entity.id().clone())
            .collect::<HashSet<_>>()
            .len();
        let merged = merge_by_id(remote, local);
        let local_only_count = merged.len() - remote_count;

        // An unreadable cache may still hold local-only entities.
        let cache_saved = cache_readable && save_list(&self.cache, E::CACHE_KEY, &merged).is_ok();
        info!(
            "event=sync_read module=sync status=ok collection={} remote_count={} local_only_count={} cache_readable={} cache_saved={}",
            E::COLLECTION,
            remote_count,
            local_only_count,
            cache_readable,
            cache_saved
        );

        SyncRead {
            items: merged,
            source: ReadSource::Merged {
                remote_count,
                local_only_count,
                cache_saved,
            },
        }
    }

    /// Write-through create: cache first, then one remote insert attempt.
    ///
    /// When the cached list cannot be read the cache is left untouched and
    /// the read error is reported in `local`.
    pub fn create<E: Entity>(&self, entity: E) -> WriteOutcome<E> {
        let local = try_load_list::<E, _>(&self.cache, E::CACHE_KEY).and_then(|mut items| {
            items.retain(|existing| existing.id() != entity.id());
            items.push(entity.clone());
            save_list(&self.cache, E::CACHE_KEY, &items)
        });

        let remote = encode_row(&entity).and_then(|row| self.remote.insert(E::COLLECTION, &row));
        log_write("sync_create", E::COLLECTION, &entity.id().to_string(), &local, &remote);

        WriteOutcome {
            value: entity,
            local,
            remote,
        }
    }

    /// Removes `id` from the cache, then attempts the remote delete either way.
    ///
    /// `value` reports whether the id was present in the cache. An unreadable
    /// cache is left untouched and reported in `local`.
    pub fn delete<E: Entity>(&self, id: &E::Id) -> WriteOutcome<bool> {
        let mut removed = false;
        let local = try_load_list::<E, _>(&self.cache, E::CACHE_KEY).and_then(|mut items| {
            let before = items.len();
            items.retain(|existing| existing.id() != id);
            removed = items.len() != before;
            save_list(&self.cache, E::CACHE_KEY, &items)
        });

        let id_text = id.to_string();
        let remote = self.remote.delete(E::COLLECTION, &id_text);
        log_write("sync_delete", E::COLLECTION, &id_text, &local, &remote);

        WriteOutcome {
            value: removed,
            local,
            remote,
        }
    }

    /// Sends the whole cached collection to the remote store in one upsert.
    ///
    /// Caller-driven resend of entities whose original insert never landed.
    /// Returns the number of rows sent.
    pub fn push_local<E: Entity>(&self) -> RemoteResult<usize> {
        let items = self.cached::<E>();
        if items.is_empty() {
            return Ok(0);
        }

        let rows = items
            .iter()
            .map(encode_row)
            .collect::<RemoteResult<Vec<_>>>()?;
        match self.remote.upsert(E::COLLECTION, &rows) {
            Ok(()) => {
                info!(
                    "event=sync_push module=sync status=ok collection={} row_count={}",
                    E::COLLECTION,
                    rows.len()
                );
                Ok(rows.len())
            }
            Err(err) => {
                warn!(
                    "event=sync_push module=sync status=error collection={} row_count={} error_code={}",
                    E::COLLECTION,
                    rows.len(),
                    err.code()
                );
                Err(err)
            }
        }
    }
}

fn encode_row<E: Entity>(entity: &E) -> RemoteResult<Value> {
    serde_json::to_value(entity).map_err(|err| RemoteError::Encode(err.to_string()))
}

fn decode_rows<E: Entity>(rows: Vec<Value>) -> Vec<E> {
    let total = rows.len();
    let decoded = rows
        .into_iter()
        .filter_map(|row| serde_json::from_value::<E>(row).ok())
        .collect::<Vec<_>>();
    if decoded.len() != total {
        warn!(
            "event=sync_read module=sync status=partial collection={} skipped_rows={}",
            E::COLLECTION,
            total - decoded.len()
        );
    }
    decoded
}

fn log_write(
    event: &str,
    collection: &str,
    id: &str,
    local: &CacheResult<()>,
    remote: &RemoteResult<()>,
) {
    match remote {
        Ok(()) => info!(
            "event={event} module=sync status=ok collection={collection} id={id} cache_saved={}",
            local.is_ok()
        ),
        Err(err) => warn!(
            "event={event} module=sync status=local_only collection={collection} id={id} cache_saved={} error_code={}",
            local.is_ok(),
            err.code()
        ),
    }
}
