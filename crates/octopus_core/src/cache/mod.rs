//! Local cache store: key-scoped entity lists in on-device storage.
//!
//! # Responsibility
//! - Define the raw key/payload storage capability (`CacheStore`).
//! - Provide typed list/record helpers on top of raw payloads.
//!
//! # Invariants
//! - Unparsable payloads are logged and read as empty.
//! - Storage read failures are surfaced by the `try_` loaders so that
//!   read-modify-write callers never save over data they could not read.
//! - Saving replaces the whole payload stored under a key.
//! - Payloads are JSON text.

mod memory;
mod sqlite;

pub use memory::MemoryCacheStore;
pub use sqlite::SqliteCacheStore;

use crate::db::DbError;
use crate::logging::sanitize_message;
use log::{debug, error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CacheResult<T> = Result<T, CacheError>;

const MAX_LOGGED_PARSE_ERROR_CHARS: usize = 120;

#[derive(Debug)]
pub enum CacheError {
    Db(DbError),
    Encode(serde_json::Error),
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "cache storage failed: {err}"),
            Self::Encode(err) => write!(f, "cache payload encoding failed: {err}"),
        }
    }
}

impl Error for CacheError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<DbError> for CacheError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for CacheError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Raw on-device key/value storage.
pub trait CacheStore {
    /// Returns the payload stored under `key`, or `None` when absent.
    fn read(&self, key: &str) -> CacheResult<Option<String>>;
    /// Replaces the payload stored under `key`.
    fn write(&self, key: &str, payload: &str) -> CacheResult<()>;
    /// Removes `key`; removing an absent key is not an error.
    fn remove(&self, key: &str) -> CacheResult<()>;
}

impl<T: CacheStore + ?Sized> CacheStore for &T {
    fn read(&self, key: &str) -> CacheResult<Option<String>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, payload: &str) -> CacheResult<()> {
        (**self).write(key, payload)
    }

    fn remove(&self, key: &str) -> CacheResult<()> {
        (**self).remove(key)
    }
}

/// Loads the list stored under `key`.
///
/// Missing keys, storage failures and unparsable payloads all yield an empty
/// list; the latter two are logged. Read-modify-write callers must use
/// [`try_load_list`] instead.
pub fn load_list<T, S>(store: &S, key: &str) -> Vec<T>
where
    T: DeserializeOwned,
    S: CacheStore + ?Sized,
{
    try_load_list(store, key).unwrap_or_default()
}

/// Loads the list stored under `key`, surfacing storage failures.
///
/// Unparsable payloads still read as empty; only a failed `read` is an error.
pub fn try_load_list<T, S>(store: &S, key: &str) -> CacheResult<Vec<T>>
where
    T: DeserializeOwned,
    S: CacheStore + ?Sized,
{
    Ok(try_load_record::<Vec<T>, S>(store, key)?.unwrap_or_default())
}

/// Replaces the list stored under `key`.
pub fn save_list<T, S>(store: &S, key: &str, items: &[T]) -> CacheResult<()>
where
    T: Serialize,
    S: CacheStore + ?Sized,
{
    save_record(store, key, &items)
}

/// Loads a single record stored under `key`, with the same fallback rules as
/// [`load_list`].
pub fn load_record<T, S>(store: &S, key: &str) -> Option<T>
where
    T: DeserializeOwned,
    S: CacheStore + ?Sized,
{
    try_load_record(store, key).unwrap_or_default()
}

/// Loads a single record stored under `key`, surfacing storage failures.
pub fn try_load_record<T, S>(store: &S, key: &str) -> CacheResult<Option<T>>
where
    T: DeserializeOwned,
    S: CacheStore + ?Sized,
{
    let payload = match store.read(key) {
        Ok(Some(payload)) => payload,
        Ok(None) => return Ok(None),
        Err(err) => {
            error!("event=cache_load module=cache status=error key={key} error={err}");
            return Err(err);
        }
    };

    match serde_json::from_str::<T>(&payload) {
        Ok(value) => {
            debug!(
                "event=cache_load module=cache status=ok key={key} bytes={}",
                payload.len()
            );
            Ok(Some(value))
        }
        Err(err) => {
            warn!(
                "event=cache_load module=cache status=fallback key={key} error_code=cache_corrupt error={}",
                sanitize_message(&err.to_string(), MAX_LOGGED_PARSE_ERROR_CHARS)
            );
            Ok(None)
        }
    }
}

/// Replaces the single record stored under `key`.
pub fn save_record<T, S>(store: &S, key: &str, value: &T) -> CacheResult<()>
where
    T: Serialize + ?Sized,
    S: CacheStore + ?Sized,
{
    let payload = serde_json::to_string(value).map_err(CacheError::Encode)?;
    match store.write(key, &payload) {
        Ok(()) => {
            debug!(
                "event=cache_save module=cache status=ok key={key} bytes={}",
                payload.len()
            );
            Ok(())
        }
        Err(err) => {
            error!("event=cache_save module=cache status=error key={key} error={err}");
            Err(err)
        }
    }
}
