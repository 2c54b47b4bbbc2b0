//! Remote collection store client.
//!
//! # Responsibility
//! - Define CRUD over named remote collections (`RemoteStore`).
//! - Surface every failure as a typed `RemoteError`; never panic.
//!
//! # Invariants
//! - No retries inside this layer; retry policy belongs to callers.
//! - Rows travel as JSON objects keyed by remote column name.

mod http;
mod memory;

pub(crate) use http::non_blank;
pub use http::{HttpRemoteStore, RemoteConfig};
pub use memory::InMemoryRemoteStore;

use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Failure of one remote operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// No remote backend is configured for this process.
    NotConfigured,
    /// Connection, DNS or I/O failure before a response arrived.
    Network(String),
    /// The request exceeded its configured deadline.
    Timeout { after_ms: u64 },
    /// Row/record-level authorization refused the operation.
    AccessDenied { status: u16, message: String },
    /// The payload shape does not match the remote schema.
    SchemaMismatch { code: String, message: String },
    /// Any other refusal reported by the remote store.
    Rejected {
        status: u16,
        code: Option<String>,
        message: String,
    },
    /// The remote answered with something that is not the expected shape.
    InvalidResponse(String),
    /// The local value could not be encoded as a row.
    Encode(String),
}

impl RemoteError {
    /// Stable short code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotConfigured => "remote_not_configured",
            Self::Network(_) => "remote_network",
            Self::Timeout { .. } => "remote_timeout",
            Self::AccessDenied { .. } => "remote_access_denied",
            Self::SchemaMismatch { .. } => "remote_schema_mismatch",
            Self::Rejected { .. } => "remote_rejected",
            Self::InvalidResponse(_) => "remote_invalid_response",
            Self::Encode(_) => "remote_encode",
        }
    }

    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, Self::SchemaMismatch { .. })
    }

    /// True for failures where the remote store was never reached.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::NotConfigured | Self::Network(_) | Self::Timeout { .. }
        )
    }
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "remote store is not configured"),
            Self::Network(message) => write!(f, "remote store unreachable: {message}"),
            Self::Timeout { after_ms } => write!(f, "remote request timed out after {after_ms}ms"),
            Self::AccessDenied { status, message } => {
                write!(f, "remote access denied (http {status}): {message}")
            }
            Self::SchemaMismatch { code, message } => {
                write!(f, "remote schema mismatch ({code}): {message}")
            }
            Self::Rejected {
                status,
                code,
                message,
            } => match code {
                Some(code) => write!(f, "remote rejected request (http {status}, {code}): {message}"),
                None => write!(f, "remote rejected request (http {status}): {message}"),
            },
            Self::InvalidResponse(message) => write!(f, "invalid remote response: {message}"),
            Self::Encode(message) => write!(f, "failed to encode remote row: {message}"),
        }
    }
}

impl Error for RemoteError {}

/// CRUD over named remote collections.
pub trait RemoteStore {
    /// Returns every row of `collection`.
    fn fetch_all(&self, collection: &str) -> RemoteResult<Vec<Value>>;
    /// Inserts one row.
    fn insert(&self, collection: &str, row: &Value) -> RemoteResult<()>;
    /// Inserts or replaces rows, matching on `id`.
    fn upsert(&self, collection: &str, rows: &[Value]) -> RemoteResult<()>;
    /// Deletes the row whose `id` equals `id`. Deleting a missing row succeeds.
    fn delete(&self, collection: &str, id: &str) -> RemoteResult<()>;
}

impl<T: RemoteStore + ?Sized> RemoteStore for &T {
    fn fetch_all(&self, collection: &str) -> RemoteResult<Vec<Value>> {
        (**self).fetch_all(collection)
    }

    fn insert(&self, collection: &str, row: &Value) -> RemoteResult<()> {
        (**self).insert(collection, row)
    }

    fn upsert(&self, collection: &str, rows: &[Value]) -> RemoteResult<()> {
        (**self).upsert(collection, rows)
    }

    fn delete(&self, collection: &str, id: &str) -> RemoteResult<()> {
        (**self).delete(collection, id)
    }
}

/// Runtime selection of the remote backend.
#[derive(Debug)]
pub enum RemoteBackend {
    Http(HttpRemoteStore),
    /// Every operation fails with `RemoteError::NotConfigured`.
    Offline,
}

impl RemoteBackend {
    pub fn from_config(config: Option<RemoteConfig>) -> Self {
        match config {
            Some(config) => Self::Http(HttpRemoteStore::new(config)),
            None => Self::Offline,
        }
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Offline)
    }
}

impl RemoteStore for RemoteBackend {
    fn fetch_all(&self, collection: &str) -> RemoteResult<Vec<Value>> {
        match self {
            Self::Http(store) => store.fetch_all(collection),
            Self::Offline => Err(RemoteError::NotConfigured),
        }
    }

    fn insert(&self, collection: &str, row: &Value) -> RemoteResult<()> {
        match self {
            Self::Http(store) => store.insert(collection, row),
            Self::Offline => Err(RemoteError::NotConfigured),
        }
    }

    fn upsert(&self, collection: &str, rows: &[Value]) -> RemoteResult<()> {
        match self {
            Self::Http(store) => store.upsert(collection, rows),
            Self::Offline => Err(RemoteError::NotConfigured),
        }
    }

    fn delete(&self, collection: &str, id: &str) -> RemoteResult<()> {
        match self {
            Self::Http(store) => store.delete(collection, id),
            Self::Offline => Err(RemoteError::NotConfigured),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RemoteBackend, RemoteError, RemoteStore};

    #[test]
    fn offline_backend_reports_not_configured() {
        let backend = RemoteBackend::from_config(None);
        assert!(backend.is_offline());
        assert_eq!(
            backend.fetch_all("events").unwrap_err(),
            RemoteError::NotConfigured
        );
        assert!(backend.delete("events", "abc").unwrap_err().is_unavailable());
    }

    #[test]
    fn timeout_counts_as_unavailable() {
        let err = RemoteError::Timeout { after_ms: 15_000 };
        assert!(err.is_unavailable());
        assert!(!err.is_schema_mismatch());
        assert_eq!(err.code(), "remote_timeout");
    }
}
