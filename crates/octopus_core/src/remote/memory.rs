//! In-process remote store with failure injection.
//!
//! Stands in for the hosted backend in tests and offline demos. Collections
//! may declare a column schema; rows carrying unknown columns are refused with
//! `RemoteError::SchemaMismatch`, like a backend whose schema lags behind.

use super::{RemoteError, RemoteResult, RemoteStore};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default)]
pub struct InMemoryRemoteStore {
    collections: RefCell<BTreeMap<String, Vec<Value>>>,
    schemas: RefCell<BTreeMap<String, BTreeSet<String>>>,
    forced_failure: RefCell<Option<RemoteError>>,
    calls: Cell<usize>,
}

impl InMemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following call fail with `error` until [`Self::restore`].
    pub fn fail_with(&self, error: RemoteError) {
        *self.forced_failure.borrow_mut() = Some(error);
    }

    /// Clears a failure installed by [`Self::fail_with`].
    pub fn restore(&self) {
        *self.forced_failure.borrow_mut() = None;
    }

    /// Restricts `collection` to `columns`.
    pub fn declare_columns(&self, collection: &str, columns: &[&str]) {
        self.schemas.borrow_mut().insert(
            collection.to_string(),
            columns.iter().map(|column| column.to_string()).collect(),
        );
    }

    /// Places a row directly, bypassing failure injection and schema checks.
    pub fn seed(&self, collection: &str, row: Value) {
        self.collections
            .borrow_mut()
            .entry(collection.to_string())
            .or_default()
            .push(row);
    }

    /// Returns a snapshot of the stored rows.
    pub fn rows(&self, collection: &str) -> Vec<Value> {
        self.collections
            .borrow()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of operations attempted, including failed ones.
    pub fn call_count(&self) -> usize {
        self.calls.get()
    }

    fn begin_call(&self) -> RemoteResult<()> {
        self.calls.set(self.calls.get() + 1);
        match self.forced_failure.borrow().as_ref() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn check_shape(&self, collection: &str, row: &Value) -> RemoteResult<()> {
        let Some(object) = row.as_object() else {
            return Err(RemoteError::Rejected {
                status: 400,
                code: None,
                message: "row must be a JSON object".to_string(),
            });
        };
        let schemas = self.schemas.borrow();
        let Some(columns) = schemas.get(collection) else {
            return Ok(());
        };
        match object.keys().find(|key| !columns.contains(key.as_str())) {
            Some(unknown) => Err(RemoteError::SchemaMismatch {
                code: "PGRST204".to_string(),
                message: format!("Could not find the '{unknown}' column of '{collection}'"),
            }),
            None => Ok(()),
        }
    }
}

fn row_id(row: &Value) -> Option<String> {
    match row.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

impl RemoteStore for InMemoryRemoteStore {
    fn fetch_all(&self, collection: &str) -> RemoteResult<Vec<Value>> {
        self.begin_call()?;
        Ok(self.rows(collection))
    }

    fn insert(&self, collection: &str, row: &Value) -> RemoteResult<()> {
        self.begin_call()?;
        self.check_shape(collection, row)?;
        if let Some(id) = row_id(row) {
            let duplicate = self
                .rows(collection)
                .iter()
                .any(|existing| row_id(existing).as_deref() == Some(id.as_str()));
            if duplicate {
                return Err(RemoteError::Rejected {
                    status: 409,
                    code: Some("23505".to_string()),
                    message: format!("duplicate key value for id {id}"),
                });
            }
        }
        self.seed(collection, row.clone());
        Ok(())
    }

    fn upsert(&self, collection: &str, rows: &[Value]) -> RemoteResult<()> {
        self.begin_call()?;
        for row in rows {
            self.check_shape(collection, row)?;
        }
        let mut collections = self.collections.borrow_mut();
        let stored = collections.entry(collection.to_string()).or_default();
        for row in rows {
            let id = row_id(row);
            match stored
                .iter_mut()
                .find(|existing| id.is_some() && row_id(existing) == id)
            {
                Some(existing) => *existing = row.clone(),
                None => stored.push(row.clone()),
            }
        }
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> RemoteResult<()> {
        self.begin_call()?;
        if let Some(rows) = self.collections.borrow_mut().get_mut(collection) {
            rows.retain(|row| row_id(row).as_deref() != Some(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryRemoteStore;
    use crate::remote::{RemoteError, RemoteStore};
    use serde_json::json;

    #[test]
    fn declared_columns_reject_unknown_fields() {
        let remote = InMemoryRemoteStore::new();
        remote.declare_columns("diagnostics", &["contact_name", "source"]);

        let err = remote
            .insert("diagnostics", &json!({"contact_name": "Ana", "score_7p": 60.0}))
            .unwrap_err();
        assert!(err.is_schema_mismatch());
        remote
            .insert("diagnostics", &json!({"contact_name": "Ana", "source": "web"}))
            .unwrap();
        assert_eq!(remote.rows("diagnostics").len(), 1);
    }

    #[test]
    fn forced_failure_applies_until_restored() {
        let remote = InMemoryRemoteStore::new();
        remote.fail_with(RemoteError::Network("offline".to_string()));
        assert!(remote.fetch_all("events").is_err());
        remote.restore();
        assert!(remote.fetch_all("events").unwrap().is_empty());
        assert_eq!(remote.call_count(), 2);
    }

    #[test]
    fn upsert_replaces_by_id_and_delete_removes() {
        let remote = InMemoryRemoteStore::new();
        remote.seed("events", json!({"id": "a", "title": "old"}));
        remote
            .upsert(
                "events",
                &[json!({"id": "a", "title": "new"}), json!({"id": "b", "title": "b"})],
            )
            .unwrap();
        let rows = remote.rows("events");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["title"], "new");

        remote.delete("events", "a").unwrap();
        assert_eq!(remote.rows("events").len(), 1);
    }
}
