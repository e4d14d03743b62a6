//! In-memory stores.
//!
//! Used by tests and by embedders that do not need durability. The remote
//! store can be told to fail, which is how load, save and per-item migration
//! failures are exercised.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use gemcase_core::{CollectionKind, ProductId, UserId};
use serde_json::Value;

use super::error::LocalStoreError;
use super::local::LocalStore;
use super::remote::{CollectionRow, RemoteStore};
use crate::db::RepositoryError;

/// Map-backed [`LocalStore`]. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryLocalStore {
    entries: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemoryLocalStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw value, bypassing serialization.
    pub fn insert_raw(&self, key: &str, value: Value) {
        self.lock().insert(key.to_owned(), value);
    }

    /// Raw value under `key`.
    #[must_use]
    pub fn get_raw(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Value>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LocalStore for MemoryLocalStore {
    async fn read(&self, key: &'static str) -> Result<Option<Value>, LocalStoreError> {
        Ok(self.get_raw(key))
    }

    async fn write(&self, key: &'static str, value: Value) -> Result<(), LocalStoreError> {
        self.insert_raw(key, value);
        Ok(())
    }

    async fn remove(&self, key: &'static str) -> Result<(), LocalStoreError> {
        self.lock().remove(key);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct RemoteTables {
    rows: HashMap<(CollectionKind, UserId), Vec<CollectionRow>>,
    fail_loads: bool,
    fail_writes: bool,
    fail_upserts: HashSet<ProductId>,
}

/// Map-backed [`RemoteStore`] with failure injection. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryRemoteStore {
    tables: Arc<Mutex<RemoteTables>>,
}

impl MemoryRemoteStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows currently stored for `owner`, in insertion order.
    #[must_use]
    pub fn rows(&self, kind: CollectionKind, owner: UserId) -> Vec<CollectionRow> {
        self.lock()
            .rows
            .get(&(kind, owner))
            .cloned()
            .unwrap_or_default()
    }

    /// Make every load fail.
    pub fn fail_loads(&self, fail: bool) {
        self.lock().fail_loads = fail;
    }

    /// Make every replace and upsert fail.
    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Make upserts of one product fail.
    pub fn fail_upsert_of(&self, product_id: ProductId) {
        self.lock().fail_upserts.insert(product_id);
    }

    fn lock(&self) -> MutexGuard<'_, RemoteTables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn unavailable(operation: &str) -> RepositoryError {
    RepositoryError::Unavailable(format!("{operation} rejected by in-memory store"))
}

impl RemoteStore for MemoryRemoteStore {
    async fn load_rows(
        &self,
        kind: CollectionKind,
        owner: UserId,
    ) -> Result<Vec<CollectionRow>, RepositoryError> {
        if self.lock().fail_loads {
            return Err(unavailable("load"));
        }
        Ok(self.rows(kind, owner))
    }

    async fn replace_rows(
        &self,
        kind: CollectionKind,
        owner: UserId,
        rows: Vec<CollectionRow>,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        if tables.fail_writes {
            return Err(unavailable("replace"));
        }
        tables.rows.insert((kind, owner), rows);
        Ok(())
    }

    async fn upsert_row(
        &self,
        kind: CollectionKind,
        row: CollectionRow,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        if tables.fail_writes || tables.fail_upserts.contains(&row.product_id) {
            return Err(unavailable("upsert"));
        }
        let rows = tables.rows.entry((kind, row.owner_id)).or_default();
        match rows.iter_mut().find(|r| r.product_id == row.product_id) {
            Some(existing) => *existing = row,
            None => rows.push(row),
        }
        Ok(())
    }
}
