//! The shared origin store and the per-tab accessor.
//!
//! A [`LocalStore`] owns the database and the change bus of one origin. Each
//! open tab gets a [`Tab`] handle with its own [`ContextId`]. Tabs read and
//! write JSON values by key; every committed write is broadcast to the other
//! tabs but not to the writer.
//!
//! The plain accessors (`get_items`, `save_items`, `get_item`, `set_item`)
//! never fail: read problems fall back to the caller's default and write
//! problems are logged and dropped. The `try_*` twins surface the error.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use academy_shared::ContextId;
use chrono::Utc;
use rusqlite::TransactionBehavior;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::StoreConfig;
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::kv::{self, StoredEntry};
use crate::notifier::{ChangeBus, ChangeEvent, Subscription};
use crate::schema::{self, Record};
use crate::session::SessionStorage;

struct Shared {
    db: Mutex<Database>,
    bus: ChangeBus,
    quota: usize,
}

/// Storage area shared by every tab of one origin.
#[derive(Clone)]
pub struct LocalStore {
    shared: Arc<Shared>,
}

impl LocalStore {
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let db = Database::open(config)?;
        Ok(Self::with_database(db, config))
    }

    /// A fresh non-persistent store with default settings.
    pub fn in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self::with_database(db, &StoreConfig::default()))
    }

    pub fn with_database(db: Database, config: &StoreConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                db: Mutex::new(db),
                bus: ChangeBus::new(config.event_capacity),
                quota: config.quota_bytes,
            }),
        }
    }

    /// Open a new browsing context on this store.
    pub fn open_tab(&self) -> Tab {
        let context = ContextId::new();
        tracing::debug!(context = %context.short(), "tab opened");
        Tab {
            store: self.clone(),
            context,
            session: SessionStorage::new(),
        }
    }

    pub fn bus(&self) -> &ChangeBus {
        &self.shared.bus
    }

    pub fn quota(&self) -> usize {
        self.shared.quota
    }

    fn lock(&self) -> Result<MutexGuard<'_, Database>> {
        self.shared.db.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Run a read-only closure against the database.
    pub fn read<R>(&self, f: impl FnOnce(&Database) -> Result<R>) -> Result<R> {
        let db = self.lock()?;
        f(&db)
    }

    pub fn used_bytes(&self) -> Result<usize> {
        self.read(|db| kv::used_bytes(db.conn()))
    }
}

/// One browsing context (tab or window) of the origin.
#[derive(Clone)]
pub struct Tab {
    store: LocalStore,
    context: ContextId,
    session: SessionStorage,
}

impl Tab {
    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// This tab's session storage.
    pub fn session(&self) -> &SessionStorage {
        &self.session
    }

    // ------------------------------------------------------------------
    // Typed accessor
    // ------------------------------------------------------------------

    /// Read and decode `key`, falling back to `default` when the key is
    /// absent or its value does not decode. Never writes.
    pub fn get_items<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.try_get_items(key) {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read stored value, using default");
                default
            }
        }
    }

    /// Encode and store `value` under `key`. Failures are logged and dropped.
    pub fn save_items<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = self.try_save_items(key, value) {
            tracing::error!(key, error = %e, "failed to save value, write lost");
        }
    }

    pub fn try_get_items<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.try_get_item(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn try_save_items<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.transaction(|txn| txn.put_raw(key, raw, 0))
    }

    // ------------------------------------------------------------------
    // Raw string accessor
    // ------------------------------------------------------------------

    pub fn get_item(&self, key: &str) -> Option<String> {
        self.try_get_item(key).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "failed to read stored string");
            None
        })
    }

    pub fn set_item(&self, key: &str, value: &str) {
        if let Err(e) = self.try_set_item(key, value) {
            tracing::error!(key, error = %e, "failed to store string, write lost");
        }
    }

    pub fn try_get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entry(key)?.map(|entry| entry.value))
    }

    pub fn try_set_item(&self, key: &str, value: &str) -> Result<()> {
        self.transaction(|txn| txn.put_raw(key, value.to_string(), 0))
    }

    pub fn remove_item(&self, key: &str) {
        if let Err(e) = self.transaction(|txn| txn.remove(key).map(|_| ())) {
            tracing::error!(key, error = %e, "failed to remove key");
        }
    }

    /// The full stored entry under `key`, including bookkeeping columns.
    pub fn entry(&self, key: &str) -> Result<Option<StoredEntry>> {
        self.store.read(|db| db.get_entry(key))
    }

    /// Revision of the current value under `key`.
    pub fn revision(&self, key: &str) -> Result<Option<i64>> {
        Ok(self.entry(key)?.map(|entry| entry.revision))
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        self.store.read(|db| db.keys())
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    /// Listen for changes other tabs make to `keys` (every key when empty).
    pub fn subscribe(&self, keys: &[&str]) -> Subscription {
        self.store.bus().subscribe(self.context, keys)
    }

    // ------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------

    /// Run `f` inside one database transaction. Nothing is written unless
    /// `f` succeeds; change events for every touched key are published after
    /// commit, in write order.
    pub fn transaction<R, E>(
        &self,
        f: impl FnOnce(&mut Txn<'_>) -> std::result::Result<R, E>,
    ) -> std::result::Result<R, E>
    where
        E: From<StoreError>,
    {
        let (out, events) = {
            let mut db = self.store.lock()?;
            let tx = db
                .conn_mut()
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(StoreError::from)?;

            let mut txn = Txn {
                tx,
                quota: self.store.quota(),
                origin: self.context,
                events: Vec::new(),
                held_back: HashMap::new(),
            };

            let out = f(&mut txn)?;

            let Txn { tx, events, .. } = txn;
            tx.commit().map_err(StoreError::from)?;
            (out, events)
        };

        for event in events {
            self.store.bus().publish(event);
        }
        Ok(out)
    }
}

/// An open write transaction on behalf of one tab.
pub struct Txn<'a> {
    tx: rusqlite::Transaction<'a>,
    quota: usize,
    origin: ContextId,
    events: Vec<ChangeEvent>,
    /// Stored elements `load` could not decode, per key, written back by `store`.
    held_back: HashMap<String, Vec<Value>>,
}

impl Txn<'_> {
    pub fn read(&self, key: &str) -> Result<Option<StoredEntry>> {
        kv::read_entry(&self.tx, key)
    }

    /// Write a raw value. Writing the value already stored is a no-op and
    /// produces no event.
    pub fn put_raw(&mut self, key: &str, value: String, schema_version: u32) -> Result<()> {
        let old = self.read(key)?;
        if let Some(old) = &old {
            if old.value == value && old.schema_version == schema_version {
                return Ok(());
            }
        }

        let revision = kv::write_entry(&self.tx, key, &value, schema_version, self.quota)?;
        tracing::debug!(key, revision, bytes = value.len(), "value written");

        self.events.push(ChangeEvent {
            key: key.to_string(),
            old_value: old.map(|e| e.value),
            new_value: Some(value),
            origin: self.origin,
            revision: Some(revision),
            at: Utc::now(),
        });
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Result<bool> {
        let old = self.read(key)?;
        if old.is_none() {
            return Ok(false);
        }
        kv::remove_entry(&self.tx, key)?;
        tracing::debug!(key, "value removed");

        self.events.push(ChangeEvent {
            key: key.to_string(),
            old_value: old.map(|e| e.value),
            new_value: None,
            origin: self.origin,
            revision: None,
            at: Utc::now(),
        });
        Ok(true)
    }

    pub fn next_counter(&self, name: &str, floor: i64) -> Result<i64> {
        kv::next_counter(&self.tx, name, floor)
    }

    /// Decode an untyped value, `None` when absent.
    pub fn load_value<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read(key)? {
            Some(entry) => Ok(Some(serde_json::from_str(&entry.value)?)),
            None => Ok(None),
        }
    }

    pub fn store_value<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.put_raw(key, raw, 0)
    }

    /// Load a record collection. An absent key yields `seed`; a value that is
    /// not a JSON array is logged and also yields `seed`. Elements that do not
    /// decode or validate are left out and kept for the next `store` of `key`.
    pub fn load<T: Record>(&mut self, key: &str, seed: &[T]) -> Result<Vec<T>> {
        let Some(entry) = self.read(key)? else {
            self.held_back.remove(key);
            return Ok(seed.to_vec());
        };
        match schema::decode_collection::<T>(key, &entry.value, entry.schema_version) {
            Ok(decoded) => {
                if decoded.rejected.is_empty() {
                    self.held_back.remove(key);
                } else {
                    let count = decoded.rejected.len();
                    tracing::debug!(key, count, "holding back unreadable records");
                    self.held_back.insert(key.to_string(), decoded.rejected);
                }
                Ok(decoded.records)
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "stored collection is corrupt, using defaults");
                self.held_back.remove(key);
                Ok(seed.to_vec())
            }
        }
    }

    /// Raw elements of `key` left out by the last `load`.
    pub fn held_back(&self, key: &str) -> &[Value] {
        self.held_back.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Validate and store a record collection tagged with its schema version.
    /// Elements held back by an earlier `load` of `key` are appended as they
    /// were.
    pub fn store<T: Record>(&mut self, key: &str, records: &[T]) -> Result<()> {
        schema::validate_collection(records)?;
        let raw = match self.held_back.get(key) {
            Some(held) => {
                let mut elements = records
                    .iter()
                    .map(serde_json::to_value)
                    .collect::<std::result::Result<Vec<Value>, _>>()?;
                elements.extend(held.iter().cloned());
                serde_json::to_string(&elements)?
            }
            None => serde_json::to_string(records)?,
        };
        self.put_raw(key, raw, T::SCHEMA_VERSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use academy_shared::ValidationError;

    #[test]
    fn transaction_rolls_back_on_error() {
        let store = LocalStore::in_memory().unwrap();
        let tab = store.open_tab();

        let result: Result<()> = tab.transaction(|txn| {
            txn.put_raw("a", "1".into(), 0)?;
            Err(StoreError::Validation(ValidationError::EmptyField { field: "a" }))
        });
        assert!(result.is_err());
        assert!(tab.get_item("a").is_none());
    }

    #[test]
    fn events_follow_write_order_after_commit() {
        let store = LocalStore::in_memory().unwrap();
        let writer = store.open_tab();
        let reader = store.open_tab();
        let mut sub = reader.subscribe(&[]);

        writer
            .transaction(|txn| {
                txn.put_raw("b", "1".into(), 0)?;
                txn.put_raw("a", "2".into(), 0)?;
                txn.remove("missing")?;
                Ok::<_, StoreError>(())
            })
            .unwrap();

        let keys: Vec<_> = sub.drain().unwrap().into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn identical_write_is_silent() {
        let store = LocalStore::in_memory().unwrap();
        let writer = store.open_tab();
        let reader = store.open_tab();
        writer.set_item("k", "v");

        let mut sub = reader.subscribe(&["k"]);
        writer.set_item("k", "v");
        assert!(sub.try_recv().unwrap().is_none());
    }

    #[test]
    fn quota_failure_is_swallowed_by_save_items() {
        let db = Database::open_in_memory().unwrap();
        let config = StoreConfig {
            quota_bytes: 16,
            ..StoreConfig::default()
        };
        let store = LocalStore::with_database(db, &config);
        let tab = store.open_tab();

        tab.save_items("big", &"x".repeat(64));
        assert!(tab.get_item("big").is_none());
        assert!(matches!(
            tab.try_save_items("big", &"x".repeat(64)),
            Err(StoreError::QuotaExceeded { .. })
        ));
    }

    #[test]
    fn removal_notifies_with_no_new_value() {
        let store = LocalStore::in_memory().unwrap();
        let writer = store.open_tab();
        let reader = store.open_tab();
        writer.set_item("k", "v");

        let mut sub = reader.subscribe(&["k"]);
        writer.remove_item("k");

        let event = sub.try_recv().unwrap().expect("event");
        assert_eq!(event.old_value.as_deref(), Some("v"));
        assert!(event.new_value.is_none());
        assert!(writer.get_item("k").is_none());
    }
}
