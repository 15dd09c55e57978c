//! Per-tab session storage.
//!
//! Session values live only as long as the tab, are never written to the
//! database and never produce change notifications.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Clone, Default)]
pub struct SessionStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl SessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map still holds consistent strings.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get_item(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    pub fn set_item(&self, key: &str, value: &str) {
        self.entries().insert(key.to_string(), value.to_string());
    }

    pub fn remove_item(&self, key: &str) -> Option<String> {
        self.entries().remove(key)
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    /// Decode the value at `key`, or return `default` when absent or invalid.
    pub fn get_items<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let Some(raw) = self.get_item(key) else {
            return default;
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "undecodable session value, using default");
                default
            }
        }
    }

    pub fn save_items<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => self.set_item(key, &raw),
            Err(e) => tracing::warn!(key, error = %e, "failed to encode session value"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_round_trip_and_default() {
        let session = SessionStorage::new();
        assert_eq!(session.get_items::<Vec<String>>("seen", vec![]), Vec::<String>::new());

        session.save_items("seen", &vec!["p1".to_string()]);
        assert_eq!(session.get_items::<Vec<String>>("seen", vec![]), vec!["p1"]);

        session.set_item("seen", "{broken");
        assert_eq!(session.get_items("seen", vec!["d".to_string()]), vec!["d"]);
    }

    #[test]
    fn clones_share_entries() {
        let a = SessionStorage::new();
        let b = a.clone();
        a.set_item("k", "v");
        assert_eq!(b.get_item("k").as_deref(), Some("v"));
        b.clear();
        assert!(a.get_item("k").is_none());
    }
}
