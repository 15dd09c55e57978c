use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::Tab;

/// Full export of a store, serialized as JSON by the tooling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub created_at: DateTime<Utc>,
    /// Crate version that produced the snapshot
    pub version: String,
    pub entries: Vec<SnapshotEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    pub key: String,
    pub value: String,
    pub schema_version: u32,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportStats {
    pub imported: usize,
    pub skipped: usize,
}

impl Tab {
    /// Export every stored key.
    pub fn export_snapshot(&self) -> Result<Snapshot> {
        let entries = self
            .store()
            .read(|db| crate::kv::list_entries(db.conn()))?
            .into_iter()
            .map(|e| SnapshotEntry {
                key: e.key,
                value: e.value,
                schema_version: e.schema_version,
            })
            .collect();

        Ok(Snapshot {
            created_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            entries,
        })
    }

    /// Import a snapshot in one transaction. Existing keys are kept unless
    /// `overwrite` is set. Other tabs are notified of every imported key.
    pub fn import_snapshot(&self, snapshot: &Snapshot, overwrite: bool) -> Result<ImportStats> {
        self.transaction(|txn| {
            let mut stats = ImportStats::default();
            for entry in &snapshot.entries {
                if !overwrite && txn.read(&entry.key)?.is_some() {
                    stats.skipped += 1;
                    continue;
                }
                txn.put_raw(&entry.key, entry.value.clone(), entry.schema_version)?;
                stats.imported += 1;
            }
            tracing::info!(imported = stats.imported, skipped = stats.skipped, "snapshot imported");
            Ok(stats)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::store::LocalStore;

    #[test]
    fn export_then_import_into_fresh_store() {
        let source = LocalStore::in_memory().unwrap().open_tab();
        source.save_items("students", &Vec::<u8>::new());
        source.set_item("welcomeEmailTemplate", "Hi {{name}}");

        let snapshot = source.export_snapshot().unwrap();
        assert_eq!(snapshot.entries.len(), 2);

        let target = LocalStore::in_memory().unwrap().open_tab();
        target.set_item("welcomeEmailTemplate", "keep me");

        let stats = target.import_snapshot(&snapshot, false).unwrap();
        assert_eq!(stats.imported, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(target.get_item("welcomeEmailTemplate").as_deref(), Some("keep me"));
        assert_eq!(target.get_item("students").as_deref(), Some("[]"));

        let stats = target.import_snapshot(&snapshot, true).unwrap();
        assert_eq!(stats.imported, 2);
        assert_eq!(target.get_item("welcomeEmailTemplate").as_deref(), Some("Hi {{name}}"));
    }
}
