//! Schema contract for stored record collections.
//!
//! Each collection is stored as a JSON array tagged with the
//! [`Record::SCHEMA_VERSION`] it was written with. Reading migrates every
//! element written under an older version, then decodes and validates it.
//! Elements that fail either step are left out of the records and logged;
//! the rest of the collection is still returned. The left-out elements are
//! kept raw so a later write can carry them through unchanged.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use academy_shared::ValidationError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A record type stored as an element of a collection.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    type Id: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync;

    /// Version written alongside the collection. Version 0 marks data written
    /// through the untyped accessor.
    const SCHEMA_VERSION: u32 = 1;

    fn id(&self) -> Self::Id;

    /// Check the record's declared invariants.
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Upgrade one raw element written under schema version `from`.
    fn migrate(record: Value, _from: u32) -> Value {
        record
    }
}

/// Result of decoding a stored collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub records: Vec<T>,
    /// Raw elements (after migration) that failed to decode or validate.
    pub rejected: Vec<Value>,
}

/// Decode a stored collection. Fails only when `raw` is not a JSON array.
pub fn decode_collection<T: Record>(
    key: &str,
    raw: &str,
    stored_version: u32,
) -> Result<Decoded<T>, serde_json::Error> {
    let elements: Vec<Value> = serde_json::from_str(raw)?;
    let migrated = stored_version < T::SCHEMA_VERSION;

    if stored_version > T::SCHEMA_VERSION {
        tracing::warn!(
            key,
            stored_version,
            supported = T::SCHEMA_VERSION,
            "collection written by a newer schema, decoding as-is"
        );
    }

    let mut records = Vec::with_capacity(elements.len());
    let mut rejected = Vec::new();

    for (index, element) in elements.into_iter().enumerate() {
        let element = if migrated {
            T::migrate(element, stored_version)
        } else {
            element
        };

        let record = match T::deserialize(&element) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(key, index, error = %e, "skipping undecodable record");
                rejected.push(element);
                continue;
            }
        };

        if let Err(e) = record.validate() {
            tracing::warn!(key, index, error = %e, "skipping invalid record");
            rejected.push(element);
            continue;
        }

        records.push(record);
    }

    if migrated {
        tracing::debug!(
            key,
            from = stored_version,
            to = T::SCHEMA_VERSION,
            count = records.len(),
            "migrated collection on read"
        );
    }

    Ok(Decoded { records, rejected })
}

/// Validate every record and reject duplicate ids.
pub fn validate_collection<T: Record>(records: &[T]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        record.validate()?;
        let id = record.id();
        if !seen.insert(id.clone()) {
            return Err(ValidationError::DuplicateId(id.to_string()));
        }
    }
    Ok(())
}
