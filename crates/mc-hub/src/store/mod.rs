//! # Document Store
//!
//! Collections of [`Record`]s behind the [`RecordStore`] trait. Handlers only
//! see the trait; the query engine only sees the snapshot `fetch_all` returns.

pub mod json_file;

use mc_core::Record;

pub use json_file::JsonFileStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store '{collection}' is unavailable: {source}")]
    Unavailable {
        collection: String,
        #[source]
        source: std::io::Error,
    },
    #[error("store '{collection}' holds malformed data: {source}")]
    Corrupt {
        collection: String,
        #[source]
        source: mc_core::RecordError,
    },
    #[error("no record in '{collection}' matches {criteria}")]
    NotFound { collection: String, criteria: String },
}

/// A named collection of records.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Collection name (`people`, `achievements`).
    fn name(&self) -> &str;

    /// Full, unfiltered snapshot in storage order.
    async fn fetch_all(&self) -> Result<Vec<Record>, StoreError>;

    /// Append a record, assigning `_id` when absent. Returns what was stored.
    async fn insert(&self, record: Record) -> Result<Record, StoreError>;

    /// Merge `patch` into the first record whose `key` field reads `value`.
    async fn update(&self, key: &str, value: &str, patch: Record) -> Result<Record, StoreError>;

    /// Remove the first record whose fields equal every `(field, value)` pair.
    async fn delete_where(&self, criteria: &[(String, String)]) -> Result<Record, StoreError>;

    /// Re-read the backing data, e.g. after an import rewrote it.
    async fn reload(&self) -> Result<usize, StoreError>;

    async fn len(&self) -> usize;
}

/// True when every criterion's value equals the field's canonical text.
pub fn matches_criteria(record: &Record, criteria: &[(String, String)]) -> bool {
    criteria
        .iter()
        .all(|(field, value)| record.text(field).is_some_and(|text| text == value.as_str()))
}

fn describe(criteria: &[(String, String)]) -> String {
    criteria
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}
