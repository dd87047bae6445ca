//! # JSON File Store
//!
//! Keeps a collection in memory and mirrors it to `<data_dir>/<name>.json`.
//! Mutations are applied to a copy, written out, and only then swapped in,
//! so a failed write leaves memory and disk in agreement.

use super::{describe, matches_criteria, RecordStore, StoreError};
use mc_core::Record;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

pub struct JsonFileStore {
    name: String,
    path: Option<PathBuf>,
    records: RwLock<Vec<Record>>,
}

impl JsonFileStore {
    /// Open `<dir>/<name>.json`. A missing file is an empty collection.
    pub async fn open(dir: &Path, name: &str) -> Result<Self, StoreError> {
        let path = dir.join(format!("{}.json", name));
        let records = read_collection(name, &path).await?;
        tracing::info!("Loaded {} record(s) into '{}' from {:?}", records.len(), name, path);
        Ok(Self {
            name: name.to_string(),
            path: Some(path),
            records: RwLock::new(records),
        })
    }

    /// A store with no backing file.
    #[cfg(test)]
    pub fn in_memory(name: &str, records: Vec<Record>) -> Self {
        Self {
            name: name.to_string(),
            path: None,
            records: RwLock::new(records),
        }
    }

    async fn persist(&self, records: &[Record]) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let body = serde_json::to_vec_pretty(records).map_err(|e| StoreError::Corrupt {
            collection: self.name.clone(),
            source: e.into(),
        })?;
        let tmp = path.with_extension("json.tmp");
        let write = async {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&tmp, body).await?;
            tokio::fs::rename(&tmp, path).await
        };
        write.await.map_err(|source| {
            tracing::error!("Failed to write '{}' to {:?}: {}", self.name, path, source);
            StoreError::Unavailable {
                collection: self.name.clone(),
                source,
            }
        })
    }

    fn not_found(&self, criteria: String) -> StoreError {
        StoreError::NotFound {
            collection: self.name.clone(),
            criteria,
        }
    }
}

async fn read_collection(name: &str, path: &Path) -> Result<Vec<Record>, StoreError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StoreError::Unavailable {
                collection: name.to_string(),
                source,
            })
        }
    };
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    Record::list_from_json(&content).map_err(|source| StoreError::Corrupt {
        collection: name.to_string(),
        source,
    })
}

#[async_trait::async_trait]
impl RecordStore for JsonFileStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_all(&self) -> Result<Vec<Record>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn insert(&self, mut record: Record) -> Result<Record, StoreError> {
        if record.get("_id").map_or(true, |v| v.is_null()) {
            record.insert("_id", format!("{}", uuid::Uuid::new_v4().as_simple()));
        }
        let mut records = self.records.write().await;
        let mut next = records.clone();
        next.push(record.clone());
        self.persist(&next).await?;
        *records = next;
        Ok(record)
    }

    async fn update(&self, key: &str, value: &str, patch: Record) -> Result<Record, StoreError> {
        let mut records = self.records.write().await;
        let mut next = records.clone();
        let target = next
            .iter_mut()
            .find(|r| r.text(key).is_some_and(|t| t == value))
            .ok_or_else(|| self.not_found(format!("{}={}", key, value)))?;
        target.merge(patch);
        let updated = target.clone();
        self.persist(&next).await?;
        *records = next;
        Ok(updated)
    }

    async fn delete_where(&self, criteria: &[(String, String)]) -> Result<Record, StoreError> {
        let mut records = self.records.write().await;
        let idx = records
            .iter()
            .position(|r| matches_criteria(r, criteria))
            .ok_or_else(|| self.not_found(describe(criteria)))?;
        let mut next = records.clone();
        let removed = next.remove(idx);
        self.persist(&next).await?;
        *records = next;
        Ok(removed)
    }

    async fn reload(&self) -> Result<usize, StoreError> {
        let Some(path) = &self.path else {
            return Ok(self.len().await);
        };
        let fresh = read_collection(&self.name, path).await?;
        let count = fresh.len();
        *self.records.write().await = fresh;
        Ok(count)
    }

    async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}
