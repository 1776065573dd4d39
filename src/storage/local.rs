// src/storage/local.rs

//! Local filesystem storage backend.
//!
//! Used for development and tests; production deployments use the bucket
//! backend. Writes go through a temp-file-then-rename step so that readers
//! never observe a partially written object.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{FieldValue, HistoryRow, StoredValue};
use crate::storage::{ValueStore, blob_key, blob_meta_key, filter_expired, partition_key};

/// Metadata sidecar persisted next to each blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BlobMeta {
    content_type: String,
    expires_at: Option<DateTime<Utc>>,
}

/// Local filesystem storage backend.
#[derive(Clone)]
pub struct LocalStore {
    root_dir: PathBuf,
}

impl LocalStore {
    /// Create a new LocalStore rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Read bytes, returning None if the file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ValueStore for LocalStore {
    async fn put(
        &self,
        container: &str,
        key: &str,
        content: &str,
        content_type: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let meta = BlobMeta {
            content_type: content_type.to_string(),
            expires_at,
        };
        self.write_bytes(&blob_key(container, key), content.as_bytes())
            .await?;
        self.write_json(&blob_meta_key(container, key), &meta).await?;

        tracing::info!("Stored blob {}/{}", container, key);
        Ok(())
    }

    async fn get(&self, container: &str, key: &str) -> Result<Option<StoredValue>> {
        let Some(bytes) = self.read_bytes(&blob_key(container, key)).await? else {
            tracing::debug!("Blob {}/{} not found", container, key);
            return Ok(None);
        };

        let content = String::from_utf8(bytes)
            .map_err(|e| AppError::storage(format!("blob {container}/{key} is not UTF-8: {e}")))?;

        let meta: BlobMeta = self
            .read_json(&blob_meta_key(container, key))
            .await?
            .unwrap_or(BlobMeta {
                content_type: "application/octet-stream".to_string(),
                expires_at: None,
            });

        let value = StoredValue {
            content,
            content_type: meta.content_type,
            expires_at: meta.expires_at,
        };
        Ok(filter_expired(value, Utc::now()))
    }

    async fn put_row(
        &self,
        series: &str,
        partition: &str,
        row_key: &str,
        fields: HashMap<String, FieldValue>,
    ) -> Result<()> {
        let key = partition_key(series, partition);
        let mut rows: BTreeMap<String, HashMap<String, FieldValue>> =
            self.read_json(&key).await?.unwrap_or_default();

        rows.insert(row_key.to_string(), fields);
        self.write_json(&key, &rows).await?;

        tracing::info!("Upserted row {}/{}/{}", series, partition, row_key);
        Ok(())
    }

    async fn last_row(&self, series: &str, partition: &str) -> Result<Option<HistoryRow>> {
        let rows: Option<BTreeMap<String, HashMap<String, FieldValue>>> =
            self.read_json(&partition_key(series, partition)).await?;

        Ok(rows.and_then(|rows| {
            rows.into_iter().next_back().map(|(row_key, fields)| HistoryRow {
                partition: partition.to_string(),
                row_key,
                fields,
            })
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn store() -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let (_dir, store) = store();

        store
            .put("results", "fuel-price.txt", "34.90", "text/plain", None)
            .await
            .unwrap();

        let value = store.get("results", "fuel-price.txt").await.unwrap().unwrap();
        assert_eq!(value.content, "34.90");
        assert_eq!(value.content_type, "text/plain");
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let (_dir, store) = store();
        assert!(store.get("results", "nope.txt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_absent() {
        let (_dir, store) = store();

        let past = Utc::now() - Duration::hours(1);
        store
            .put("results", "stale.txt", "x", "text/plain", Some(past))
            .await
            .unwrap();

        // Object still exists on disk, but the read applies the expiry.
        assert!(store.get("results", "stale.txt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let (_dir, store) = store();

        store
            .put("results", "v.txt", "old", "text/plain", None)
            .await
            .unwrap();
        store
            .put("results", "v.txt", "new", "text/plain", None)
            .await
            .unwrap();

        let value = store.get("results", "v.txt").await.unwrap().unwrap();
        assert_eq!(value.content, "new");
    }

    #[tokio::test]
    async fn test_last_row_empty_partition() {
        let (_dir, store) = store();
        assert!(store.last_row("history", "price").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_last_row_is_max_row_key() {
        let (_dir, store) = store();

        for (day, price) in [("2024-06-01", 34.9), ("2024-06-03", 35.3), ("2024-06-02", 35.1)] {
            let mut fields = HashMap::new();
            fields.insert("Price".to_string(), FieldValue::Number(price));
            store.put_row("history", "price", day, fields).await.unwrap();
        }

        let last = store.last_row("history", "price").await.unwrap().unwrap();
        assert_eq!(last.row_key, "2024-06-03");
        assert_eq!(last.number("Price"), Some(35.3));
    }

    #[tokio::test]
    async fn test_put_row_upsert_is_idempotent() {
        let (_dir, store) = store();

        let mut fields = HashMap::new();
        fields.insert("Price".to_string(), FieldValue::Number(34.9));
        store
            .put_row("history", "price", "2024-06-01", fields.clone())
            .await
            .unwrap();
        store
            .put_row("history", "price", "2024-06-01", fields)
            .await
            .unwrap();

        let last = store.last_row("history", "price").await.unwrap().unwrap();
        assert_eq!(last.row_key, "2024-06-01");
        assert_eq!(last.number("Price"), Some(34.9));
    }
}
