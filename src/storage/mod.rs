// src/storage/mod.rs

//! Storage abstractions for cache entries and history rows.
//!
//! Two kinds of data are persisted:
//!
//! - **Cache entries**: plain blobs with a MIME-type hint and an advisory
//!   expiry, consumed directly by external automations.
//! - **History rows**: one record per partition per day, keyed by an ISO
//!   date string; the latest row is the maximum row key.
//!
//! ## Key Layout
//!
//! ```text
//! {root}/
//! ├── blobs/
//! │   └── {container}/
//! │       ├── {key}            # blob content
//! │       └── {key}.meta.json  # content type + expiry (local backend only)
//! └── history/
//!     └── {series}/
//!         └── {partition}.json # row_key -> fields map
//! ```
//!
//! The same key layout is used by both backends, as filesystem paths locally
//! and as object keys in the bucket; the bucket backend carries content type
//! and expiry as object metadata instead of a sidecar.

pub mod local;

#[cfg(feature = "s3")]
pub mod s3;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::StorageTarget;
use crate::error::Result;
use crate::models::{FieldValue, HistoryRow, StoredValue};

// Re-export for convenience
pub use local::LocalStore;

/// Build the storage backend selected at startup.
///
/// Components receive the resolved store and never branch on the
/// environment themselves.
pub async fn from_target(target: &StorageTarget) -> Result<Box<dyn ValueStore>> {
    match target {
        StorageTarget::Local { root } => Ok(Box::new(LocalStore::new(root.clone()))),
        #[cfg(feature = "s3")]
        StorageTarget::S3 { bucket, prefix } => Ok(Box::new(
            s3::S3Store::connect(bucket.clone(), prefix.clone()).await,
        )),
        #[cfg(not(feature = "s3"))]
        StorageTarget::S3 { .. } => Err(crate::error::AppError::config(
            "built without the 's3' feature; s3:// storage is unavailable",
        )),
    }
}

/// Trait for cache + history persistence backends.
///
/// "Not found" is a normal outcome and maps to `Ok(None)`; any other backend
/// failure propagates unmodified. The store performs no retries.
#[async_trait]
pub trait ValueStore: Send + Sync {
    /// Overwrite a cache entry unconditionally. Single-object write; no
    /// partial state is observable.
    async fn put(
        &self,
        container: &str,
        key: &str,
        content: &str,
        content_type: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<()>;

    /// Read a cache entry. Returns `None` when the entry was never written
    /// or its advisory expiry has passed at call time.
    async fn get(&self, container: &str, key: &str) -> Result<Option<StoredValue>>;

    /// Idempotent upsert of a history row. Replays with the same row key
    /// overwrite silently rather than duplicate.
    async fn put_row(
        &self,
        series: &str,
        partition: &str,
        row_key: &str,
        fields: HashMap<String, FieldValue>,
    ) -> Result<()>;

    /// Return the row with the maximum row key in the partition, or `None`
    /// when the partition is empty.
    async fn last_row(&self, series: &str, partition: &str) -> Result<Option<HistoryRow>>;
}

/// Object key for a blob's content.
pub(crate) fn blob_key(container: &str, key: &str) -> String {
    format!("blobs/{container}/{key}")
}

/// Object key for a blob's metadata sidecar.
pub(crate) fn blob_meta_key(container: &str, key: &str) -> String {
    format!("blobs/{container}/{key}.meta.json")
}

/// Object key for a history partition file.
pub(crate) fn partition_key(series: &str, partition: &str) -> String {
    format!("history/{series}/{partition}.json")
}

/// Apply the advisory-expiry read rule shared by all backends.
pub(crate) fn filter_expired(value: StoredValue, now: DateTime<Utc>) -> Option<StoredValue> {
    if value.is_expired(now) {
        tracing::debug!("cache entry expired at {:?}", value.expires_at);
        None
    } else {
        Some(value)
    }
}
