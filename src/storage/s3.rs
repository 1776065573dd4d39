// src/storage/s3.rs

//! Bucket storage backend.
//!
//! Production counterpart of [`LocalStore`](crate::storage::LocalStore),
//! using the same key layout inside a bucket/prefix. Blob expiry travels as
//! object metadata (`expiry-date`, ISO-8601); history partitions are single
//! JSON objects rewritten on each upsert, which is safe because the platform
//! runs at most one job instance at a time.

use std::collections::{BTreeMap, HashMap};

use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::models::{FieldValue, HistoryRow, StoredValue};
use crate::storage::{ValueStore, blob_key, filter_expired, partition_key};

/// Object metadata key carrying the advisory expiry instant.
const EXPIRY_METADATA_KEY: &str = "expiry-date";

/// Bucket-backed storage.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3Store {
    /// Create a new bucket store.
    pub fn new(client: Client, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    /// Create a bucket store with ambient credentials.
    pub async fn connect(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config), bucket, prefix)
    }

    /// Full object key including the configured prefix.
    fn object_key(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}/{}", self.prefix.trim_end_matches('/'), key)
        }
    }

    /// Fetch an object with its metadata, mapping "no such key" to `None`.
    async fn read_object(
        &self,
        key: &str,
    ) -> Result<Option<(Vec<u8>, String, HashMap<String, String>)>> {
        let full_key = self.object_key(key);
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&full_key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let content_type = output
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let metadata = output.metadata().cloned().unwrap_or_default();
                let bytes = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| AppError::storage(e.to_string()))?;
                Ok(Some((bytes.into_bytes().to_vec(), content_type, metadata)))
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    debug!("No object at s3://{}/{}", self.bucket, full_key);
                    Ok(None)
                } else {
                    Err(AppError::storage(service_err.to_string()))
                }
            }
        }
    }

    /// Write an object in a single put.
    async fn write_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        metadata: Option<(&str, String)>,
    ) -> Result<()> {
        let full_key = self.object_key(key);
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&full_key)
            .body(ByteStream::from(bytes))
            .content_type(content_type);

        if let Some((name, value)) = metadata {
            request = request.metadata(name, value);
        }

        request
            .send()
            .await
            .map_err(|e| AppError::storage(e.into_service_error().to_string()))?;

        info!("Wrote s3://{}/{}", self.bucket, full_key);
        Ok(())
    }
}

#[async_trait]
impl ValueStore for S3Store {
    async fn put(
        &self,
        container: &str,
        key: &str,
        content: &str,
        content_type: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let metadata = expires_at.map(|t| (EXPIRY_METADATA_KEY, t.to_rfc3339()));
        self.write_object(
            &blob_key(container, key),
            content.as_bytes().to_vec(),
            content_type,
            metadata,
        )
        .await
    }

    async fn get(&self, container: &str, key: &str) -> Result<Option<StoredValue>> {
        let Some((bytes, content_type, metadata)) =
            self.read_object(&blob_key(container, key)).await?
        else {
            return Ok(None);
        };

        let content = String::from_utf8(bytes)
            .map_err(|e| AppError::storage(format!("blob {container}/{key} is not UTF-8: {e}")))?;

        let expires_at = match metadata.get(EXPIRY_METADATA_KEY) {
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(raw)
                    .map_err(|e| {
                        AppError::storage(format!("bad {EXPIRY_METADATA_KEY} metadata: {e}"))
                    })?
                    .with_timezone(&Utc),
            ),
            None => None,
        };

        let value = StoredValue {
            content,
            content_type,
            expires_at,
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
            match self.read_object(&key).await? {
                Some((bytes, _, _)) => serde_json::from_slice(&bytes)?,
                None => BTreeMap::new(),
            };

        rows.insert(row_key.to_string(), fields);
        let json = serde_json::to_vec_pretty(&rows)?;
        self.write_object(&key, json, "application/json", None).await
    }

    async fn last_row(&self, series: &str, partition: &str) -> Result<Option<HistoryRow>> {
        let rows: BTreeMap<String, HashMap<String, FieldValue>> =
            match self.read_object(&partition_key(series, partition)).await? {
                Some((bytes, _, _)) => serde_json::from_slice(&bytes)?,
                None => return Ok(None),
            };

        Ok(rows.into_iter().next_back().map(|(row_key, fields)| HistoryRow {
            partition: partition.to_string(),
            row_key,
            fields,
        }))
    }
}
