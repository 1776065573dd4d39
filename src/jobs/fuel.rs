// src/jobs/fuel.rs

//! Fuel price change-detection job.
//!
//! Extracts the current discounted price, compares it against the last
//! history row under exact numeric equality, and on change writes one new
//! per-day row plus a refreshed cache entry with a 24-hour expiry. This
//! variant sends no notification.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::Result;
use crate::jobs::{HISTORY_SERIES, JobOutcome, RESULTS_CONTAINER, cache_expiry, day_key};
use crate::scrape::fuel::FuelPriceScraper;
use crate::storage::ValueStore;

/// History partition holding one price row per day.
pub const PRICE_PARTITION: &str = "price";

/// Field name of the price inside a history row.
pub const PRICE_FIELD: &str = "Price";

/// Cache entry consumed by external shortcut automations.
pub const PRICE_CACHE_KEY: &str = "fuel-price.txt";

/// Source of the current discounted price; the job treats it as opaque.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn current_price(&self) -> Result<f64>;
}

#[async_trait]
impl PriceSource for FuelPriceScraper {
    async fn current_price(&self) -> Result<f64> {
        FuelPriceScraper::current_price(self).await
    }
}

/// The price watch job.
pub struct FuelPriceJob<'a> {
    store: &'a dyn ValueStore,
    source: &'a dyn PriceSource,
}

impl<'a> FuelPriceJob<'a> {
    pub fn new(store: &'a dyn ValueStore, source: &'a dyn PriceSource) -> Self {
        Self { store, source }
    }

    /// Run one check at the given instant.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<JobOutcome> {
        // Extraction and the value comparison are both fail-closed: any
        // failure aborts the run before a single write happens.
        let price = self.source.current_price().await?;

        let last = self.store.last_row(HISTORY_SERIES, PRICE_PARTITION).await?;
        if let Some(last) = &last {
            if last.number(PRICE_FIELD) == Some(price) {
                info!(
                    "Price unchanged at {:.2} since {}; skipping",
                    price, last.row_key
                );
                return Ok(JobOutcome::NoChange);
            }
        }

        let today = day_key(now);
        let mut fields = HashMap::new();
        fields.insert(PRICE_FIELD.to_string(), price.into());
        self.store
            .put_row(HISTORY_SERIES, PRICE_PARTITION, &today, fields)
            .await?;

        self.store
            .put(
                RESULTS_CONTAINER,
                PRICE_CACHE_KEY,
                &format!("{price:.2}"),
                "text/plain",
                Some(cache_expiry(now)),
            )
            .await?;

        info!("Recorded new price {:.2} for {}", price, today);
        Ok(JobOutcome::Updated { notified: false })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use chrono::TimeZone;

    use super::*;
    use crate::error::AppError;
    use crate::jobs::testing::MemStore;

    struct FixedPrice(f64);

    #[async_trait]
    impl PriceSource for FixedPrice {
        async fn current_price(&self) -> Result<f64> {
            Ok(self.0)
        }
    }

    struct BrokenSource;

    #[async_trait]
    impl PriceSource for BrokenSource {
        async fn current_price(&self) -> Result<f64> {
            Err(AppError::extraction("portal", "unreachable"))
        }
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 8, 0, 0).unwrap()
    }

    async fn seed_price(store: &MemStore, day: &str, price: f64) {
        let mut fields = HashMap::new();
        fields.insert(PRICE_FIELD.to_string(), price.into());
        store
            .put_row(HISTORY_SERIES, PRICE_PARTITION, day, fields)
            .await
            .unwrap();
        store.row_writes.store(0, Ordering::SeqCst);
    }

    #[tokio::test]
    async fn test_unchanged_price_writes_nothing() {
        let store = MemStore::new();
        seed_price(&store, "2024-06-01", 34.90).await;

        let source = FixedPrice(34.90);
        let job = FuelPriceJob::new(&store, &source);
        let outcome = job.run(at(2024, 6, 1)).await.unwrap();

        assert_eq!(outcome, JobOutcome::NoChange);
        assert_eq!(store.row_writes.load(Ordering::SeqCst), 0);
        assert_eq!(store.blob_writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_changed_price_writes_row_and_cache() {
        let store = MemStore::new();
        seed_price(&store, "2024-06-01", 34.90).await;

        let source = FixedPrice(35.10);
        let job = FuelPriceJob::new(&store, &source);
        let now = at(2024, 6, 2);
        let outcome = job.run(now).await.unwrap();

        assert_eq!(outcome, JobOutcome::Updated { notified: false });
        assert_eq!(store.row_writes.load(Ordering::SeqCst), 1);
        assert_eq!(store.blob_writes.load(Ordering::SeqCst), 1);

        let last = store
            .last_row(HISTORY_SERIES, PRICE_PARTITION)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(last.row_key, "2024-06-02");
        assert_eq!(last.number(PRICE_FIELD), Some(35.10));

        let cache = store.blob(RESULTS_CONTAINER, PRICE_CACHE_KEY).unwrap();
        assert_eq!(cache.content, "35.10");
        assert_eq!(cache.content_type, "text/plain");
        assert_eq!(cache.expires_at, Some(cache_expiry(now)));
    }

    #[tokio::test]
    async fn test_first_run_with_empty_history_writes() {
        let store = MemStore::new();
        let source = FixedPrice(34.90);
        let job = FuelPriceJob::new(&store, &source);

        let outcome = job.run(at(2024, 6, 1)).await.unwrap();
        assert_eq!(outcome, JobOutcome::Updated { notified: false });
        assert_eq!(store.row_writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_replayed_run_is_noop() {
        let store = MemStore::new();
        let source = FixedPrice(35.10);
        let job = FuelPriceJob::new(&store, &source);
        let now = at(2024, 6, 2);

        assert_eq!(
            job.run(now).await.unwrap(),
            JobOutcome::Updated { notified: false }
        );
        // Same extraction result again: the dedup check short-circuits.
        assert_eq!(job.run(now).await.unwrap(), JobOutcome::NoChange);
        assert_eq!(store.row_writes.load(Ordering::SeqCst), 1);
        assert_eq!(store.blob_writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_extraction_failure_aborts_without_writes() {
        let store = MemStore::new();
        let job = FuelPriceJob::new(&store, &BrokenSource);

        let err = job.run(at(2024, 6, 1)).await.unwrap_err();
        assert!(matches!(err, AppError::Extraction { .. }));
        assert_eq!(store.row_writes.load(Ordering::SeqCst), 0);
        assert_eq!(store.blob_writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_history_read_failure_is_fail_closed() {
        let store = MemStore::new();
        store.fail_reads.store(true, Ordering::SeqCst);

        let source = FixedPrice(34.90);
        let job = FuelPriceJob::new(&store, &source);

        let err = job.run(at(2024, 6, 1)).await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(store.row_writes.load(Ordering::SeqCst), 0);
    }
}
