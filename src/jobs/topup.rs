// src/jobs/topup.rs

//! Top-up offer notification job.
//!
//! Checks whether a bonus top-up window is announced for today and posts it
//! to the chat channel at most once per calendar day. The already-posted
//! check is advisory and fails open: a store outage must not silence an
//! active offer, while a duplicate post is acceptable.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::jobs::{JobOutcome, RESULTS_CONTAINER, cache_expiry, day_key};
use crate::models::{MessageFormat, MessageOptions, OfferNotice};
use crate::notify::Notifier;
use crate::scrape::offer::{OFFER_URL, OfferScraper, pdf_dated};
use crate::storage::ValueStore;

/// Cache entry recording the last day a notification went out.
pub const LAST_POSTED_KEY: &str = "topup-last-posted.txt";

/// Source of the active offer; the job treats it as opaque.
#[async_trait]
pub trait OfferSource: Send + Sync {
    /// Link to the campaign PDF, or an error when no offer is active.
    async fn find_pdf_link(&self) -> Result<String>;

    /// Validity window from the PDF text; `None` when the marker is absent.
    async fn extract_interval(&self, pdf_url: &str) -> Result<Option<String>>;
}

#[async_trait]
impl OfferSource for OfferScraper {
    async fn find_pdf_link(&self) -> Result<String> {
        OfferScraper::find_pdf_link(self).await
    }

    async fn extract_interval(&self, pdf_url: &str) -> Result<Option<String>> {
        OfferScraper::extract_interval(self, pdf_url).await
    }
}

/// The offer notification job.
pub struct TopupOfferJob<'a> {
    store: &'a dyn ValueStore,
    notifier: &'a dyn Notifier,
    source: &'a dyn OfferSource,
}

impl<'a> TopupOfferJob<'a> {
    pub fn new(
        store: &'a dyn ValueStore,
        notifier: &'a dyn Notifier,
        source: &'a dyn OfferSource,
    ) -> Self {
        Self {
            store,
            notifier,
            source,
        }
    }

    /// Run one check at the given instant.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<JobOutcome> {
        let today = day_key(now);

        let pdf_url = self.source.find_pdf_link().await?;

        if !pdf_dated(&pdf_url, now.date_naive()) {
            info!("Campaign PDF is not for today; skipping");
            return Ok(JobOutcome::NoChange);
        }

        // Advisory dedup: a failure here is logged and treated as "not yet
        // posted", before the expensive PDF download.
        match self.store.get(RESULTS_CONTAINER, LAST_POSTED_KEY).await {
            Ok(Some(marker)) if marker.content.trim() == today => {
                info!("Offer already posted today; skipping");
                return Ok(JobOutcome::AlreadyDone);
            }
            Ok(_) => {}
            Err(e) => warn!("Could not check last posted day: {}", e),
        }

        let interval = self
            .source
            .extract_interval(&pdf_url)
            .await?
            .ok_or_else(|| {
                AppError::extraction(pdf_url.as_str(), "no validity window found in campaign PDF")
            })?;

        let notice = OfferNotice {
            pdf_url,
            interval,
            extracted_at: now,
        };

        let receipt = self
            .notifier
            .notify(&format_message(&notice), &MessageOptions {
                format: MessageFormat::Html,
                disable_link_preview: false,
                silent: false,
            })
            .await?;
        info!("Offer notification delivered: message id {}", receipt.message_id);

        // Notify-then-mark: a crash in between can duplicate a post but
        // never silently skip one.
        self.store
            .put(
                RESULTS_CONTAINER,
                LAST_POSTED_KEY,
                &today,
                "text/plain",
                Some(cache_expiry(now)),
            )
            .await?;

        Ok(JobOutcome::Updated { notified: true })
    }
}

/// Chat message announcing the active offer.
fn format_message(notice: &OfferNotice) -> String {
    format!(
        "🎉 <b>Kaktus Dobíječka je aktivní!</b>\n\n\
         📅 <b>Období:</b> {}\n\n\
         🔗 <a href=\"{}\">Zobrazit detaily</a>\n\n\
         <i>Extrahováno: {}</i>",
        notice.interval,
        OFFER_URL,
        notice.extracted_at.format("%d.%m.%Y %H:%M"),
    )
}
