// src/handler.rs

//! AWS Lambda handler routing scheduled and HTTP-triggered runs.
//!
//! Scheduled events carry `{"job": "fuel" | "topup"}`. The on-demand
//! variant carries a `url` (directly or as an HTTP query parameter) and
//! answers `{"number": <float>}`.

use chrono::Utc;
use lambda_runtime::{Error as LambdaError, LambdaEvent};
use serde_json::{Value, json};
use tracing::{error, info, instrument};

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::jobs::{FuelPriceJob, TopupOfferJob};
use crate::notify::TelegramNotifier;
use crate::scrape::fuel::FuelPriceScraper;
use crate::scrape::number::scrape_first_number;
use crate::scrape::offer::OfferScraper;
use crate::storage;
use crate::utils::create_client;

/// Main Lambda handler function.
#[instrument(skip(event))]
pub async fn handler(event: LambdaEvent<Value>) -> std::result::Result<Value, LambdaError> {
    match run(&event.payload).await {
        Ok(response) => {
            info!("Run successful");
            Ok(response)
        }
        Err(e) => {
            // The platform records the failed invocation; no retry here.
            error!("Run failed: {}", e);
            Err(e.into())
        }
    }
}

/// Execute the run selected by the event payload.
async fn run(payload: &Value) -> Result<Value> {
    let config = AppConfig::from_env()?;
    let client = create_client()?;

    if let Some(url) = scrape_url(payload) {
        let number = scrape_first_number(&client, url, config.browser.as_ref()).await?;
        return Ok(json!({ "number": number }));
    }

    let store = storage::from_target(&config.storage).await?;

    match payload.get("job").and_then(Value::as_str) {
        Some("fuel") => {
            let scraper = FuelPriceScraper::new(client, config.fuel()?.clone());
            let outcome = FuelPriceJob::new(store.as_ref(), &scraper)
                .run(Utc::now())
                .await?;
            Ok(json!({ "status": "success", "outcome": outcome.label() }))
        }
        Some("topup") => {
            let notifier = TelegramNotifier::new(client.clone(), config.telegram()?);
            let scraper = OfferScraper::new(client);
            let outcome = TopupOfferJob::new(store.as_ref(), &notifier, &scraper)
                .run(Utc::now())
                .await?;
            Ok(json!({ "status": "success", "outcome": outcome.label() }))
        }
        Some(other) => Err(AppError::config(format!("unknown job '{other}'"))),
        None => Err(AppError::config("event names no job and carries no url")),
    }
}

/// URL for the on-demand number scrape, if the event carries one.
fn scrape_url(payload: &Value) -> Option<&str> {
    payload
        .get("url")
        .and_then(Value::as_str)
        .or_else(|| {
            payload
                .pointer("/queryStringParameters/url")
                .and_then(Value::as_str)
        })
}
