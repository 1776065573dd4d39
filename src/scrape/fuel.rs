// src/scrape/fuel.rs

//! Fuel-card portal price extraction.
//!
//! Logs into the card portal with the configured credentials, reads the
//! current listed price per litre from the account page and applies the
//! contractual discount.

use scraper::Html;
use tracing::{debug, info};

use crate::config::FuelPortalConfig;
use crate::error::{AppError, Result};
use crate::scrape::{parse_decimal, selector};
use crate::utils::fetch_page;

/// Portal login endpoint.
const LOGIN_URL: &str = "https://portal.tankovacikarta.cz/prihlaseni";

/// Account page listing the current price.
const PRICE_URL: &str = "https://portal.tankovacikarta.cz/muj-ucet";

/// Element carrying the listed per-litre price.
const PRICE_SELECTOR: &str = ".account-summary .price-per-litre";

/// Extractor for the current discounted fuel price.
pub struct FuelPriceScraper {
    client: reqwest::Client,
    config: FuelPortalConfig,
}

impl FuelPriceScraper {
    /// Create a scraper using the given client and portal credentials.
    ///
    /// The client must have its cookie store enabled so the login session
    /// carries over to the price page request.
    pub fn new(client: reqwest::Client, config: FuelPortalConfig) -> Self {
        Self { client, config }
    }

    /// Establish a portal session.
    async fn login(&self) -> Result<()> {
        debug!("Logging into fuel portal as {}", self.config.username);
        let response = self
            .client
            .post(LOGIN_URL)
            .form(&[
                ("username", self.config.username.as_str()),
                ("password", self.config.password.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::extraction(
                LOGIN_URL,
                format!("portal login rejected with status {}", response.status()),
            ));
        }
        Ok(())
    }

    /// Fetch the current per-litre price with the discount applied.
    pub async fn current_price(&self) -> Result<f64> {
        self.login().await?;

        let document = fetch_page(&self.client, PRICE_URL).await?;
        let price = extract_price(&document, self.config.discount)?;

        info!("Current discounted fuel price: {:.2}", price);
        Ok(price)
    }
}

/// Pull the listed price out of the account page and apply the discount.
fn extract_price(document: &Html, discount: f64) -> Result<f64> {
    let price_selector = selector(PRICE_SELECTOR)?;

    let element = document
        .select(&price_selector)
        .next()
        .ok_or_else(|| AppError::extraction(PRICE_URL, "price element not found"))?;

    let text: String = element.text().collect();
    let listed = parse_decimal(&text)
        .ok_or_else(|| AppError::extraction(PRICE_URL, format!("unparsable price '{text}'")))?;

    // Round to whole hundredths; the portal lists prices in CZK with two
    // decimal places and the subtraction must not introduce float dust.
    Ok(((listed - discount) * 100.0).round() / 100.0)
}
