// src/utils/http.rs

//! HTTP client utilities.

use scraper::Html;

use crate::config::{HTTP_TIMEOUT, USER_AGENT};
use crate::error::Result;

/// Create a configured asynchronous HTTP client.
///
/// The cookie store is enabled so that a session established by one request
/// (homepage visit, portal login) carries over to the following ones.
pub fn create_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(HTTP_TIMEOUT)
        .cookie_store(true)
        .build()?;
    Ok(client)
}

/// Fetch a page and parse it as HTML.
pub async fn fetch_page(client: &reqwest::Client, url: &str) -> Result<Html> {
    let text = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(Html::parse_document(&text))
}

/// Fetch a binary document (e.g. a PDF) into memory.
pub async fn fetch_bytes(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let bytes = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    Ok(bytes.to_vec())
}
