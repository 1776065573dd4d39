// src/scrape/number.rs

//! On-demand "first number on the page" extraction.
//!
//! Fetches a page, optionally rendered through a remote headless-browser
//! service for script-heavy sites, and returns the first decimal number in
//! the document body text.

use scraper::Html;
use serde_json::json;
use tracing::debug;

use crate::config::BrowserConfig;
use crate::error::{AppError, Result};

/// Fetch page HTML, rendered remotely when a browser service is configured.
async fn fetch_html(
    client: &reqwest::Client,
    url: &str,
    browser: Option<&BrowserConfig>,
) -> Result<String> {
    match browser {
        Some(browser) => {
            let endpoint = format!(
                "{}/content?token={}",
                browser.endpoint.trim_end_matches('/'),
                browser.token
            );
            debug!("Rendering {} via remote browser", url);
            let text = client
                .post(endpoint)
                .json(&json!({ "url": url }))
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?;
            Ok(text)
        }
        None => {
            let text = client
                .get(url)
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?;
            Ok(text)
        }
    }
}

/// Extract the first decimal number from the page at `url`.
pub async fn scrape_first_number(
    client: &reqwest::Client,
    url: &str,
    browser: Option<&BrowserConfig>,
) -> Result<f64> {
    let html = fetch_html(client, url, browser).await?;
    first_number(&html).ok_or_else(|| AppError::extraction(url, "no number found in page text"))
}

/// First decimal number in the document body text, if any.
fn first_number(html: &str) -> Option<f64> {
    let document = Html::parse_document(html);
    let text: String = document.root_element().text().collect::<Vec<_>>().join(" ");

    let re = regex::Regex::new(r"\d+\.?\d*").ok()?;
    re.find(&text)?.as_str().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_number_in_body_text() {
        let html = "<html><body><h1>Balance</h1><p>You have 123.45 points</p></body></html>";
        assert_eq!(first_number(html), Some(123.45));
    }

    #[test]
    fn test_first_number_skips_markup() {
        // The "2" inside the tag name must not be picked up.
        let html = "<html><body><h2>Total: 7</h2></body></html>";
        assert_eq!(first_number(html), Some(7.0));
    }

    #[test]
    fn test_no_number_is_none() {
        let html = "<html><body><p>nothing numeric</p></body></html>";
        assert_eq!(first_number(html), None);
    }
}
