// src/scrape/offer.rs

//! Top-up campaign extraction.
//!
//! The operator announces a same-day bonus top-up window ("dobíječka") by
//! linking a dated terms PDF from the campaign page. Extraction locates that
//! link, checks the filename date and pulls the validity window out of the
//! PDF text.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::scrape::selector;
use crate::utils::{fetch_page, http::fetch_bytes};

/// Operator homepage, visited first to pick up session cookies.
pub const HOMEPAGE_URL: &str = "https://www.mujkaktus.cz/";

/// Campaign page carrying the terms PDF link when an offer is active.
pub const OFFER_URL: &str = "https://www.mujkaktus.cz/chces-pridat";

/// Anchor pointing at the campaign terms PDF.
const PDF_LINK_SELECTOR: &str = r#"a[href*="OP-Odmena-za-dobiti-FB"]"#;

/// Campaign PDF filenames embed the offer day as DDMMYYYY.
const PDF_DATE_PATTERN: &str = r"OP-Odmena-za-dobiti-FB_(\d{8})\.pdf";

/// Extractor for the active top-up offer.
pub struct OfferScraper {
    client: reqwest::Client,
}

impl OfferScraper {
    /// Create a scraper using the given client.
    ///
    /// The client must have its cookie store enabled; the homepage visit in
    /// [`find_pdf_link`](Self::find_pdf_link) primes the session.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Locate the campaign PDF link on the offer page.
    ///
    /// A missing link means the offer is not active; the site expresses this
    /// by simply not rendering the anchor. Callers treat it as an extraction
    /// failure.
    pub async fn find_pdf_link(&self) -> Result<String> {
        // Session cookies improve the odds of getting the full page; a
        // failure here is not fatal.
        if let Err(e) = self.client.get(HOMEPAGE_URL).send().await {
            debug!("Homepage cookie priming failed: {}", e);
        }

        let document = fetch_page(&self.client, OFFER_URL).await?;
        let link_selector = selector(PDF_LINK_SELECTOR)?;

        let href = document
            .select(&link_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
            .ok_or_else(|| {
                AppError::extraction(OFFER_URL, "no campaign PDF link found; offer not active")
            })?;

        let absolute = url::Url::parse(OFFER_URL)?.join(href)?;
        info!("Found campaign PDF link: {}", absolute);
        Ok(absolute.into())
    }

    /// Download the PDF and extract the validity window from its text.
    ///
    /// Returns `Ok(None)` when the marker phrase is absent: a valid,
    /// empty-but-successful outcome.
    pub async fn extract_interval(&self, pdf_url: &str) -> Result<Option<String>> {
        debug!("Downloading campaign PDF for text extraction");
        let bytes = fetch_bytes(&self.client, pdf_url).await?;

        let text = pdf_extract::extract_text_from_mem(&bytes)
            .map_err(|e| AppError::extraction(pdf_url, e))?;
        debug!("Campaign PDF text length: {}", text.len());

        Ok(find_interval(&text))
    }
}

/// Whether the campaign PDF filename carries the given day.
pub fn pdf_dated(pdf_url: &str, day: NaiveDate) -> bool {
    let Ok(pattern) = regex::Regex::new(PDF_DATE_PATTERN) else {
        return false;
    };
    match pattern.captures(pdf_url) {
        Some(captures) => captures[1] == day.format("%d%m%Y").to_string(),
        None => false,
    }
}

/// Search the PDF text for the validity window.
///
/// Finds the line containing the marker phrase "období od", then appends up
/// to two subsequent lines to complete the sentence, skipping numbered list
/// items and stopping early once a time of day appears. The redundant
/// lead-in ("využít v období od") is stripped down to "od".
pub fn find_interval(text: &str) -> Option<String> {
    let marker = regex::Regex::new(r"(?i)období\s+od").ok()?;
    let time_of_day = regex::Regex::new(r"\d{1,2}:\d{2}").ok()?;
    let numbered_item = regex::Regex::new(r"^\d+\.").ok()?;

    let lines: Vec<&str> = text.lines().collect();
    let start = lines.iter().position(|line| marker.is_match(line))?;

    let mut complete = lines[start].trim().to_string();
    for line in lines.iter().skip(start + 1).take(2) {
        let line = line.trim();
        if line.is_empty() || numbered_item.is_match(line) {
            continue;
        }
        complete.push(' ');
        complete.push_str(line);
        if line.contains("hod") || time_of_day.is_match(line) {
            break;
        }
    }

    let lead_in = regex::Regex::new(r"(?i)^(využít v\s*)?období\s+(od\s+)").ok()?;
    Some(lead_in.replace(&complete, "${2}").into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_dated_match() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let url = "https://www.mujkaktus.cz/docs/OP-Odmena-za-dobiti-FB_01062024.pdf";
        assert!(pdf_dated(url, day));
    }

    #[test]
    fn test_pdf_dated_other_day() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        let url = "https://www.mujkaktus.cz/docs/OP-Odmena-za-dobiti-FB_01062024.pdf";
        assert!(!pdf_dated(url, day));
    }

    #[test]
    fn test_pdf_dated_unrelated_url() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert!(!pdf_dated("https://www.mujkaktus.cz/docs/other.pdf", day));
    }

    #[test]
    fn test_find_interval_single_line() {
        let text = "Podmínky akce\nvyužít v období od 1. 6. 2024 12:00 do 14:00 hod.\nDalší text";
        assert_eq!(
            find_interval(text).as_deref(),
            Some("od 1. 6. 2024 12:00 do 14:00 hod.")
        );
    }

    #[test]
    fn test_find_interval_continues_to_time_line() {
        let text = "období od 1. 6. 2024\ndo 14:00 hod.\ntento řádek se už nepřidá";
        assert_eq!(
            find_interval(text).as_deref(),
            Some("od 1. 6. 2024 do 14:00 hod.")
        );
    }

    #[test]
    fn test_find_interval_skips_numbered_items() {
        let text = "období od 1. 6. 2024\n3. numerovaný bod\nod 12:00 do 14:00";
        assert_eq!(
            find_interval(text).as_deref(),
            Some("od 1. 6. 2024 od 12:00 do 14:00")
        );
    }

    #[test]
    fn test_find_interval_absent_marker() {
        assert_eq!(find_interval("žádná akce dnes není"), None);
    }
}
