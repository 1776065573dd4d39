// src/scrape/mod.rs

//! Value extraction from external sources.
//!
//! Each extractor produces a candidate value for a job run. Extractors fail
//! loudly when the source is unreachable or malformed; they never hand back
//! a stale or partial value.

pub mod fuel;
pub mod number;
pub mod offer;

use scraper::Selector;

use crate::error::{AppError, Result};

/// Parse a CSS selector, mapping the parse failure into an [`AppError`].
pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| AppError::selector(css, e))
}

/// Parse a decimal that may use a comma as the separator ("35,10 Kč").
pub(crate) fn parse_decimal(raw: &str) -> Option<f64> {
    let re = regex::Regex::new(r"\d+(?:[.,]\d+)?").ok()?;
    let m = re.find(raw)?;
    m.as_str().replace(',', ".").parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal_variants() {
        assert_eq!(parse_decimal("35,10 Kč"), Some(35.10));
        assert_eq!(parse_decimal("Price: 34.90 CZK"), Some(34.90));
        assert_eq!(parse_decimal("42"), Some(42.0));
        assert_eq!(parse_decimal("no number here"), None);
    }
}
