// src/config.rs

//! Environment-derived application configuration.
//!
//! All configuration is read once at process start via [`AppConfig::from_env`]
//! and passed into component constructors. Components never look up the
//! environment themselves; a missing setting surfaces as a
//! [`AppError::Config`](crate::error::AppError) when the job that needs it
//! first asks for it.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{AppError, Result};

/// Default User-Agent for outbound scraping requests.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Default timeout for outbound HTTP requests.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolved storage backend selection.
///
/// The two forms are mutually exclusive and resolved exactly once at startup:
/// a `file://` URL selects the local filesystem backend for development, an
/// `s3://` URL selects the bucket backend with ambient credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageTarget {
    /// Local filesystem root (development and tests)
    Local { root: PathBuf },
    /// Object storage bucket with optional key prefix (production)
    S3 { bucket: String, prefix: String },
}

impl StorageTarget {
    /// Parse a storage URL into a backend selection.
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw)?;
        match url.scheme() {
            "file" => {
                let root = url
                    .to_file_path()
                    .map_err(|_| AppError::config(format!("invalid file storage URL: {raw}")))?;
                Ok(StorageTarget::Local { root })
            }
            "s3" => {
                let bucket = url
                    .host_str()
                    .ok_or_else(|| {
                        AppError::config(format!("storage URL has no bucket: {raw}"))
                    })?
                    .to_string();
                let prefix = url.path().trim_matches('/').to_string();
                Ok(StorageTarget::S3 { bucket, prefix })
            }
            other => Err(AppError::config(format!(
                "unsupported storage scheme '{other}' in {raw}"
            ))),
        }
    }
}

/// Credentials and destination for the notification channel.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: String,
}

/// Login credentials for the fuel-card portal.
#[derive(Debug, Clone)]
pub struct FuelPortalConfig {
    pub username: String,
    pub password: String,
    /// Per-litre discount subtracted from the listed price
    pub discount: f64,
}

/// Remote headless-browser rendering service.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub endpoint: String,
    pub token: String,
}

/// Root application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage: StorageTarget,
    pub telegram: Option<TelegramConfig>,
    pub fuel: Option<FuelPortalConfig>,
    pub browser: Option<BrowserConfig>,
}

impl AppConfig {
    /// Build the configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        let storage_url = require_env("STORAGE_URL")?;
        let storage = StorageTarget::parse(&storage_url)?;

        let telegram = match (env_opt("TOPUP_TG_TOKEN"), env_opt("TOPUP_TG_CHAT_ID")) {
            (Some(token), Some(chat_id)) => Some(TelegramConfig { token, chat_id }),
            _ => None,
        };

        let fuel = match (env_opt("FUEL_PORTAL_USER"), env_opt("FUEL_PORTAL_PASSWORD")) {
            (Some(username), Some(password)) => {
                let discount = match env_opt("FUEL_DISCOUNT") {
                    Some(raw) => raw.parse::<f64>().map_err(|e| {
                        AppError::config(format!("FUEL_DISCOUNT is not a number: {e}"))
                    })?,
                    None => 0.0,
                };
                Some(FuelPortalConfig {
                    username,
                    password,
                    discount,
                })
            }
            _ => None,
        };

        let browser = match (env_opt("BROWSER_ENDPOINT"), env_opt("BROWSER_TOKEN")) {
            (Some(endpoint), Some(token)) => Some(BrowserConfig { endpoint, token }),
            _ => None,
        };

        Ok(Self {
            storage,
            telegram,
            fuel,
            browser,
        })
    }

    /// Notification settings, or a configuration error on first use.
    pub fn telegram(&self) -> Result<&TelegramConfig> {
        self.telegram
            .as_ref()
            .ok_or_else(|| AppError::config("TOPUP_TG_TOKEN / TOPUP_TG_CHAT_ID not set"))
    }

    /// Fuel portal settings, or a configuration error on first use.
    pub fn fuel(&self) -> Result<&FuelPortalConfig> {
        self.fuel
            .as_ref()
            .ok_or_else(|| AppError::config("FUEL_PORTAL_USER / FUEL_PORTAL_PASSWORD not set"))
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| AppError::config(format!("{name} not set")))
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_target() {
        let target = StorageTarget::parse("file:///var/lib/pricewatch").unwrap();
        assert_eq!(
            target,
            StorageTarget::Local {
                root: PathBuf::from("/var/lib/pricewatch")
            }
        );
    }

    #[test]
    fn test_parse_s3_target() {
        let target = StorageTarget::parse("s3://nexus-results/pricewatch").unwrap();
        assert_eq!(
            target,
            StorageTarget::S3 {
                bucket: "nexus-results".into(),
                prefix: "pricewatch".into(),
            }
        );
    }

    #[test]
    fn test_parse_s3_target_without_prefix() {
        let target = StorageTarget::parse("s3://nexus-results").unwrap();
        assert_eq!(
            target,
            StorageTarget::S3 {
                bucket: "nexus-results".into(),
                prefix: String::new(),
            }
        );
    }

    #[test]
    fn test_rejects_unknown_scheme() {
        assert!(StorageTarget::parse("ftp://somewhere/else").is_err());
    }
}
