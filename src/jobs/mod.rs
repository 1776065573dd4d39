// src/jobs/mod.rs

//! Change-detection jobs.
//!
//! Each job is one scheduled run: extract a candidate value, compare it
//! against the last stored state under the job's dedup policy, and only on a
//! real change persist the new state and (for the notifying variant) send a
//! message. Redundant runs terminate with no side effects, so a run is
//! always safe to re-trigger.

pub mod fuel;
pub mod topup;

use chrono::{DateTime, Duration, Utc};

pub use fuel::FuelPriceJob;
pub use topup::TopupOfferJob;

/// Container for cache entries consumed by external automations.
pub const RESULTS_CONTAINER: &str = "nexus-results";

/// Series holding the per-day history rows.
pub const HISTORY_SERIES: &str = "history";

/// How long a refreshed cache entry stays valid.
const CACHE_TTL_HOURS: i64 = 24;

/// Terminal state of one job run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// The dedup key matched the last run; nothing was touched.
    AlreadyDone,
    /// Extraction succeeded but the value is unchanged; nothing was touched.
    NoChange,
    /// New state was persisted.
    Updated {
        /// Whether a notification went out as part of the update
        notified: bool,
    },
}

impl JobOutcome {
    /// Short machine-readable label for logs and handler responses.
    pub fn label(&self) -> &'static str {
        match self {
            JobOutcome::AlreadyDone => "already-done",
            JobOutcome::NoChange => "no-change",
            JobOutcome::Updated { notified: false } => "updated",
            JobOutcome::Updated { notified: true } => "updated-notified",
        }
    }
}

/// Calendar-day dedup key (ISO date) for the given instant.
pub fn day_key(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}

/// Advisory expiry for a cache entry refreshed at `now`.
pub fn cache_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::hours(CACHE_TTL_HOURS)
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_day_key_is_iso_date() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 13, 37, 0).unwrap();
        assert_eq!(day_key(now), "2024-06-01");
    }

    #[test]
    fn test_cache_expiry_is_24h_out() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 13, 37, 0).unwrap();
        let expiry = cache_expiry(now);
        assert_eq!(expiry, Utc.with_ymd_and_hms(2024, 6, 2, 13, 37, 0).unwrap());
    }
}
