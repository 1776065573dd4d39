// src/lib.rs

//! pricewatch Library
//!
//! Scheduled scrape-compare-notify jobs: extract a value from an external
//! source, compare it against the last stored value, persist on change and
//! optionally notify a chat channel.

pub mod config;
pub mod error;
pub mod jobs;
pub mod models;
pub mod notify;
pub mod scrape;
pub mod storage;
pub mod utils;

#[cfg(feature = "lambda")]
pub mod handler;
